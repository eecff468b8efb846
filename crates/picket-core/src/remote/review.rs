//! HTTP client for the content-moderation endpoint.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::ModerationClient;
use crate::config::{EndpointsConfig, IdentityConfig};
use crate::error::StageError;
use crate::types::Stage;

/// Submits a public image URL for review and returns the verdict text.
pub struct HttpModerationClient {
    url: String,
    account: String,
    package_name: String,
    client: reqwest::Client,
}

impl HttpModerationClient {
    pub fn new(endpoints: &EndpointsConfig, identity: &IdentityConfig) -> Self {
        Self {
            url: endpoints.review_url.clone(),
            account: identity.account.clone(),
            package_name: identity.package_name.clone(),
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReviewForm<'a> {
    account: &'a str,
    package_name: &'a str,
    image_url: &'a str,
}

#[derive(Deserialize)]
struct ReviewResponse {
    data: Option<ReviewData>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReviewData {
    review_msg: Option<String>,
}

#[async_trait]
impl ModerationClient for HttpModerationClient {
    async fn review(&self, image_url: &str) -> Result<Option<String>, StageError> {
        let form = ReviewForm {
            account: &self.account,
            package_name: &self.package_name,
            image_url,
        };

        let resp = self
            .client
            .post(&self.url)
            .form(&form)
            .send()
            .await
            .map_err(|e| StageError::Transport {
                stage: Stage::Review,
                message: format!("review request failed: {e}"),
                status_code: None,
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(StageError::Transport {
                stage: Stage::Review,
                message: format!("review endpoint returned HTTP {status}"),
                status_code: Some(status.as_u16()),
            });
        }

        let review_resp: ReviewResponse =
            resp.json().await.map_err(|e| StageError::ResponseShape {
                stage: Stage::Review,
                message: format!("cannot parse review response: {e}"),
            })?;

        // A null or absent verdict is a valid answer, not an error.
        Ok(review_resp.data.and_then(|d| d.review_msg))
    }
}
