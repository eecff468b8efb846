//! HTTP client for the credential-issuing endpoint.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::CredentialBroker;
use crate::config::{EndpointsConfig, IdentityConfig};
use crate::error::StageError;
use crate::types::{Credentials, Stage};

/// Requests single-use upload tokens from the credential service.
pub struct HttpCredentialBroker {
    url: String,
    app_key: String,
    client: reqwest::Client,
}

impl HttpCredentialBroker {
    pub fn new(endpoints: &EndpointsConfig, identity: &IdentityConfig) -> Self {
        Self {
            url: endpoints.credentials_url.clone(),
            app_key: identity.app_key.clone(),
            client: reqwest::Client::new(),
        }
    }
}

// --- Wire types ---

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TokenRequest<'a> {
    app_key: &'a str,
    file_name: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
    data: Option<TokenData>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenData {
    token: Option<String>,
    resource_name: Option<String>,
}

#[async_trait]
impl CredentialBroker for HttpCredentialBroker {
    async fn issue(&self, file_name: &str) -> Result<Credentials, StageError> {
        let body = TokenRequest {
            app_key: &self.app_key,
            file_name,
        };

        let resp = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| StageError::Transport {
                stage: Stage::Credentials,
                message: format!("credential request failed: {e}"),
                status_code: None,
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(StageError::Transport {
                stage: Stage::Credentials,
                message: format!("credential endpoint returned HTTP {status}"),
                status_code: Some(status.as_u16()),
            });
        }

        let token_resp: TokenResponse =
            resp.json().await.map_err(|e| StageError::ResponseShape {
                stage: Stage::Credentials,
                message: format!("cannot parse credential response: {e}"),
            })?;

        let data = token_resp.data.ok_or_else(|| StageError::ResponseShape {
            stage: Stage::Credentials,
            message: "response missing data object".to_string(),
        })?;
        let token = data.token.ok_or_else(|| StageError::ResponseShape {
            stage: Stage::Credentials,
            message: "response missing data.token".to_string(),
        })?;
        let resource_key = data.resource_name.ok_or_else(|| StageError::ResponseShape {
            stage: Stage::Credentials,
            message: "response missing data.resourceName".to_string(),
        })?;

        Ok(Credentials {
            token,
            resource_key,
        })
    }
}
