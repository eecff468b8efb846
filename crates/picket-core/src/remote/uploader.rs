//! HTTP client for the object-storage upload endpoint.

use std::path::Path;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;

use super::StorageUploader;
use crate::config::EndpointsConfig;
use crate::error::StageError;
use crate::types::{Credentials, Stage, UploadResult};

/// Pushes image bytes to object storage and returns the public URL.
pub struct HttpStorageUploader {
    url: String,
    client: reqwest::Client,
}

impl HttpStorageUploader {
    pub fn new(endpoints: &EndpointsConfig) -> Self {
        Self {
            url: endpoints.upload_url.clone(),
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Deserialize)]
struct UploadResponse {
    data: Option<UploadData>,
}

#[derive(Deserialize)]
struct UploadData {
    url: Option<String>,
}

/// The moderation service only accepts plain-http URLs, so a secure
/// scheme on the storage host gets rewritten before handing it over.
fn normalize_scheme(url: String) -> String {
    match url.strip_prefix("https://") {
        Some(rest) => format!("http://{rest}"),
        None => url,
    }
}

#[async_trait]
impl StorageUploader for HttpStorageUploader {
    async fn upload(
        &self,
        credentials: &Credentials,
        path: &Path,
    ) -> Result<UploadResult, StageError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| StageError::Filesystem {
                stage: Stage::Upload,
                path: path.to_path_buf(),
                message: format!("cannot read upload payload: {e}"),
            })?;

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let form = Form::new()
            .text("token", credentials.token.clone())
            .text("key", credentials.resource_key.clone())
            .part("file", Part::bytes(bytes).file_name(file_name));

        let resp = self
            .client
            .post(&self.url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| StageError::Transport {
                stage: Stage::Upload,
                message: format!("upload request failed: {e}"),
                status_code: None,
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(StageError::Transport {
                stage: Stage::Upload,
                message: format!("upload endpoint returned HTTP {status}"),
                status_code: Some(status.as_u16()),
            });
        }

        let upload_resp: UploadResponse =
            resp.json().await.map_err(|e| StageError::ResponseShape {
                stage: Stage::Upload,
                message: format!("cannot parse upload response: {e}"),
            })?;

        let url = upload_resp
            .data
            .and_then(|d| d.url)
            .ok_or_else(|| StageError::ResponseShape {
                stage: Stage::Upload,
                message: "response missing data.url".to_string(),
            })?;

        Ok(UploadResult {
            public_url: normalize_scheme(url),
        })
    }
}
