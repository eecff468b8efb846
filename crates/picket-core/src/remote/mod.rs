//! Remote-service clients for the three network stages.
//!
//! Each stage sits behind a trait so the task runner can be exercised with
//! failing fakes and so deployments can swap client implementations. The
//! HTTP implementations live in `broker`, `uploader`, and `review`.

pub mod broker;
pub mod retry;
pub mod review;
pub mod uploader;

pub use broker::HttpCredentialBroker;
pub use review::HttpModerationClient;
pub use uploader::HttpStorageUploader;

use async_trait::async_trait;
use std::path::Path;

use crate::error::StageError;
use crate::types::{Credentials, UploadResult};

/// Issues single-use upload credentials.
///
/// Uses `async_trait` because native async fn in trait is not object-safe
/// (the task runner holds `Arc<dyn CredentialBroker>`).
#[async_trait]
pub trait CredentialBroker: Send + Sync {
    /// Request a token/key pair for the given destination file name.
    async fn issue(&self, file_name: &str) -> Result<Credentials, StageError>;
}

/// Pushes files to object storage.
#[async_trait]
pub trait StorageUploader: Send + Sync {
    /// Upload the file at `path` using `credentials` and return its public
    /// URL. Empty credentials are passed through to the remote side, which
    /// owns rejecting them.
    async fn upload(
        &self,
        credentials: &Credentials,
        path: &Path,
    ) -> Result<UploadResult, StageError>;
}

/// Submits image URLs for content review.
#[async_trait]
pub trait ModerationClient: Send + Sync {
    /// Submit `image_url` and return the verdict message. `Ok(None)` is a
    /// successful call whose verdict field was null or missing; that is an
    /// answer from the service, not a client failure.
    async fn review(&self, image_url: &str) -> Result<Option<String>, StageError>;
}
