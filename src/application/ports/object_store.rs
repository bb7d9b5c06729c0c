use crate::shared::error::AppError;
use async_trait::async_trait;

/// Remote object store: path-addressed binary upload with overwrite, public
/// URL lookup, and signed-URL issuance as fallback.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str)
        -> Result<(), AppError>;

    /// `None` when the bucket does not expose public URLs.
    async fn public_url(&self, path: &str) -> Result<Option<String>, AppError>;

    /// Time-limited signed URL; `None` when the backend refuses to sign.
    async fn signed_url(&self, path: &str, expires_secs: u64) -> Result<Option<String>, AppError>;
}
