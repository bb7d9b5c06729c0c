use crate::shared::error::AppError;
use async_trait::async_trait;

/// A photo as it leaves the device camera, before it is persisted.
#[derive(Debug, Clone)]
pub struct CapturedPhoto {
    pub bytes: Vec<u8>,
    pub extension: String,
}

#[async_trait]
pub trait Camera: Send + Sync {
    /// `None` when the user cancels the capture.
    async fn capture(&self) -> Result<Option<CapturedPhoto>, AppError>;
}
