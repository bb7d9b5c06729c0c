use std::path::{Path, PathBuf};

use rand::Rng;
use tokio::fs;
use tracing::warn;

use crate::shared::error::AppError;

const PENDING_DIR: &str = "pending-photos";

/// App-private durable directory for captured photos awaiting sync. Files
/// placed here survive process restarts until the upload pipeline confirms
/// them remote and discards the local copy.
pub struct PhotoStore {
    pending_dir: PathBuf,
}

impl PhotoStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            pending_dir: data_dir.join(PENDING_DIR),
        }
    }

    pub fn pending_dir(&self) -> &Path {
        &self.pending_dir
    }

    /// Copies captured bytes into the pending directory under a
    /// collision-resistant name and returns the durable `file://` URI.
    pub async fn persist_capture(
        &self,
        field: &str,
        extension: &str,
        bytes: &[u8],
    ) -> Result<String, AppError> {
        fs::create_dir_all(&self.pending_dir)
            .await
            .map_err(|err| AppError::Storage(format!("Failed to create photo dir: {err}")))?;

        let millis = chrono::Utc::now().timestamp_millis();
        let suffix: String = rand::thread_rng()
            .sample_iter(&rand::distributions::Alphanumeric)
            .take(6)
            .map(|c| (c as char).to_ascii_lowercase())
            .collect();
        let path = self
            .pending_dir
            .join(format!("{field}_{millis}_{suffix}.{extension}"));

        fs::write(&path, bytes)
            .await
            .map_err(|err| AppError::Storage(format!("Failed to persist photo: {err}")))?;
        Ok(format!("file://{}", path.display()))
    }

    /// Resolves a `file://` URI back to a filesystem path.
    pub fn path_from_uri(uri: &str) -> PathBuf {
        let stripped = uri
            .strip_prefix("file://")
            .or_else(|| uri.strip_prefix("FILE://"))
            .unwrap_or(uri);
        PathBuf::from(stripped)
    }

    pub async fn exists(&self, uri: &str) -> bool {
        fs::metadata(Self::path_from_uri(uri)).await.is_ok()
    }

    pub async fn size(&self, uri: &str) -> Option<u64> {
        fs::metadata(Self::path_from_uri(uri))
            .await
            .ok()
            .map(|meta| meta.len())
    }

    pub async fn read(&self, uri: &str) -> Result<Vec<u8>, AppError> {
        fs::read(Self::path_from_uri(uri))
            .await
            .map_err(|err| AppError::Storage(format!("Failed to read photo: {err}")))
    }

    /// Idempotent delete; faults are logged, never surfaced.
    pub async fn discard(&self, uri: &str) {
        match fs::remove_file(Self::path_from_uri(uri)).await {
            Ok(()) => {}
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => warn!("Failed to delete local photo {uri}: {err}"),
        }
    }
}
