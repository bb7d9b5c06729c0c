use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use crate::application::ports::{Camera, ObjectStore};
use crate::infrastructure::media::compress::recompress_jpeg;
use crate::infrastructure::storage::PhotoStore;
use crate::shared::config::SyncConfig;
use crate::shared::error::AppError;

const SIGNED_URL_EXPIRY_SECS: u64 = 60 * 60;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Upload path not allowed: {0}")]
    PathNotAllowed(String),

    #[error("Source file missing: {0}")]
    MissingSource(String),

    #[error("Source file is empty: {0}")]
    EmptySource(String),

    #[error("Object store rejected the upload: {0}")]
    Store(String),
}

/// Photo asset lifecycle: capture into durable local storage, compressed
/// upload to the object store, URL resolution, and reclaim of local copies
/// once their remote path is recorded.
pub struct PhotoService {
    camera: Arc<dyn Camera>,
    objects: Arc<dyn ObjectStore>,
    store: PhotoStore,
    config: SyncConfig,
}

impl PhotoService {
    pub fn new(
        camera: Arc<dyn Camera>,
        objects: Arc<dyn ObjectStore>,
        store: PhotoStore,
        config: SyncConfig,
    ) -> Self {
        Self {
            camera,
            objects,
            store,
            config,
        }
    }

    /// Acquires a photo and copies it into the durable pending directory so
    /// it survives a process kill before sync. Returns the `file://` URI to
    /// persist into the record immediately, or `None` when the user cancels.
    pub async fn capture(&self, field: &str) -> Result<Option<String>, AppError> {
        let Some(photo) = self.camera.capture().await? else {
            return Ok(None);
        };

        let size = photo.bytes.len() as u64;
        if size > self.config.max_photo_bytes {
            return Err(AppError::ValidationError(format!(
                "Photo is too large ({size} bytes, limit {} bytes). Take a lighter one.",
                self.config.max_photo_bytes
            )));
        }

        let extension = if photo.extension.is_empty() {
            "jpg"
        } else {
            photo.extension.as_str()
        };
        let uri = self.store.persist_capture(field, extension, &photo.bytes).await?;
        debug!("Captured photo persisted at {uri}");
        Ok(Some(uri))
    }

    /// Uploads a locally persisted photo to `destination` (overwrite
    /// allowed) and returns the stored path. Recompression is best-effort:
    /// when it fails the original bytes go up instead. All intermediates
    /// live in memory, so there is nothing to clean up on failure paths.
    pub async fn upload(&self, local_uri: &str, destination: &str) -> Result<String, UploadError> {
        if !destination.starts_with(&self.config.upload_prefix) {
            warn!(
                "Rejecting upload outside '{}': {destination}",
                self.config.upload_prefix
            );
            return Err(UploadError::PathNotAllowed(destination.to_string()));
        }

        match self.store.size(local_uri).await {
            None => return Err(UploadError::MissingSource(local_uri.to_string())),
            Some(0) => return Err(UploadError::EmptySource(local_uri.to_string())),
            Some(_) => {}
        }

        let original = self
            .store
            .read(local_uri)
            .await
            .map_err(|err| UploadError::MissingSource(err.to_string()))?;

        let bytes = match recompress_jpeg(
            &original,
            self.config.max_long_edge,
            self.config.jpeg_quality,
        ) {
            Ok(compressed) => compressed,
            Err(err) => {
                warn!("Photo recompression failed, uploading original bytes: {err}");
                original
            }
        };

        self.objects
            .upload(destination, bytes, "image/jpeg")
            .await
            .map_err(|err| UploadError::Store(err.to_string()))?;
        Ok(destination.to_string())
    }

    /// Resolves a storage path to something a client can fetch. Absolute
    /// URLs pass through; otherwise public URL, then signed URL, then empty
    /// string. Callers treat empty as "no photo available".
    pub async fn resolve_url(&self, path_or_url: &str) -> String {
        let lower = path_or_url.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            return path_or_url.to_string();
        }

        let path = path_or_url.trim_start_matches('/');
        if path.is_empty() {
            return String::new();
        }

        match self.objects.public_url(path).await {
            Ok(Some(url)) => return url,
            Ok(None) => {}
            Err(err) => warn!("Public URL lookup failed for {path}: {err}"),
        }
        match self.objects.signed_url(path, SIGNED_URL_EXPIRY_SECS).await {
            Ok(Some(url)) => return url,
            Ok(None) => {}
            Err(err) => warn!("Signed URL issuance failed for {path}: {err}"),
        }
        String::new()
    }

    pub async fn local_exists(&self, uri: &str) -> bool {
        self.store.exists(uri).await
    }

    /// Deletes the local copy. Only called after the remote path has been
    /// durably recorded in the record store.
    pub async fn discard_local(&self, uri: &str) {
        self.store.discard(uri).await;
    }
}
