use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::warn;

use crate::domain::entities::Identity;

const CACHE_FILE: &str = "identity.json";

/// The "last authenticated identity" blob, used to bootstrap the app when
/// the remote session cannot be verified offline.
pub struct IdentityCache {
    cache_path: PathBuf,
}

impl IdentityCache {
    pub async fn new(data_dir: &Path) -> Self {
        if let Err(err) = fs::create_dir_all(data_dir).await {
            warn!("Identity cache directory unavailable: {err}");
        }
        Self {
            cache_path: data_dir.join(CACHE_FILE),
        }
    }

    pub async fn load(&self) -> Option<Identity> {
        match fs::read(&self.cache_path).await {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(identity) => Some(identity),
                Err(err) => {
                    warn!("Cached identity is unreadable, ignoring it: {err}");
                    None
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => None,
            Err(err) => {
                warn!("Failed to read cached identity: {err}");
                None
            }
        }
    }

    pub async fn save(&self, identity: &Identity) {
        let json = match serde_json::to_vec_pretty(identity) {
            Ok(json) => json,
            Err(err) => {
                warn!("Failed to serialize identity: {err}");
                return;
            }
        };
        if let Err(err) = fs::write(&self.cache_path, json).await {
            warn!("Failed to persist cached identity: {err}");
        }
    }

    pub async fn clear(&self) {
        match fs::remove_file(&self.cache_path).await {
            Ok(()) => {}
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => warn!("Failed to clear cached identity: {err}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn identity() -> Identity {
        Identity {
            id: "user-1".to_string(),
            email: "ana@example.com".to_string(),
            name: "Ana Pérez".to_string(),
            region: "north".to_string(),
        }
    }

    #[tokio::test]
    async fn save_load_clear_round_trip() {
        let dir = tempdir().unwrap();
        let cache = IdentityCache::new(dir.path()).await;

        assert!(cache.load().await.is_none());
        cache.save(&identity()).await;
        assert_eq!(cache.load().await.unwrap(), identity());

        cache.clear().await;
        cache.clear().await;
        assert!(cache.load().await.is_none());
    }

    #[tokio::test]
    async fn malformed_blob_is_ignored() {
        let dir = tempdir().unwrap();
        let cache = IdentityCache::new(dir.path()).await;
        tokio::fs::write(dir.path().join(CACHE_FILE), b"{not json")
            .await
            .unwrap();
        assert!(cache.load().await.is_none());
    }
}
