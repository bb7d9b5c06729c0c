use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tokio::{fs, sync::Mutex};
use tracing::warn;

use crate::domain::entities::OfflineCredential;

const STORE_FILE: &str = "credentials_v1.json";

/// Offline unlock credentials, one per user id, persisted as a single JSON
/// map. Faults are absorbed the same way as the record store: the in-memory
/// map keeps serving callers.
pub struct CredentialStore {
    store_path: PathBuf,
    credentials: Mutex<HashMap<String, OfflineCredential>>,
}

impl CredentialStore {
    pub async fn new(data_dir: &Path) -> Self {
        if let Err(err) = fs::create_dir_all(data_dir).await {
            warn!("Credential store directory unavailable, falling back to memory: {err}");
        }
        let store_path = data_dir.join(STORE_FILE);
        let credentials = match fs::read(&store_path).await {
            Ok(bytes) if bytes.is_empty() => HashMap::new(),
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|err| {
                warn!("Credential collection is unreadable, starting empty: {err}");
                HashMap::new()
            }),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(err) => {
                warn!("Failed to read credential collection: {err}");
                HashMap::new()
            }
        };
        Self {
            store_path,
            credentials: Mutex::new(credentials),
        }
    }

    pub async fn get(&self, user_id: &str) -> Option<OfflineCredential> {
        self.credentials.lock().await.get(user_id).cloned()
    }

    pub async fn set(&self, user_id: &str, credential: OfflineCredential) {
        let mut credentials = self.credentials.lock().await;
        credentials.insert(user_id.to_string(), credential);
        self.persist(&credentials).await;
    }

    pub async fn remove(&self, user_id: &str) {
        let mut credentials = self.credentials.lock().await;
        if credentials.remove(user_id).is_some() {
            self.persist(&credentials).await;
        }
    }

    async fn persist(&self, credentials: &HashMap<String, OfflineCredential>) {
        let json = match serde_json::to_vec_pretty(credentials) {
            Ok(json) => json,
            Err(err) => {
                warn!("Failed to serialize credential collection: {err}");
                return;
            }
        };
        if let Err(err) = fs::write(&self.store_path, json).await {
            warn!("Failed to persist credential collection, keeping it in memory: {err}");
        }
    }
}
