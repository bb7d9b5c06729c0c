use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tokio::{fs, sync::Mutex};
use tracing::{debug, warn};

use crate::domain::entities::pending_record::{
    is_local_photo_uri, PendingRecord, SyncMeta, PHOTO_FIELD,
};
use crate::domain::value_objects::{LocalId, PhotoState, RecordId};

const STORE_FILE: &str = "records_v1.json";
const LEGACY_FILE: &str = "records.json";

/// Durable store of pending submission records.
///
/// One versioned JSON collection on disk; every mutation is a full
/// read-modify-write serialized behind the mutex. Storage faults are logged
/// and absorbed, and the in-memory collection keeps serving callers.
pub struct FileRecordStore {
    store_path: PathBuf,
    records: Mutex<Vec<PendingRecord>>,
}

impl FileRecordStore {
    pub async fn new(data_dir: &Path) -> Self {
        if let Err(err) = fs::create_dir_all(data_dir).await {
            warn!("Record store directory unavailable, falling back to memory: {err}");
        }
        let store_path = data_dir.join(STORE_FILE);
        let legacy_path = data_dir.join(LEGACY_FILE);
        Self {
            records: Mutex::new(load_or_migrate(&store_path, &legacy_path).await),
            store_path,
        }
    }

    /// Inserts a new record, or updates the existing one when the payload
    /// carries a durable id the store already knows. Returns the local id.
    pub async fn append(&self, mut payload: Map<String, Value>) -> LocalId {
        let server_id = take_durable_id(&mut payload);
        let now = chrono::Utc::now();

        let mut records = self.records.lock().await;

        if let Some(id) = &server_id {
            if let Some(existing) = records
                .iter_mut()
                .find(|r| r.server_id.as_ref() == Some(id))
            {
                let photo = derived_photo_state(&payload);
                existing.payload.extend(payload);
                if let Some(photo) = photo {
                    existing.sync.photo = photo;
                }
                existing.updated_at = now;
                let local_id = existing.local_id.clone();
                self.persist(&records).await;
                return local_id;
            }
        }

        let mut record = PendingRecord {
            local_id: LocalId::generate(),
            server_id,
            payload,
            sync: SyncMeta::default(),
            created_at: now,
            updated_at: now,
        };
        if let Some(photo) = derived_photo_state(&record.payload) {
            record.sync.photo = photo;
        }
        let local_id = record.local_id.clone();
        records.push(record);
        self.persist(&records).await;
        local_id
    }

    /// All records, most recently created first.
    pub async fn list(&self) -> Vec<PendingRecord> {
        let records = self.records.lock().await;
        let mut out = records.clone();
        out.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.local_id.as_str().cmp(a.local_id.as_str()))
        });
        out
    }

    /// Merges fields into the record matching `key` (local or server id).
    /// A durable `id` field becomes the record's server id. Returns `false`
    /// when no record matches.
    pub async fn patch(&self, key: &str, fields: Map<String, Value>) -> bool {
        let mut records = self.records.lock().await;
        let Some(record) = records.iter_mut().find(|r| r.matches(key)) else {
            return false;
        };

        for (field, value) in fields {
            if field == "id" {
                match value.as_str().and_then(RecordId::parse) {
                    Some(id) => record.server_id = Some(id),
                    None => debug!("Ignoring non-durable id patch for {key}"),
                }
                continue;
            }
            record.payload.insert(field, value);
        }
        if let Some(photo) = derived_photo_state(&record.payload) {
            record.sync.photo = photo;
        }
        record.updated_at = chrono::Utc::now();
        self.persist(&records).await;
        true
    }

    /// Bumps the retry counter and stores the last sync error; the record
    /// stays pending. Returns `false` when no record matches.
    pub async fn mark_sync_error(&self, key: &str, message: &str) -> bool {
        let mut records = self.records.lock().await;
        let Some(record) = records.iter_mut().find(|r| r.matches(key)) else {
            return false;
        };
        record.sync.tries += 1;
        record.sync.last_error = Some(message.to_string());
        record.updated_at = chrono::Utc::now();
        self.persist(&records).await;
        true
    }

    /// Deletes any record matching `key`; a miss is a no-op.
    pub async fn remove(&self, key: &str) {
        let mut records = self.records.lock().await;
        let before = records.len();
        records.retain(|r| !r.matches(key));
        if records.len() != before {
            self.persist(&records).await;
        }
    }

    pub async fn count(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn clear(&self) {
        let mut records = self.records.lock().await;
        records.clear();
        self.persist(&records).await;
    }

    async fn persist(&self, records: &[PendingRecord]) {
        let json = match serde_json::to_vec_pretty(records) {
            Ok(json) => json,
            Err(err) => {
                warn!("Failed to serialize record collection: {err}");
                return;
            }
        };
        if let Err(err) = fs::write(&self.store_path, json).await {
            warn!("Failed to persist record collection, keeping it in memory: {err}");
        }
    }
}

async fn load_or_migrate(store_path: &Path, legacy_path: &Path) -> Vec<PendingRecord> {
    match fs::read(store_path).await {
        Ok(bytes) if bytes.is_empty() => Vec::new(),
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(records) => records,
            Err(err) => {
                warn!("Record collection is unreadable, starting empty: {err}");
                Vec::new()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            migrate_legacy(store_path, legacy_path).await
        }
        Err(err) => {
            warn!("Failed to read record collection, falling back to memory: {err}");
            Vec::new()
        }
    }
}

/// One-time import from the prior unversioned format: a bare array of
/// payload objects without sync metadata. The migrated collection is written
/// out immediately so the import never runs twice; the legacy file stays in
/// place for rollback.
async fn migrate_legacy(store_path: &Path, legacy_path: &Path) -> Vec<PendingRecord> {
    let records = match fs::read(legacy_path).await {
        Ok(bytes) => match serde_json::from_slice::<Vec<Map<String, Value>>>(&bytes) {
            Ok(entries) => {
                debug!("Migrating {} legacy record(s)", entries.len());
                let now = chrono::Utc::now();
                entries
                    .into_iter()
                    .map(|mut payload| {
                        let server_id = take_durable_id(&mut payload);
                        let mut record = PendingRecord {
                            local_id: LocalId::generate(),
                            server_id,
                            payload,
                            sync: SyncMeta::default(),
                            created_at: now,
                            updated_at: now,
                        };
                        if let Some(photo) = derived_photo_state(&record.payload) {
                            record.sync.photo = photo;
                        }
                        record
                    })
                    .collect()
            }
            Err(err) => {
                warn!("Legacy record collection is unreadable, skipping migration: {err}");
                Vec::new()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Vec::new(),
        Err(err) => {
            warn!("Failed to read legacy record collection: {err}");
            Vec::new()
        }
    };

    // Stamp the current format even when nothing was migrated.
    match serde_json::to_vec_pretty(&records) {
        Ok(json) => {
            if let Err(err) = fs::write(store_path, json).await {
                warn!("Failed to persist migrated records, keeping them in memory: {err}");
            }
        }
        Err(err) => warn!("Failed to serialize migrated records: {err}"),
    }
    records
}

/// Pulls a durable `id` out of an incoming payload. Short or numeric ids are
/// legacy artifacts and are dropped.
fn take_durable_id(payload: &mut Map<String, Value>) -> Option<RecordId> {
    let value = payload.remove("id")?;
    match value.as_str().and_then(RecordId::parse) {
        Some(id) => Some(id),
        None => {
            debug!("Dropping non-durable record id from payload");
            None
        }
    }
}

fn derived_photo_state(payload: &Map<String, Value>) -> Option<PhotoState> {
    match payload.get(PHOTO_FIELD) {
        Some(Value::String(uri)) if !uri.is_empty() => {
            if is_local_photo_uri(uri) {
                Some(PhotoState::Pending)
            } else {
                Some(PhotoState::Uploaded)
            }
        }
        _ => None,
    }
}
