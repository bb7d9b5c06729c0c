use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::{json, Map, Value};
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use crate::application::ports::{Connectivity, RecordTable};
use crate::application::services::photo_service::PhotoService;
use crate::domain::entities::pending_record::{is_local_photo_uri, PendingRecord, PHOTO_FIELD};
use crate::domain::entities::{EngineStatus, Identity, SkipReason, SyncMode, SyncOutcome, SyncReport};
use crate::domain::value_objects::agent_name::normalize_display;
use crate::domain::value_objects::RecordId;
use crate::infrastructure::storage::{FileRecordStore, IdentityCache};
use crate::shared::config::SyncConfig;

/// Columns accepted by the remote records table. Anything else is dropped
/// before transmission so removed or device-only fields can never fail the
/// remote schema.
const ALLOWED_COLUMNS: &[&str] = &[
    "id",
    "customer_first_name",
    "customer_last_name",
    "customer_document_id",
    "customer_phone",
    "customer_email",
    "app_downloaded",
    "registered",
    "cash_in",
    "cash_out",
    "p2p",
    "physical_qr",
    "had_error",
    "error_description",
    "activation_type",
    "activation_base",
    "is_reactivation",
    "store_size",
    "business_type",
    "photo_url",
    "activation_date",
    "latitude",
    "longitude",
    "business_reactivation",
    "backup",
    "city",
    "zone",
    "sync_state",
    "device",
];

/// Column retired from the remote schema; stripped before building a row.
const RETIRED_COLUMNS: &[&str] = &["captured_at"];

#[derive(Debug, Default)]
struct EngineState {
    is_running: bool,
    last_silent_run: Option<Instant>,
    last_sync: Option<chrono::DateTime<chrono::Utc>>,
    last_outcome: Option<SyncOutcome>,
    pending: usize,
}

/// Drains the pending queue against the remote record table: resolves
/// identities and photos, filters payloads, performs idempotent upserts and
/// keeps per-record retry bookkeeping. At most one run executes at a time.
pub struct SyncEngine {
    store: Arc<FileRecordStore>,
    photos: Arc<PhotoService>,
    table: Arc<dyn RecordTable>,
    connectivity: Arc<dyn Connectivity>,
    identity: Arc<IdentityCache>,
    config: SyncConfig,
    state: RwLock<EngineState>,
}

impl SyncEngine {
    pub fn new(
        store: Arc<FileRecordStore>,
        photos: Arc<PhotoService>,
        table: Arc<dyn RecordTable>,
        connectivity: Arc<dyn Connectivity>,
        identity: Arc<IdentityCache>,
        config: SyncConfig,
    ) -> Self {
        Self {
            store,
            photos,
            table,
            connectivity,
            identity,
            config,
            state: RwLock::new(EngineState::default()),
        }
    }

    /// Runs one synchronization pass. A second trigger while a run is active
    /// is a silent no-op, as are runs without identity or connectivity.
    /// Silent runs are additionally rate limited by a cooldown.
    pub async fn run(&self, mode: SyncMode) -> SyncReport {
        let Some(identity) = self.identity.load().await else {
            debug!("Sync skipped: no authenticated identity");
            return SyncReport::skipped(SkipReason::NoIdentity, self.pending().await);
        };
        if !self.connectivity.is_connected().await {
            debug!("Sync skipped: offline");
            return SyncReport::skipped(SkipReason::Offline, self.pending().await);
        }

        {
            let mut state = self.state.write().await;
            if state.is_running {
                debug!("Sync skipped: a run is already in progress");
                return SyncReport::skipped(SkipReason::AlreadyRunning, state.pending);
            }
            if mode == SyncMode::Silent {
                let cooldown = Duration::from_secs(self.config.silent_cooldown_secs);
                if let Some(last) = state.last_silent_run {
                    if last.elapsed() < cooldown {
                        debug!("Sync skipped: silent cooldown active");
                        return SyncReport::skipped(SkipReason::CoolingDown, state.pending);
                    }
                }
                state.last_silent_run = Some(Instant::now());
            }
            state.is_running = true;
        }

        let (synced, errors) = self.drain_pending(&identity).await;

        // Refreshed on every exit path, whatever the outcome.
        let pending_after = self.store.count().await;

        let outcome = if errors.is_empty() {
            SyncOutcome::Success
        } else if synced > 0 {
            SyncOutcome::PartialFailure
        } else {
            SyncOutcome::TotalFailure
        };
        let report = SyncReport {
            outcome,
            synced,
            errors,
            pending_after,
        };

        {
            let mut state = self.state.write().await;
            state.is_running = false;
            state.pending = pending_after;
            state.last_sync = Some(chrono::Utc::now());
            state.last_outcome = Some(report.outcome);
        }

        match report.outcome {
            SyncOutcome::Success => info!("Sync complete: {} record(s) pushed", report.synced),
            _ => warn!(
                "Sync finished with errors ({} ok / {} failed): {}",
                report.synced,
                report.errors.len(),
                report.error_preview(self.config.error_preview)
            ),
        }
        report
    }

    pub async fn status(&self) -> EngineStatus {
        let state = self.state.read().await;
        EngineStatus {
            is_running: state.is_running,
            last_sync: state.last_sync,
            last_outcome: state.last_outcome,
            pending: state.pending,
        }
    }

    /// Re-counts pending records and updates the cached status.
    pub async fn refresh_pending(&self) -> usize {
        let pending = self.store.count().await;
        self.state.write().await.pending = pending;
        pending
    }

    async fn pending(&self) -> usize {
        self.state.read().await.pending
    }

    /// Sequentially pushes the snapshot of pending records taken at run
    /// start. Records appended mid-run are left for the next run. Every
    /// failure is absorbed into the error list; the store is never left in a
    /// partially patched state for a record.
    async fn drain_pending(&self, identity: &Identity) -> (u32, Vec<String>) {
        let snapshot = self.store.list().await;
        if snapshot.is_empty() {
            debug!("Sync: nothing pending");
            return (0, Vec::new());
        }

        let mut synced = 0u32;
        let mut errors = Vec::new();
        for record in &snapshot {
            match self.push_record(record, identity).await {
                Ok(()) => {
                    self.store.remove(record.local_id.as_str()).await;
                    synced += 1;
                }
                Err(message) => {
                    error!("{message}");
                    self.store
                        .mark_sync_error(record.local_id.as_str(), &message)
                        .await;
                    errors.push(message);
                }
            }
        }
        (synced, errors)
    }

    async fn push_record(&self, record: &PendingRecord, identity: &Identity) -> Result<(), String> {
        let local_id = record.local_id.as_str();

        // A durable id must be persisted before the push so a retry after a
        // partial failure reuses it and the upsert stays idempotent.
        let record_id = match record.durable_id() {
            Some(id) => id,
            None => RecordId::generate(),
        };
        if record.server_id.as_ref() != Some(&record_id) {
            let mut fields = Map::new();
            fields.insert("id".to_string(), json!(record_id.as_str()));
            if !self.store.patch(local_id, fields).await {
                return Err(format!("record {local_id}: vanished from the local store"));
            }
        }

        let mut outbound = record.payload.clone();
        for column in RETIRED_COLUMNS {
            outbound.remove(*column);
        }
        outbound
            .entry("activation_date".to_string())
            .or_insert_with(|| json!(chrono::Utc::now().format("%Y-%m-%d").to_string()));

        if let Some(uri) = record.photo_uri() {
            if is_local_photo_uri(uri) {
                let stored = self.push_photo(local_id, uri, &record_id).await?;
                outbound.insert(PHOTO_FIELD.to_string(), json!(stored));
            }
        }

        let row = self.build_row(&outbound, &record_id, identity);
        self.table
            .upsert(&row)
            .await
            .map_err(|err| format!("record {local_id}: {err}"))
    }

    /// Uploads a record's local photo. The remote path is patched into the
    /// local store before the device copy is discarded; a crash in between
    /// leaves a harmless extra file, never a dangling reference.
    async fn push_photo(
        &self,
        local_id: &str,
        uri: &str,
        record_id: &RecordId,
    ) -> Result<String, String> {
        if !self.photos.local_exists(uri).await {
            return Err(format!(
                "record {local_id}: photo is no longer on the device; retake it before syncing"
            ));
        }

        let destination = format!("{}{}.jpg", self.config.upload_prefix, record_id);
        let stored = self
            .photos
            .upload(uri, &destination)
            .await
            .map_err(|err| format!("record {local_id}: photo upload failed ({err})"))?;

        let mut fields = Map::new();
        fields.insert(PHOTO_FIELD.to_string(), json!(stored));
        self.store.patch(local_id, fields).await;
        self.photos.discard_local(uri).await;
        Ok(stored)
    }

    /// Allow-list filter plus identity context. Unknown payload fields never
    /// reach the remote store.
    fn build_row(
        &self,
        outbound: &Map<String, Value>,
        record_id: &RecordId,
        identity: &Identity,
    ) -> Map<String, Value> {
        let mut row = Map::new();
        for column in ALLOWED_COLUMNS {
            if let Some(value) = outbound.get(*column) {
                row.insert(column.to_string(), value.clone());
            }
        }

        let agent_name = {
            let normalized = normalize_display(&identity.name);
            if !normalized.is_empty() {
                normalized
            } else if let Some(existing) = outbound.get("agent_name").and_then(Value::as_str) {
                existing.to_string()
            } else {
                identity.email.clone()
            }
        };

        row.insert("id".to_string(), json!(record_id.as_str()));
        row.insert("user_id".to_string(), json!(identity.id));
        row.insert("agent_name".to_string(), json!(agent_name));
        row.insert("region".to_string(), json!(identity.region));
        row.insert("sync_state".to_string(), json!("online"));
        row
    }
}
