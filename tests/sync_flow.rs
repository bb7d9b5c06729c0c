mod common;

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Map, Value};
use tempfile::tempdir;

use common::mocks::{MockConnectivity, MockObjectStore, MockRecordTable, NullCamera};
use fieldkit::application::services::{PhotoService, SyncEngine};
use fieldkit::domain::entities::{Identity, SkipReason, SyncMode, SyncOutcome};
use fieldkit::domain::value_objects::PhotoState;
use fieldkit::infrastructure::storage::{FileRecordStore, IdentityCache, PhotoStore};
use fieldkit::shared::config::AppConfig;

struct Harness {
    engine: SyncEngine,
    store: Arc<FileRecordStore>,
    table: Arc<MockRecordTable>,
    objects: Arc<MockObjectStore>,
    connectivity: Arc<MockConnectivity>,
    photos: PhotoStore,
    _dir: tempfile::TempDir,
}

async fn harness_with_identity(identity: Option<Identity>) -> Harness {
    let dir = tempdir().unwrap();
    let config = AppConfig::default().sync;

    let store = Arc::new(FileRecordStore::new(dir.path()).await);
    let table = Arc::new(MockRecordTable::default());
    let objects = Arc::new(MockObjectStore::default());
    let connectivity = Arc::new(MockConnectivity::new(true));
    let cache = Arc::new(IdentityCache::new(dir.path()).await);
    if let Some(identity) = identity {
        cache.save(&identity).await;
    }

    let photo_service = Arc::new(PhotoService::new(
        Arc::new(NullCamera),
        objects.clone(),
        PhotoStore::new(dir.path()),
        config.clone(),
    ));

    let engine = SyncEngine::new(
        store.clone(),
        photo_service,
        table.clone(),
        connectivity.clone(),
        cache,
        config,
    );

    Harness {
        engine,
        store,
        table,
        objects,
        connectivity,
        photos: PhotoStore::new(dir.path()),
        _dir: dir,
    }
}

fn agent() -> Identity {
    Identity {
        id: "user-1".to_string(),
        email: "ana@example.com".to_string(),
        name: " Ana   María ".to_string(),
        region: "north".to_string(),
    }
}

async fn harness() -> Harness {
    harness_with_identity(Some(agent())).await
}

fn payload(entries: &[(&str, Value)]) -> Map<String, Value> {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

#[tokio::test]
async fn end_to_end_two_records_drain_the_store() {
    let h = harness().await;

    let photo_uri = h
        .photos
        .persist_capture("photo_url", "jpg", b"photo-bytes")
        .await
        .unwrap();
    h.store
        .append(payload(&[
            ("customer_first_name", json!("Ana")),
            ("photo_url", json!(photo_uri.clone())),
            ("zone", json!("north")),
        ]))
        .await;
    h.store
        .append(payload(&[
            ("customer_first_name", json!("Luis")),
            ("zone", json!("south")),
        ]))
        .await;

    let report = h.engine.run(SyncMode::Manual).await;
    assert_eq!(report.outcome, SyncOutcome::Success);
    assert_eq!(report.synced, 2);
    assert!(report.errors.is_empty());
    assert_eq!(report.pending_after, 0);
    assert_eq!(h.store.count().await, 0);

    // One photo upload, two remote rows, local copy reclaimed.
    let uploads = h.objects.uploaded_paths();
    assert_eq!(uploads.len(), 1);
    assert!(uploads[0].starts_with("activations/"));
    assert_eq!(h.table.row_count(), 2);
    assert!(!h.photos.exists(&photo_uri).await);

    // A drained store makes the next run a zero-processed no-op.
    let report = h.engine.run(SyncMode::Manual).await;
    assert_eq!(report.outcome, SyncOutcome::Success);
    assert_eq!(report.synced, 0);
    assert_eq!(h.table.row_count(), 2);
}

#[tokio::test]
async fn partial_failure_leaves_only_the_failing_record() {
    let h = harness().await;
    h.table.fail_when("zone", json!("bad"));

    h.store.append(payload(&[("zone", json!("ok-1"))])).await;
    let failing = h.store.append(payload(&[("zone", json!("bad"))])).await;
    h.store.append(payload(&[("zone", json!("ok-2"))])).await;

    let report = h.engine.run(SyncMode::Manual).await;
    assert_eq!(report.outcome, SyncOutcome::PartialFailure);
    assert_eq!(report.synced, 2);
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].contains(failing.as_str()));
    assert_eq!(report.pending_after, 1);

    let remaining = h.store.list().await;
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].local_id, failing);
    assert_eq!(remaining[0].sync.tries, 1);
    assert!(remaining[0].sync.last_error.is_some());
    assert_eq!(h.table.row_count(), 2);
}

#[tokio::test]
async fn second_concurrent_trigger_is_a_no_op() {
    let h = harness().await;
    h.store.append(payload(&[("zone", json!("north"))])).await;
    h.table.set_delay(Duration::from_millis(200));

    let (first, second) = tokio::join!(h.engine.run(SyncMode::Manual), async {
        // Trigger again while the first run's upsert is still in flight.
        while h.table.upserted_ids().is_empty() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        h.engine.run(SyncMode::Manual).await
    });

    assert_eq!(first.outcome, SyncOutcome::Success);
    assert_eq!(
        second.outcome,
        SyncOutcome::Skipped(SkipReason::AlreadyRunning)
    );
    // The skipped run altered nothing: exactly one upsert happened.
    assert_eq!(h.table.upserted_ids().len(), 1);
}

#[tokio::test]
async fn runs_are_guarded_by_identity_and_connectivity() {
    let h = harness_with_identity(None).await;
    h.store.append(payload(&[("zone", json!("north"))])).await;
    let report = h.engine.run(SyncMode::Manual).await;
    assert_eq!(report.outcome, SyncOutcome::Skipped(SkipReason::NoIdentity));

    let h = harness().await;
    h.store.append(payload(&[("zone", json!("north"))])).await;
    h.connectivity.set_connected(false);
    let report = h.engine.run(SyncMode::Manual).await;
    assert_eq!(report.outcome, SyncOutcome::Skipped(SkipReason::Offline));
    assert_eq!(h.store.count().await, 1);
    assert!(h.table.upserted_ids().is_empty());
}

#[tokio::test]
async fn silent_runs_cool_down_but_manual_runs_do_not() {
    let h = harness().await;

    let first = h.engine.run(SyncMode::Silent).await;
    assert_eq!(first.outcome, SyncOutcome::Success);

    let second = h.engine.run(SyncMode::Silent).await;
    assert_eq!(
        second.outcome,
        SyncOutcome::Skipped(SkipReason::CoolingDown)
    );

    let manual = h.engine.run(SyncMode::Manual).await;
    assert_eq!(manual.outcome, SyncOutcome::Success);
}

#[tokio::test]
async fn retry_after_failure_reuses_the_durable_id() {
    let h = harness().await;
    h.table.set_fail_all(true);

    let local_id = h.store.append(payload(&[("zone", json!("north"))])).await;

    let report = h.engine.run(SyncMode::Manual).await;
    assert_eq!(report.outcome, SyncOutcome::TotalFailure);
    assert_eq!(report.pending_after, 1);

    // The durable id was persisted before the failed push.
    let record = &h.store.list().await[0];
    let assigned = record.server_id.clone().expect("durable id assigned");
    assert_eq!(record.sync.tries, 1);

    h.table.set_fail_all(false);
    let report = h.engine.run(SyncMode::Manual).await;
    assert_eq!(report.outcome, SyncOutcome::Success);
    assert_eq!(h.store.count().await, 0);

    // Same id on both attempts: the upsert overwrote, never duplicated.
    let ids = h.table.upserted_ids();
    assert_eq!(ids.len(), 2);
    assert_eq!(ids[0], ids[1]);
    assert_eq!(ids[0], assigned.as_str());
    assert_eq!(h.table.row_count(), 1);
    assert!(local_id.as_str().starts_with("loc_"));
}

#[tokio::test]
async fn missing_photo_skips_the_record_with_a_recapture_error() {
    let h = harness().await;
    let local_id = h
        .store
        .append(payload(&[
            ("photo_url", json!("file:///vanished/photo.jpg")),
            ("zone", json!("north")),
        ]))
        .await;

    let report = h.engine.run(SyncMode::Manual).await;
    assert_eq!(report.outcome, SyncOutcome::TotalFailure);
    assert!(report.errors[0].contains("retake"));
    assert!(report.errors[0].contains(local_id.as_str()));

    assert!(h.table.upserted_ids().is_empty());
    assert!(h.objects.uploaded_paths().is_empty());
    let record = &h.store.list().await[0];
    assert_eq!(record.sync.tries, 1);
}

#[tokio::test]
async fn failed_photo_upload_keeps_the_local_copy() {
    let h = harness().await;
    h.objects.set_fail_uploads(true);

    let photo_uri = h
        .photos
        .persist_capture("photo_url", "jpg", b"photo-bytes")
        .await
        .unwrap();
    h.store
        .append(payload(&[("photo_url", json!(photo_uri.clone()))]))
        .await;

    let report = h.engine.run(SyncMode::Manual).await;
    assert_eq!(report.outcome, SyncOutcome::TotalFailure);
    assert!(report.errors[0].contains("photo upload failed"));

    // Nothing was upserted and the device copy is untouched for the retry.
    assert!(h.table.upserted_ids().is_empty());
    assert!(h.photos.exists(&photo_uri).await);
    let record = &h.store.list().await[0];
    assert_eq!(record.sync.photo, PhotoState::Pending);
}

#[tokio::test]
async fn photo_path_is_recorded_before_the_local_copy_is_deleted() {
    let h = harness().await;
    h.table.set_fail_all(true);

    let photo_uri = h
        .photos
        .persist_capture("photo_url", "jpg", b"photo-bytes")
        .await
        .unwrap();
    h.store
        .append(payload(&[("photo_url", json!(photo_uri.clone()))]))
        .await;

    // Upsert fails after the photo went up: the remote path must already be
    // durable in the store, and only then is the local file reclaimed.
    let report = h.engine.run(SyncMode::Manual).await;
    assert_eq!(report.outcome, SyncOutcome::TotalFailure);
    assert_eq!(h.objects.uploaded_paths().len(), 1);

    let record = &h.store.list().await[0];
    let stored = record.payload["photo_url"].as_str().unwrap();
    assert!(stored.starts_with("activations/"));
    assert_eq!(record.sync.photo, PhotoState::Uploaded);
    assert!(!h.photos.exists(&photo_uri).await);

    // The retry skips the upload and pushes the same row.
    h.table.set_fail_all(false);
    let report = h.engine.run(SyncMode::Manual).await;
    assert_eq!(report.outcome, SyncOutcome::Success);
    assert_eq!(h.objects.uploaded_paths().len(), 1);
    assert_eq!(h.store.count().await, 0);
}

#[tokio::test]
async fn rows_are_allow_listed_and_carry_identity_context() {
    let h = harness().await;
    h.store
        .append(payload(&[
            ("customer_first_name", json!("Ana")),
            ("zone", json!("north")),
            ("draft_notes", json!("do not ship this")),
            ("captured_at", json!("2026-08-06T10:00:00Z")),
        ]))
        .await;

    let report = h.engine.run(SyncMode::Manual).await;
    assert_eq!(report.outcome, SyncOutcome::Success);

    let ids = h.table.upserted_ids();
    let row = h.table.row(&ids[0]).unwrap();

    assert_eq!(row["customer_first_name"], json!("Ana"));
    assert_eq!(row["zone"], json!("north"));
    assert!(!row.contains_key("draft_notes"));
    assert!(!row.contains_key("captured_at"));

    assert_eq!(row["user_id"], json!("user-1"));
    assert_eq!(row["agent_name"], json!("Ana María"));
    assert_eq!(row["region"], json!("north"));
    assert_eq!(row["sync_state"], json!("online"));
    assert!(row["activation_date"].as_str().unwrap().len() == 10);
}

#[tokio::test]
async fn records_appended_mid_run_wait_for_the_next_run() {
    let h = harness().await;
    h.store.append(payload(&[("zone", json!("north"))])).await;
    h.table.set_delay(Duration::from_millis(100));

    let (report, appended) = tokio::join!(h.engine.run(SyncMode::Manual), async {
        // Wait until the run is past its snapshot (first upsert in flight).
        while h.table.upserted_ids().is_empty() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        h.store.append(payload(&[("zone", json!("late"))])).await
    });

    assert_eq!(report.synced, 1);
    assert_eq!(report.pending_after, 1);
    let remaining = h.store.list().await;
    assert_eq!(remaining[0].local_id, appended);

    let report = h.engine.run(SyncMode::Manual).await;
    assert_eq!(report.synced, 1);
    assert_eq!(h.store.count().await, 0);
}

#[tokio::test]
async fn engine_status_tracks_runs() {
    let h = harness().await;
    h.store.append(payload(&[("zone", json!("north"))])).await;

    assert_eq!(h.engine.refresh_pending().await, 1);
    let status = h.engine.status().await;
    assert!(!status.is_running);
    assert_eq!(status.pending, 1);
    assert!(status.last_outcome.is_none());

    h.engine.run(SyncMode::Manual).await;
    let status = h.engine.status().await;
    assert_eq!(status.pending, 0);
    assert_eq!(status.last_outcome, Some(SyncOutcome::Success));
    assert!(status.last_sync.is_some());
}
