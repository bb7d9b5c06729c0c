use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};

use fieldkit::application::ports::{
    Camera, CapturedPhoto, Connectivity, ObjectStore, RecordTable,
};
use fieldkit::shared::error::AppError;

/// In-memory record table keyed by the durable id, so idempotent upserts are
/// observable: re-pushing the same id never grows the table.
#[derive(Default)]
pub struct MockRecordTable {
    pub rows: Mutex<HashMap<String, Map<String, Value>>>,
    pub upsert_log: Mutex<Vec<String>>,
    pub fail_all: AtomicBool,
    /// Rejects rows whose field equals the given value.
    pub fail_when: Mutex<Option<(String, Value)>>,
    pub delay: Mutex<Option<Duration>>,
}

impl MockRecordTable {
    pub fn set_fail_all(&self, fail: bool) {
        self.fail_all.store(fail, Ordering::SeqCst);
    }

    pub fn fail_when(&self, field: &str, value: Value) {
        *self.fail_when.lock().unwrap() = Some((field.to_string(), value));
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn row_count(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    pub fn upserted_ids(&self) -> Vec<String> {
        self.upsert_log.lock().unwrap().clone()
    }

    pub fn row(&self, id: &str) -> Option<Map<String, Value>> {
        self.rows.lock().unwrap().get(id).cloned()
    }
}

#[async_trait]
impl RecordTable for MockRecordTable {
    async fn upsert(&self, row: &Map<String, Value>) -> Result<(), AppError> {
        let id = row
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| AppError::InvalidInput("row without id".to_string()))?
            .to_string();
        // Log the attempt up front so tests can observe an in-flight run.
        self.upsert_log.lock().unwrap().push(id.clone());

        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail_all.load(Ordering::SeqCst) {
            return Err(AppError::Network("record table unavailable".to_string()));
        }
        let rejected = {
            let fail_when = self.fail_when.lock().unwrap();
            fail_when
                .as_ref()
                .map(|(field, value)| row.get(field) == Some(value))
                .unwrap_or(false)
        };
        if rejected {
            return Err(AppError::Network("row rejected by schema".to_string()));
        }

        self.rows.lock().unwrap().insert(id, row.clone());
        Ok(())
    }

    async fn select_page(
        &self,
        user_id: &str,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<Map<String, Value>>, AppError> {
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .values()
            .filter(|row| row.get("user_id").and_then(Value::as_str) == Some(user_id))
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct MockObjectStore {
    pub uploads: Mutex<Vec<(String, Vec<u8>)>>,
    pub fail_uploads: AtomicBool,
}

impl MockObjectStore {
    pub fn set_fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }

    pub fn uploaded_paths(&self) -> Vec<String> {
        self.uploads
            .lock()
            .unwrap()
            .iter()
            .map(|(path, _)| path.clone())
            .collect()
    }
}

#[async_trait]
impl ObjectStore for MockObjectStore {
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        _content_type: &str,
    ) -> Result<(), AppError> {
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(AppError::Network("object store unavailable".to_string()));
        }
        self.uploads.lock().unwrap().push((path.to_string(), bytes));
        Ok(())
    }

    async fn public_url(&self, path: &str) -> Result<Option<String>, AppError> {
        Ok(Some(format!("https://cdn.test/{path}")))
    }

    async fn signed_url(&self, path: &str, _expires_secs: u64) -> Result<Option<String>, AppError> {
        Ok(Some(format!("https://cdn.test/signed/{path}")))
    }
}

pub struct MockConnectivity {
    pub connected: AtomicBool,
}

impl MockConnectivity {
    pub fn new(connected: bool) -> Self {
        Self {
            connected: AtomicBool::new(connected),
        }
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }
}

#[async_trait]
impl Connectivity for MockConnectivity {
    async fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

/// Camera that never fires; the sync tests only consume already-captured
/// files.
pub struct NullCamera;

#[async_trait]
impl Camera for NullCamera {
    async fn capture(&self) -> Result<Option<CapturedPhoto>, AppError> {
        Ok(None)
    }
}
