use crate::domain::value_objects::{LocalId, PhotoState, RecordId, SyncState};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Payload field holding the record's photo reference.
pub const PHOTO_FIELD: &str = "photo_url";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SyncMeta {
    pub state: SyncState,
    pub tries: u32,
    pub last_error: Option<String>,
    pub photo: PhotoState,
}

/// A locally captured submission not yet confirmed stored remotely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingRecord {
    pub local_id: LocalId,
    pub server_id: Option<RecordId>,
    pub payload: Map<String, Value>,
    #[serde(default)]
    pub sync: SyncMeta,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PendingRecord {
    /// The durable identifier, when one has already been assigned either as
    /// `server_id` or as a durable-shaped `id` inside the payload.
    pub fn durable_id(&self) -> Option<RecordId> {
        if let Some(id) = &self.server_id {
            return Some(id.clone());
        }
        match self.payload.get("id") {
            Some(Value::String(s)) => RecordId::parse(s),
            _ => None,
        }
    }

    /// Records are addressable by local id or by server id.
    pub fn matches(&self, key: &str) -> bool {
        if self.local_id.as_str() == key {
            return true;
        }
        self.server_id
            .as_ref()
            .map(|id| id.as_str() == key)
            .unwrap_or(false)
    }

    pub fn photo_uri(&self) -> Option<&str> {
        match self.payload.get(PHOTO_FIELD) {
            Some(Value::String(s)) if !s.is_empty() => Some(s),
            _ => None,
        }
    }
}

/// Local URIs come from the capture pipeline; anything else is a remote
/// storage path or URL.
pub fn is_local_photo_uri(value: &str) -> bool {
    let lower = value.to_ascii_lowercase();
    lower.starts_with("file://") || lower.starts_with("content://")
}
