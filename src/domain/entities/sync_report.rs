use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// Explicit user-triggered run; ignores the silent cooldown.
    Manual,
    /// Background trigger (connectivity change, app foreground); rate limited.
    Silent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    AlreadyRunning,
    NoIdentity,
    Offline,
    CoolingDown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncOutcome {
    Skipped(SkipReason),
    Success,
    PartialFailure,
    TotalFailure,
}

/// Summary of one synchronization run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncReport {
    pub outcome: SyncOutcome,
    pub synced: u32,
    pub errors: Vec<String>,
    pub pending_after: usize,
}

impl SyncReport {
    pub fn skipped(reason: SkipReason, pending_after: usize) -> Self {
        Self {
            outcome: SyncOutcome::Skipped(reason),
            synced: 0,
            errors: Vec::new(),
            pending_after,
        }
    }

    /// Bounded preview of the error list for user-facing summaries.
    pub fn error_preview(&self, limit: usize) -> String {
        let mut preview = self
            .errors
            .iter()
            .take(limit)
            .cloned()
            .collect::<Vec<_>>()
            .join("\n");
        if self.errors.len() > limit {
            preview.push_str("\n…");
        }
        preview
    }
}

/// Engine state exposed to the shell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineStatus {
    pub is_running: bool,
    pub last_sync: Option<DateTime<Utc>>,
    pub last_outcome: Option<SyncOutcome>,
    pub pending: usize,
}
