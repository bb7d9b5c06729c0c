use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Offline unlock credential for one user. The Argon2 PHC string carries its
/// own salt. `lock_until` is epoch seconds, 0 when unlocked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfflineCredential {
    pub pin_hash: String,
    pub failed_attempts: u32,
    pub lock_until: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_success_at: Option<DateTime<Utc>>,
}

impl OfflineCredential {
    pub fn new(pin_hash: String) -> Self {
        let now = Utc::now();
        Self {
            pin_hash,
            failed_attempts: 0,
            lock_until: 0,
            created_at: now,
            updated_at: now,
            last_success_at: None,
        }
    }

    pub fn lock_remaining_secs(&self, now: DateTime<Utc>) -> u64 {
        let remaining = self.lock_until - now.timestamp();
        if remaining > 0 { remaining as u64 } else { 0 }
    }

    pub fn is_locked(&self, now: DateTime<Utc>) -> bool {
        self.lock_remaining_secs(now) > 0
    }
}
