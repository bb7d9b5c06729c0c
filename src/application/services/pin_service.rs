use std::sync::Arc;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::entities::OfflineCredential;
use crate::infrastructure::storage::CredentialStore;
use crate::shared::config::PinPolicyConfig;
use crate::shared::error::AppError;

/// Structured verification result. Expected conditions are values, never
/// errors, so callers can render precise guidance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum PinVerification {
    Accepted,
    InvalidFormat,
    NotConfigured,
    Locked { remaining_seconds: u64 },
    InvalidPin { attempts_left: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinStatus {
    pub configured: bool,
    pub locked: bool,
    pub remaining_seconds: u64,
    pub failed_attempts: u32,
    pub attempts_left: u32,
}

/// PIN-based offline unlock: set/verify with attempt counting and a timed
/// lockout, gating access to the cached session when no network is
/// available. The digest is a deterrent for a stolen device, not a server
/// credential; Argon2 keeps it honest without changing the contract.
pub struct PinGate {
    store: Arc<CredentialStore>,
    policy: PinPolicyConfig,
}

impl PinGate {
    pub fn new(store: Arc<CredentialStore>, policy: PinPolicyConfig) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> &PinPolicyConfig {
        &self.policy
    }

    /// Stores a fresh credential for the user, overwriting any prior one.
    pub async fn configure(&self, user_id: &str, pin: &str) -> Result<(), AppError> {
        if user_id.is_empty() {
            return Err(AppError::InvalidInput(
                "A user is required to configure a PIN".to_string(),
            ));
        }
        let normalized = normalize_pin(pin);
        if !self.format_ok(&normalized) {
            return Err(AppError::ValidationError(format!(
                "PIN must be {} to {} digits",
                self.policy.min_length, self.policy.max_length
            )));
        }

        let salt = SaltString::generate(&mut OsRng);
        let pin_hash = Argon2::default()
            .hash_password(normalized.as_bytes(), &salt)
            .map_err(|err| AppError::Internal(format!("Failed to derive PIN digest: {err}")))?
            .to_string();

        self.store
            .set(user_id, OfflineCredential::new(pin_hash))
            .await;
        debug!("Offline PIN configured for user {user_id}");
        Ok(())
    }

    pub async fn verify(&self, user_id: &str, pin: &str) -> PinVerification {
        let normalized = normalize_pin(pin);
        if !self.format_ok(&normalized) {
            return PinVerification::InvalidFormat;
        }
        if user_id.is_empty() {
            return PinVerification::NotConfigured;
        }
        let Some(mut credential) = self.store.get(user_id).await else {
            return PinVerification::NotConfigured;
        };

        let now = chrono::Utc::now();
        if credential.is_locked(now) {
            return PinVerification::Locked {
                remaining_seconds: credential.lock_remaining_secs(now),
            };
        }

        if digest_matches(&credential.pin_hash, &normalized) {
            credential.failed_attempts = 0;
            credential.lock_until = 0;
            credential.updated_at = now;
            credential.last_success_at = Some(now);
            self.store.set(user_id, credential).await;
            return PinVerification::Accepted;
        }

        let failed = credential.failed_attempts + 1;
        if failed >= self.policy.max_failed_attempts {
            credential.failed_attempts = 0;
            credential.lock_until = now.timestamp() + self.policy.lock_window_secs as i64;
            credential.updated_at = now;
            self.store.set(user_id, credential).await;
            warn!("Offline PIN locked for user {user_id}");
            return PinVerification::Locked {
                remaining_seconds: self.policy.lock_window_secs,
            };
        }

        credential.failed_attempts = failed;
        credential.lock_until = 0;
        credential.updated_at = now;
        self.store.set(user_id, credential).await;
        PinVerification::InvalidPin {
            attempts_left: self.policy.max_failed_attempts - failed,
        }
    }

    pub async fn status(&self, user_id: &str) -> PinStatus {
        let Some(credential) = self.store.get(user_id).await else {
            return PinStatus {
                configured: false,
                locked: false,
                remaining_seconds: 0,
                failed_attempts: 0,
                attempts_left: self.policy.max_failed_attempts,
            };
        };

        let now = chrono::Utc::now();
        let remaining_seconds = credential.lock_remaining_secs(now);
        let locked = remaining_seconds > 0;
        PinStatus {
            configured: true,
            locked,
            remaining_seconds,
            failed_attempts: credential.failed_attempts,
            attempts_left: if locked {
                0
            } else {
                self.policy
                    .max_failed_attempts
                    .saturating_sub(credential.failed_attempts)
            },
        }
    }

    pub async fn clear(&self, user_id: &str) {
        self.store.remove(user_id).await;
    }

    fn format_ok(&self, normalized: &str) -> bool {
        (self.policy.min_length..=self.policy.max_length).contains(&normalized.len())
    }
}

/// Keypads sometimes smuggle separators in; only digits count.
fn normalize_pin(pin: &str) -> String {
    pin.chars().filter(|c| c.is_ascii_digit()).collect()
}

fn digest_matches(stored: &str, pin: &str) -> bool {
    match PasswordHash::new(stored) {
        Ok(parsed) => Argon2::default()
            .verify_password(pin.as_bytes(), &parsed)
            .is_ok(),
        Err(err) => {
            warn!("Stored PIN digest is unreadable, treating as mismatch: {err}");
            false
        }
    }
}
