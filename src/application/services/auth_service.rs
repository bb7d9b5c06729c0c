use std::sync::Arc;

use tracing::{info, warn};

use crate::application::ports::AuthGateway;
use crate::domain::entities::Identity;
use crate::domain::value_objects::agent_name::normalize_display;
use crate::infrastructure::storage::IdentityCache;
use crate::shared::error::AppError;

const UNSPECIFIED_REGION: &str = "unspecified";

/// Online sign-in plus the cached-identity path used when the remote
/// session cannot be verified offline.
pub struct AuthService {
    gateway: Arc<dyn AuthGateway>,
    cache: Arc<IdentityCache>,
}

impl AuthService {
    pub fn new(gateway: Arc<dyn AuthGateway>, cache: Arc<IdentityCache>) -> Self {
        Self { gateway, cache }
    }

    /// Signs in against the auth service and assembles the working identity:
    /// profile name/region when the profile row exists, cached values as
    /// fallback, the account email as a last resort. The result is persisted
    /// for offline bootstrap before it is returned.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, AppError> {
        let email = email.trim();
        let password = password.trim();
        if email.is_empty() || password.is_empty() {
            return Err(AppError::InvalidInput(
                "Email and password are required".to_string(),
            ));
        }

        let user = self.gateway.sign_in(email, password).await?;

        // The profile row is best-effort; a missing profile must not block
        // sign-in on a device that has cached context.
        let profile = match self.gateway.fetch_profile(&user.id).await {
            Ok(profile) => profile.unwrap_or_default(),
            Err(err) => {
                warn!("Could not fetch agent profile: {err}");
                Default::default()
            }
        };

        let cached = self
            .cache
            .load()
            .await
            .filter(|identity| identity.id == user.id);

        let name = [
            profile.name.as_deref(),
            cached.as_ref().map(|c| c.name.as_str()),
            user.display_name.as_deref(),
        ]
        .into_iter()
        .flatten()
        .map(normalize_display)
        .find(|candidate| !candidate.is_empty())
        .unwrap_or_else(|| user.email.clone());

        let region = [
            profile.region.as_deref(),
            cached.as_ref().map(|c| c.region.as_str()),
        ]
        .into_iter()
        .flatten()
        .map(normalize_display)
        .find(|candidate| !candidate.is_empty())
        .unwrap_or_else(|| UNSPECIFIED_REGION.to_string());

        let identity = Identity {
            id: user.id,
            email: user.email,
            name,
            region,
        };
        self.cache.save(&identity).await;
        info!("Signed in as {}", identity.email);
        Ok(identity)
    }

    /// The last authenticated identity, if one was cached. This is what
    /// gates the offline PIN flow: no cached identity, no offline unlock.
    pub async fn bootstrap_offline(&self) -> Option<Identity> {
        self.cache.load().await
    }

    /// The cache survives sign-out on purpose: it backs offline unlock on
    /// the next launch.
    pub async fn sign_out(&self) {
        info!("Signed out; cached identity retained for offline unlock");
    }
}
