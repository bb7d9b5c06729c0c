use serde::{Deserialize, Serialize};

/// Authenticated user identity merged into outbound records and cached
/// locally for offline bootstrap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub email: String,
    pub name: String,
    pub region: String,
}

/// What the auth service returns from a password sign-in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: String,
    pub email: String,
    pub display_name: Option<String>,
}

/// Row from the agent profile table, both fields optional upstream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentProfile {
    pub name: Option<String>,
    pub region: Option<String>,
}
