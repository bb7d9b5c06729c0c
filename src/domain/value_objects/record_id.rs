use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Minimum length a string must have to count as a durable server id.
/// Anything shorter is a legacy numeric id or a placeholder.
const DURABLE_ID_MIN_LEN: usize = 21;

/// Durable, server-side record identifier (UUID-shaped).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Accepts a value only when it already has the durable-id shape.
    pub fn parse(value: &str) -> Option<Self> {
        if Self::is_durable(value) {
            Some(Self(value.to_string()))
        } else {
            None
        }
    }

    pub fn is_durable(value: &str) -> bool {
        value.len() >= DURABLE_ID_MIN_LEN
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_durable_shaped() {
        let id = RecordId::generate();
        assert!(RecordId::is_durable(id.as_str()));
    }

    #[test]
    fn short_ids_are_rejected() {
        assert!(RecordId::parse("42").is_none());
        assert!(RecordId::parse("loc_1700000000_abc").is_none());
        assert!(RecordId::parse("9b2f8a34-52e1-4c7d-9d3e-8f0a1b2c3d4e").is_some());
    }
}
