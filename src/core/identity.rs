//! Per-process client identity.
//!
//! Each running client needs a stable holder id for the lease protocol and a
//! human-readable name for display and audit records. The id is sampled once
//! at construction and lives for the process lifetime.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity of this client within a team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientIdentity {
    /// Stable per-process holder id used in lock entries.
    pub holder_id: String,
    /// Human-readable name shown in audit records and state displays.
    pub display_name: String,
}

impl ClientIdentity {
    /// Create a fresh identity with a random holder id.
    ///
    /// The display name defaults to `user@host` from the environment, falling
    /// back to the bare username or a generic label when unavailable.
    #[must_use]
    pub fn generate() -> Self {
        Self::with_display_name(default_display_name())
    }

    /// Create a fresh identity with an explicit display name.
    #[must_use]
    pub fn with_display_name(display_name: impl Into<String>) -> Self {
        Self {
            holder_id: Uuid::new_v4().to_string(),
            display_name: display_name.into(),
        }
    }

    /// Rebuild an identity from persisted parts (useful for tests).
    #[must_use]
    pub fn from_parts(holder_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            holder_id: holder_id.into(),
            display_name: display_name.into(),
        }
    }
}

fn default_display_name() -> String {
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string());
    std::env::var("HOSTNAME").map_or_else(|_| user.clone(), |host| format!("{user}@{host}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_identities_are_unique() {
        let a = ClientIdentity::generate();
        let b = ClientIdentity::generate();
        assert_ne!(a.holder_id, b.holder_id);
    }

    #[test]
    fn holder_id_is_uuid() {
        let id = ClientIdentity::generate();
        assert!(Uuid::parse_str(&id.holder_id).is_ok());
    }

    #[test]
    fn from_parts_roundtrip() {
        let id = ClientIdentity::from_parts("abc-123", "alice");
        assert_eq!(id.holder_id, "abc-123");
        assert_eq!(id.display_name, "alice");
    }
}
