//! Append-only audit trail for manual refreshes.
//!
//! One object per event under a date-namespaced key. Write-only: nothing in
//! the scheduler ever reads these back. A failed audit write is logged and
//! must not fail the refresh that triggered it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;
use crate::scheduler::RefreshReason;
use crate::store::CacheClient;

/// Retention hint stored on each record, about one year.
pub const AUDIT_RETENTION_SECS: u64 = 365 * 24 * 60 * 60;

/// One manual-refresh event. Its own minimal schema, separate from cache
/// entries and locks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub team_id: String,
    pub actor: String,
    pub reason: RefreshReason,
    pub timestamp: DateTime<Utc>,
    pub retention_seconds: u64,
}

/// Key for one audit event: `teams/{teamId}/audit/{yyyy-mm-dd}/{uuid}.json`.
#[must_use]
pub fn audit_key(team_id: &str, timestamp: DateTime<Utc>, event_id: Uuid) -> String {
    format!(
        "teams/{team_id}/audit/{}/{event_id}.json",
        timestamp.format("%Y-%m-%d")
    )
}

/// Writes audit records through the typed cache client.
#[derive(Clone)]
pub struct AuditWriter {
    client: CacheClient,
}

impl AuditWriter {
    #[must_use]
    pub const fn new(client: CacheClient) -> Self {
        Self { client }
    }

    /// Record a manual refresh by `actor`.
    ///
    /// Infallible from the caller's perspective: store errors are logged at
    /// warn and swallowed.
    pub async fn record_manual_refresh(&self, team_id: &str, actor: &str) {
        let entry = AuditEntry {
            team_id: team_id.to_string(),
            actor: actor.to_string(),
            reason: RefreshReason::Manual,
            timestamp: self.client.clock().now(),
            retention_seconds: AUDIT_RETENTION_SECS,
        };
        let key = audit_key(team_id, entry.timestamp, Uuid::new_v4());
        if let Err(e) = self.client.put_json(&key, &entry).await {
            tracing::warn!(team_id, actor, error = %e, "audit write failed");
        }
    }

    /// List audit keys for a team, sorted (so date-ordered).
    pub async fn list_keys(&self, team_id: &str) -> Result<Vec<String>> {
        self.client.list(&format!("teams/{team_id}/audit/")).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::SharedClock;
    use crate::store::ObjectStore;
    use crate::store::memory::MemoryStore;
    use crate::test_utils::ManualClock;
    use std::sync::Arc;

    fn writer() -> (AuditWriter, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::default());
        let client = CacheClient::new(store.clone(), clock as SharedClock);
        (AuditWriter::new(client), store)
    }

    #[test]
    fn audit_key_is_date_namespaced() {
        let ts = "2026-08-26T10:30:00Z".parse().unwrap();
        let id = Uuid::nil();
        assert_eq!(
            audit_key("platform", ts, id),
            format!("teams/platform/audit/2026-08-26/{id}.json")
        );
    }

    #[tokio::test]
    async fn record_writes_one_object_per_event() {
        let (writer, store) = writer();
        writer.record_manual_refresh("platform", "alice").await;
        writer.record_manual_refresh("platform", "bob").await;

        let keys = writer.list_keys("platform").await.unwrap();
        assert_eq!(keys.len(), 2);
        assert!(keys.iter().all(|k| k.starts_with("teams/platform/audit/")));

        let bytes = store.get_raw(&keys[0]).await.unwrap().unwrap();
        let entry: AuditEntry = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(entry.reason, RefreshReason::Manual);
        assert_eq!(entry.retention_seconds, AUDIT_RETENTION_SECS);
    }

    #[tokio::test]
    async fn failed_audit_write_is_swallowed() {
        let (writer, store) = writer();
        store.set_fail_writes(true);
        // Does not panic or propagate.
        writer.record_manual_refresh("platform", "alice").await;
        store.set_fail_writes(false);
        assert!(writer.list_keys("platform").await.unwrap().is_empty());
    }
}
