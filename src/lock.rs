//! Lease-based soft lock over the object store.
//!
//! Emulates "at most one client refreshes a team at a time" with plain,
//! non-atomic blob writes - no central lock service and no assumed
//! conditional-write support. Two clients can both observe an absent or
//! expired lock and both acquire; that rare double-refresh is an accepted
//! trade-off because the protected operation (re-fetch + overwrite) is
//! idempotent. It costs one extra upstream call, never data corruption.
//! Backends that do offer if-absent writes can shrink the window, but the
//! protocol must not rely on them.
//!
//! A lease is self-expiring: a crashed holder blocks acquisition for at most
//! `lease_ttl` past the lease's creation.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::core::identity::ClientIdentity;
use crate::error::Result;
use crate::store::CacheClient;

/// Default lease duration.
pub const DEFAULT_LEASE_TTL: Duration = Duration::from_secs(120);

/// Well-known lock key for a team.
#[must_use]
pub fn lock_key(team_id: &str) -> String {
    format!("teams/{team_id}/lock.json")
}

/// The lease token as stored. Deliberately its own minimal schema - locks do
/// not reuse the cache-entry envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SoftLock {
    pub holder_id: String,
    pub holder_name: String,
    pub expires_at: DateTime<Utc>,
}

impl SoftLock {
    /// A lease is expired once `now` reaches `expires_at`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Time left on the lease, if any.
    #[must_use]
    pub fn remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        if self.is_expired(now) {
            None
        } else {
            (self.expires_at - now).to_std().ok()
        }
    }
}

/// Acquire/release operations for one client identity.
#[derive(Clone)]
pub struct LockManager {
    client: CacheClient,
    identity: ClientIdentity,
    lease_ttl: Duration,
}

impl LockManager {
    /// Build a manager acquiring leases of `lease_ttl`.
    #[must_use]
    pub const fn new(client: CacheClient, identity: ClientIdentity, lease_ttl: Duration) -> Self {
        Self {
            client,
            identity,
            lease_ttl,
        }
    }

    /// The identity this manager acquires leases as.
    #[must_use]
    pub const fn identity(&self) -> &ClientIdentity {
        &self.identity
    }

    /// Try to take the lease for `team_id`.
    ///
    /// Returns `Ok(false)` when another holder has a live lease. An expired
    /// lease is treated as abandoned and stolen. The check-then-write is
    /// explicitly not atomic; see the module docs for the accepted race.
    pub async fn acquire(&self, team_id: &str) -> Result<bool> {
        let key = lock_key(team_id);
        let now = self.client.clock().now();

        if self.client.head(&key).await? {
            match self.client.get_json::<SoftLock>(&key).await {
                Ok(Some(lock)) => {
                    if !lock.is_expired(now) && lock.holder_id != self.identity.holder_id {
                        tracing::debug!(
                            team_id,
                            holder = %lock.holder_name,
                            expires_at = %lock.expires_at,
                            "lock held elsewhere, skipping"
                        );
                        return Ok(false);
                    }
                    if lock.is_expired(now) {
                        tracing::info!(
                            team_id,
                            stale_holder = %lock.holder_name,
                            "stealing abandoned lease"
                        );
                    }
                }
                // Deleted between head and get: proceed as absent.
                Ok(None) => {}
                // An undecodable lock entry cannot name a live holder; treat
                // it as abandoned rather than wedging the team forever.
                Err(e) if e.reads_as_expired() => {
                    tracing::warn!(team_id, error = %e, "replacing corrupted lock entry");
                }
                Err(e) => return Err(e),
            }
        }

        let lease = SoftLock {
            holder_id: self.identity.holder_id.clone(),
            holder_name: self.identity.display_name.clone(),
            expires_at: now
                + TimeDelta::from_std(self.lease_ttl).unwrap_or_else(|_| TimeDelta::seconds(120)),
        };
        self.client.put_json(&key, &lease).await?;
        tracing::debug!(team_id, expires_at = %lease.expires_at, "lease acquired");
        Ok(true)
    }

    /// Give the lease back by overwriting it as already expired.
    ///
    /// Only a lease we hold is overwritten: a live lease under a different
    /// holder id is left alone (releasing it would cut short that client's
    /// refresh), logged, and reported as `Ok` since there is nothing of ours
    /// to clean up.
    pub async fn release(&self, team_id: &str) -> Result<()> {
        let key = lock_key(team_id);
        let now = self.client.clock().now();

        match self.client.get_json::<SoftLock>(&key).await {
            Ok(Some(lock)) => {
                if lock.holder_id != self.identity.holder_id && !lock.is_expired(now) {
                    tracing::warn!(
                        team_id,
                        holder = %lock.holder_name,
                        "not releasing a live lease we do not hold"
                    );
                    return Ok(());
                }
            }
            Ok(None) => return Ok(()),
            // Corrupted lock: overwriting with an expired marker is the only
            // way to unwedge future acquirers.
            Err(e) if e.reads_as_expired() => {
                tracing::warn!(team_id, error = %e, "overwriting corrupted lock on release");
            }
            Err(e) => return Err(e),
        }

        let released = SoftLock {
            holder_id: self.identity.holder_id.clone(),
            holder_name: self.identity.display_name.clone(),
            expires_at: now - TimeDelta::seconds(1),
        };
        self.client.put_json(&key, &released).await?;
        tracing::debug!(team_id, "lease released");
        Ok(())
    }
}
