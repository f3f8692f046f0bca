//! Per-team refresh scheduling and coordination.
//!
//! Each tracked team gets one cooperative timer task. On every tick the team
//! is checked for auto-refresh eligibility; manual refreshes arrive through
//! [`RefreshCoordinator::request_manual_refresh`] and are gated by a
//! cooldown predicate rather than a separate state. A refresh attempt is
//! serialized within the process by a per-team busy flag (self-collision
//! protection) and across processes by the soft lock (best-effort).
//!
//! Stopping the coordinator prevents future ticks but never aborts an
//! in-flight refresh: the loop only observes shutdown between ticks, so a
//! held lease is always released before the task exits.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Datelike, NaiveDate, TimeDelta, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::audit::AuditWriter;
use crate::cache::{CacheKey, CostDataType};
use crate::core::identity::ClientIdentity;
use crate::core::models::{CacheMetadata, RemoteCacheEntry};
use crate::error::{Result, TeamCostError};
use crate::fetch::CostFetcher;
use crate::lock::LockManager;
use crate::staleness::{Freshness, classify};
use crate::store::CacheClient;

// =============================================================================
// Constants and configuration
// =============================================================================

/// Base interval between automatic refreshes.
pub const AUTO_INTERVAL: Duration = Duration::from_secs(6 * 60 * 60);
/// Minimum spacing between manual refreshes.
pub const MANUAL_COOLDOWN: Duration = Duration::from_secs(30 * 60);
/// How often each team's eligibility is checked.
pub const CHECK_INTERVAL: Duration = Duration::from_secs(10 * 60);

/// Scheduling knobs. Defaults match production cadence; tests shrink them.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub auto_interval: Duration,
    pub manual_cooldown: Duration,
    pub check_interval: Duration,
    pub lease_ttl: Duration,
    /// TTL stamped into cache-entry metadata.
    pub entry_ttl: Duration,
    /// Fraction of `auto_interval` used for jitter, `U(0, fraction)` each way.
    pub jitter_fraction: f64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            auto_interval: AUTO_INTERVAL,
            manual_cooldown: MANUAL_COOLDOWN,
            check_interval: CHECK_INTERVAL,
            lease_ttl: crate::lock::DEFAULT_LEASE_TTL,
            entry_ttl: AUTO_INTERVAL,
            jitter_fraction: 0.1,
        }
    }
}

impl SchedulerConfig {
    /// Sample the jittered auto interval: `auto_interval * (1 ± U(0, f))`.
    ///
    /// Sampled once per coordinator (process lifetime) to desynchronize
    /// independent clients' polling cadence and reduce lock contention.
    #[must_use]
    pub fn sample_jittered_auto_interval(&self) -> Duration {
        if self.jitter_fraction <= 0.0 {
            return self.auto_interval;
        }
        let factor = 1.0 + rand::rng().random_range(-self.jitter_fraction..=self.jitter_fraction);
        self.auto_interval.mul_f64(factor)
    }
}

// =============================================================================
// Public types
// =============================================================================

/// Why a refresh ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefreshReason {
    Auto,
    Manual,
}

/// A team the coordinator tracks: one billing account shared by the team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamProfile {
    pub team_id: String,
    pub account_id: String,
}

/// Derived, never persisted: recomputed from the latest cache entry plus
/// scheduling constants each time it is loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamCacheState {
    pub team_id: String,
    pub last_refreshed_at: Option<DateTime<Utc>>,
    pub refreshed_by: Option<String>,
    pub next_auto_eligible_at: DateTime<Utc>,
    pub next_manual_eligible_at: DateTime<Utc>,
    pub as_of_date: Option<NaiveDate>,
    pub version: u64,
    pub freshness: Freshness,
    /// Last per-team error surfaced for display, if any.
    pub last_error: Option<String>,
}

impl TeamCacheState {
    /// Whether a manual refresh would currently be accepted.
    #[must_use]
    pub fn is_manual_refresh_enabled(&self, now: DateTime<Utc>) -> bool {
        now >= self.next_manual_eligible_at
    }
}

/// Response to a manual refresh request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManualRefreshOutcome {
    /// The cooldown gate passed and an attempt ran. `refreshed` is false when
    /// the attempt was silently skipped because another client held the lock.
    Accepted { refreshed: bool },
    /// Still cooling down.
    Rejected { seconds_remaining: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TeamPhase {
    Idle,
    Refreshing,
}

struct TeamSlot {
    profile: TeamProfile,
    phase: TeamPhase,
    last_error: Option<String>,
}

// =============================================================================
// Coordinator
// =============================================================================

/// Owns the per-team state map, busy flags, and timer tasks. Multiple
/// independent coordinators can coexist (nothing is process-global), which is
/// exactly what the multi-client tests do.
#[derive(Clone)]
pub struct RefreshCoordinator {
    inner: Arc<Inner>,
}

struct Inner {
    client: CacheClient,
    locks: LockManager,
    audit: AuditWriter,
    fetcher: Arc<dyn CostFetcher>,
    identity: ClientIdentity,
    config: SchedulerConfig,
    /// Jittered auto interval, sampled once at construction.
    auto_interval: Duration,
    teams: Mutex<HashMap<String, TeamSlot>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    shutdown_tx: watch::Sender<bool>,
    running: AtomicBool,
}

impl RefreshCoordinator {
    /// Build a coordinator. The jittered auto interval is sampled here, once.
    #[must_use]
    pub fn new(
        client: CacheClient,
        fetcher: Arc<dyn CostFetcher>,
        identity: ClientIdentity,
        config: SchedulerConfig,
    ) -> Self {
        let auto_interval = config.sample_jittered_auto_interval();
        Self::with_auto_interval(client, fetcher, identity, config, auto_interval)
    }

    /// Build a coordinator with a pinned auto interval (tests pin jitter).
    #[must_use]
    pub fn with_auto_interval(
        client: CacheClient,
        fetcher: Arc<dyn CostFetcher>,
        identity: ClientIdentity,
        config: SchedulerConfig,
        auto_interval: Duration,
    ) -> Self {
        let locks = LockManager::new(client.clone(), identity.clone(), config.lease_ttl);
        let audit = AuditWriter::new(client.clone());
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            inner: Arc::new(Inner {
                client,
                locks,
                audit,
                fetcher,
                identity,
                config,
                auto_interval,
                teams: Mutex::new(HashMap::new()),
                tasks: Mutex::new(Vec::new()),
                shutdown_tx,
                running: AtomicBool::new(false),
            }),
        }
    }

    /// The identity this coordinator refreshes as.
    #[must_use]
    pub fn identity(&self) -> &ClientIdentity {
        &self.inner.identity
    }

    /// The jittered auto interval in effect for this process.
    #[must_use]
    pub fn auto_interval(&self) -> Duration {
        self.inner.auto_interval
    }

    /// Start tracking a team. If the scheduler is running, a timer task for
    /// the team starts immediately. Tracking an already-tracked team updates
    /// its profile and is otherwise a no-op.
    pub fn track_team(&self, profile: TeamProfile) {
        let team_id = profile.team_id.clone();
        let newly_tracked = {
            let mut teams = self.inner.teams.lock().expect("team map poisoned");
            match teams.entry(team_id.clone()) {
                std::collections::hash_map::Entry::Occupied(mut slot) => {
                    slot.get_mut().profile = profile;
                    false
                }
                std::collections::hash_map::Entry::Vacant(slot) => {
                    slot.insert(TeamSlot {
                        profile,
                        phase: TeamPhase::Idle,
                        last_error: None,
                    });
                    true
                }
            }
        };
        if newly_tracked && self.inner.running.load(Ordering::SeqCst) {
            self.spawn_team_loop(team_id);
        }
    }

    /// Tracked team ids, sorted.
    #[must_use]
    pub fn tracked_teams(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .inner
            .teams
            .lock()
            .expect("team map poisoned")
            .keys()
            .cloned()
            .collect();
        ids.sort();
        ids
    }

    /// Start the per-team timers. Idempotent.
    pub fn start(&self) {
        if self
            .inner
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return;
        }
        self.inner.shutdown_tx.send_replace(false);
        for team_id in self.tracked_teams() {
            self.spawn_team_loop(team_id);
        }
        tracing::info!(check_interval_secs = self.inner.config.check_interval.as_secs(), "scheduler started");
    }

    /// Stop future ticks and wait for the timer tasks to wind down. An
    /// in-flight refresh is not aborted; its lease is released normally
    /// before the task exits. Idempotent.
    pub async fn stop(&self) {
        if self
            .inner
            .running
            .compare_exchange(true, false, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return;
        }
        self.inner.shutdown_tx.send_replace(true);
        let handles: Vec<JoinHandle<()>> = {
            let mut tasks = self.inner.tasks.lock().expect("task list poisoned");
            tasks.drain(..).collect()
        };
        futures::future::join_all(handles).await;
        tracing::info!("scheduler stopped");
    }

    /// Load and derive the current state for a team.
    ///
    /// A corrupted or undecodable cache entry reads as "never refreshed"
    /// rather than an error, so the next attempt rewrites it.
    pub async fn state(&self, team_id: &str) -> Result<TeamCacheState> {
        let (profile, last_error) = self.inner.slot_info(team_id)?;
        let entry = self.inner.load_entry_tolerant(&profile).await?;
        Ok(self.inner.derive_state(team_id, entry.as_ref(), last_error))
    }

    /// Request a manual refresh, gated by the cooldown predicate.
    pub async fn request_manual_refresh(&self, team_id: &str) -> Result<ManualRefreshOutcome> {
        let state = self.state(team_id).await?;
        let now = self.inner.client.clock().now();
        if !state.is_manual_refresh_enabled(now) {
            let remaining_ms = (state.next_manual_eligible_at - now).num_milliseconds().max(0);
            let seconds_remaining = u64::try_from(remaining_ms).unwrap_or(0).div_ceil(1000);
            tracing::debug!(team_id, seconds_remaining, "manual refresh rejected, cooling down");
            return Ok(ManualRefreshOutcome::Rejected { seconds_remaining });
        }
        let refreshed = self.inner.attempt_refresh(team_id, RefreshReason::Manual).await?;
        Ok(ManualRefreshOutcome::Accepted { refreshed })
    }

    /// Run one eligibility check for a team, as a timer tick would.
    /// Exposed so tests can drive virtual time instead of sleeping.
    pub async fn tick_team(&self, team_id: &str) {
        self.inner.auto_tick(team_id).await;
    }

    fn spawn_team_loop(&self, team_id: String) {
        let inner = self.inner.clone();
        let mut shutdown_rx = self.inner.shutdown_tx.subscribe();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(inner.config.check_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // The first tick of tokio's interval fires immediately; that is
            // wanted here - a freshly started client checks eligibility at once.
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        inner.auto_tick(&team_id).await;
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }
            tracing::debug!(team_id, "team timer stopped");
        });
        self.inner
            .tasks
            .lock()
            .expect("task list poisoned")
            .push(handle);
    }
}

impl Inner {
    fn slot_info(&self, team_id: &str) -> Result<(TeamProfile, Option<String>)> {
        let teams = self.teams.lock().expect("team map poisoned");
        teams.get(team_id).map_or_else(
            || Err(TeamCostError::Config(format!("team {team_id} is not tracked"))),
            |slot| Ok((slot.profile.clone(), slot.last_error.clone())),
        )
    }

    /// Key holding the full payload for the current month.
    fn entry_key(&self, account_id: &str) -> String {
        let now = self.client.clock().now();
        // Construction cannot fail: chrono months are always 1-12.
        CacheKey::new(account_id, now.year(), now.month(), CostDataType::FullData)
            .map_or_else(String::new, |k| k.encode())
    }

    async fn load_entry_tolerant(&self, profile: &TeamProfile) -> Result<Option<RemoteCacheEntry>> {
        let key = self.entry_key(&profile.account_id);
        match self.client.get::<RemoteCacheEntry>(&key).await {
            Ok(outcome) => Ok(outcome.into_entry()),
            Err(e) if e.reads_as_expired() => {
                tracing::warn!(team_id = %profile.team_id, key, error = %e, "cache entry unreadable, will refresh");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn derive_state(
        &self,
        team_id: &str,
        entry: Option<&RemoteCacheEntry>,
        last_error: Option<String>,
    ) -> TeamCacheState {
        let now = self.client.clock().now();
        let last_refreshed_at = entry.map(|e| e.fetched_at);
        let auto = TimeDelta::from_std(self.auto_interval).unwrap_or_else(|_| TimeDelta::hours(6));
        let cooldown = TimeDelta::from_std(self.config.manual_cooldown)
            .unwrap_or_else(|_| TimeDelta::minutes(30));
        TeamCacheState {
            team_id: team_id.to_string(),
            last_refreshed_at,
            refreshed_by: entry.map(|e| e.metadata.created_by.clone()),
            next_auto_eligible_at: last_refreshed_at.map_or(now, |t| t + auto),
            next_manual_eligible_at: last_refreshed_at.map_or(now, |t| t + cooldown),
            as_of_date: entry.map(|e| e.end_date),
            version: entry.map_or(0, |e| e.version),
            freshness: classify(last_refreshed_at, now),
            last_error,
        }
    }

    /// One automatic eligibility check. Errors are recorded per-team, never
    /// propagated: the next tick retries.
    async fn auto_tick(&self, team_id: &str) {
        let Ok((profile, _)) = self.slot_info(team_id) else {
            return;
        };
        let entry = match self.load_entry_tolerant(&profile).await {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(team_id, error = %e, "state load failed at tick");
                self.record_error(team_id, Some(e.to_string()));
                return;
            }
        };
        let state = self.derive_state(team_id, entry.as_ref(), None);
        let now = self.client.clock().now();
        if now < state.next_auto_eligible_at {
            return;
        }
        if let Err(e) = self.attempt_refresh(team_id, RefreshReason::Auto).await {
            tracing::warn!(team_id, error = %e, "auto refresh failed");
        }
    }

    /// Guarded refresh attempt. Returns whether a refresh actually ran
    /// (`false` means skipped: busy in-process or lock held elsewhere).
    async fn attempt_refresh(&self, team_id: &str, reason: RefreshReason) -> Result<bool> {
        let profile = {
            let mut teams = self.teams.lock().expect("team map poisoned");
            let slot = teams
                .get_mut(team_id)
                .ok_or_else(|| TeamCostError::Config(format!("team {team_id} is not tracked")))?;
            if slot.phase == TeamPhase::Refreshing {
                tracing::debug!(team_id, "refresh already in flight in this process");
                return Ok(false);
            }
            slot.phase = TeamPhase::Refreshing;
            slot.profile.clone()
        };

        let result = self.refresh_with_lock(&profile, reason).await;

        let outcome = match &result {
            Ok(_) => None,
            Err(e) => Some(e.to_string()),
        };
        {
            let mut teams = self.teams.lock().expect("team map poisoned");
            if let Some(slot) = teams.get_mut(team_id) {
                slot.phase = TeamPhase::Idle;
                slot.last_error = outcome;
            }
        }
        result
    }

    /// Acquire the soft lock, refresh, and release on every exit path.
    async fn refresh_with_lock(&self, profile: &TeamProfile, reason: RefreshReason) -> Result<bool> {
        if !self.locks.acquire(&profile.team_id).await? {
            // Someone else is refreshing; skip silently.
            return Ok(false);
        }

        let refresh_result = self.refresh_locked(profile).await;

        // Cleanup step: runs regardless of the fetch/write outcome above.
        if let Err(e) = self.locks.release(&profile.team_id).await {
            tracing::warn!(team_id = %profile.team_id, error = %e, "lock release failed; lease will self-expire");
        }

        if reason == RefreshReason::Manual {
            self.audit
                .record_manual_refresh(&profile.team_id, &self.identity.display_name)
                .await;
        }

        refresh_result.map(|()| true)
    }

    /// The protected operation: fetch upstream and overwrite the entry.
    /// Idempotent, which is what makes the lock race tolerable.
    async fn refresh_locked(&self, profile: &TeamProfile) -> Result<()> {
        let key = self.entry_key(&profile.account_id);
        let prior = self.load_entry_tolerant(profile).await?;
        let prior_version = prior.as_ref().map_or(0, |e| e.version);
        let now = self.client.clock().now();

        match self.fetcher.fetch_costs(&profile.account_id).await {
            Ok(report) => {
                let metadata = CacheMetadata::new(
                    self.identity.display_name.clone(),
                    now,
                    self.config.entry_ttl.as_secs(),
                    key.clone(),
                );
                let mut entry = RemoteCacheEntry::from_report(
                    profile.team_id.clone(),
                    profile.account_id.clone(),
                    report,
                    now,
                    prior_version + 1,
                    metadata,
                );
                entry.metadata.uncompressed_size_bytes = serde_json::to_vec(&entry)
                    .ok()
                    .and_then(|b| u64::try_from(b.len()).ok());
                self.client.put_json(&key, &entry).await?;
                tracing::info!(
                    team_id = %profile.team_id,
                    version = entry.version,
                    mtd_total = entry.mtd_total,
                    "cache entry refreshed"
                );
                Ok(())
            }
            Err(e) => {
                // Failed fetch: keep fetched_at and metadata untouched so the
                // derived eligibility timestamps are unchanged and the next
                // tick retries soon. Only the write counter moves.
                if let Some(mut prev) = prior {
                    prev.version = prior_version + 1;
                    self.client.put_json(&key, &prev).await?;
                }
                tracing::warn!(team_id = %profile.team_id, error = %e, "upstream fetch failed");
                Err(e)
            }
        }
    }

    fn record_error(&self, team_id: &str, error: Option<String>) {
        let mut teams = self.teams.lock().expect("team map poisoned");
        if let Some(slot) = teams.get_mut(team_id) {
            slot.last_error = error;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::SharedClock;
    use crate::store::memory::MemoryStore;
    use crate::test_utils::{ManualClock, StaticFetcher, make_test_report};

    fn coordinator() -> (RefreshCoordinator, Arc<ManualClock>, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::default());
        let client = CacheClient::new(store.clone(), clock.clone() as SharedClock);
        let coordinator = RefreshCoordinator::with_auto_interval(
            client,
            Arc::new(StaticFetcher::succeeding(make_test_report(10.0))),
            ClientIdentity::from_parts("alice-id", "alice"),
            SchedulerConfig::default(),
            AUTO_INTERVAL,
        );
        coordinator.track_team(TeamProfile {
            team_id: "platform".into(),
            account_id: "123456789012".into(),
        });
        (coordinator, clock, store)
    }

    #[test]
    fn jitter_stays_within_ten_percent() {
        let config = SchedulerConfig::default();
        for _ in 0..100 {
            let sampled = config.sample_jittered_auto_interval();
            let base = config.auto_interval.as_secs_f64();
            let ratio = sampled.as_secs_f64() / base;
            assert!((0.9..=1.1).contains(&ratio), "ratio {ratio} out of range");
        }
    }

    #[test]
    fn zero_jitter_is_exact() {
        let config = SchedulerConfig {
            jitter_fraction: 0.0,
            ..SchedulerConfig::default()
        };
        assert_eq!(config.sample_jittered_auto_interval(), config.auto_interval);
    }

    #[tokio::test]
    async fn state_for_untracked_team_errors() {
        let (coordinator, _, _) = coordinator();
        assert!(coordinator.state("nobody").await.is_err());
    }

    #[tokio::test]
    async fn never_refreshed_state_is_immediately_eligible() {
        let (coordinator, clock, _) = coordinator();
        let state = coordinator.state("platform").await.unwrap();
        let now = clock.now();
        assert_eq!(state.version, 0);
        assert_eq!(state.freshness, Freshness::Red);
        assert!(state.last_refreshed_at.is_none());
        assert!(state.next_auto_eligible_at <= now);
        assert!(state.is_manual_refresh_enabled(now));
    }

    #[tokio::test]
    async fn manual_refresh_bumps_version_and_starts_cooldown() {
        let (coordinator, clock, _) = coordinator();
        let outcome = coordinator.request_manual_refresh("platform").await.unwrap();
        assert_eq!(outcome, ManualRefreshOutcome::Accepted { refreshed: true });

        let state = coordinator.state("platform").await.unwrap();
        assert_eq!(state.version, 1);
        assert_eq!(state.refreshed_by.as_deref(), Some("alice"));
        assert_eq!(state.last_refreshed_at, Some(clock.now()));
        assert!(!state.is_manual_refresh_enabled(clock.now()));
    }

    #[tokio::test]
    async fn manual_cooldown_boundary_is_exact() {
        let (coordinator, clock, _) = coordinator();
        coordinator.request_manual_refresh("platform").await.unwrap();

        // One second before eligibility: rejected with remaining time.
        clock.advance(TimeDelta::minutes(30) - TimeDelta::seconds(1));
        let outcome = coordinator.request_manual_refresh("platform").await.unwrap();
        assert_eq!(outcome, ManualRefreshOutcome::Rejected { seconds_remaining: 1 });

        // Exactly at eligibility: accepted.
        clock.advance(TimeDelta::seconds(1));
        let outcome = coordinator.request_manual_refresh("platform").await.unwrap();
        assert!(matches!(outcome, ManualRefreshOutcome::Accepted { .. }));
    }

    #[tokio::test]
    async fn auto_tick_refreshes_only_when_eligible() {
        let (coordinator, clock, _) = coordinator();
        coordinator.tick_team("platform").await;
        assert_eq!(coordinator.state("platform").await.unwrap().version, 1);

        // Not yet eligible: tick is a no-op.
        clock.advance(TimeDelta::hours(1));
        coordinator.tick_team("platform").await;
        assert_eq!(coordinator.state("platform").await.unwrap().version, 1);

        // Past the auto interval: tick refreshes.
        clock.advance(TimeDelta::hours(5));
        coordinator.tick_team("platform").await;
        assert_eq!(coordinator.state("platform").await.unwrap().version, 2);
    }

    #[tokio::test]
    async fn failed_fetch_leaves_eligibility_unchanged() {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::default());
        let client = CacheClient::new(store.clone(), clock.clone() as SharedClock);
        let fetcher = Arc::new(StaticFetcher::succeeding(make_test_report(10.0)));
        let coordinator = RefreshCoordinator::with_auto_interval(
            client,
            fetcher.clone(),
            ClientIdentity::from_parts("alice-id", "alice"),
            SchedulerConfig::default(),
            AUTO_INTERVAL,
        );
        coordinator.track_team(TeamProfile {
            team_id: "platform".into(),
            account_id: "acct".into(),
        });

        coordinator.request_manual_refresh("platform").await.unwrap();
        let before = coordinator.state("platform").await.unwrap();

        clock.advance(TimeDelta::hours(7));
        fetcher.set_failing(true);
        coordinator.tick_team("platform").await;

        let after = coordinator.state("platform").await.unwrap();
        assert_eq!(after.last_refreshed_at, before.last_refreshed_at);
        assert_eq!(after.next_auto_eligible_at, before.next_auto_eligible_at);
        assert_eq!(after.next_manual_eligible_at, before.next_manual_eligible_at);
        // The write counter still moved: the failed attempt is observable.
        assert_eq!(after.version, before.version + 1);
        assert!(after.last_error.is_some());

        // Recovery at the very next tick, not a full interval later.
        fetcher.set_failing(false);
        coordinator.tick_team("platform").await;
        let recovered = coordinator.state("platform").await.unwrap();
        assert!(recovered.last_refreshed_at > before.last_refreshed_at);
        assert!(recovered.last_error.is_none());
    }

    #[tokio::test]
    async fn start_and_stop_are_idempotent() {
        let (coordinator, _, _) = coordinator();
        coordinator.start();
        coordinator.start();
        coordinator.stop().await;
        coordinator.stop().await;
        coordinator.start();
        coordinator.stop().await;
    }
}
