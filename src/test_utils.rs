//! Shared test fixtures: a hand-driven clock, a scriptable fetcher, and
//! entry/report factories. Available to integration tests through the
//! `test-utils` feature.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Datelike, NaiveDate, TimeDelta, Utc};

use crate::cache::{CacheKey, CostDataType};
use crate::core::clock::Clock;
use crate::core::models::{
    CacheMetadata, CostReport, DailyCost, RemoteCacheEntry, ServiceCost,
};
use crate::error::{Result, TeamCostError};
use crate::fetch::CostFetcher;
use crate::store::fs::FsStore;

/// A clock that only moves when told to. Starts at a fixed instant so tests
/// are deterministic.
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::starting_at(
            "2026-08-15T12:00:00Z"
                .parse()
                .expect("valid fixed timestamp"),
        )
    }
}

impl ManualClock {
    #[must_use]
    pub fn starting_at(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Move time forward (or backward, with a negative delta).
    pub fn advance(&self, delta: TimeDelta) {
        let mut now = self.now.lock().expect("clock poisoned");
        *now += delta;
    }

    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        *self.now.lock().expect("clock poisoned")
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().expect("clock poisoned")
    }
}

/// A fetcher that returns a fixed report, flippable into a failure mode.
pub struct StaticFetcher {
    report: Mutex<CostReport>,
    failing: AtomicBool,
    calls: AtomicUsize,
}

impl StaticFetcher {
    #[must_use]
    pub fn succeeding(report: CostReport) -> Self {
        Self {
            report: Mutex::new(report),
            failing: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    /// Switch between success and `FetchFailed` responses.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Replace the report returned by subsequent fetches.
    pub fn set_report(&self, report: CostReport) {
        *self.report.lock().expect("report poisoned") = report;
    }

    /// How many fetches ran, successful or not.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CostFetcher for StaticFetcher {
    async fn fetch_costs(&self, account_id: &str) -> Result<CostReport> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(TeamCostError::FetchFailed {
                account_id: account_id.to_string(),
                message: "simulated upstream failure".to_string(),
            });
        }
        Ok(self.report.lock().expect("report poisoned").clone())
    }
}

/// A filesystem store rooted in a temporary directory that is removed when
/// this value is dropped. Uses the `tempfile` crate internally.
pub struct TempStore {
    _dir: tempfile::TempDir,
    pub store: Arc<FsStore>,
}

impl TempStore {
    /// Create a fresh empty store.
    ///
    /// # Panics
    ///
    /// Panics if the temporary directory cannot be created.
    #[must_use]
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp directory");
        let store = Arc::new(FsStore::open(dir.path()).expect("failed to open store"));
        Self { _dir: dir, store }
    }
}

impl Default for TempStore {
    fn default() -> Self {
        Self::new()
    }
}

/// A plausible month-to-date report with the given total.
#[must_use]
pub fn make_test_report(mtd_total: f64) -> CostReport {
    CostReport {
        mtd_total,
        currency: "USD".to_string(),
        daily_costs: vec![
            DailyCost {
                date: NaiveDate::from_ymd_opt(2026, 8, 14).expect("valid date"),
                amount: mtd_total / 2.0,
            },
            DailyCost {
                date: NaiveDate::from_ymd_opt(2026, 8, 15).expect("valid date"),
                amount: mtd_total / 2.0,
            },
        ],
        service_costs: vec![
            ServiceCost {
                service: "compute".to_string(),
                amount: mtd_total * 0.7,
            },
            ServiceCost {
                service: "storage".to_string(),
                amount: mtd_total * 0.3,
            },
        ],
        start_date: NaiveDate::from_ymd_opt(2026, 8, 1).expect("valid date"),
        end_date: NaiveDate::from_ymd_opt(2026, 8, 15).expect("valid date"),
    }
}

/// A cache entry as the coordinator would write it at `now`, with a 6h TTL.
#[must_use]
pub fn make_test_entry(
    team_id: &str,
    account_id: &str,
    now: DateTime<Utc>,
    version: u64,
) -> RemoteCacheEntry {
    let key = CacheKey::new(account_id, now.year(), now.month(), CostDataType::FullData)
        .expect("valid test key")
        .encode();
    RemoteCacheEntry::from_report(
        team_id,
        account_id,
        make_test_report(42.0),
        now,
        version,
        CacheMetadata::new("test-writer", now, 6 * 60 * 60, key),
    )
}
