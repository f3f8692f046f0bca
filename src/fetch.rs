//! The upstream billing fetch seam.
//!
//! The billing-API client itself is out of scope: the coordinator only sees
//! an opaque async [`CostFetcher`]. A file-backed adapter is provided so the
//! CLI has something concrete to run against.

use std::path::PathBuf;

use async_trait::async_trait;

use crate::core::models::CostReport;
use crate::error::{Result, TeamCostError};

/// Opaque async fetch of current month-to-date costs for one account.
///
/// Invoked at most once per successful lock acquisition. Any error is caught
/// by the scheduler, recorded per-team, and does not advance the
/// next-eligible timestamps.
#[async_trait]
pub trait CostFetcher: Send + Sync {
    async fn fetch_costs(&self, account_id: &str) -> Result<CostReport>;
}

/// Reads a [`CostReport`] from a JSON file on each fetch.
///
/// Stands in for the real billing client in the CLI and demos; the file is
/// re-read every time, so an external process can keep it current.
#[derive(Debug, Clone)]
pub struct JsonFileFetcher {
    path: PathBuf,
}

impl JsonFileFetcher {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CostFetcher for JsonFileFetcher {
    async fn fetch_costs(&self, account_id: &str) -> Result<CostReport> {
        let bytes =
            tokio::fs::read(&self.path)
                .await
                .map_err(|e| TeamCostError::FetchFailed {
                    account_id: account_id.to_string(),
                    message: format!("reading {}: {e}", self.path.display()),
                })?;
        serde_json::from_slice(&bytes).map_err(|e| TeamCostError::FetchFailed {
            account_id: account_id.to_string(),
            message: format!("parsing {}: {e}", self.path.display()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::make_test_report;

    #[tokio::test]
    async fn file_fetcher_reads_report() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("report.json");
        let report = make_test_report(123.45);
        std::fs::write(&path, serde_json::to_vec(&report).unwrap()).unwrap();

        let fetcher = JsonFileFetcher::new(&path);
        let fetched = fetcher.fetch_costs("acct").await.unwrap();
        assert_eq!(fetched, report);
    }

    #[tokio::test]
    async fn missing_file_is_fetch_failed() {
        let fetcher = JsonFileFetcher::new("/nonexistent/report.json");
        let err = fetcher.fetch_costs("acct").await.unwrap_err();
        assert!(matches!(err, TeamCostError::FetchFailed { .. }));
        assert!(err.is_retryable());
    }
}
