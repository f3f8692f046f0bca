//! Wire models for cached billing data.
//!
//! [`RemoteCacheEntry`] is the shared-read payload every client of a team
//! sees; it is exclusively written by whichever client holds the soft lock.
//! The object store is the sole source of truth - any in-memory copy is a
//! transient cache-of-a-cache.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Current schema version for [`RemoteCacheEntry`] payloads.
pub const SCHEMA_VERSION: u32 = 1;

/// One day's spend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyCost {
    pub date: NaiveDate,
    pub amount: f64,
}

/// Month-to-date spend for one upstream service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceCost {
    pub service: String,
    pub amount: f64,
}

/// Result of one upstream billing fetch - what the opaque collaborator hands
/// back on success.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostReport {
    pub mtd_total: f64,
    pub currency: String,
    pub daily_costs: Vec<DailyCost>,
    pub service_costs: Vec<ServiceCost>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Envelope metadata carried by every cache entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheMetadata {
    /// Display name of the client that wrote the entry.
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub ttl_seconds: u64,
    /// The key this entry was written under, for cross-checks.
    pub cache_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compressed_size_bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uncompressed_size_bytes: Option<u64>,
}

impl CacheMetadata {
    /// Build metadata stamped at `created_at`.
    #[must_use]
    pub fn new(
        created_by: impl Into<String>,
        created_at: DateTime<Utc>,
        ttl_seconds: u64,
        cache_key: impl Into<String>,
    ) -> Self {
        Self {
            created_by: created_by.into(),
            created_at,
            ttl_seconds,
            cache_key: cache_key.into(),
            compressed_size_bytes: None,
            uncompressed_size_bytes: None,
        }
    }

    /// Whether the entry has outlived its TTL as of `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        let age = now.signed_duration_since(self.created_at);
        age.num_seconds() > i64::try_from(self.ttl_seconds).unwrap_or(i64::MAX)
    }
}

/// The shared cache entry for one team's cost data.
///
/// `version` is a monotonically bumped write counter: last write wins across
/// clients, and readers can observe which write they are seeing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteCacheEntry {
    pub team_id: String,
    pub account_id: String,
    /// When the upstream fetch that produced this payload completed.
    pub fetched_at: DateTime<Utc>,
    pub mtd_total: f64,
    pub currency: String,
    pub daily_costs: Vec<DailyCost>,
    pub service_costs: Vec<ServiceCost>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub schema_version: u32,
    pub version: u64,
    pub metadata: CacheMetadata,
}

impl RemoteCacheEntry {
    /// Build an entry from a fetched report.
    #[must_use]
    pub fn from_report(
        team_id: impl Into<String>,
        account_id: impl Into<String>,
        report: CostReport,
        fetched_at: DateTime<Utc>,
        version: u64,
        metadata: CacheMetadata,
    ) -> Self {
        Self {
            team_id: team_id.into(),
            account_id: account_id.into(),
            fetched_at,
            mtd_total: report.mtd_total,
            currency: report.currency,
            daily_costs: report.daily_costs,
            service_costs: report.service_costs,
            start_date: report.start_date,
            end_date: report.end_date,
            schema_version: SCHEMA_VERSION,
            version,
            metadata,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    fn meta_at(created_at: DateTime<Utc>, ttl_seconds: u64) -> CacheMetadata {
        CacheMetadata::new("alice", created_at, ttl_seconds, "cache-v1/k")
    }

    #[test]
    fn metadata_expiry_is_strictly_after_ttl() {
        let created = Utc::now();
        let meta = meta_at(created, 60);
        assert!(!meta.is_expired(created + TimeDelta::seconds(60)));
        assert!(meta.is_expired(created + TimeDelta::seconds(61)));
    }

    #[test]
    fn metadata_never_expires_before_creation() {
        let created = Utc::now();
        let meta = meta_at(created, 60);
        assert!(!meta.is_expired(created - TimeDelta::seconds(30)));
    }

    #[test]
    fn entry_serializes_camel_case() {
        let created = Utc::now();
        let entry = RemoteCacheEntry::from_report(
            "platform",
            "123456789012",
            CostReport {
                mtd_total: 42.5,
                currency: "USD".into(),
                daily_costs: vec![DailyCost {
                    date: NaiveDate::from_ymd_opt(2026, 8, 1).unwrap(),
                    amount: 42.5,
                }],
                service_costs: vec![ServiceCost {
                    service: "compute".into(),
                    amount: 42.5,
                }],
                start_date: NaiveDate::from_ymd_opt(2026, 8, 1).unwrap(),
                end_date: NaiveDate::from_ymd_opt(2026, 8, 26).unwrap(),
            },
            created,
            3,
            meta_at(created, 21_600),
        );

        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["teamId"], "platform");
        assert_eq!(json["mtdTotal"], 42.5);
        assert_eq!(json["schemaVersion"], 1);
        assert_eq!(json["version"], 3);
        assert_eq!(json["metadata"]["createdBy"], "alice");
        // optional sizes are omitted when absent
        assert!(json["metadata"].get("compressedSizeBytes").is_none());
    }

    #[test]
    fn entry_roundtrips_through_json() {
        let created = Utc::now();
        let entry = RemoteCacheEntry::from_report(
            "platform",
            "123456789012",
            CostReport {
                mtd_total: 0.0,
                currency: "EUR".into(),
                daily_costs: vec![],
                service_costs: vec![],
                start_date: NaiveDate::from_ymd_opt(2026, 8, 1).unwrap(),
                end_date: NaiveDate::from_ymd_opt(2026, 8, 26).unwrap(),
            },
            created,
            1,
            meta_at(created, 60),
        );
        let bytes = serde_json::to_vec(&entry).unwrap();
        let back: RemoteCacheEntry = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(back, entry);
    }
}
