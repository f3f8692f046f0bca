//! Deterministic cache key scheme.
//!
//! Blobs are addressed by `(account, year-month, data type)`:
//!
//! ```text
//! cache-v{version}/{accountId}/{yyyy}-{mm}/{dataType}.json.gz
//! ```
//!
//! `encode` followed by `parse` is lossless for every valid key; malformed
//! strings parse to `None` rather than erroring.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Current key scheme version.
pub const KEY_VERSION: u32 = 1;

const KEY_PREFIX: &str = "cache-v";
const KEY_SUFFIX: &str = ".json.gz";

/// Which slice of the billing data a blob holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CostDataType {
    MtdCosts,
    DailyBreakdown,
    ServiceBreakdown,
    FullData,
}

impl CostDataType {
    /// All data types, in key order.
    pub const ALL: &'static [Self] = &[
        Self::MtdCosts,
        Self::DailyBreakdown,
        Self::ServiceBreakdown,
        Self::FullData,
    ];

    /// Segment used in the key string.
    #[must_use]
    pub const fn as_key_segment(self) -> &'static str {
        match self {
            Self::MtdCosts => "mtdCosts",
            Self::DailyBreakdown => "dailyBreakdown",
            Self::ServiceBreakdown => "serviceBreakdown",
            Self::FullData => "fullData",
        }
    }

    /// Parse a key segment back to a data type.
    #[must_use]
    pub fn from_key_segment(segment: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .find(|dt| dt.as_key_segment() == segment)
            .copied()
    }
}

impl fmt::Display for CostDataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_key_segment())
    }
}

/// Parsed form of a cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub version: u32,
    pub account_id: String,
    pub year: i32,
    pub month: u32,
    pub data_type: CostDataType,
}

impl CacheKey {
    /// Build a key for the current scheme version.
    ///
    /// Returns `None` when `month` is outside `1..=12` or `year` outside
    /// `1..=9999` - such keys could never round-trip.
    #[must_use]
    pub fn new(
        account_id: impl Into<String>,
        year: i32,
        month: u32,
        data_type: CostDataType,
    ) -> Option<Self> {
        if !(1..=12).contains(&month) || !(1..=9999).contains(&year) {
            return None;
        }
        Some(Self {
            version: KEY_VERSION,
            account_id: account_id.into(),
            year,
            month,
            data_type,
        })
    }

    /// Render the key string, month and year zero-padded.
    #[must_use]
    pub fn encode(&self) -> String {
        format!(
            "{KEY_PREFIX}{}/{}/{:04}-{:02}/{}{KEY_SUFFIX}",
            self.version,
            self.account_id,
            self.year,
            self.month,
            self.data_type.as_key_segment()
        )
    }

    /// Parse a key string. Returns `None` for a wrong prefix, wrong segment
    /// count, non-numeric year/month, month outside 1-12, or an unrecognized
    /// data type suffix.
    #[must_use]
    pub fn parse(key: &str) -> Option<Self> {
        let segments: Vec<&str> = key.split('/').collect();
        let [head, account_id, period, file] = segments.as_slice() else {
            return None;
        };

        let version: u32 = head.strip_prefix(KEY_PREFIX)?.parse().ok()?;

        if account_id.is_empty() {
            return None;
        }

        let (year_str, month_str) = period.split_once('-')?;
        let year: i32 = parse_numeric(year_str)?;
        let month: u32 = parse_numeric(month_str)?;
        if !(1..=12).contains(&month) || !(1..=9999).contains(&year) {
            return None;
        }

        let data_type = CostDataType::from_key_segment(file.strip_suffix(KEY_SUFFIX)?)?;

        Some(Self {
            version,
            account_id: (*account_id).to_string(),
            year,
            month,
            data_type,
        })
    }

    /// Prefix under which every key for one account lives.
    #[must_use]
    pub fn account_prefix(account_id: &str) -> String {
        format!("{KEY_PREFIX}{KEY_VERSION}/{account_id}/")
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

// Rejects signs and whitespace that str::parse would accept (e.g. "+8").
fn parse_numeric<T: std::str::FromStr>(s: &str) -> Option<T> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}
