//! Freshness tiers for the last successful refresh.
//!
//! Pure classification, used only for reporting - the scheduler never gates
//! on it.

use chrono::{DateTime, Utc};

/// Age at which data stops being green.
pub const STALE_YELLOW_SECS: i64 = 12 * 60 * 60;
/// Age at which data stops being yellow.
pub const STALE_RED_SECS: i64 = 24 * 60 * 60;

/// Qualitative freshness tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Freshness {
    Green,
    Yellow,
    Red,
}

impl Freshness {
    /// Display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Green => "fresh",
            Self::Yellow => "stale",
            Self::Red => "very stale",
        }
    }

    /// Status glyph for terminal output.
    #[must_use]
    pub const fn glyph(self) -> &'static str {
        match self {
            Self::Green => "●",
            Self::Yellow => "◐",
            Self::Red => "○",
        }
    }
}

/// Classify the age of the last successful refresh.
///
/// Never refreshed is red; age up to 12h inclusive is green; up to 24h
/// inclusive is yellow; beyond that red.
#[must_use]
pub fn classify(last_refreshed_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Freshness {
    let Some(refreshed_at) = last_refreshed_at else {
        return Freshness::Red;
    };
    let age_secs = now.signed_duration_since(refreshed_at).num_seconds();
    if age_secs <= STALE_YELLOW_SECS {
        Freshness::Green
    } else if age_secs <= STALE_RED_SECS {
        Freshness::Yellow
    } else {
        Freshness::Red
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    fn at_age(age: TimeDelta) -> Freshness {
        let now = Utc::now();
        classify(Some(now - age), now)
    }

    #[test]
    fn never_refreshed_is_red() {
        assert_eq!(classify(None, Utc::now()), Freshness::Red);
    }

    #[test]
    fn tier_boundaries() {
        assert_eq!(at_age(TimeDelta::zero()), Freshness::Green);
        assert_eq!(
            at_age(TimeDelta::hours(11) + TimeDelta::minutes(59)),
            Freshness::Green
        );
        assert_eq!(at_age(TimeDelta::hours(12)), Freshness::Green);
        assert_eq!(
            at_age(TimeDelta::hours(12) + TimeDelta::seconds(1)),
            Freshness::Yellow
        );
        assert_eq!(
            at_age(TimeDelta::hours(23) + TimeDelta::minutes(59)),
            Freshness::Yellow
        );
        assert_eq!(at_age(TimeDelta::hours(24)), Freshness::Yellow);
        assert_eq!(
            at_age(TimeDelta::hours(24) + TimeDelta::seconds(1)),
            Freshness::Red
        );
    }

    #[test]
    fn future_refresh_timestamp_is_green() {
        let now = Utc::now();
        assert_eq!(
            classify(Some(now + TimeDelta::minutes(5)), now),
            Freshness::Green
        );
    }
}
