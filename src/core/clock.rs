//! Injectable time source.
//!
//! Everything time-gated in this crate (lease expiry, staleness tiers,
//! cooldown predicates) reads the current instant through [`Clock`] so tests
//! can advance virtual time instead of sleeping.

use std::sync::Arc;

use chrono::{DateTime, Utc};

/// A source of "now".
pub trait Clock: Send + Sync {
    /// Current instant in UTC.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock implementation used outside of tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Shared clock handle.
pub type SharedClock = Arc<dyn Clock>;

/// Convenience constructor for the default wall clock.
#[must_use]
pub fn system_clock() -> SharedClock {
    Arc::new(SystemClock)
}
