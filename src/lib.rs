//! teamcost - Shared team cost-cache coordinator
//!
//! Lets multiple independent clients share one cached view of periodically
//! fetched, metered billing data, so that only one client calls the expensive
//! upstream API at a time. Coordination is a lease-based soft lock stored as
//! ordinary data in a plain key/blob object store - no central lock service.

#![forbid(unsafe_code)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod audit;
pub mod cache;
pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod fetch;
pub mod lock;
pub mod scheduler;
pub mod staleness;
pub mod store;
pub mod util;

/// Test utilities module - included in test builds or when test-utils feature is enabled.
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use error::{Result, TeamCostError};

// Re-export test utilities for external test crates
#[cfg(any(test, feature = "test-utils"))]
pub use test_utils::*;
