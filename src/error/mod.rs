//! Error types for teamcost.
//!
//! Uses `thiserror` for structured error types.
//!
//! ## Error Taxonomy
//!
//! - **Store**: transport/permission failures talking to the object store
//!   (`Network`, `AccessDenied`, `BucketNotFound`)
//! - **Data**: payloads that cannot be decoded (`Serialization`, `CorruptedData`)
//! - **Configuration / Internal**: settings files, I/O, unclassified
//!
//! `NotFound` and `Expired` on a cache read are normal control flow, not
//! failures - they live in [`crate::store::GetOutcome`], never here. Lock
//! contention is likewise not an error: acquisition reports it as a plain
//! `false`. A read that yields `CorruptedData` or `Serialization` is
//! downgraded by the coordinator to "needs refresh" rather than propagated
//! to the user.

use thiserror::Error;

/// Main error type for teamcost operations.
#[derive(Error, Debug)]
pub enum TeamCostError {
    // ==========================================================================
    // Object store errors
    // ==========================================================================
    /// Transport-level failure reaching the object store. Operation timeouts
    /// map here as well - a slow store is never an indefinite block.
    #[error("network error talking to object store: {message}")]
    Network { message: String },

    /// The store rejected the credentials for this key.
    #[error("access denied for key {key}")]
    AccessDenied { key: String },

    /// The backing bucket/namespace does not exist.
    #[error("bucket not found: {bucket}")]
    BucketNotFound { bucket: String },

    // ==========================================================================
    // Data errors
    // ==========================================================================
    /// A stored blob decoded to something other than the expected schema.
    #[error("corrupted data at {key}: {message}")]
    CorruptedData { key: String, message: String },

    /// JSON encode/decode failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // ==========================================================================
    // Configuration errors
    // ==========================================================================
    /// Settings file missing, unparsable, or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// The external cost fetch collaborator failed.
    #[error("cost fetch failed for account {account_id}: {message}")]
    FetchFailed { account_id: String, message: String },

    // ==========================================================================
    // Internal errors
    // ==========================================================================
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Catch-all for other errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TeamCostError {
    /// Whether the error is potentially recoverable by retrying at the next
    /// scheduler tick. Retryable errors leave scheduling timestamps unchanged
    /// so the team is re-attempted soon instead of waiting a full interval.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Network { .. }
                | Self::FetchFailed { .. }
                | Self::AccessDenied { .. }
                | Self::BucketNotFound { .. }
        )
    }

    /// Whether a read that produced this error should be treated as an
    /// expired cache entry (forcing a fresh refresh) rather than surfaced.
    #[must_use]
    pub const fn reads_as_expired(&self) -> bool {
        matches!(self, Self::CorruptedData { .. } | Self::Serialization(_))
    }
}

/// Result type alias for teamcost operations.
pub type Result<T> = std::result::Result<T, TeamCostError>;
