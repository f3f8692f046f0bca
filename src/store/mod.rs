//! Object store abstraction and the typed cache client.
//!
//! [`ObjectStore`] is the minimal async surface over a flat key/blob
//! namespace: get/put/head/delete/list, overwrite semantics, no internal
//! retries. [`CacheClient`] layers JSON typing, TTL-aware reads, and a
//! per-operation timeout on top; a timed-out call surfaces as
//! [`TeamCostError::Network`], never an indefinite block.

pub mod fs;
pub mod memory;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::core::clock::SharedClock;
use crate::core::models::CacheMetadata;
use crate::error::{Result, TeamCostError};

/// Default per-operation timeout. The recommended range is 10-30s.
pub const DEFAULT_OP_TIMEOUT: Duration = Duration::from_secs(15);

/// Async operations over a flat key namespace.
///
/// Entries are small (<1MB); no multipart or partial semantics. Errors
/// propagate to the caller - implementations never retry internally.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch the raw bytes at `key`, or `None` when absent.
    async fn get_raw(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Write `bytes` at `key`, overwriting any existing blob.
    async fn put_raw(&self, key: &str, bytes: Vec<u8>) -> Result<()>;

    /// Existence check without fetching the body.
    async fn head(&self, key: &str) -> Result<bool>;

    /// Delete the blob at `key`. Idempotent; absent keys are not an error.
    async fn delete(&self, key: &str) -> Result<()>;

    /// All keys under `prefix`, sorted.
    async fn list(&self, prefix: &str) -> Result<Vec<String>>;
}

/// Shared store handle.
pub type SharedStore = Arc<dyn ObjectStore>;

/// Outcome of a TTL-aware cache read. `NotFound` and `Expired` are normal
/// control flow - they mean "needs refresh", not failure.
#[derive(Debug, Clone, PartialEq)]
pub enum GetOutcome<T> {
    Found(T),
    NotFound,
    Expired(T),
}

impl<T> GetOutcome<T> {
    /// The entry, whether fresh or expired.
    #[must_use]
    pub fn into_entry(self) -> Option<T> {
        match self {
            Self::Found(entry) | Self::Expired(entry) => Some(entry),
            Self::NotFound => None,
        }
    }

    /// Whether a refresh is needed to serve fresh data.
    #[must_use]
    pub const fn needs_refresh(&self) -> bool {
        !matches!(self, Self::Found(_))
    }
}

/// Types carrying a [`CacheMetadata`] envelope, enabling TTL-aware reads.
pub trait Cached {
    fn cache_metadata(&self) -> &CacheMetadata;
}

impl Cached for crate::core::models::RemoteCacheEntry {
    fn cache_metadata(&self) -> &CacheMetadata {
        &self.metadata
    }
}

/// Typed JSON client over an [`ObjectStore`].
#[derive(Clone)]
pub struct CacheClient {
    store: SharedStore,
    clock: SharedClock,
    op_timeout: Duration,
}

impl CacheClient {
    /// Wrap a store with the default operation timeout.
    #[must_use]
    pub fn new(store: SharedStore, clock: SharedClock) -> Self {
        Self::with_timeout(store, clock, DEFAULT_OP_TIMEOUT)
    }

    /// Wrap a store with an explicit operation timeout.
    #[must_use]
    pub const fn with_timeout(store: SharedStore, clock: SharedClock, op_timeout: Duration) -> Self {
        Self {
            store,
            clock,
            op_timeout,
        }
    }

    /// TTL-aware typed read. Expiry is decided by the entry's own metadata
    /// against the injected clock. A blob that fails to decode raises
    /// [`TeamCostError::CorruptedData`].
    pub async fn get<T>(&self, key: &str) -> Result<GetOutcome<T>>
    where
        T: DeserializeOwned + Cached,
    {
        let Some(entry) = self.get_json::<T>(key).await? else {
            return Ok(GetOutcome::NotFound);
        };
        if entry.cache_metadata().is_expired(self.clock.now()) {
            Ok(GetOutcome::Expired(entry))
        } else {
            Ok(GetOutcome::Found(entry))
        }
    }

    /// Typed read without TTL semantics (locks carry their own expiry).
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let Some(bytes) = self.timed(key, self.store.get_raw(key)).await? else {
            return Ok(None);
        };
        let entry = serde_json::from_slice(&bytes).map_err(|e| TeamCostError::CorruptedData {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Ok(Some(entry))
    }

    /// Typed overwrite.
    pub async fn put_json<T: Serialize + Sync>(&self, key: &str, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec(value)?;
        self.timed(key, self.store.put_raw(key, bytes)).await
    }

    /// Existence check.
    pub async fn head(&self, key: &str) -> Result<bool> {
        self.timed(key, self.store.head(key)).await
    }

    /// Idempotent delete.
    pub async fn delete(&self, key: &str) -> Result<()> {
        self.timed(key, self.store.delete(key)).await
    }

    /// Sorted key listing under a prefix.
    pub async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        self.timed(prefix, self.store.list(prefix)).await
    }

    /// The clock every time-gated decision reads from.
    #[must_use]
    pub fn clock(&self) -> &SharedClock {
        &self.clock
    }

    async fn timed<T>(&self, key: &str, fut: impl Future<Output = Result<T>> + Send) -> Result<T> {
        match tokio::time::timeout(self.op_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(TeamCostError::Network {
                message: format!(
                    "operation on {key} timed out after {}s",
                    self.op_timeout.as_secs()
                ),
            }),
        }
    }
}
