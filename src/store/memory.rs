//! In-memory object store.
//!
//! Backs tests and demos. Supports injecting transport failures so callers
//! can exercise the error paths without a real network.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use crate::error::{Result, TeamCostError};

use super::ObjectStore;

/// A flat blob namespace held in a `BTreeMap` (keys come back sorted for free).
#[derive(Debug, Default)]
pub struct MemoryStore {
    blobs: Mutex<BTreeMap<String, Vec<u8>>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent reads fail with a network error.
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent writes fail with a network error.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of blobs currently stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.blobs.lock().expect("store poisoned").len()
    }

    /// Whether the store holds no blobs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_read(&self, key: &str) -> Result<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(TeamCostError::Network {
                message: format!("injected read failure for {key}"),
            });
        }
        Ok(())
    }

    fn check_write(&self, key: &str) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(TeamCostError::Network {
                message: format!("injected write failure for {key}"),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn get_raw(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.check_read(key)?;
        Ok(self.blobs.lock().expect("store poisoned").get(key).cloned())
    }

    async fn put_raw(&self, key: &str, bytes: Vec<u8>) -> Result<()> {
        self.check_write(key)?;
        self.blobs
            .lock()
            .expect("store poisoned")
            .insert(key.to_string(), bytes);
        Ok(())
    }

    async fn head(&self, key: &str) -> Result<bool> {
        self.check_read(key)?;
        Ok(self.blobs.lock().expect("store poisoned").contains_key(key))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.check_write(key)?;
        self.blobs.lock().expect("store poisoned").remove(key);
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        self.check_read(prefix)?;
        Ok(self
            .blobs
            .lock()
            .expect("store poisoned")
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }
}
