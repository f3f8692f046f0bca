//! Filesystem-backed object store.
//!
//! Maps the flat key namespace onto a directory tree under one root. Writes
//! are atomic (temp file + rename) so a crashed writer never leaves a torn
//! blob for other clients to read.

use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::{Result, TeamCostError};

use super::ObjectStore;

/// Object store rooted at a local directory.
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    /// Open (and create if needed) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Root directory of this store.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, key: &str) -> Result<PathBuf> {
        // Keys are store-relative; path traversal out of the root is a
        // permission error, not a lookup miss.
        if key.is_empty() || key.split('/').any(|seg| seg.is_empty() || seg == "..") {
            return Err(TeamCostError::AccessDenied {
                key: key.to_string(),
            });
        }
        Ok(self.root.join(key))
    }

    fn map_io(&self, key: &str, err: std::io::Error) -> TeamCostError {
        match err.kind() {
            std::io::ErrorKind::PermissionDenied => TeamCostError::AccessDenied {
                key: key.to_string(),
            },
            _ if !self.root.exists() => TeamCostError::BucketNotFound {
                bucket: self.root.display().to_string(),
            },
            _ => TeamCostError::Io(err),
        }
    }
}

#[async_trait]
impl ObjectStore for FsStore {
    async fn get_raw(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.resolve(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.map_io(key, e)),
        }
    }

    async fn put_raw(&self, key: &str, bytes: Vec<u8>) -> Result<()> {
        let path = self.resolve(key)?;
        let root = self.root.clone();
        let owned_key = key.to_string();
        tokio::task::spawn_blocking(move || write_atomic(&path, &bytes))
            .await
            .map_err(|e| TeamCostError::Other(anyhow::anyhow!("write task panicked: {e}")))?
            .map_err(|e| map_io_for(&root, &owned_key, e))
    }

    async fn head(&self, key: &str) -> Result<bool> {
        let path = self.resolve(key)?;
        match tokio::fs::metadata(&path).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(self.map_io(key, e)),
        }
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let path = self.resolve(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.map_io(key, e)),
        }
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let root = self.root.clone();
        let prefix = prefix.to_string();
        tokio::task::spawn_blocking(move || {
            let mut keys = Vec::new();
            walk(&root, &root, &mut keys)?;
            keys.retain(|k| k.starts_with(&prefix));
            keys.sort();
            Ok(keys)
        })
        .await
        .map_err(|e| TeamCostError::Other(anyhow::anyhow!("list task panicked: {e}")))?
    }
}

/// Write bytes atomically using temp file + rename. Prevents a concurrent
/// reader from ever observing a partially written blob.
fn write_atomic(path: &Path, content: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    // Temp file in the same directory (required for atomic rename).
    let parent = path.parent().unwrap_or(Path::new("."));
    let temp_path = parent.join(format!(
        ".{}.tmp.{}",
        path.file_name().and_then(|n| n.to_str()).unwrap_or("blob"),
        std::process::id()
    ));

    {
        let mut file = std::fs::File::create(&temp_path)?;
        file.write_all(content)?;
        file.sync_all()?;
    }
    std::fs::rename(&temp_path, path)
}

fn map_io_for(root: &Path, key: &str, err: std::io::Error) -> TeamCostError {
    match err.kind() {
        std::io::ErrorKind::PermissionDenied => TeamCostError::AccessDenied {
            key: key.to_string(),
        },
        _ if !root.exists() => TeamCostError::BucketNotFound {
            bucket: root.display().to_string(),
        },
        _ => TeamCostError::Io(err),
    }
}

fn walk(root: &Path, dir: &Path, keys: &mut Vec<String>) -> Result<()> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(TeamCostError::Io(e)),
    };
    for entry in entries {
        let entry = entry.map_err(TeamCostError::Io)?;
        let path = entry.path();
        if path.is_dir() {
            walk(root, &path, keys)?;
        } else if let Ok(rel) = path.strip_prefix(root) {
            // Skip in-flight temp files from concurrent atomic writes.
            let is_temp = rel
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with('.') && n.contains(".tmp."));
            if !is_temp {
                let key = rel
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                keys.push(key);
            }
        }
    }
    Ok(())
}
