//! Persisted "has been requested" flags
//!
//! The only way to tell `NOT_REQUESTED` from `DENIED_ALWAYS` is to remember whether
//! a permission was ever presented to the user. That memory lives in a
//! [`FlagStore`]: a durable map from logical permission name to `true`. Flags are
//! set just before a prompt is issued and never cleared.
//!
//! Two implementations are provided:
//!
//! - [`FileFlagStore`]: JSON file, survives process restarts
//! - [`MemoryFlagStore`]: in-memory, for tests and ephemeral hosts

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::warn;

use crate::catalog::Permission;

/// Error type for flag store operations
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the backing file failed
    #[error("Failed to access flag store: {0}")]
    Io(#[from] std::io::Error),

    /// The backing file is not valid store JSON
    #[error("Failed to parse flag store: {0}")]
    Parse(#[from] serde_json::Error),

    /// The store rejects writes
    #[error("Flag store is read-only")]
    ReadOnly,
}

/// Durable per-permission requested flags
#[async_trait]
pub trait FlagStore: Send + Sync {
    /// Record that `permission` has been presented to the user
    ///
    /// Resolves once the write is durable.
    async fn set_requested(&self, permission: Permission) -> Result<(), StoreError>;

    /// Whether `permission` was ever recorded; `false` if never written
    fn was_requested(&self, permission: Permission) -> bool;
}

// ============================================================================
// File-backed Flag Store
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
struct FlagFileData {
    version: u32,
    requested: BTreeMap<String, bool>,
}

impl Default for FlagFileData {
    fn default() -> Self {
        Self {
            version: 1,
            requested: BTreeMap::new(),
        }
    }
}

/// Flag store persisted as a JSON file
///
/// The file is read once when the store is opened and rewritten in full on
/// every new flag. Writers are serialized and each rewrite lands through a
/// rename, so the file on disk always holds a complete flag set.
pub struct FileFlagStore {
    path: PathBuf,
    data: RwLock<FlagFileData>,
    write_lock: Mutex<()>,
}

impl FileFlagStore {
    /// Open the store at `path`, creating an empty one if the file does not exist
    ///
    /// A file that exists but is not valid store JSON is logged and replaced by
    /// an empty store on the next write; only an unreadable file is an error.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();

        let data = if path.exists() {
            let bytes = std::fs::read(&path)?;
            match serde_json::from_slice(&bytes) {
                Ok(data) => data,
                Err(e) => {
                    warn!(
                        "Discarding corrupt flag store at {}: {}",
                        path.display(),
                        e
                    );
                    FlagFileData::default()
                }
            }
        } else {
            FlagFileData::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
            write_lock: Mutex::new(()),
        })
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    async fn save(&self, bytes: Vec<u8>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let staging = self.staging_path();
        tokio::fs::write(&staging, bytes).await?;
        tokio::fs::rename(&staging, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl FlagStore for FileFlagStore {
    async fn set_requested(&self, permission: Permission) -> Result<(), StoreError> {
        // held until the rename so the newest snapshot is always written last
        let _writer = self.write_lock.lock().await;
        let bytes = {
            let mut data = self.data.write().unwrap_or_else(PoisonError::into_inner);
            data.requested.insert(permission.name().to_string(), true);
            serde_json::to_vec_pretty(&*data)?
        };
        self.save(bytes).await
    }

    fn was_requested(&self, permission: Permission) -> bool {
        let data = self.data.read().unwrap_or_else(PoisonError::into_inner);
        data.requested
            .get(permission.name())
            .copied()
            .unwrap_or(false)
    }
}

impl std::fmt::Debug for FileFlagStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileFlagStore")
            .field("path", &self.path)
            .finish()
    }
}

// ============================================================================
// In-Memory Flag Store
// ============================================================================

/// In-memory flag store
#[derive(Debug, Default)]
pub struct MemoryFlagStore {
    requested: RwLock<BTreeMap<Permission, bool>>,
}

impl MemoryFlagStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store with `permissions` already flagged
    pub fn with_requested(permissions: impl IntoIterator<Item = Permission>) -> Self {
        Self {
            requested: RwLock::new(permissions.into_iter().map(|p| (p, true)).collect()),
        }
    }

    /// Number of flagged permissions
    pub fn len(&self) -> usize {
        self.requested
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether no permission has been flagged
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl FlagStore for MemoryFlagStore {
    async fn set_requested(&self, permission: Permission) -> Result<(), StoreError> {
        self.requested
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(permission, true);
        Ok(())
    }

    fn was_requested(&self, permission: Permission) -> bool {
        self.requested
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&permission)
            .copied()
            .unwrap_or(false)
    }
}

// ============================================================================
// Read-Only Flag Store
// ============================================================================

/// Read-only wrapper for any flag store
///
/// Reads pass through; every write fails with [`StoreError::ReadOnly`].
#[derive(Debug)]
pub struct ReadOnlyFlagStore<S: FlagStore> {
    inner: S,
}

impl<S: FlagStore> ReadOnlyFlagStore<S> {
    /// Wrap `inner`
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<S: FlagStore> FlagStore for ReadOnlyFlagStore<S> {
    async fn set_requested(&self, _permission: Permission) -> Result<(), StoreError> {
        Err(StoreError::ReadOnly)
    }

    fn was_requested(&self, permission: Permission) -> bool {
        self.inner.was_requested(permission)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_read_only_store() {
        let store = ReadOnlyFlagStore::new(MemoryFlagStore::with_requested([Permission::Camera]));
        assert!(store.was_requested(Permission::Camera));
        assert!(matches!(
            store.set_requested(Permission::ReadSms).await,
            Err(StoreError::ReadOnly)
        ));
        assert!(!store.was_requested(Permission::ReadSms));
    }

    #[tokio::test]
    async fn test_memory_store() {
        let store = MemoryFlagStore::new();
        assert!(store.is_empty());
        assert!(!store.was_requested(Permission::Camera));

        store.set_requested(Permission::Camera).await.unwrap();
        assert!(store.was_requested(Permission::Camera));
        assert!(!store.was_requested(Permission::ReadSms));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_memory_store_set_is_idempotent() {
        let store = MemoryFlagStore::with_requested([Permission::ReadSms]);
        store.set_requested(Permission::ReadSms).await.unwrap();
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("flags.json");

        let store = FileFlagStore::open(&path).unwrap();
        assert!(!store.was_requested(Permission::RecordAudio));
        store.set_requested(Permission::RecordAudio).await.unwrap();
        assert!(path.exists());

        let reopened = FileFlagStore::open(&path).unwrap();
        assert!(reopened.was_requested(Permission::RecordAudio));
        assert!(!reopened.was_requested(Permission::Camera));
    }

    #[tokio::test]
    async fn test_file_store_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flags.json");

        let store = FileFlagStore::open(&path).unwrap();
        store.set_requested(Permission::ReadSms).await.unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["version"], 1);
        assert_eq!(raw["requested"]["READ_SMS"], true);
    }

    #[tokio::test]
    async fn test_file_store_recovers_from_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flags.json");
        std::fs::write(&path, "{ \"version\": 1, \"requested\": {} }\n}").unwrap();

        let store = FileFlagStore::open(&path).unwrap();
        assert!(!store.was_requested(Permission::Camera));

        store.set_requested(Permission::Camera).await.unwrap();
        let reopened = FileFlagStore::open(&path).unwrap();
        assert!(reopened.was_requested(Permission::Camera));
    }

    #[test]
    fn test_file_store_unreadable_path() {
        let dir = tempfile::tempdir().unwrap();

        assert!(matches!(
            FileFlagStore::open(dir.path()),
            Err(StoreError::Io(_))
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_file_store_concurrent_writers_keep_every_flag() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flags.json");
        let store = std::sync::Arc::new(FileFlagStore::open(&path).unwrap());

        let permissions: Vec<Permission> = Permission::ALL.iter().copied().take(16).collect();
        let mut handles = vec![];
        for permission in permissions.clone() {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.set_requested(permission).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let reopened = FileFlagStore::open(&path).unwrap();
        for permission in permissions {
            assert!(reopened.was_requested(permission), "{} lost", permission);
        }
        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["requested"].as_object().unwrap().len(), 16);
        assert!(!dir.path().join("flags.json.tmp").exists());
    }
}
