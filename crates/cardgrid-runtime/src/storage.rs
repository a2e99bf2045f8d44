#![forbid(unsafe_code)]

//! Durable key-value storage for serialized layout snapshots.
//!
//! The engine stores exactly one named blob (the layout snapshot JSON). A
//! [`StorageBackend`] reads, writes, and deletes such blobs.
//!
//! # Backends
//!
//! - [`MemoryStorage`]: in-process map. Clones share state so a test can
//!   inspect what the engine wrote. Can simulate quota and outage failures.
//! - [`FileStorage`]: one `<key>.json` file per key inside a directory,
//!   written with temp-file-then-rename so a crash never leaves a torn file.
//!
//! # Failure Modes
//!
//! | Failure | Error |
//! |---------|-------|
//! | Store disabled or unreachable | [`StorageError::Unavailable`] |
//! | Blob larger than the remaining quota | [`StorageError::QuotaExceeded`] |
//! | Key with path separators or empty | [`StorageError::InvalidKey`] |
//! | Filesystem error | [`StorageError::Io`] |

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use rustc_hash::FxHashMap;
use thiserror::Error;

/// Errors from a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("storage quota exceeded for {key:?}: {requested} bytes requested, {limit} allowed")]
    QuotaExceeded {
        key: String,
        requested: usize,
        limit: usize,
    },
    #[error("invalid storage key {0:?}")]
    InvalidKey(String),
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to serialize layout: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// A store holding named text blobs.
pub trait StorageBackend {
    /// Short label for logs.
    fn name(&self) -> &str;

    /// Read a blob. A missing key is `Ok(None)`, not an error.
    fn load(&self, key: &str) -> StorageResult<Option<String>>;

    /// Write a blob, replacing any previous value.
    fn store(&mut self, key: &str, value: &str) -> StorageResult<()>;

    /// Delete a blob. Deleting a missing key succeeds.
    fn remove(&mut self, key: &str) -> StorageResult<()>;
}

impl<T: StorageBackend + ?Sized> StorageBackend for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn load(&self, key: &str) -> StorageResult<Option<String>> {
        (**self).load(key)
    }

    fn store(&mut self, key: &str, value: &str) -> StorageResult<()> {
        (**self).store(key, value)
    }

    fn remove(&mut self, key: &str) -> StorageResult<()> {
        (**self).remove(key)
    }
}

/// Keys become file names, so keep them to a safe alphabet: ASCII
/// alphanumerics plus `-`, `_` and `.`, not starting with `.`.
#[must_use]
pub fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

fn check_key(key: &str) -> StorageResult<()> {
    if is_valid_key(key) {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_owned()))
    }
}

// =========================================================================
// MemoryStorage
// =========================================================================

#[derive(Debug, Default)]
struct MemoryInner {
    entries: FxHashMap<String, String>,
    quota_bytes: Option<usize>,
    unavailable: Option<String>,
}

/// In-memory backend with shared state.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    inner: Arc<Mutex<MemoryInner>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject writes whose total stored size would exceed `bytes`.
    #[must_use]
    pub fn with_quota(self, bytes: usize) -> Self {
        self.lock().quota_bytes = Some(bytes);
        self
    }

    /// Make every operation fail with [`StorageError::Unavailable`].
    pub fn set_unavailable(&self, reason: Option<&str>) {
        self.lock().unavailable = reason.map(str::to_owned);
    }

    /// Raw stored value, bypassing availability checks.
    #[must_use]
    pub fn peek(&self, key: &str) -> Option<String> {
        self.lock().entries.get(key).cloned()
    }

    /// Seed a raw value, bypassing checks.
    pub fn insert_raw(&self, key: &str, value: impl Into<String>) {
        self.lock().entries.insert(key.to_owned(), value.into());
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, MemoryInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl MemoryInner {
    fn check_available(&self) -> StorageResult<()> {
        match &self.unavailable {
            Some(reason) => Err(StorageError::Unavailable(reason.clone())),
            None => Ok(()),
        }
    }
}

impl StorageBackend for MemoryStorage {
    fn name(&self) -> &str {
        "memory"
    }

    fn load(&self, key: &str) -> StorageResult<Option<String>> {
        check_key(key)?;
        let inner = self.lock();
        inner.check_available()?;
        Ok(inner.entries.get(key).cloned())
    }

    fn store(&mut self, key: &str, value: &str) -> StorageResult<()> {
        check_key(key)?;
        let mut inner = self.lock();
        inner.check_available()?;
        if let Some(limit) = inner.quota_bytes {
            let others: usize = inner
                .entries
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(_, v)| v.len())
                .sum();
            let requested = others + value.len();
            if requested > limit {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_owned(),
                    requested,
                    limit,
                });
            }
        }
        inner.entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> StorageResult<()> {
        check_key(key)?;
        let mut inner = self.lock();
        inner.check_available()?;
        inner.entries.remove(key);
        Ok(())
    }
}

// =========================================================================
// FileStorage
// =========================================================================

/// Directory-backed storage, one JSON file per key.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Store blobs under `dir`. The directory is created on first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file that holds `key`.
    pub fn path_for(&self, key: &str) -> StorageResult<PathBuf> {
        check_key(key)?;
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl StorageBackend for FileStorage {
    fn name(&self) -> &str {
        "file"
    }

    fn load(&self, key: &str) -> StorageResult<Option<String>> {
        let path = self.path_for(key)?;
        match std::fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn store(&mut self, key: &str, value: &str) -> StorageResult<()> {
        let path = self.path_for(key)?;
        std::fs::create_dir_all(&self.dir)?;
        // Atomic write: temp file then rename
        let temp = path.with_extension("json.tmp");
        std::fs::write(&temp, value)?;
        std::fs::rename(&temp, &path)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> StorageResult<()> {
        let path = self.path_for(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl fmt::Display for FileStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "file:{}", self.dir.display())
    }
}
