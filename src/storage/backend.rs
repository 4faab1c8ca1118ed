//! Key-value storage backends
//!
//! The backend is constructed once per process and handed to collaborators;
//! nothing in the crate reaches for an ambient global store.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

/// Errors raised by a storage backend
#[derive(Debug)]
pub enum StorageError {
    /// The medium could not be read
    Read(String),
    /// The medium rejected a write (out of space, permissions, ...)
    Write(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::Read(msg) => write!(f, "Storage read failed: {msg}"),
            StorageError::Write(msg) => write!(f, "Storage write failed: {msg}"),
        }
    }
}

impl std::error::Error for StorageError {}

/// Minimal key-value persistence seam
///
/// Models the per-origin local storage the web surfaces use: opaque string
/// keys, opaque string values, no transactions.
pub trait StorageBackend: Send + Sync {
    /// Read the value stored under `key`, if any
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Read`] if the medium itself cannot be read.
    /// A missing key is `Ok(None)`, not an error.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Write`] if the medium rejects the write
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove the value stored under `key`, if any
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Write`] if the removal cannot be persisted
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// In-memory backend for tests and ephemeral processes
#[derive(Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageBackend for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self
            .entries
            .lock()
            .map_err(|e| StorageError::Read(e.to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| StorageError::Write(e.to_string()))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| StorageError::Write(e.to_string()))?;
        entries.remove(key);
        Ok(())
    }
}

/// File-backed backend: one JSON object per state file
///
/// The whole map is rewritten on every mutation. State files are small (a
/// session record, a conversation id, a short history array), so the
/// read-modify-write cycle is not worth optimizing.
pub struct FileStorage {
    path: PathBuf,
    // Serializes read-modify-write cycles within the process
    lock: Mutex<()>,
}

impl FileStorage {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    fn load_map(&self) -> Result<HashMap<String, String>, StorageError> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }
        let raw = fs::read_to_string(&self.path).map_err(|e| StorageError::Read(e.to_string()))?;
        if raw.trim().is_empty() {
            return Ok(HashMap::new());
        }
        serde_json::from_str(&raw).map_err(|e| StorageError::Read(e.to_string()))
    }

    fn save_map(&self, map: &HashMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| StorageError::Write(e.to_string()))?;
            }
        }
        let raw = serde_json::to_string(map).map_err(|e| StorageError::Write(e.to_string()))?;
        fs::write(&self.path, raw).map_err(|e| StorageError::Write(e.to_string()))
    }
}

impl StorageBackend for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let _guard = self
            .lock
            .lock()
            .map_err(|e| StorageError::Read(e.to_string()))?;
        Ok(self.load_map()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let _guard = self
            .lock
            .lock()
            .map_err(|e| StorageError::Write(e.to_string()))?;
        let mut map = self.load_map()?;
        map.insert(key.to_string(), value.to_string());
        self.save_map(&map)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let _guard = self
            .lock
            .lock()
            .map_err(|e| StorageError::Write(e.to_string()))?;
        let mut map = self.load_map()?;
        if map.remove(key).is_some() {
            self.save_map(&map)?;
        }
        Ok(())
    }
}
