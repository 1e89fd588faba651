//! Persistent storage
//!
//! This module handles persistence of settings, model presets and the
//! enhanced-prompt library behind a small key-value port.

pub mod collection;
pub mod library;
pub mod presets;
pub mod settings;

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use thiserror::Error;

pub use collection::{Collection, Record};

/// Environment variable overriding the data directory
pub const DATA_DIR_ENV: &str = "PROMPTFORGE_DATA_DIR";

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Could not determine a data directory")]
    NoDataDir,
    #[error("Invalid storage key: {0}")]
    InvalidKey(String),
}

/// Get the application data directory
///
/// `PROMPTFORGE_DATA_DIR` wins over the platform default.
pub fn get_data_dir() -> Result<PathBuf, StorageError> {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        if !dir.trim().is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }

    // Linux: ~/.local/share/promptforge
    // macOS: ~/Library/Application Support/com.PromptForge.PromptForge
    // Windows: %APPDATA%\PromptForge\PromptForge\data
    directories::ProjectDirs::from("com", "PromptForge", "PromptForge")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or(StorageError::NoDataDir)
}

/// Key-value persistence port
///
/// Blobs are whole serialized documents; there are no partial writes.
pub trait KeyValueStore: Send + Sync {
    /// Read the blob stored under `key`, `None` when nothing was written yet
    fn read(&self, key: &str) -> Result<Option<String>, StorageError>;
    /// Replace the blob stored under `key`
    fn write(&self, key: &str, blob: &str) -> Result<(), StorageError>;
}

/// File-backed store: one `<key>.json` file per key
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Store rooted at the application data directory
    pub fn open_default() -> Result<Self, StorageError> {
        Ok(Self::new(get_data_dir()?))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(format!("{}.json", key)))
    }
}

impl KeyValueStore for FileStore {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(&path)?))
    }

    fn write(&self, key: &str, blob: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;

        // Ensure the parent directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(&path, blob)?;
        tracing::debug!("Wrote {} ({} bytes)", path.display(), blob.len());
        Ok(())
    }
}

/// In-memory store for tests and throwaway sessions
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with a single entry
    pub fn with_entry(key: &str, blob: &str) -> Self {
        let store = Self::new();
        store
            .entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), blob.to_string());
        store
    }
}

impl KeyValueStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Ok(entries.get(key).cloned())
    }

    fn write(&self, key: &str, blob: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.to_string(), blob.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_store_missing_key_reads_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        assert!(store.read("presets").unwrap().is_none());
    }

    #[test]
    fn test_file_store_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("nested").join("data"));

        store.write("presets", "[]").unwrap();
        assert_eq!(store.read("presets").unwrap().as_deref(), Some("[]"));
        assert!(dir.path().join("nested/data/presets.json").exists());
    }

    #[test]
    fn test_file_store_rejects_path_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        assert!(matches!(
            store.write("../escape", "x"),
            Err(StorageError::InvalidKey(_))
        ));
        assert!(matches!(store.read(""), Err(StorageError::InvalidKey(_))));
    }

    #[test]
    fn test_memory_store_overwrites() {
        let store = MemoryStore::with_entry("k", "one");
        store.write("k", "two").unwrap();
        assert_eq!(store.read("k").unwrap().as_deref(), Some("two"));
        assert!(store.read("other").unwrap().is_none());
    }
}
