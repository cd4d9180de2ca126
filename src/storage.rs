//! Persisted key/value storage
//!
//! The pipeline persists its stores through `Storage` so the backend can be
//! swapped: `FileStorage` on disk, `MemoryStorage` in tests.

use crate::error::{DiagError, Result};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub trait Storage: Send + Sync {
    /// Value for `key`, `None` if never written or removed
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

// =============================================================================
// In-memory
// =============================================================================

#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.values.lock().remove(key);
        Ok(())
    }
}

// =============================================================================
// File-backed
// =============================================================================

/// One `<key>.json` file per key inside `dir`
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| DiagError::Io {
            path: dir.clone(),
            source: e,
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let safe: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
            .collect();
        self.dir.join(format!("{}.json", safe))
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(DiagError::Storage {
                key: key.to_string(),
                source: e,
            }),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        // Write-then-rename: readers never observe a partial value
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)
            .and_then(|_| fs::rename(&tmp, &path))
            .map_err(|e| DiagError::Storage {
                key: key.to_string(),
                source: e,
            })
    }

    fn remove(&self, key: &str) -> Result<()> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(DiagError::Storage {
                key: key.to_string(),
                source: e,
            }),
        }
    }
}

#[cfg(test)]
pub(crate) fn unique_temp_dir(tag: &str) -> PathBuf {
    use std::sync::atomic::{AtomicUsize, Ordering};
    static COUNTER: AtomicUsize = AtomicUsize::new(0);

    let pid = std::process::id();
    let ts = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!("vault-diag-{}-{}-{}-{}", tag, pid, ts, n))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_roundtrip_and_remove() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.get("error_logs").unwrap(), None);

        storage.set("error_logs", "[]").unwrap();
        assert_eq!(storage.get("error_logs").unwrap().as_deref(), Some("[]"));

        storage.remove("error_logs").unwrap();
        assert_eq!(storage.get("error_logs").unwrap(), None);
    }

    #[test]
    fn test_file_storage_persists_across_instances() {
        let dir = unique_temp_dir("storage");
        {
            let storage = FileStorage::open(&dir).unwrap();
            storage.set("offline_logs", "[1,2,3]").unwrap();
        }
        let reopened = FileStorage::open(&dir).unwrap();
        assert_eq!(reopened.get("offline_logs").unwrap().as_deref(), Some("[1,2,3]"));

        reopened.remove("offline_logs").unwrap();
        // Removing twice is fine
        reopened.remove("offline_logs").unwrap();
        assert_eq!(reopened.get("offline_logs").unwrap(), None);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_file_storage_sanitizes_key() {
        let dir = unique_temp_dir("storage-key");
        let storage = FileStorage::open(&dir).unwrap();
        storage.set("../escape", "x").unwrap();
        assert!(dir.join("___escape.json").exists());
        let _ = fs::remove_dir_all(&dir);
    }
}
