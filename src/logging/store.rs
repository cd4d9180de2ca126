//! Analytics store
//!
//! Persisted history of ERROR and FATAL entries, read by the debug console
//! and by export. Independent of which emitters are enabled.

use super::persisted::BoundedLog;
use super::LogEntry;
use crate::constants::ERROR_LOGS_KEY;
use crate::storage::Storage;
use std::sync::Arc;
use tracing::debug;

pub struct AnalyticsStore {
    log: BoundedLog,
}

impl AnalyticsStore {
    /// Open the store, keeping at most `max_stored_logs` entries
    pub fn open(storage: Arc<dyn Storage>, max_stored_logs: usize) -> Self {
        Self {
            log: BoundedLog::load(ERROR_LOGS_KEY, max_stored_logs, storage),
        }
    }

    /// Append a severe entry; non-severe entries are ignored
    pub fn append(&mut self, entry: &LogEntry) {
        if !entry.level.is_severe() {
            return;
        }
        let evicted = self.log.push(entry.clone());
        if evicted > 0 {
            debug!("Analytics store full, evicted {} oldest", evicted);
        }
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.log.snapshot()
    }

    pub fn len(&self) -> usize {
        self.log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.log.capacity()
    }

    pub fn clear(&mut self) {
        self.log.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::LogLevel;
    use crate::storage::MemoryStorage;
    use proptest::prelude::*;

    fn entry(level: LogLevel, msg: &str) -> LogEntry {
        LogEntry::new("2024-01-01T00:00:00.000Z", level, "VaultService", msg)
    }

    #[test]
    fn test_only_severe_entries_kept() {
        let mut store = AnalyticsStore::open(Arc::new(MemoryStorage::new()), 50);
        store.append(&entry(LogLevel::Info, "info"));
        store.append(&entry(LogLevel::Warn, "warn"));
        store.append(&entry(LogLevel::Error, "error"));
        store.append(&entry(LogLevel::Fatal, "fatal"));

        let levels: Vec<LogLevel> = store.entries().iter().map(|e| e.level).collect();
        assert_eq!(levels, vec![LogLevel::Error, LogLevel::Fatal]);
    }

    #[test]
    fn test_survives_reopen() {
        let storage = Arc::new(MemoryStorage::new());
        {
            let mut store = AnalyticsStore::open(storage.clone(), 50);
            store.append(&entry(LogLevel::Error, "persisted"));
        }
        let reopened = AnalyticsStore::open(storage.clone(), 50);
        assert_eq!(reopened.entries()[0].message, "persisted");
        assert!(storage.get(ERROR_LOGS_KEY).unwrap().is_some());
    }

    #[test]
    fn test_clear_empties_storage() {
        let storage = Arc::new(MemoryStorage::new());
        let mut store = AnalyticsStore::open(storage.clone(), 50);
        store.append(&entry(LogLevel::Fatal, "x"));
        store.clear();
        assert!(store.is_empty());
        assert!(AnalyticsStore::open(storage, 50).is_empty());
    }

    #[test]
    fn test_corrupt_storage_resets() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(ERROR_LOGS_KEY, "[{\"broken\"").unwrap();
        let store = AnalyticsStore::open(storage, 50);
        assert!(store.is_empty());
    }

    proptest! {
        #[test]
        fn prop_bounded_keeps_newest(cap in 1usize..20, n in 0usize..60) {
            let mut store = AnalyticsStore::open(Arc::new(MemoryStorage::new()), cap);
            for i in 0..n {
                store.append(&entry(LogLevel::Error, &i.to_string()));
            }
            let kept: Vec<String> = store.entries().into_iter().map(|e| e.message).collect();
            let expected: Vec<String> = (n.saturating_sub(cap)..n).map(|i| i.to_string()).collect();
            prop_assert_eq!(kept, expected);
        }
    }
}
