//! Bounded, persisted entry queue
//!
//! Shared backing for the analytics store and the offline buffer: a FIFO of
//! `LogEntry` capped at `capacity` (oldest evicted), written through to
//! `Storage` as a JSON array after every mutation.

use super::LogEntry;
use crate::error::{DiagError, Result};
use crate::storage::Storage;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::warn;

pub struct BoundedLog {
    key: &'static str,
    capacity: usize,
    entries: VecDeque<LogEntry>,
    storage: Arc<dyn Storage>,
}

impl BoundedLog {
    /// Load from storage. Unreadable or malformed data resets to empty.
    pub fn load(key: &'static str, capacity: usize, storage: Arc<dyn Storage>) -> Self {
        let entries = match read_entries(key, storage.as_ref()) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("{}, resetting", e);
                VecDeque::new()
            }
        };

        let mut log = Self {
            key,
            capacity: capacity.max(1),
            entries,
            storage,
        };
        if log.trim() > 0 {
            log.persist();
        }
        log
    }

    /// Append, evicting the oldest entries past capacity. Returns evicted count.
    pub fn push(&mut self, entry: LogEntry) -> usize {
        self.entries.push_back(entry);
        let evicted = self.trim();
        self.persist();
        evicted
    }

    /// Remove up to `n` entries from the front
    pub fn take_front(&mut self, n: usize) -> Vec<LogEntry> {
        let n = n.min(self.entries.len());
        let taken: Vec<LogEntry> = self.entries.drain(..n).collect();
        if !taken.is_empty() {
            self.persist();
        }
        taken
    }

    /// Put a batch back at the front, preserving its order
    ///
    /// On overflow the oldest entries go first, as with `push`. Returns the
    /// evicted count.
    pub fn requeue_front(&mut self, batch: Vec<LogEntry>) -> usize {
        for entry in batch.into_iter().rev() {
            self.entries.push_front(entry);
        }
        let evicted = self.trim();
        self.persist();
        evicted
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        if let Err(e) = self.storage.remove(self.key) {
            warn!("Failed to clear '{}': {}", self.key, e);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn entries(&self) -> &VecDeque<LogEntry> {
        &self.entries
    }

    pub fn snapshot(&self) -> Vec<LogEntry> {
        self.entries.iter().cloned().collect()
    }

    fn trim(&mut self) -> usize {
        let mut evicted = 0;
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
            evicted += 1;
        }
        evicted
    }

    fn persist(&self) {
        let result = serde_json::to_string(&self.entries)
            .map_err(|e| DiagError::Encode { source: e })
            .and_then(|json| self.storage.set(self.key, &json));
        if let Err(e) = result {
            warn!("Failed to persist '{}': {}", self.key, e);
        }
    }
}

fn read_entries(key: &str, storage: &dyn Storage) -> Result<VecDeque<LogEntry>> {
    match storage.get(key)? {
        None => Ok(VecDeque::new()),
        Some(raw) if raw.trim().is_empty() => Ok(VecDeque::new()),
        Some(raw) => serde_json::from_str(&raw).map_err(|e| DiagError::StorageDecode {
            key: key.to_string(),
            source: e,
        }),
    }
}
