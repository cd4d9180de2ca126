//! Offline buffer
//!
//! Remote-bound entries that could not be delivered. Persisted after every
//! mutation so they survive a restart; replayed in batches by the service.

use super::persisted::BoundedLog;
use super::LogEntry;
use crate::constants::OFFLINE_LOGS_KEY;
use crate::storage::Storage;
use std::sync::Arc;
use tracing::warn;

pub struct OfflineBuffer {
    log: BoundedLog,
}

impl OfflineBuffer {
    pub fn open(storage: Arc<dyn Storage>, max_buffer_size: usize) -> Self {
        Self {
            log: BoundedLog::load(OFFLINE_LOGS_KEY, max_buffer_size, storage),
        }
    }

    pub fn push(&mut self, entry: LogEntry) {
        let evicted = self.log.push(entry);
        if evicted > 0 {
            warn!("Offline buffer full, dropped {} oldest entries", evicted);
        }
    }

    /// Remove the first `n` entries for a replay batch
    pub fn take_front(&mut self, n: usize) -> Vec<LogEntry> {
        self.log.take_front(n)
    }

    /// Return an undelivered batch to the front. Returns the evicted count.
    pub fn requeue_front(&mut self, batch: Vec<LogEntry>) -> usize {
        let evicted = self.log.requeue_front(batch);
        if evicted > 0 {
            warn!("Offline buffer full on requeue, dropped {} oldest entries", evicted);
        }
        evicted
    }

    pub fn len(&self) -> usize {
        self.log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }

    pub fn snapshot(&self) -> Vec<LogEntry> {
        self.log.snapshot()
    }

    pub fn clear(&mut self) {
        self.log.clear();
    }
}
