//! Live log stream
//!
//! Fan-out of accepted entries to in-process observers (the debug console).
//! Each subscriber owns an unbounded channel: publishing never blocks and
//! never drops. Late subscribers see only what is published after they join.

use super::LogEntry;
use parking_lot::Mutex;
use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver, UnboundedSender};

#[derive(Default)]
pub struct LogStream {
    subscribers: Mutex<Vec<UnboundedSender<LogEntry>>>,
}

impl LogStream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> LogSubscription {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.lock().push(tx);
        LogSubscription { rx }
    }

    /// Deliver to every live subscriber, pruning closed ones
    pub fn publish(&self, entry: &LogEntry) {
        self.subscribers
            .lock()
            .retain(|tx| tx.send(entry.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|tx| !tx.is_closed());
        subscribers.len()
    }
}

/// Receiving end of a stream subscription; dropping it unsubscribes
pub struct LogSubscription {
    rx: UnboundedReceiver<LogEntry>,
}

impl LogSubscription {
    /// Wait for the next entry, `None` once the stream is gone
    pub async fn recv(&mut self) -> Option<LogEntry> {
        self.rx.recv().await
    }

    /// Everything published since the last call, without waiting
    pub fn drain(&mut self) -> Vec<LogEntry> {
        let mut out = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(entry) => out.push(entry),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        out
    }
}
