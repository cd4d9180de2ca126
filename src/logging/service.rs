//! Logging service
//!
//! Single entry point for application logging. An accepted call runs:
//!
//! ```text
//! filter -> build -> stream -> console -> remote/offline -> file -> analytics
//! ```
//!
//! Nothing on this path returns an error to the caller. Emitter and storage
//! failures are reported through `tracing` and the pipeline carries on.

use super::builder::{EntryBuilder, LogOptions};
use super::context::{RuntimeContext, ServerContext};
use super::filter::LevelFilter;
use super::offline::OfflineBuffer;
use super::store::AnalyticsStore;
use super::stream::{LogStream, LogSubscription};
use super::{LogEntry, LogLevel};
use crate::clock::{Clock, SystemClock};
use crate::config::LoggingConfig;
use crate::constants::REPLAY_BATCH_SIZE;
use crate::emitter::{ConsoleEmitter, FileEmitter, FlushReport, HttpSink, RemoteEmitter, RemoteSink};
use crate::error::Result;
use crate::export::{self, ExportArtifact, ExportOptions};
use crate::storage::{MemoryStorage, Storage};
use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use parking_lot::Mutex;
use std::fmt;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::{watch, Notify};
use tracing::{debug, info, warn};

// =============================================================================
// Collaborators
// =============================================================================

/// Injected dependencies; everything but storage has a default
pub struct Collaborators {
    pub storage: Arc<dyn Storage>,
    pub clock: Arc<dyn Clock>,
    pub runtime: Arc<dyn RuntimeContext>,
    /// `None` builds one HTTP sink per configured endpoint
    pub remote_sinks: Option<Vec<Arc<dyn RemoteSink>>>,
    /// `None` writes to stderr
    pub console: Option<ConsoleEmitter>,
}

impl Collaborators {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            storage,
            clock: Arc::new(SystemClock),
            runtime: Arc::new(ServerContext),
            remote_sinks: None,
            console: None,
        }
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn runtime(mut self, runtime: Arc<dyn RuntimeContext>) -> Self {
        self.runtime = runtime;
        self
    }

    pub fn remote_sinks(mut self, sinks: Vec<Arc<dyn RemoteSink>>) -> Self {
        self.remote_sinks = Some(sinks);
        self
    }

    pub fn console(mut self, console: ConsoleEmitter) -> Self {
        self.console = Some(console);
        self
    }
}

// =============================================================================
// Replay report
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplayReport {
    /// Entries accepted by every endpoint
    pub delivered: usize,
    pub batches: usize,
    /// Entries put back after a failed batch
    pub requeued: usize,
    /// Still buffered when replay stopped
    pub remaining: usize,
    pub error: Option<String>,
    /// Another replay was already in flight; nothing was done
    pub already_running: bool,
}

impl ReplayReport {
    pub fn already_running() -> Self {
        Self {
            already_running: true,
            ..Default::default()
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.already_running && self.error.is_none() && self.remaining == 0
    }
}

impl fmt::Display for ReplayReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.already_running {
            return write!(f, "Offline replay already in progress");
        }
        write!(
            f,
            "Replayed {} entries in {} batch(es), {} remaining",
            self.delivered, self.batches, self.remaining
        )?;
        if let Some(error) = &self.error {
            write!(f, " (stopped: {})", error)?;
        }
        Ok(())
    }
}

// =============================================================================
// Service
// =============================================================================

/// Cheap to clone; all clones share one pipeline
#[derive(Clone)]
pub struct LoggingService {
    inner: Arc<Inner>,
}

struct Inner {
    config: LoggingConfig,
    filter: LevelFilter,
    builder: EntryBuilder,
    clock: Arc<dyn Clock>,
    stream: LogStream,
    console: Option<ConsoleEmitter>,
    remote: RemoteEmitter,
    file: Option<FileEmitter>,
    offline: Mutex<OfflineBuffer>,
    analytics: Mutex<AnalyticsStore>,
    online: watch::Sender<bool>,
    replaying: AtomicBool,
    in_flight: AtomicUsize,
    settled: Notify,
}

/// Clears the replay flag when a replay ends
struct ReplayGuard<'a>(&'a AtomicBool);

impl Drop for ReplayGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Counts a live delivery as finished when its task ends, even on panic
struct InFlightGuard<'a>(&'a Inner);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if self.0.in_flight.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.0.settled.notify_waiters();
        }
    }
}

impl LoggingService {
    pub fn new(config: LoggingConfig, collaborators: Collaborators) -> Self {
        let Collaborators {
            storage,
            clock,
            runtime,
            remote_sinks,
            console,
        } = collaborators;

        let filter = LevelFilter::new(
            config.effective_min_level(),
            config.filters.exclude_sources.iter().cloned(),
        );
        let builder = EntryBuilder::new(
            clock.clone(),
            runtime,
            config.app_version.clone(),
            config.redact_stacks(),
            config.filters.custom.clone(),
        );

        let console = config
            .emitters
            .console
            .then(|| console.unwrap_or_else(|| ConsoleEmitter::stderr(config.production)));

        let sinks = match remote_sinks {
            Some(sinks) => sinks,
            None => HttpSink::for_endpoints(&config.remote_endpoints).unwrap_or_else(|e| {
                warn!("Remote logging unavailable: {}", e);
                Vec::new()
            }),
        };

        let file = (config.emitters.file && config.file.enabled)
            .then(|| FileEmitter::new(config.file.clone(), clock.clone()));

        let offline = OfflineBuffer::open(storage.clone(), config.offline.max_buffer_size);
        let analytics = AnalyticsStore::open(storage, config.max_stored_logs);
        let (online, _) = watch::channel(true);

        debug!(
            "Logging service ready (min level {}, {} remote endpoint(s), {} buffered offline)",
            filter.min_level(),
            sinks.len(),
            offline.len()
        );

        Self {
            inner: Arc::new(Inner {
                config,
                filter,
                builder,
                clock,
                stream: LogStream::new(),
                console,
                remote: RemoteEmitter::new(sinks),
                file,
                offline: Mutex::new(offline),
                analytics: Mutex::new(analytics),
                online,
                replaying: AtomicBool::new(false),
                in_flight: AtomicUsize::new(0),
                settled: Notify::new(),
            }),
        }
    }

    /// Memory-backed service with a silent console, for tests and tooling
    pub fn in_memory(config: LoggingConfig) -> Self {
        Self::new(
            config,
            Collaborators::new(Arc::new(MemoryStorage::new()))
                .console(ConsoleEmitter::with_writer(false, Box::new(io::sink()), false)),
        )
    }

    pub fn config(&self) -> &LoggingConfig {
        &self.inner.config
    }

    // === Entry points ===

    /// Log at `level`; `None` when the filter rejected the call
    pub fn log(
        &self,
        level: LogLevel,
        source: &str,
        message: &str,
        options: LogOptions,
    ) -> Option<LogEntry> {
        let inner = &self.inner;
        if !inner.filter.allows(level, source) {
            return None;
        }

        let entry = inner.builder.build(level, source, message, &options);

        inner.stream.publish(&entry);

        if let Some(console) = &inner.console {
            console.emit(&entry);
        }

        if inner.config.emitters.remote {
            self.dispatch_remote(entry.clone());
        }

        if let Some(file) = &inner.file {
            file.push(entry.clone());
        }

        if entry.level.is_severe() {
            inner.analytics.lock().append(&entry);
        }

        Some(entry)
    }

    pub fn debug(&self, source: &str, message: &str, options: LogOptions) -> Option<LogEntry> {
        self.log(LogLevel::Debug, source, message, options)
    }

    pub fn info(&self, source: &str, message: &str, options: LogOptions) -> Option<LogEntry> {
        self.log(LogLevel::Info, source, message, options)
    }

    pub fn warn(&self, source: &str, message: &str, options: LogOptions) -> Option<LogEntry> {
        self.log(LogLevel::Warn, source, message, options)
    }

    pub fn error(&self, source: &str, message: &str, options: LogOptions) -> Option<LogEntry> {
        self.log(LogLevel::Error, source, message, options)
    }

    pub fn fatal(&self, source: &str, message: &str, options: LogOptions) -> Option<LogEntry> {
        self.log(LogLevel::Fatal, source, message, options)
    }

    // === Remote ===

    fn dispatch_remote(&self, entry: LogEntry) {
        let offline_enabled = self.inner.config.offline.enabled;

        if !self.is_online() && offline_enabled {
            self.inner.offline.lock().push(entry);
            return;
        }

        match Handle::try_current() {
            Ok(handle) => {
                self.inner.in_flight.fetch_add(1, Ordering::AcqRel);
                let service = self.clone();
                handle.spawn(async move {
                    let _guard = InFlightGuard(&service.inner);
                    service.deliver_live(entry).await;
                });
            }
            Err(_) => {
                warn!("No async runtime, remote log delivery skipped");
                if offline_enabled {
                    self.inner.offline.lock().push(entry);
                }
            }
        }
    }

    async fn deliver_live(&self, entry: LogEntry) {
        if let Err(e) = self.inner.remote.deliver(&entry).await {
            warn!("Remote log delivery failed: {}", e);
            if self.inner.config.offline.enabled {
                self.inner.offline.lock().push(entry);
            }
        }
    }

    /// Wait until every spawned live delivery has finished
    pub async fn settle(&self) {
        loop {
            let notified = self.inner.settled.notified();
            if self.inner.in_flight.load(Ordering::Acquire) == 0 {
                return;
            }
            notified.await;
        }
    }

    pub fn remote_endpoints(&self) -> Vec<String> {
        self.inner.remote.endpoints()
    }

    // === Connectivity & replay ===

    pub fn is_online(&self) -> bool {
        *self.inner.online.borrow()
    }

    /// Watch connectivity transitions
    pub fn connectivity(&self) -> watch::Receiver<bool> {
        self.inner.online.subscribe()
    }

    /// Record connectivity; a reconnect spawns a replay when configured
    pub fn set_online(&self, online: bool) {
        if self.record_online(online) {
            match Handle::try_current() {
                Ok(handle) => {
                    let service = self.clone();
                    handle.spawn(async move {
                        let report = service.sync_offline().await;
                        info!("{}", report);
                    });
                }
                Err(_) => warn!("No async runtime, offline replay deferred"),
            }
        }
    }

    /// Same as `set_online`, but waits for the triggered replay
    pub async fn handle_connectivity(&self, online: bool) -> Option<ReplayReport> {
        if self.record_online(online) {
            Some(self.sync_offline().await)
        } else {
            None
        }
    }

    /// Store the new state; true when a replay should follow
    fn record_online(&self, online: bool) -> bool {
        let was_online = self.inner.online.send_replace(online);
        let offline = &self.inner.config.offline;
        !was_online && online && offline.enabled && offline.sync_when_online
    }

    /// Replay the offline buffer in batches
    ///
    /// Each batch is delivered concurrently as retry-tagged copies. A batch
    /// with any failure goes back to the front of the buffer and replay stops.
    pub async fn sync_offline(&self) -> ReplayReport {
        let inner = &self.inner;
        if inner.replaying.swap(true, Ordering::AcqRel) {
            return ReplayReport::already_running();
        }
        let _guard = ReplayGuard(&inner.replaying);

        let mut report = ReplayReport::default();
        loop {
            let batch = inner.offline.lock().take_front(REPLAY_BATCH_SIZE);
            if batch.is_empty() {
                break;
            }

            let retry_at = inner.clock.timestamp();
            let retries: Vec<LogEntry> = batch.iter().map(|e| e.as_retry(retry_at.clone())).collect();
            let results = join_all(retries.iter().map(|e| inner.remote.deliver(e))).await;

            if let Some(e) = results.into_iter().find_map(|r| r.err()) {
                warn!("Offline replay stopped, {} entries requeued: {}", batch.len(), e);
                report.requeued = batch.len();
                report.error = Some(e.to_string());
                inner.offline.lock().requeue_front(batch);
                break;
            }

            report.delivered += batch.len();
            report.batches += 1;

            if inner.offline.lock().is_empty() {
                break;
            }
            tokio::time::sleep(inner.config.replay_batch_delay()).await;
        }

        report.remaining = inner.offline.lock().len();
        report
    }

    pub fn offline_logs(&self) -> Vec<LogEntry> {
        self.inner.offline.lock().snapshot()
    }

    pub fn offline_count(&self) -> usize {
        self.inner.offline.lock().len()
    }

    // === Analytics ===

    pub fn stored_logs(&self) -> Vec<LogEntry> {
        self.inner.analytics.lock().entries()
    }

    pub fn stored_count(&self) -> usize {
        self.inner.analytics.lock().len()
    }

    pub fn clear_stored_logs(&self) {
        self.inner.analytics.lock().clear();
    }

    pub fn export_stored(&self, options: &ExportOptions) -> Result<ExportArtifact> {
        export::render(&self.stored_logs(), options, self.now())
    }

    /// Current time on the pipeline clock
    pub fn now(&self) -> DateTime<Utc> {
        self.inner.clock.now()
    }

    // === Stream & files ===

    pub fn subscribe(&self) -> LogSubscription {
        self.inner.stream.subscribe()
    }

    /// Flush buffered file entries now
    pub fn flush_files(&self) -> Result<FlushReport> {
        match &self.inner.file {
            Some(file) => file.flush(),
            None => Ok(FlushReport::default()),
        }
    }

    pub fn file_pending(&self) -> usize {
        self.inner.file.as_ref().map(FileEmitter::pending).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::builder::ErrorInfo;
    use crate::clock::ManualClock;
    use crate::error::DiagError;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    /// Sink that fails while `fail` is set
    #[derive(Default)]
    struct ScriptedSink {
        fail: AtomicBool,
        seen: Mutex<Vec<LogEntry>>,
    }

    #[async_trait]
    impl RemoteSink for ScriptedSink {
        fn endpoint(&self) -> &str {
            "http://scripted"
        }

        async fn send(&self, entry: &LogEntry) -> Result<()> {
            self.seen.lock().push(entry.clone());
            if self.fail.load(Ordering::SeqCst) {
                Err(DiagError::RemoteStatus {
                    endpoint: "http://scripted".into(),
                    status: 500,
                })
            } else {
                Ok(())
            }
        }
    }

    fn remote_config() -> LoggingConfig {
        let mut config = LoggingConfig::default();
        config.emitters.console = false;
        config.emitters.remote = true;
        config.replay_batch_delay_ms = 0;
        config
    }

    fn service_with(config: LoggingConfig, sink: Arc<ScriptedSink>) -> LoggingService {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        LoggingService::new(
            config,
            Collaborators::new(Arc::new(MemoryStorage::new()))
                .clock(Arc::new(clock))
                .remote_sinks(vec![sink as Arc<dyn RemoteSink>]),
        )
    }

    #[test]
    fn test_filtered_call_produces_nothing() {
        let mut config = LoggingConfig::default();
        config.production = true;
        let service = LoggingService::in_memory(config);
        let mut sub = service.subscribe();

        assert!(service.debug("VaultService", "cache hit", LogOptions::new()).is_none());
        assert!(sub.drain().is_empty());
        assert!(service.info("VaultService", "loaded", LogOptions::new()).is_some());
        assert_eq!(sub.drain().len(), 1);
    }

    #[test]
    fn test_excluded_source_suppressed() {
        let service = LoggingService::in_memory(LoggingConfig::default());
        assert!(service.fatal("heartbeat", "tick", LogOptions::new()).is_none());
        assert_eq!(service.stored_count(), 0);
    }

    #[test]
    fn test_severe_entries_reach_analytics_without_emitters() {
        let mut config = LoggingConfig::default();
        config.emitters.console = false;
        let service = LoggingService::in_memory(config);

        service.warn("Auth", "token near expiry", LogOptions::new());
        let entry = service
            .error(
                "VaultService",
                "Failed to retrieve vault items",
                LogOptions::new()
                    .code("VAULT_ERROR")
                    .error(ErrorInfo::new("HttpError", "500").with_details(json!({"status": 500}))),
            )
            .unwrap();

        assert_eq!(entry.technical.as_ref().unwrap().name, "HttpError");
        assert_eq!(service.stored_logs(), vec![entry]);
    }

    #[test]
    fn test_log_without_runtime_buffers_remote() {
        let sink = Arc::new(ScriptedSink::default());
        let service = service_with(remote_config(), sink.clone());

        service.error("VaultService", "boom", LogOptions::new());
        assert_eq!(service.offline_count(), 1);
        assert!(sink.seen.lock().is_empty());
    }

    #[tokio::test]
    async fn test_offline_entries_buffer_then_replay_as_retries() {
        let sink = Arc::new(ScriptedSink::default());
        let service = service_with(remote_config(), sink.clone());

        service.set_online(false);
        for i in 0..25 {
            service.info("Sync", &format!("m{}", i), LogOptions::new());
        }
        assert_eq!(service.offline_count(), 25);

        let report = service.handle_connectivity(true).await.unwrap();
        assert_eq!(report.delivered, 25);
        assert_eq!(report.batches, 3);
        assert!(report.is_complete());
        assert_eq!(service.offline_count(), 0);

        let seen = sink.seen.lock();
        assert_eq!(seen.len(), 25);
        assert!(seen.iter().all(LogEntry::is_retry));
        assert_eq!(seen[0].message, "m0");
    }

    #[tokio::test]
    async fn test_failed_batch_requeued_in_order() {
        let sink = Arc::new(ScriptedSink::default());
        let service = service_with(remote_config(), sink.clone());

        service.set_online(false);
        for i in 0..15 {
            service.info("Sync", &format!("m{}", i), LogOptions::new());
        }
        sink.fail.store(true, Ordering::SeqCst);

        let report = service.sync_offline().await;
        assert_eq!(report.delivered, 0);
        assert_eq!(report.requeued, 10);
        assert_eq!(report.remaining, 15);
        assert!(report.error.is_some());

        let buffered = service.offline_logs();
        let messages: Vec<String> = buffered.iter().map(|e| e.message.clone()).collect();
        let expected: Vec<String> = (0..15).map(|i| format!("m{}", i)).collect();
        assert_eq!(messages, expected);
        // Buffered originals are never tagged
        assert!(!buffered.iter().any(LogEntry::is_retry));
    }

    struct PanickingSink;

    #[async_trait]
    impl RemoteSink for PanickingSink {
        fn endpoint(&self) -> &str {
            "http://panics"
        }

        async fn send(&self, _entry: &LogEntry) -> Result<()> {
            panic!("sink exploded");
        }
    }

    #[tokio::test]
    async fn test_settle_returns_after_sink_panic() {
        let service = LoggingService::new(
            remote_config(),
            Collaborators::new(Arc::new(MemoryStorage::new()))
                .remote_sinks(vec![Arc::new(PanickingSink) as Arc<dyn RemoteSink>]),
        );

        service.error("VaultService", "boom", LogOptions::new());
        tokio::time::timeout(std::time::Duration::from_secs(5), service.settle())
            .await
            .expect("settle must not hang on a panicked delivery");
        // Analytics is unaffected by the remote task
        assert_eq!(service.stored_count(), 1);
    }

    #[tokio::test]
    async fn test_live_failure_falls_back_to_buffer() {
        let sink = Arc::new(ScriptedSink::default());
        sink.fail.store(true, Ordering::SeqCst);
        let service = service_with(remote_config(), sink.clone());

        service.error("VaultService", "boom", LogOptions::new());
        service.settle().await;

        assert_eq!(sink.seen.lock().len(), 1);
        assert_eq!(service.offline_count(), 1);
    }

    #[tokio::test]
    async fn test_live_success_leaves_buffer_empty() {
        let sink = Arc::new(ScriptedSink::default());
        let service = service_with(remote_config(), sink.clone());

        service.info("VaultService", "ok", LogOptions::new());
        service.settle().await;

        assert_eq!(sink.seen.lock().len(), 1);
        assert!(!sink.seen.lock()[0].is_retry());
        assert_eq!(service.offline_count(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_replay_is_rejected() {
        let sink = Arc::new(ScriptedSink::default());
        let service = service_with(remote_config(), sink);
        service.inner.replaying.store(true, Ordering::SeqCst);

        assert!(service.sync_offline().await.already_running);
    }

    #[tokio::test]
    async fn test_reconnect_without_sync_policy_keeps_buffer() {
        let sink = Arc::new(ScriptedSink::default());
        let mut config = remote_config();
        config.offline.sync_when_online = false;
        let service = service_with(config, sink);

        service.set_online(false);
        service.info("Sync", "queued", LogOptions::new());
        assert!(service.handle_connectivity(true).await.is_none());
        assert_eq!(service.offline_count(), 1);
    }

    #[test]
    fn test_replay_report_display() {
        let report = ReplayReport {
            delivered: 10,
            batches: 1,
            remaining: 5,
            error: Some("HTTP 500".into()),
            ..Default::default()
        };
        assert_eq!(
            report.to_string(),
            "Replayed 10 entries in 1 batch(es), 5 remaining (stopped: HTTP 500)"
        );
    }
}
