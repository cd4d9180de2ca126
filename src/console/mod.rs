//! Debug console state and orchestration
//!
//! Single source of truth for the console. The TUI in `ui` only renders a
//! `ConsoleState` snapshot and forwards keys to `handle_key()`.

mod commands;
pub mod detail;
mod operations;
pub mod view;

pub use commands::{translate_key, ConsoleCommand};
pub use view::ConsoleView;

use crate::config::Config;
use crate::constants::{AUTO_CLEAR_KEY, SESSION_ID_KEY, STATUS_MESSAGE_TIMEOUT_SECS};
use crate::export::ExportOptions;
use crate::logging::{LogEntry, LogOptions, LogSubscription, LoggingService, ReplayReport};
use crate::storage::Storage;
use crossterm::event::KeyEvent;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::oneshot;
use tracing::warn;

const SOURCE: &str = "DebugConsole";

// =============================================================================
// Types
// =============================================================================

/// Top-level console tab
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConsoleTab {
    #[default]
    Logs,
    Files,
    Settings,
}

impl ConsoleTab {
    pub fn next(self) -> Self {
        match self {
            ConsoleTab::Logs => ConsoleTab::Files,
            ConsoleTab::Files => ConsoleTab::Settings,
            ConsoleTab::Settings => ConsoleTab::Logs,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            ConsoleTab::Logs => "Logs",
            ConsoleTab::Files => "Files",
            ConsoleTab::Settings => "Settings",
        }
    }
}

/// Detail pane tab for an expanded entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DetailTab {
    #[default]
    Formatted,
    Raw,
    Context,
    Error,
}

impl DetailTab {
    /// Tabs offered for `entry`; Error only when technical details exist
    pub fn available(entry: &LogEntry) -> &'static [DetailTab] {
        if entry.technical.is_some() {
            &[
                DetailTab::Formatted,
                DetailTab::Raw,
                DetailTab::Context,
                DetailTab::Error,
            ]
        } else {
            &[DetailTab::Formatted, DetailTab::Raw, DetailTab::Context]
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            DetailTab::Formatted => "Formatted",
            DetailTab::Raw => "Raw",
            DetailTab::Context => "Context",
            DetailTab::Error => "Error",
        }
    }
}

/// A log entry plus its console-only view state
#[derive(Debug, Clone, PartialEq)]
pub struct ConsoleEntry {
    pub entry: LogEntry,
    pub expanded: bool,
    pub tab: DetailTab,
}

impl ConsoleEntry {
    pub fn new(entry: LogEntry) -> Self {
        Self {
            entry,
            expanded: false,
            tab: DetailTab::Formatted,
        }
    }
}

/// Where the console writes exports
#[derive(Debug, Clone)]
pub struct ConsoleOptions {
    pub export_dir: PathBuf,
    pub export: ExportOptions,
}

impl ConsoleOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            export_dir: config.paths.export_dir.clone(),
            export: ExportOptions {
                filename: config.debug_console.export_filename.clone(),
                ..Default::default()
            },
        }
    }
}

/// Render snapshot (borrowed, no cloning)
#[derive(Clone)]
pub struct ConsoleState<'a> {
    pub session_id: &'a str,
    pub online: bool,
    pub offline_count: usize,
    pub error_count: usize,
    pub auto_clear: bool,
    pub paused: bool,
    pub editing_source: bool,
    pub syncing: bool,
    pub tab: ConsoleTab,
    pub export: &'a ExportOptions,
    pub status_message: Option<&'a str>,
}

// =============================================================================
// Policy
// =============================================================================

/// Whether the console should be shown at all
///
/// Always in development. In production only when stored errors exist or
/// the console is forced on.
pub fn is_enabled(production: bool, has_errors: bool, force: bool) -> bool {
    !production || has_errors || force
}

pub fn new_session_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

// =============================================================================
// Console
// =============================================================================

pub struct DebugConsole {
    pub(super) service: LoggingService,
    storage: Arc<dyn Storage>,
    subscription: LogSubscription,
    pub(super) view: ConsoleView,
    session_id: String,
    auto_clear: bool,
    tab: ConsoleTab,
    online: bool,
    offline_count: usize,
    pub(super) export: ExportOptions,
    pub(super) export_dir: PathBuf,
    editing_source: bool,
    sync_rx: Option<oneshot::Receiver<ReplayReport>>,
    status_message: Option<(String, Instant)>,
    should_quit: bool,
}

impl DebugConsole {
    /// Start a console session
    ///
    /// A different session id left in storage means a new session: stored
    /// logs are cleared when auto-clear is on. History is loaded after that,
    /// then the console follows the live stream.
    pub fn open(
        service: LoggingService,
        storage: Arc<dyn Storage>,
        session_id: impl Into<String>,
        options: ConsoleOptions,
    ) -> Self {
        let session_id = session_id.into();
        let auto_clear = read_auto_clear(storage.as_ref());

        let previous = storage.get(SESSION_ID_KEY).unwrap_or_else(|e| {
            warn!("Cannot read previous console session: {}", e);
            None
        });
        if let Some(previous) = previous.filter(|p| *p != session_id) {
            if auto_clear {
                service.debug(
                    SOURCE,
                    "New session detected, auto-clearing logs",
                    LogOptions::new().data(json!({
                        "previousSession": previous,
                        "newSession": session_id,
                    })),
                );
                service.clear_stored_logs();
            }
        }
        if let Err(e) = storage.set(SESSION_ID_KEY, &session_id) {
            warn!("Cannot store console session id: {}", e);
        }

        let mut view = ConsoleView::new(service.config().max_stored_logs);
        for entry in service.stored_logs() {
            view.add(entry);
        }
        let subscription = service.subscribe();

        Self {
            online: service.is_online(),
            offline_count: service.offline_count(),
            service,
            storage,
            subscription,
            view,
            session_id,
            auto_clear,
            tab: ConsoleTab::Logs,
            export: options.export,
            export_dir: options.export_dir,
            editing_source: false,
            sync_rx: None,
            status_message: None,
            should_quit: false,
        }
    }

    // =========================================================================
    // State access
    // =========================================================================

    pub fn state(&self) -> ConsoleState<'_> {
        ConsoleState {
            session_id: &self.session_id,
            online: self.online,
            offline_count: self.offline_count,
            error_count: self.view.error_count(),
            auto_clear: self.auto_clear,
            paused: self.view.is_paused(),
            editing_source: self.editing_source,
            syncing: self.sync_rx.is_some(),
            tab: self.tab,
            export: &self.export,
            status_message: self.status_text(),
        }
    }

    pub fn view(&self) -> &ConsoleView {
        &self.view
    }

    pub fn service(&self) -> &LoggingService {
        &self.service
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn auto_clear(&self) -> bool {
        self.auto_clear
    }

    pub fn tab(&self) -> ConsoleTab {
        self.tab
    }

    /// Pull new stream entries and refresh connectivity figures
    pub fn poll(&mut self) {
        for entry in self.subscription.drain() {
            self.view.add(entry);
        }

        if let Some(rx) = self.sync_rx.as_mut() {
            match rx.try_recv() {
                Ok(report) => {
                    self.sync_rx = None;
                    self.finish_sync(report);
                }
                Err(oneshot::error::TryRecvError::Empty) => {}
                Err(oneshot::error::TryRecvError::Closed) => {
                    self.sync_rx = None;
                    self.set_status("Sync aborted");
                }
            }
        }

        self.online = self.service.is_online();
        self.offline_count = self.service.offline_count();
    }

    // =========================================================================
    // Status message
    // =========================================================================

    pub(super) fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = Some((msg.into(), Instant::now()));
    }

    fn status_text(&self) -> Option<&str> {
        self.status_message
            .as_ref()
            .filter(|(_, t)| t.elapsed().as_secs() < STATUS_MESSAGE_TIMEOUT_SECS)
            .map(|(s, _)| s.as_str())
    }

    // =========================================================================
    // Settings
    // =========================================================================

    /// Flip and persist the auto-clear preference
    pub fn toggle_auto_clear(&mut self) -> bool {
        self.auto_clear = !self.auto_clear;
        if let Err(e) = self
            .storage
            .set(AUTO_CLEAR_KEY, if self.auto_clear { "true" } else { "false" })
        {
            warn!("Cannot persist auto-clear setting: {}", e);
        }
        self.service.info(
            SOURCE,
            "Auto-clear logs setting changed",
            LogOptions::new().data(json!({ "enabled": self.auto_clear })),
        );
        self.set_status(if self.auto_clear {
            "Auto-clear on"
        } else {
            "Auto-clear off"
        });
        self.auto_clear
    }

    pub fn next_tab(&mut self) {
        self.tab = self.tab.next();
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// End the session: auto-clear stored logs if enabled, flush files
    pub fn close(&mut self) {
        if self.auto_clear {
            self.service
                .debug(SOURCE, "Session ending, auto-clearing logs", LogOptions::new());
            self.service.clear_stored_logs();
        }
        if let Err(e) = self.service.flush_files() {
            warn!("Final log file flush failed: {}", e);
        }
        self.should_quit = true;
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    // =========================================================================
    // Input handling
    // =========================================================================

    /// Handle keyboard input. Returns true if the console should close.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        let cmd = translate_key(key, self.editing_source);
        self.execute_command(cmd)
    }

    pub fn handle_scroll(&mut self, up: bool) {
        if up {
            self.view.scroll_up();
        } else {
            self.view.scroll_down();
        }
    }

    pub(super) fn set_editing_source(&mut self, editing: bool) {
        self.editing_source = editing;
    }

    pub(super) fn sync_pending(&mut self, rx: oneshot::Receiver<ReplayReport>) {
        self.sync_rx = Some(rx);
    }
}

fn read_auto_clear(storage: &dyn Storage) -> bool {
    match storage.get(AUTO_CLEAR_KEY) {
        Ok(Some(value)) => value.trim() == "true",
        Ok(None) => true,
        Err(e) => {
            warn!("Cannot read auto-clear setting: {}", e);
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LoggingConfig;
    use crate::logging::LogLevel;
    use crate::storage::MemoryStorage;

    fn options() -> ConsoleOptions {
        ConsoleOptions {
            export_dir: PathBuf::from("exports"),
            export: ExportOptions::default(),
        }
    }

    fn quiet_config() -> LoggingConfig {
        let mut config = LoggingConfig::default();
        config.emitters.console = false;
        config
    }

    #[test]
    fn test_is_enabled_policy() {
        assert!(is_enabled(false, false, false));
        assert!(!is_enabled(true, false, false));
        assert!(is_enabled(true, true, false));
        assert!(is_enabled(true, false, true));
    }

    #[test]
    fn test_session_ids_are_unique() {
        assert_ne!(new_session_id(), new_session_id());
    }

    #[test]
    fn test_new_session_auto_clears_stored_logs() {
        let service = LoggingService::in_memory(quiet_config());
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        service.error("Vault", "old failure", LogOptions::new());
        storage.set(SESSION_ID_KEY, "previous").unwrap();

        let console = DebugConsole::open(service.clone(), storage.clone(), "current", options());
        assert_eq!(service.stored_count(), 0);
        assert!(console.view().entries().is_empty());
        assert_eq!(storage.get(SESSION_ID_KEY).unwrap().as_deref(), Some("current"));
    }

    #[test]
    fn test_auto_clear_off_keeps_history() {
        let service = LoggingService::in_memory(quiet_config());
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        service.error("Vault", "old failure", LogOptions::new());
        storage.set(SESSION_ID_KEY, "previous").unwrap();
        storage.set(AUTO_CLEAR_KEY, "false").unwrap();

        let console = DebugConsole::open(service.clone(), storage, "current", options());
        assert!(!console.auto_clear());
        assert_eq!(service.stored_count(), 1);
        assert_eq!(console.view().entries().len(), 1);
    }

    #[test]
    fn test_same_session_keeps_history() {
        let service = LoggingService::in_memory(quiet_config());
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        service.fatal("Vault", "crash", LogOptions::new());
        storage.set(SESSION_ID_KEY, "same").unwrap();

        let console = DebugConsole::open(service, storage, "same", options());
        assert_eq!(console.view().error_count(), 1);
    }

    #[test]
    fn test_poll_follows_stream() {
        let service = LoggingService::in_memory(quiet_config());
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        let mut console = DebugConsole::open(service.clone(), storage, "s", options());

        service.info("Vault", "loaded 120 items", LogOptions::new());
        service.warn("Auth", "token near expiry", LogOptions::new());
        console.poll();

        let levels: Vec<LogLevel> = console
            .view()
            .visible()
            .map(|e| e.entry.level)
            .collect();
        assert_eq!(levels, vec![LogLevel::Info, LogLevel::Warn]);
    }

    #[test]
    fn test_toggle_auto_clear_persists() {
        let service = LoggingService::in_memory(quiet_config());
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        let mut console = DebugConsole::open(service, storage.clone(), "s", options());

        assert!(console.auto_clear());
        assert!(!console.toggle_auto_clear());
        assert_eq!(storage.get(AUTO_CLEAR_KEY).unwrap().as_deref(), Some("false"));
        assert!(!read_auto_clear(storage.as_ref()));
    }

    #[test]
    fn test_close_clears_when_auto_clear_on() {
        let service = LoggingService::in_memory(quiet_config());
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        let mut console = DebugConsole::open(service.clone(), storage, "s", options());
        service.error("Vault", "boom", LogOptions::new());

        console.close();
        assert!(console.should_quit());
        assert_eq!(service.stored_count(), 0);
    }

    #[test]
    fn test_tabs_cycle() {
        assert_eq!(ConsoleTab::Logs.next(), ConsoleTab::Files);
        assert_eq!(ConsoleTab::Settings.next(), ConsoleTab::Logs);
    }
}
