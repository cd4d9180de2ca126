//! Application-wide constants
//!
//! Centralized constants to avoid duplication and ensure consistency.

// =============================================================================
// Storage keys
// =============================================================================

/// Analytics store (ERROR/FATAL history)
pub const ERROR_LOGS_KEY: &str = "error_logs";

/// Offline buffer (remote-bound entries awaiting connectivity)
pub const OFFLINE_LOGS_KEY: &str = "offline_logs";

/// Debug console auto-clear preference ("true"/"false")
pub const AUTO_CLEAR_KEY: &str = "debug_console_auto_clear";

/// Last debug console session id
pub const SESSION_ID_KEY: &str = "debug_console_session_id";

// =============================================================================
// Pipeline
// =============================================================================

/// Default cap on the analytics store
pub const DEFAULT_MAX_STORED_LOGS: usize = 50;

/// Default cap on the offline buffer
pub const DEFAULT_MAX_BUFFER_SIZE: usize = 50;

/// Entries per replay batch
pub const REPLAY_BATCH_SIZE: usize = 10;

/// Pause between replay batches (milliseconds)
pub const REPLAY_BATCH_DELAY_MS: u64 = 1000;

/// Buffered entries that trigger a file flush
pub const FILE_FLUSH_THRESHOLD: usize = 100;

/// File buffer cap, as a multiple of the flush threshold
pub const FILE_BUFFER_CAP_FACTOR: usize = 10;

/// Wait after a failed file flush before pushes trigger another (seconds)
pub const FILE_RETRY_BACKOFF_SECS: i64 = 30;

/// Marker written in place of sensitive values
pub const REDACTED: &str = "[REDACTED]";

/// Keys whose values are always redacted (compared lowercase)
pub const SENSITIVE_KEYS: [&str; 6] = [
    "password",
    "token",
    "secret",
    "key",
    "authorization",
    "authtoken",
];

/// Nesting limit for error sanitization
pub const SANITIZE_MAX_DEPTH: usize = 64;

/// Default application version stamped in metadata
pub const DEFAULT_APP_VERSION: &str = "1.0.0";

// =============================================================================
// Connectivity
// =============================================================================

/// Interval between connectivity probes (seconds)
pub const CONNECTIVITY_POLL_INTERVAL_SECS: u64 = 5;

/// Timeout for a single connectivity probe (seconds)
pub const CONNECTIVITY_PROBE_TIMEOUT_SECS: u64 = 3;

// =============================================================================
// UI
// =============================================================================

/// Frame duration for TUI loop (milliseconds)
pub const FRAME_DURATION_MS: u64 = 16;

/// Number of lines to scroll per page (PageUp/PageDown)
pub const PAGE_SCROLL_LINES: usize = 10;

/// Auto-scroll threshold (lines from bottom)
pub const AUTO_SCROLL_THRESHOLD: usize = 5;

/// Status message display timeout (seconds)
pub const STATUS_MESSAGE_TIMEOUT_SECS: u64 = 2;

/// Width threshold for wide/narrow layout switch
pub const WIDE_THRESHOLD: u16 = 100;

/// Width of the detail pane in wide mode
pub const DETAIL_WIDTH: u16 = 48;

/// Default export filename base
pub const DEFAULT_EXPORT_FILENAME: &str = "app-logs";
