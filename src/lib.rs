//! Vault diagnostics - logging pipeline for the Destiny 2 vault viewer
//!
//! `LoggingService` filters, enriches, and fans entries out to the console,
//! remote endpoints (with an offline buffer and replay), rotating log files,
//! and a persisted store of recent errors. `DebugConsole` is the interactive
//! view over all of it.

pub mod cli;
pub mod clock;
pub mod config;
pub mod connectivity;
pub mod console;
pub mod constants;
pub mod emitter;
pub mod error;
pub mod export;
pub mod logging;
pub mod storage;
pub mod ui;

pub use error::{DiagError, Result};
pub use logging::{LogEntry, LogLevel, LogOptions, LoggingService};
