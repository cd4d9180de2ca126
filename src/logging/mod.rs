//! Logging pipeline
//!
//! Centralizes all log-related types and utilities:
//! - `LogEntry` - structured record shared by every consumer
//! - `EntryBuilder` - enrichment (context, error, device metadata)
//! - `LevelFilter` / `ConsoleFilter` - pipeline gate and display filter
//! - `AnalyticsStore` / `OfflineBuffer` - persisted bounded queues
//! - `LogStream` - live fan-out to the debug console
//! - `LoggingService` - the pipeline itself

pub mod builder;
pub mod context;
pub mod entry;
pub mod filter;
pub mod offline;
mod persisted;
pub mod sanitize;
pub mod service;
pub mod store;
pub mod stream;

pub use builder::{EntryBuilder, ErrorInfo, LogOptions};
pub use context::{RuntimeContext, ServerContext, StaticContext};
pub use entry::{DeviceMetadata, LogContext, LogEntry, LogLevel, TechnicalDetails, UserRef};
pub use filter::{ConsoleFilter, LevelFilter};
pub use offline::OfflineBuffer;
pub use service::{Collaborators, LoggingService, ReplayReport};
pub use store::AnalyticsStore;
pub use stream::{LogStream, LogSubscription};

/// Initialize the crate's own diagnostics output
///
/// Call early in main() before any logging occurs.
/// Set `verbose` to true for debug-level output. `RUST_LOG` wins when set.
pub fn init_tracing(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_file(false)
                .compact(),
        )
        .with(filter)
        .try_init();
}
