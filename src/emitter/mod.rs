//! Log emitters
//!
//! - `ConsoleEmitter` - colored terminal output
//! - `RemoteEmitter` - HTTP POST to one or more endpoints
//! - `FileEmitter` - buffered, rotating JSON Lines files
//!
//! Emitters never call back into the logging service: their own failures
//! go to `tracing`.

pub mod console;
pub mod file;
pub mod remote;

pub use console::ConsoleEmitter;
pub use file::{FileEmitter, FlushReport};
pub use remote::{HttpSink, RemoteEmitter, RemoteSink};
