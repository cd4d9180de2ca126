//! Centralized error types for the diagnostics pipeline
//!
//! All fallible operations return `DiagError`.
//! Use `Result<T>` as shorthand for `std::result::Result<T, DiagError>`.
//!
//! None of these ever escape the public logging entry points: the pipeline
//! reports them through `tracing` and carries on.

use std::fmt;
use std::path::PathBuf;

/// All diagnostics errors
#[derive(Debug)]
pub enum DiagError {
    // === Persistence ===
    /// Storage backend failed to read or write a key
    Storage {
        key: String,
        source: std::io::Error,
    },
    /// Stored value could not be decoded
    StorageDecode {
        key: String,
        source: serde_json::Error,
    },

    // === Serialization ===
    /// Entry or export payload could not be encoded
    Encode { source: serde_json::Error },

    // === Remote ===
    /// HTTP request to a log endpoint failed
    Remote {
        endpoint: String,
        source: reqwest::Error,
    },
    /// Endpoint answered with a non-success status
    RemoteStatus { endpoint: String, status: u16 },
    /// Remote delivery requested but no endpoint is configured
    NoRemoteEndpoints,

    // === IO ===
    /// File system operation failed
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to read config file
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Invalid config value
    ConfigValidation { field: &'static str, reason: String },

    // === Console ===
    /// Clipboard unavailable or rejected the text
    Clipboard { message: String },

    // === Runtime ===
    /// Terminal or runtime setup failed
    Runtime { source: std::io::Error },
}

impl std::error::Error for DiagError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Storage { source, .. }
            | Self::Io { source, .. }
            | Self::ConfigRead { source, .. }
            | Self::Runtime { source } => Some(source),
            Self::StorageDecode { source, .. } | Self::Encode { source } => Some(source),
            Self::Remote { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl fmt::Display for DiagError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Storage { key, source } => write!(f, "Storage error on '{}': {}", key, source),
            Self::StorageDecode { key, source } => {
                write!(f, "Malformed stored value '{}': {}", key, source)
            }
            Self::Encode { source } => write!(f, "Serialization failed: {}", source),
            Self::Remote { endpoint, source } => {
                write!(f, "Remote log delivery to {} failed: {}", endpoint, source)
            }
            Self::RemoteStatus { endpoint, status } => {
                write!(f, "Remote log endpoint {} answered {}", endpoint, status)
            }
            Self::NoRemoteEndpoints => write!(f, "No remote log endpoint configured"),
            Self::Io { path, source } => write!(f, "IO error: {}: {}", path.display(), source),
            Self::ConfigRead { path, .. } => write!(f, "Cannot read config: {}", path.display()),
            Self::ConfigValidation { field, reason } => {
                write!(f, "Invalid {}: {}", field, reason)
            }
            Self::Clipboard { message } => write!(f, "Clipboard error: {}", message),
            Self::Runtime { source } => write!(f, "Runtime error: {}", source),
        }
    }
}

/// Alias for Result with DiagError
pub type Result<T> = std::result::Result<T, DiagError>;
