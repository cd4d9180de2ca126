//! Command-line interface definition using clap
//!
//! Provides structured argument parsing with automatic help generation.

use crate::export::{ExportFormat, ExportLevel};
use crate::logging::LogLevel;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

// =============================================================================
// CLI Definition
// =============================================================================

/// Logging and diagnostics pipeline for the vault inventory viewer
#[derive(Parser, Debug, Default)]
#[command(name = "vault-diag")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose debug output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file to use instead of the default location
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Interactive debug console (default)
    Console {
        /// Open even in production without stored errors
        #[arg(long)]
        force: bool,
    },

    /// Push one entry through the pipeline
    Emit {
        /// DEBUG, INFO, WARN, ERROR or FATAL
        level: LogLevel,
        source: String,
        message: String,

        /// Application error code
        #[arg(long)]
        code: Option<String>,

        /// Extra JSON attached as additional data
        #[arg(long, value_name = "JSON")]
        data: Option<String>,
    },

    /// Replay the offline buffer to the remote endpoints
    Sync,

    /// Export stored error logs
    Export {
        #[arg(long, value_enum, default_value_t = ExportFormat::Json)]
        format: ExportFormat,

        #[arg(long, value_enum, default_value_t = ExportLevel::All)]
        level: ExportLevel,

        /// Base filename; a timestamp and extension are appended
        #[arg(long)]
        filename: Option<String>,

        /// Output directory (defaults to the configured export dir)
        #[arg(long, value_name = "DIR")]
        out: Option<PathBuf>,
    },

    /// Show stored, offline, and pending file counts
    Status,

    /// Remove stored error logs
    Clear,

    /// Print the effective configuration
    Config,
}

// =============================================================================
// Tests
// =============================================================================
