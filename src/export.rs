//! Log export
//!
//! Renders a set of entries as a downloadable artifact: pretty JSON, or
//! compact JSON gzipped. The filename carries a second-resolution stamp.

use crate::constants::DEFAULT_EXPORT_FILENAME;
use crate::error::{DiagError, Result};
use crate::logging::{LogEntry, LogLevel};
use chrono::{DateTime, SecondsFormat, Utc};
use clap::ValueEnum;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Json,
    #[value(alias = "gz")]
    Compressed,
}

/// Level sub-filter applied before rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExportLevel {
    #[default]
    All,
    /// ERROR and FATAL only
    Error,
    /// Everything except DEBUG
    Info,
}

impl ExportLevel {
    pub fn keeps(self, level: LogLevel) -> bool {
        match self {
            ExportLevel::All => true,
            ExportLevel::Error => level.is_severe(),
            ExportLevel::Info => level != LogLevel::Debug,
        }
    }

    pub fn next(self) -> Self {
        match self {
            ExportLevel::All => ExportLevel::Error,
            ExportLevel::Error => ExportLevel::Info,
            ExportLevel::Info => ExportLevel::All,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOptions {
    pub format: ExportFormat,
    /// Base name; the stamp and extension are appended
    pub filename: String,
    pub level: ExportLevel,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            format: ExportFormat::Json,
            filename: DEFAULT_EXPORT_FILENAME.to_string(),
            level: ExportLevel::All,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub filename: String,
    pub bytes: Vec<u8>,
    /// Entries included after filtering
    pub count: usize,
}

/// `2024-06-01T12:00:00.000Z` -> `2024-06-01T12-00-00`
pub fn filename_stamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-")
        .chars()
        .take(19)
        .collect()
}

pub fn render(
    entries: &[LogEntry],
    options: &ExportOptions,
    now: DateTime<Utc>,
) -> Result<ExportArtifact> {
    let selected: Vec<&LogEntry> = entries
        .iter()
        .filter(|e| options.level.keeps(e.level))
        .collect();

    let base = if options.filename.trim().is_empty() {
        DEFAULT_EXPORT_FILENAME
    } else {
        options.filename.trim()
    };
    let stem = format!("{}-{}", base, filename_stamp(now));

    let (filename, bytes) = match options.format {
        ExportFormat::Json => {
            let json = serde_json::to_vec_pretty(&selected)
                .map_err(|e| DiagError::Encode { source: e })?;
            (format!("{}.json", stem), json)
        }
        ExportFormat::Compressed => {
            let json =
                serde_json::to_vec(&selected).map_err(|e| DiagError::Encode { source: e })?;
            let filename = format!("{}.gz", stem);
            let io_err = |e| DiagError::Io {
                path: PathBuf::from(&filename),
                source: e,
            };
            let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(&json).map_err(io_err)?;
            let gz = encoder.finish().map_err(io_err)?;
            (filename, gz)
        }
    };

    Ok(ExportArtifact {
        filename,
        bytes,
        count: selected.len(),
    })
}

/// Persist an artifact into `dir`, returning the written path
pub fn write_to(dir: &Path, artifact: &ExportArtifact) -> Result<PathBuf> {
    fs::create_dir_all(dir).map_err(|e| DiagError::Io {
        path: dir.to_path_buf(),
        source: e,
    })?;
    let path = dir.join(&artifact.filename);
    fs::write(&path, &artifact.bytes).map_err(|e| DiagError::Io {
        path: path.clone(),
        source: e,
    })?;
    Ok(path)
}
