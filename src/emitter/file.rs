//! Rotating file emitter
//!
//! Entries are buffered in memory and flushed once `FILE_FLUSH_THRESHOLD`
//! accumulate (or on demand). A flush appends the batch as JSON Lines to:
//!
//! ```text
//! <base_path>/<prefix><period>/<filename_pattern>
//! ```
//!
//! with `{level}` = `all` for every entry and `error` for the ERROR/FATAL
//! subset. With `compress` each flush is appended as its own gzip member,
//! which standard readers decode as one stream.
//!
//! Each buffered entry remembers whether it already reached the `all`
//! artifact, so a flush that fails on the `error` artifact is retried without
//! duplicating lines. While the disk keeps failing the buffer is capped and
//! threshold flushes back off.

use crate::clock::Clock;
use crate::config::{FileConfig, RotationPeriod};
use crate::constants::{FILE_BUFFER_CAP_FACTOR, FILE_FLUSH_THRESHOLD, FILE_RETRY_BACKOFF_SECS};
use crate::error::{DiagError, Result};
use crate::logging::LogEntry;
use chrono::{DateTime, Utc};
use flate2::write::GzEncoder;
use flate2::Compression;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Outcome of one flush attempt
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlushReport {
    pub written: usize,
    pub files: Vec<PathBuf>,
    /// Another flush was in progress; nothing was done
    pub skipped: bool,
}

pub struct FileEmitter {
    config: FileConfig,
    clock: Arc<dyn Clock>,
    threshold: usize,
    capacity: usize,
    buffer: Mutex<VecDeque<Pending>>,
    /// No threshold flush before this instant (set after a failure)
    retry_at: Mutex<Option<DateTime<Utc>>>,
    busy: AtomicBool,
}

/// A buffered entry and how far it got
struct Pending {
    entry: LogEntry,
    /// Already appended to the `all` artifact
    in_all: bool,
}

impl Pending {
    fn needs_error_artifact(&self) -> bool {
        self.entry.level.is_severe()
    }
}

/// Clears the busy flag when the flush ends, however it ends
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl FileEmitter {
    pub fn new(config: FileConfig, clock: Arc<dyn Clock>) -> Self {
        Self::with_threshold(config, clock, FILE_FLUSH_THRESHOLD)
    }

    pub fn with_threshold(config: FileConfig, clock: Arc<dyn Clock>, threshold: usize) -> Self {
        let threshold = threshold.max(1);
        Self {
            config,
            clock,
            threshold,
            capacity: threshold * FILE_BUFFER_CAP_FACTOR,
            buffer: Mutex::new(VecDeque::new()),
            retry_at: Mutex::new(None),
            busy: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &FileConfig {
        &self.config
    }

    /// Buffer an entry, flushing when the threshold is reached
    ///
    /// After a failed flush, pushes only buffer until the backoff expires.
    pub fn push(&self, entry: LogEntry) {
        let pending = {
            let mut buffer = self.buffer.lock();
            buffer.push_back(Pending {
                entry,
                in_all: false,
            });
            self.trim(&mut buffer);
            buffer.len()
        };

        if pending >= self.threshold && !self.backing_off() {
            if let Err(e) = self.flush() {
                warn!(
                    "File log flush failed, {} entries kept, retry in {}s: {}",
                    self.pending(),
                    FILE_RETRY_BACKOFF_SECS,
                    e
                );
            }
        }
    }

    pub fn pending(&self) -> usize {
        self.buffer.lock().len()
    }

    /// Largest number of entries held while the disk is failing
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn backing_off(&self) -> bool {
        match *self.retry_at.lock() {
            Some(at) => self.clock.now() < at,
            None => false,
        }
    }

    /// Drop the oldest entries past capacity
    fn trim(&self, buffer: &mut VecDeque<Pending>) {
        let excess = buffer.len().saturating_sub(self.capacity);
        if excess > 0 {
            buffer.drain(..excess);
            warn!("File log buffer full, dropped {} oldest entries", excess);
        }
    }

    /// Write everything buffered so far
    ///
    /// No-op while another flush runs. On failure the entries still owed to
    /// an artifact go back to the front of the buffer and threshold flushes
    /// pause for the backoff period. An explicit call always tries.
    pub fn flush(&self) -> Result<FlushReport> {
        if self.busy.swap(true, Ordering::Acquire) {
            return Ok(FlushReport {
                skipped: true,
                ..Default::default()
            });
        }
        let _guard = BusyGuard(&self.busy);

        let mut batch: Vec<Pending> = self.buffer.lock().drain(..).collect();
        if batch.is_empty() {
            return Ok(FlushReport::default());
        }

        match self.write_batch(&mut batch) {
            Ok(files) => {
                *self.retry_at.lock() = None;
                debug!("Flushed {} log entries to {} file(s)", batch.len(), files.len());
                Ok(FlushReport {
                    written: batch.len(),
                    files,
                    skipped: false,
                })
            }
            Err(e) => {
                *self.retry_at.lock() =
                    Some(self.clock.now() + chrono::Duration::seconds(FILE_RETRY_BACKOFF_SECS));
                let mut buffer = self.buffer.lock();
                for pending in batch.into_iter().rev() {
                    if !pending.in_all || pending.needs_error_artifact() {
                        buffer.push_front(pending);
                    }
                }
                self.trim(&mut buffer);
                Err(e)
            }
        }
    }

    /// Append owed entries to each artifact, marking `in_all` once written
    fn write_batch(&self, batch: &mut [Pending]) -> Result<Vec<PathBuf>> {
        let now = self.clock.now();
        let mut files = Vec::with_capacity(2);

        if batch.iter().any(|p| !p.in_all) {
            let all = self.artifact_path(now, "all");
            self.append(&all, batch.iter().filter(|p| !p.in_all).map(|p| &p.entry))?;
            for pending in batch.iter_mut() {
                pending.in_all = true;
            }
            files.push(all);
        }

        if batch.iter().any(Pending::needs_error_artifact) {
            let errors = self.artifact_path(now, "error");
            self.append(
                &errors,
                batch
                    .iter()
                    .filter(|p| p.needs_error_artifact())
                    .map(|p| &p.entry),
            )?;
            files.push(errors);
        }

        Ok(files)
    }

    /// Resolved path of the artifact for `level_tag` at `now`
    pub fn artifact_path(&self, now: DateTime<Utc>, level_tag: &str) -> PathBuf {
        let stamp = period_stamp(self.config.rotation_period, now);
        let folder = format!("{}{}", self.config.folder_name_prefix, stamp);
        let mut name = self
            .config
            .filename_pattern
            .replace("{prefix}", &self.config.folder_name_prefix)
            .replace("{date}", &stamp)
            .replace("{level}", level_tag);
        if self.config.compress && !name.ends_with(".gz") {
            name.push_str(".gz");
        }
        self.config.base_path.join(folder).join(name)
    }

    fn append<'a>(&self, path: &Path, entries: impl Iterator<Item = &'a LogEntry>) -> Result<()> {
        let io_err = |e: io::Error| DiagError::Io {
            path: path.to_path_buf(),
            source: e,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let size = fs::metadata(path).map(|m| m.len()).unwrap_or(0);
        if size >= self.config.max_size {
            rotate_files(path, self.config.max_files).map_err(io_err)?;
        }

        let mut body = Vec::new();
        for entry in entries {
            serde_json::to_writer(&mut body, entry).map_err(|e| DiagError::Encode { source: e })?;
            body.push(b'\n');
        }

        let bytes = if self.config.compress {
            let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(&body).map_err(io_err)?;
            encoder.finish().map_err(io_err)?
        } else {
            body
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(io_err)?;
        file.write_all(&bytes).map_err(io_err)?;
        file.flush().map_err(io_err)
    }
}

/// Folder/file stamp for the rotation period
pub fn period_stamp(period: RotationPeriod, now: DateTime<Utc>) -> String {
    match period {
        RotationPeriod::Hourly => now.format("%Y-%m-%d-%H").to_string(),
        RotationPeriod::Daily => now.format("%Y-%m-%d").to_string(),
        RotationPeriod::Weekly => now.format("%G-W%V").to_string(),
    }
}

/// Shift `name` -> `name.1` -> ... -> `name.N`, dropping the oldest
fn rotate_files(path: &Path, max_files: usize) -> io::Result<()> {
    if max_files == 0 {
        return Ok(());
    }

    let name = path
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "log.json".to_string());
    let dir = path.parent().unwrap_or_else(|| Path::new("."));

    let oldest = dir.join(format!("{}.{}", name, max_files));
    let _ = fs::remove_file(&oldest);

    for i in (1..max_files).rev() {
        let src = dir.join(format!("{}.{}", name, i));
        let dst = dir.join(format!("{}.{}", name, i + 1));
        if src.exists() {
            fs::rename(&src, &dst)?;
        }
    }

    if path.exists() {
        fs::rename(path, dir.join(format!("{}.1", name)))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::logging::LogLevel;
    use crate::storage::unique_temp_dir;
    use chrono::TimeZone;
    use flate2::read::MultiGzDecoder;
    use std::io::Read;

    fn clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 3, 5, 14, 30, 0).unwrap(),
        ))
    }

    fn config(base: &Path, compress: bool) -> FileConfig {
        FileConfig {
            base_path: base.to_path_buf(),
            compress,
            ..Default::default()
        }
    }

    fn entry(level: LogLevel, i: usize) -> LogEntry {
        LogEntry::new("t", level, "VaultService", format!("m{}", i))
    }

    fn read_lines(path: &Path, compressed: bool) -> Vec<LogEntry> {
        let raw = fs::read(path).unwrap();
        let text = if compressed {
            let mut out = String::new();
            MultiGzDecoder::new(&raw[..]).read_to_string(&mut out).unwrap();
            out
        } else {
            String::from_utf8(raw).unwrap()
        };
        text.lines().map(|l| serde_json::from_str(l).unwrap()).collect()
    }

    #[test]
    fn test_period_stamps() {
        let at = Utc.with_ymd_and_hms(2024, 3, 5, 14, 30, 0).unwrap();
        assert_eq!(period_stamp(RotationPeriod::Hourly, at), "2024-03-05-14");
        assert_eq!(period_stamp(RotationPeriod::Daily, at), "2024-03-05");
        assert_eq!(period_stamp(RotationPeriod::Weekly, at), "2024-W10");
    }

    #[test]
    fn test_artifact_path_from_pattern() {
        let base = PathBuf::from("/var/log/vault");
        let emitter = FileEmitter::new(config(&base, true), clock());
        let path = emitter.artifact_path(clock().now(), "error");
        assert_eq!(
            path,
            base.join("destiny-app-2024-03-05")
                .join("destiny-app-log-2024-03-05-error.json.gz")
        );
    }

    #[test]
    fn test_threshold_triggers_flush() {
        let dir = unique_temp_dir("file-threshold");
        let emitter = FileEmitter::with_threshold(config(&dir, false), clock(), 3);

        emitter.push(entry(LogLevel::Info, 0));
        emitter.push(entry(LogLevel::Info, 1));
        assert_eq!(emitter.pending(), 2);
        emitter.push(entry(LogLevel::Error, 2));
        assert_eq!(emitter.pending(), 0);

        let all = read_lines(&emitter.artifact_path(clock().now(), "all"), false);
        assert_eq!(all.len(), 3);
        let errors = read_lines(&emitter.artifact_path(clock().now(), "error"), false);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "m2");

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_no_error_artifact_without_severe_entries() {
        let dir = unique_temp_dir("file-noerr");
        let emitter = FileEmitter::new(config(&dir, false), clock());
        emitter.push(entry(LogLevel::Info, 0));

        let report = emitter.flush().unwrap();
        assert_eq!(report.written, 1);
        assert_eq!(report.files.len(), 1);
        assert!(!emitter.artifact_path(clock().now(), "error").exists());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_compressed_flushes_append_members() {
        let dir = unique_temp_dir("file-gz");
        let emitter = FileEmitter::new(config(&dir, true), clock());

        emitter.push(entry(LogLevel::Info, 0));
        emitter.flush().unwrap();
        emitter.push(entry(LogLevel::Warn, 1));
        emitter.flush().unwrap();

        let all = read_lines(&emitter.artifact_path(clock().now(), "all"), true);
        let messages: Vec<&str> = all.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, vec!["m0", "m1"]);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_rotates_when_max_size_reached() {
        let dir = unique_temp_dir("file-rotate");
        let mut cfg = config(&dir, false);
        cfg.max_size = 1;
        cfg.max_files = 2;
        let emitter = FileEmitter::new(cfg, clock());
        let path = emitter.artifact_path(clock().now(), "all");

        for i in 0..4 {
            emitter.push(entry(LogLevel::Info, i));
            emitter.flush().unwrap();
        }

        let name = path.file_name().unwrap().to_string_lossy().to_string();
        let parent = path.parent().unwrap();
        assert_eq!(read_lines(&path, false)[0].message, "m3");
        assert_eq!(read_lines(&parent.join(format!("{}.1", name)), false)[0].message, "m2");
        assert_eq!(read_lines(&parent.join(format!("{}.2", name)), false)[0].message, "m1");
        assert!(!parent.join(format!("{}.3", name)).exists());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_failed_flush_requeues_batch() {
        let dir = unique_temp_dir("file-fail");
        fs::create_dir_all(&dir).unwrap();
        // A regular file where the base directory should be
        let blocker = dir.join("blocked");
        fs::write(&blocker, "x").unwrap();
        let emitter = FileEmitter::new(config(&blocker, false), clock());

        emitter.push(entry(LogLevel::Error, 0));
        emitter.push(entry(LogLevel::Error, 1));
        assert!(emitter.flush().is_err());
        assert_eq!(emitter.pending(), 2);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_retry_after_error_artifact_failure_does_not_duplicate() {
        let dir = unique_temp_dir("file-partial");
        let emitter = FileEmitter::new(config(&dir, false), clock());
        let all_path = emitter.artifact_path(clock().now(), "all");
        let error_path = emitter.artifact_path(clock().now(), "error");
        // A directory where the error artifact should be
        fs::create_dir_all(&error_path).unwrap();

        emitter.push(entry(LogLevel::Info, 0));
        emitter.push(entry(LogLevel::Error, 1));
        assert!(emitter.flush().is_err());
        // Only the ERROR entry is still owed, to the error artifact
        assert_eq!(emitter.pending(), 1);
        assert_eq!(read_lines(&all_path, false).len(), 2);

        fs::remove_dir_all(&error_path).unwrap();
        let report = emitter.flush().unwrap();
        assert_eq!(report.files, vec![error_path.clone()]);
        assert_eq!(emitter.pending(), 0);

        let all: Vec<String> = read_lines(&all_path, false)
            .into_iter()
            .map(|e| e.message)
            .collect();
        assert_eq!(all, vec!["m0", "m1"]);
        let errors = read_lines(&error_path, false);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "m1");

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_failing_disk_caps_buffer_and_backs_off() {
        let dir = unique_temp_dir("file-cap");
        fs::create_dir_all(&dir).unwrap();
        let blocker = dir.join("blocked");
        fs::write(&blocker, "x").unwrap();
        let clock = clock();
        let emitter = FileEmitter::with_threshold(config(&blocker, false), clock.clone(), 3);
        assert_eq!(emitter.capacity(), 30);

        for i in 0..100 {
            emitter.push(entry(LogLevel::Info, i));
        }
        assert_eq!(emitter.pending(), 30);
        // Oldest dropped first
        let first = emitter.buffer.lock().front().map(|p| p.entry.message.clone());
        assert_eq!(first.as_deref(), Some("m70"));

        // Disk back, but pushes wait out the backoff
        fs::remove_file(&blocker).unwrap();
        emitter.push(entry(LogLevel::Info, 100));
        assert_eq!(emitter.pending(), 30);
        assert!(!blocker.exists());

        clock.advance(chrono::Duration::seconds(FILE_RETRY_BACKOFF_SECS));
        emitter.push(entry(LogLevel::Info, 101));
        assert_eq!(emitter.pending(), 0);
        let all = read_lines(&emitter.artifact_path(clock.now(), "all"), false);
        assert_eq!(all.len(), 30);
        assert_eq!(all[29].message, "m101");

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_flush_while_busy_is_skipped() {
        let dir = unique_temp_dir("file-busy");
        let emitter = FileEmitter::new(config(&dir, false), clock());
        emitter.push(entry(LogLevel::Info, 0));

        emitter.busy.store(true, Ordering::Release);
        let report = emitter.flush().unwrap();
        assert!(report.skipped);
        assert_eq!(emitter.pending(), 1);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_rotate_files_keeps_max_files() {
        let dir = unique_temp_dir("file-rotate-raw");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("log.json");

        fs::write(&path, "active").unwrap();
        fs::write(dir.join("log.json.1"), "one").unwrap();
        fs::write(dir.join("log.json.2"), "two").unwrap();

        rotate_files(&path, 2).unwrap();

        assert_eq!(fs::read_to_string(dir.join("log.json.1")).unwrap(), "active");
        assert_eq!(fs::read_to_string(dir.join("log.json.2")).unwrap(), "one");
        assert!(!dir.join("log.json.3").exists());
        assert!(!path.exists());

        let _ = fs::remove_dir_all(&dir);
    }
}
