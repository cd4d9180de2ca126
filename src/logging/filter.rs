//! Log filtering
//!
//! - `LevelFilter`: pipeline gate, decides whether a call produces an entry at all
//! - `ConsoleFilter`: display filter for the debug console

use super::{LogEntry, LogLevel};
use std::collections::HashSet;

/// Pipeline gate: minimum level plus excluded sources
#[derive(Debug, Clone)]
pub struct LevelFilter {
    min_level: LogLevel,
    excluded_sources: HashSet<String>,
}

impl LevelFilter {
    pub fn new(min_level: LogLevel, excluded_sources: impl IntoIterator<Item = String>) -> Self {
        Self {
            min_level,
            excluded_sources: excluded_sources.into_iter().collect(),
        }
    }

    /// Environment default: everything in development, INFO and up in production
    pub fn default_min_level(production: bool) -> LogLevel {
        if production {
            LogLevel::Info
        } else {
            LogLevel::Debug
        }
    }

    /// Check whether a call at `level` from `source` should proceed
    #[inline]
    pub fn allows(&self, level: LogLevel, source: &str) -> bool {
        level >= self.min_level && !self.excluded_sources.contains(source)
    }

    pub fn min_level(&self) -> LogLevel {
        self.min_level
    }
}

impl Default for LevelFilter {
    fn default() -> Self {
        Self::new(LogLevel::Debug, Vec::new())
    }
}

/// Debug console display filter
#[derive(Debug, Clone)]
pub struct ConsoleFilter {
    /// Levels currently shown
    pub levels: HashSet<LogLevel>,
    /// Case-insensitive substring match on `source`; empty = all
    pub source: String,
}

impl Default for ConsoleFilter {
    fn default() -> Self {
        Self {
            levels: LogLevel::ALL.into_iter().collect(),
            source: String::new(),
        }
    }
}

impl ConsoleFilter {
    /// Check if a log entry passes the filter
    pub fn matches(&self, entry: &LogEntry) -> bool {
        if !self.levels.contains(&entry.level) {
            return false;
        }
        if self.source.is_empty() {
            return true;
        }
        entry
            .source
            .to_lowercase()
            .contains(&self.source.to_lowercase())
    }

    /// Flip visibility of one level, returns the new state
    pub fn toggle_level(&mut self, level: LogLevel) -> bool {
        if !self.levels.remove(&level) {
            self.levels.insert(level);
            true
        } else {
            false
        }
    }

    pub fn shows(&self, level: LogLevel) -> bool {
        self.levels.contains(&level)
    }
}
