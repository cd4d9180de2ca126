//! Console emitter
//!
//! Colored one-line summaries on stderr. In development the full entry
//! follows as pretty JSON; in production only ERROR and FATAL are written.

use crate::logging::{LogEntry, LogLevel};
use crossterm::style::{Color, Stylize};
use parking_lot::Mutex;
use std::io::{self, Write};
use tracing::warn;

pub struct ConsoleEmitter {
    production: bool,
    color: bool,
    writer: Mutex<Box<dyn Write + Send>>,
}

impl ConsoleEmitter {
    /// Emit to stderr with colors
    pub fn stderr(production: bool) -> Self {
        Self::with_writer(production, Box::new(io::stderr()), true)
    }

    pub fn with_writer(production: bool, writer: Box<dyn Write + Send>, color: bool) -> Self {
        Self {
            production,
            color,
            writer: Mutex::new(writer),
        }
    }

    pub fn emit(&self, entry: &LogEntry) {
        if self.production && !entry.level.is_severe() {
            return;
        }

        let headline = entry.headline();
        let mut text = if self.color {
            let styled = headline.with(level_color(entry.level));
            if entry.level == LogLevel::Fatal {
                styled.bold().to_string()
            } else {
                styled.to_string()
            }
        } else {
            headline
        };

        if !self.production {
            match serde_json::to_string_pretty(entry) {
                Ok(json) => {
                    text.push('\n');
                    text.push_str(&json);
                }
                Err(e) => warn!("Console emitter could not encode entry: {}", e),
            }
        }

        let mut writer = self.writer.lock();
        if let Err(e) = writeln!(writer, "{}", text).and_then(|_| writer.flush()) {
            warn!("Console emitter write failed: {}", e);
        }
    }
}

fn level_color(level: LogLevel) -> Color {
    match level {
        LogLevel::Debug => Color::Grey,
        LogLevel::Info => Color::Blue,
        LogLevel::Warn => Color::Yellow,
        LogLevel::Error => Color::Red,
        LogLevel::Fatal => Color::DarkRed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    /// Shared buffer so the test can read what the emitter wrote
    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Captured {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock()).into_owned()
        }
    }

    fn entry(level: LogLevel) -> LogEntry {
        LogEntry::new("2024-01-01T00:00:00.000Z", level, "VaultService", "loaded")
    }

    #[test]
    fn test_development_writes_headline_and_json() {
        let out = Captured::default();
        let emitter = ConsoleEmitter::with_writer(false, Box::new(out.clone()), false);
        emitter.emit(&entry(LogLevel::Debug));

        let text = out.text();
        assert!(text.starts_with("[DEBUG] VaultService: loaded\n"));
        assert!(text.contains("\"source\": \"VaultService\""));
    }

    #[test]
    fn test_production_writes_only_severe_headlines() {
        let out = Captured::default();
        let emitter = ConsoleEmitter::with_writer(true, Box::new(out.clone()), false);
        emitter.emit(&entry(LogLevel::Info));
        emitter.emit(&entry(LogLevel::Warn));
        emitter.emit(&entry(LogLevel::Error));

        assert_eq!(out.text(), "[ERROR] VaultService: loaded\n");
    }

    #[test]
    fn test_color_wraps_headline_in_ansi() {
        let out = Captured::default();
        let emitter = ConsoleEmitter::with_writer(true, Box::new(out.clone()), true);
        emitter.emit(&entry(LogLevel::Fatal));

        let text = out.text();
        assert!(text.contains("\u{1b}["));
        assert!(text.contains("[FATAL] VaultService: loaded"));
    }
}
