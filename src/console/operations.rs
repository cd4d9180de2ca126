//! Console actions: clipboard, export, clear, sync

use super::{DebugConsole, SOURCE};
use crate::error::{DiagError, Result};
use crate::export::{self, ExportFormat};
use crate::logging::{LogEntry, LogOptions, ReplayReport};
use serde_json::json;
use std::path::PathBuf;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tracing::warn;

// =============================================================================
// Clipboard
// =============================================================================

/// Each entry as pretty JSON, separated by a blank line
pub fn entries_as_json<'a>(entries: impl IntoIterator<Item = &'a LogEntry>) -> String {
    entries
        .into_iter()
        .filter_map(|e| serde_json::to_string_pretty(e).ok())
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn set_clipboard(text: &str) -> Result<()> {
    let mut clipboard = arboard::Clipboard::new().map_err(|e| DiagError::Clipboard {
        message: e.to_string(),
    })?;
    clipboard.set_text(text).map_err(|e| DiagError::Clipboard {
        message: e.to_string(),
    })
}

impl DebugConsole {
    pub fn toggle_pause(&mut self) {
        let paused = self.view.toggle_pause();
        self.set_status(if paused { "Paused" } else { "Resumed" });
    }

    /// Visible entries as clipboard text
    pub fn visible_json(&self) -> String {
        entries_as_json(self.view.visible().map(|e| &e.entry))
    }

    /// Copy visible entries to the clipboard
    pub fn copy_logs(&mut self) {
        let count = self.view.filtered_count();
        match set_clipboard(&self.visible_json()) {
            Ok(()) => self.set_status(format!("Copied {} logs", count)),
            Err(e) => self.set_status(e.to_string()),
        }
    }

    // =========================================================================
    // Clear
    // =========================================================================

    /// Clear the console and the persisted store
    pub fn clear_logs(&mut self) {
        self.view.clear();
        self.service.clear_stored_logs();
        self.service.info(SOURCE, "Logs cleared by user", LogOptions::new());
        self.set_status("Logs cleared");
    }

    // =========================================================================
    // Export
    // =========================================================================

    pub fn cycle_export_format(&mut self) {
        self.export.format = match self.export.format {
            ExportFormat::Json => ExportFormat::Compressed,
            ExportFormat::Compressed => ExportFormat::Json,
        };
        self.set_status(format!("Export format: {:?}", self.export.format));
    }

    pub fn cycle_export_level(&mut self) {
        self.export.level = self.export.level.next();
        self.set_status(format!("Export level: {:?}", self.export.level));
    }

    /// Export every held entry (level option applied) into the export dir
    pub fn export_to_dir(&self) -> Result<(PathBuf, usize)> {
        let entries: Vec<LogEntry> = self.view.entries().iter().map(|e| e.entry.clone()).collect();
        let artifact = export::render(&entries, &self.export, self.service.now())?;
        let path = export::write_to(&self.export_dir, &artifact)?;

        self.service.info(
            SOURCE,
            "Logs exported",
            LogOptions::new().data(json!({
                "filename": artifact.filename,
                "format": self.export.format,
                "count": artifact.count,
            })),
        );
        Ok((path, artifact.count))
    }

    pub fn export_logs(&mut self) {
        match self.export_to_dir() {
            Ok((path, count)) => {
                self.set_status(format!("Exported {} logs to {}", count, path.display()))
            }
            Err(e) => self.set_status(format!("Export failed: {}", e)),
        }
    }

    // =========================================================================
    // Offline sync
    // =========================================================================

    /// Start an offline replay in the background; `poll` picks up the result
    pub fn start_sync(&mut self) {
        if self.state().syncing {
            self.set_status("Sync already running");
            return;
        }

        let handle = match Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                warn!("No async runtime, offline sync skipped");
                self.set_status("Sync unavailable");
                return;
            }
        };

        let (tx, rx) = oneshot::channel();
        let service = self.service.clone();
        handle.spawn(async move {
            let report = service.sync_offline().await;
            let _ = tx.send(report);
        });
        self.sync_pending(rx);
        self.set_status("Syncing offline logs...");
    }

    pub(super) fn finish_sync(&mut self, report: ReplayReport) {
        if report.delivered > 0 {
            self.service.info(
                SOURCE,
                "Offline logs synchronized",
                LogOptions::new().data(json!({
                    "delivered": report.delivered,
                    "remaining": report.remaining,
                })),
            );
        }
        self.set_status(report.to_string());
    }
}
