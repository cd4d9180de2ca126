//! Files widget - file emitter configuration and backlog

use crate::config::{LoggingConfig, RotationPeriod};
use crate::ui::theme::{STYLE_BORDER, STYLE_LABEL, STYLE_MUTED, STYLE_VALUE};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

pub struct FilesWidget<'a> {
    config: &'a LoggingConfig,
    pending: usize,
}

impl<'a> FilesWidget<'a> {
    pub fn new(config: &'a LoggingConfig, pending: usize) -> Self {
        Self { config, pending }
    }
}

fn row(label: &str, value: impl Into<String>) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {:<16}", label), STYLE_LABEL),
        Span::styled(value.into(), STYLE_VALUE),
    ])
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

impl Widget for FilesWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let file = &self.config.file;
        let active = self.config.emitters.file && file.enabled;
        let rotation = match file.rotation_period {
            RotationPeriod::Hourly => "hourly",
            RotationPeriod::Daily => "daily",
            RotationPeriod::Weekly => "weekly",
        };

        let mut lines = vec![
            row("File logging", if active { "active" } else { "inactive" }),
            row("Base path", file.base_path.display().to_string()),
            row("Folder prefix", file.folder_name_prefix.clone()),
            row("Filename", file.filename_pattern.clone()),
            row("Max size", format_file_size(file.max_size)),
            row("Max files", file.max_files.to_string()),
            row("Compress", yes_no(file.compress)),
            row("Rotation", rotation),
            row("Pending", format!("{} entries", self.pending)),
        ];
        if !active {
            lines.push(Line::raw(""));
            lines.push(Line::styled(
                "  Enable [logging.emitters] file = true to write log files",
                STYLE_MUTED,
            ));
        }

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(STYLE_BORDER)
            .title(Span::styled(" Files ", STYLE_LABEL));

        Paragraph::new(lines).block(block).render(area, buf);
    }
}

/// Human-readable size with one decimal: `10485760` -> `10.0 MB`
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", size, UNITS[unit])
}
