//! Settings widget - effective pipeline configuration

use crate::config::LoggingConfig;
use crate::ui::theme::{style_bold, COLOR_BRIGHT, STYLE_BORDER, STYLE_LABEL, STYLE_MUTED, STYLE_VALUE};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};

pub struct SettingsWidget<'a> {
    config: &'a LoggingConfig,
    endpoints: Vec<String>,
}

impl<'a> SettingsWidget<'a> {
    pub fn new(config: &'a LoggingConfig, endpoints: Vec<String>) -> Self {
        Self { config, endpoints }
    }
}

fn row(label: &str, value: impl Into<String>) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {:<20}", label), STYLE_LABEL),
        Span::styled(value.into(), STYLE_VALUE),
    ])
}

fn on_off(flag: bool) -> &'static str {
    if flag {
        "on"
    } else {
        "off"
    }
}

fn heading(text: &'static str) -> Line<'static> {
    Line::styled(text, style_bold(COLOR_BRIGHT))
}

impl Widget for SettingsWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let c = self.config;

        let mut lines = vec![
            heading(" Pipeline"),
            row(
                "Environment",
                if c.production { "production" } else { "development" },
            ),
            row("Minimum level", c.effective_min_level().to_string()),
            row("App version", c.app_version.clone()),
            row("Max stored logs", c.max_stored_logs.to_string()),
            row("Stacks in prod", on_off(c.include_stacks_in_production)),
            row("Excluded sources", c.filters.exclude_sources.join(", ")),
            Line::raw(""),
            heading(" Emitters"),
            row("Console", on_off(c.emitters.console)),
            row("Remote", on_off(c.emitters.remote)),
            row("File", on_off(c.emitters.file)),
            Line::raw(""),
            heading(" Remote endpoints"),
        ];
        if self.endpoints.is_empty() {
            lines.push(Line::styled("  none configured", STYLE_MUTED));
        } else {
            lines.extend(
                self.endpoints
                    .into_iter()
                    .map(|e| Line::styled(format!("  {}", e), STYLE_VALUE)),
            );
        }
        lines.extend([
            Line::raw(""),
            heading(" Offline"),
            row("Buffering", on_off(c.offline.enabled)),
            row("Buffer size", c.offline.max_buffer_size.to_string()),
            row("Sync when online", on_off(c.offline.sync_when_online)),
        ]);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(STYLE_BORDER)
            .title(Span::styled(" Settings ", STYLE_LABEL));

        Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: false })
            .render(area, buf);
    }
}
