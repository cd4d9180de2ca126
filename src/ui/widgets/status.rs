//! Status widget - session, connectivity, offline backlog, error count

use crate::console::{ConsoleState, ConsoleTab};
use crate::ui::theme::*;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

pub struct StatusWidget<'a> {
    state: &'a ConsoleState<'a>,
    app_version: &'a str,
}

impl<'a> StatusWidget<'a> {
    pub fn new(state: &'a ConsoleState<'a>, app_version: &'a str) -> Self {
        Self { state, app_version }
    }
}

impl Widget for StatusWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let (link_symbol, link_color, link_text) = if self.state.syncing {
            (SYMBOL_SYNCING, COLOR_WARNING, "Syncing")
        } else if self.state.online {
            (SYMBOL_ONLINE, COLOR_ONLINE, "Online")
        } else {
            (SYMBOL_OFFLINE, COLOR_OFFLINE, "Offline")
        };

        let errors = if self.state.error_count > 0 {
            Span::styled(
                format!("{} {}", SYMBOL_ERROR, self.state.error_count),
                Style::new().fg(COLOR_ERROR),
            )
        } else {
            Span::styled("0", STYLE_VALUE)
        };

        let offline = if self.state.offline_count > 0 {
            Span::styled(
                format!("{} pending  (S to sync)", self.state.offline_count),
                Style::new().fg(COLOR_WARNING),
            )
        } else {
            Span::styled("none", STYLE_VALUE)
        };

        let mut tabs = vec![Span::styled("  Tab        ", STYLE_LABEL)];
        for tab in [ConsoleTab::Logs, ConsoleTab::Files, ConsoleTab::Settings] {
            if tab == self.state.tab {
                tabs.push(Span::styled(format!("[{}] ", tab.title()), style_bold(COLOR_BRIGHT)));
            } else {
                tabs.push(Span::styled(format!(" {}  ", tab.title()), STYLE_MUTED));
            }
        }
        if let Some(msg) = self.state.status_message {
            tabs.push(Span::styled(format!("  {}", msg), STYLE_BRIGHT));
        }

        let lines = vec![
            Line::from(vec![
                Span::styled("  Network    ", STYLE_LABEL),
                Span::styled(format!("{} ", link_symbol), Style::new().fg(link_color)),
                Span::styled(link_text, STYLE_VALUE),
            ]),
            Line::from(vec![Span::styled("  Errors     ", STYLE_LABEL), errors]),
            Line::from(vec![Span::styled("  Offline    ", STYLE_LABEL), offline]),
            Line::from(vec![
                Span::styled("  Session    ", STYLE_LABEL),
                Span::styled(self.state.session_id.to_string(), STYLE_VALUE),
                Span::styled(
                    if self.state.auto_clear {
                        "  auto-clear on"
                    } else {
                        "  auto-clear off"
                    },
                    STYLE_MUTED,
                ),
            ]),
            Line::from(tabs),
        ];

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(STYLE_BORDER)
            .title(Span::styled(
                format!(" DEBUG CONSOLE v{} ", self.app_version),
                style_bold(COLOR_TITLE),
            ));

        Paragraph::new(lines).block(block).render(area, buf);
    }
}
