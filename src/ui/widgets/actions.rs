//! Actions widget - displays keyboard shortcuts bar
//!
//! Shows available commands based on current state.

use crate::console::{ConsoleState, ConsoleTab};
use crate::export::{ExportFormat, ExportLevel};
use crate::ui::theme::{STYLE_ACTION, STYLE_DIM, STYLE_KEY};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

pub struct ActionsWidget<'a> {
    state: &'a ConsoleState<'a>,
}

impl<'a> ActionsWidget<'a> {
    pub fn new(state: &'a ConsoleState<'a>) -> Self {
        Self { state }
    }
}

fn action(key: &'static str, label: impl Into<String>) -> [Span<'static>; 2] {
    [
        Span::styled(key, STYLE_KEY),
        Span::styled(format!(" {}  ", label.into()), STYLE_ACTION),
    ]
}

impl Widget for ActionsWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let line1: Vec<Span> = if self.state.editing_source {
            let mut spans = vec![Span::raw("  ")];
            spans.extend(action("⏎", "Done"));
            spans.extend(action("⌫", "Delete"));
            spans.push(Span::styled("type to filter by source", STYLE_DIM));
            spans
        } else {
            let mut spans = vec![Span::raw("  ")];
            if self.state.tab == ConsoleTab::Logs {
                spans.extend(action("⏎", "Expand"));
                spans.extend(action("1-5", "Levels"));
                spans.extend(action("/", "Source"));
            }
            spans.extend(action("Tab", "View"));
            spans.extend(action("S", "Sync"));
            spans.extend(action(
                "A",
                if self.state.auto_clear {
                    "Auto-clear:on"
                } else {
                    "Auto-clear:off"
                },
            ));
            spans.extend(action("Q", "Quit"));
            spans
        };

        let pause_label = if self.state.paused { "Resume" } else { "Pause" };
        let format = match self.state.export.format {
            ExportFormat::Json => "json",
            ExportFormat::Compressed => "gz",
        };
        let level = match self.state.export.level {
            ExportLevel::All => "all",
            ExportLevel::Error => "error",
            ExportLevel::Info => "info",
        };

        let mut line2 = vec![Span::raw("  ")];
        line2.extend(action("P", pause_label));
        line2.extend(action("C", "Copy"));
        line2.extend(action("E", "Export"));
        line2.extend(action("F", format!("Format:{}", format)));
        line2.extend(action("V", format!("Level:{}", level)));
        line2.extend(action("⌫", "Clear"));

        let block = Block::default().borders(Borders::TOP).border_style(STYLE_DIM);

        Paragraph::new(vec![Line::from(line1), Line::from(line2)])
            .block(block)
            .render(area, buf);
    }
}
