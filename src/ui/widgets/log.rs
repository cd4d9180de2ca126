//! Log widget - scrollable entry list, filter bar, and detail pane
//!
//! Wide mode (>100 cols): detail pane to the right of the list
//! Narrow mode: detail pane below the list

use crate::console::detail::detail_lines;
use crate::console::{ConsoleEntry, ConsoleView, DetailTab};
use crate::constants::{DETAIL_WIDTH, WIDE_THRESHOLD};
use crate::logging::LogLevel;
use crate::ui::theme::{
    level_color, level_tag, style_bold, COLOR_BRIGHT, COLOR_WARNING, STYLE_BORDER, STYLE_DIM,
    STYLE_KEY, STYLE_LABEL, STYLE_MUTED, STYLE_SELECTED, STYLE_TEXT, SYMBOL_COLLAPSED,
    SYMBOL_EXPANDED,
};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{
        Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, StatefulWidget,
        Widget, Wrap,
    },
};

pub struct LogWidget<'a> {
    view: &'a ConsoleView,
    editing_source: bool,
}

impl<'a> LogWidget<'a> {
    pub fn new(view: &'a ConsoleView, editing_source: bool) -> Self {
        Self {
            view,
            editing_source,
        }
    }
}

impl Widget for LogWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::vertical([Constraint::Length(1), Constraint::Min(3)]).split(area);
        self.render_filter_bar(chunks[0], buf);

        let detail = self.view.selected().filter(|e| e.expanded);
        match detail {
            Some(entry) if area.width > WIDE_THRESHOLD => {
                let cols = Layout::horizontal([
                    Constraint::Min(40),
                    Constraint::Length(DETAIL_WIDTH),
                ])
                .split(chunks[1]);
                self.render_logs(cols[0], buf);
                render_detail(entry, cols[1], buf);
            }
            Some(entry) => {
                let rows = Layout::vertical([Constraint::Min(3), Constraint::Percentage(50)])
                    .split(chunks[1]);
                self.render_logs(rows[0], buf);
                render_detail(entry, rows[1], buf);
            }
            None => self.render_logs(chunks[1], buf),
        }
    }
}

impl LogWidget<'_> {
    fn render_filter_bar(&self, area: Rect, buf: &mut Buffer) {
        let filter = self.view.filter();
        let mut spans = vec![Span::styled(" Levels: ", STYLE_LABEL)];
        for (i, level) in LogLevel::ALL.iter().enumerate() {
            spans.push(level_button(i + 1, *level, filter.shows(*level)));
            spans.push(Span::raw(" "));
        }

        spans.push(Span::styled("  Source: ", STYLE_LABEL));
        if self.editing_source {
            spans.push(Span::styled(format!("{}_", filter.source), style_bold(COLOR_BRIGHT)));
        } else if filter.source.is_empty() {
            spans.push(Span::styled("/ to filter", STYLE_DIM));
        } else {
            spans.push(Span::styled(filter.source.clone(), STYLE_TEXT));
        }

        Paragraph::new(Line::from(spans)).render(area, buf);
    }

    fn render_logs(&self, area: Rect, buf: &mut Buffer) {
        let inner_height = area.height.saturating_sub(2) as usize;
        let inner_width = area.width.saturating_sub(3) as usize; // borders + scrollbar

        let total_lines = self.view.filtered_count();
        let scroll = self.view.scroll_position();
        let start = scroll.saturating_sub(inner_height.saturating_sub(1));
        let end = (start + inner_height).min(total_lines);

        let lines: Vec<Line> = self
            .view
            .visible()
            .enumerate()
            .skip(start)
            .take(end.saturating_sub(start))
            .map(|(i, entry)| format_entry(entry, inner_width, i == scroll))
            .collect();

        let title_right = if self.view.is_paused() {
            Line::from(vec![
                Span::styled("PAUSED ", Style::new().fg(COLOR_WARNING)),
                Span::styled("P Resume ", STYLE_MUTED),
            ])
        } else {
            Line::from(Span::styled("P Pause ", STYLE_DIM))
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(STYLE_BORDER)
            .title(Span::styled(
                format!(" Logs {}/{} ", total_lines, self.view.entries().len()),
                STYLE_LABEL,
            ))
            .title_bottom(title_right);

        Paragraph::new(lines).block(block).render(area, buf);

        if total_lines > inner_height {
            let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
                .begin_symbol(Some("▲"))
                .end_symbol(Some("▼"));
            let mut scrollbar_state = ScrollbarState::new(total_lines).position(scroll);
            let scrollbar_area = Rect {
                x: area.x + area.width - 1,
                y: area.y + 1,
                width: 1,
                height: area.height.saturating_sub(2),
            };
            scrollbar.render(scrollbar_area, buf, &mut scrollbar_state);
        }
    }
}

fn level_button(key: usize, level: LogLevel, shown: bool) -> Span<'static> {
    if shown {
        Span::styled(
            format!("[{}]{}", key, level.as_str()),
            Style::new().fg(level_color(level)),
        )
    } else {
        Span::styled(format!(" {} {}", key, level.as_str()), STYLE_DIM)
    }
}

fn render_detail(entry: &ConsoleEntry, area: Rect, buf: &mut Buffer) {
    let mut tabs = vec![Span::raw(" ")];
    for tab in DetailTab::available(&entry.entry) {
        if *tab == entry.tab {
            tabs.push(Span::styled(format!("[{}]", tab.title()), style_bold(COLOR_BRIGHT)));
        } else {
            tabs.push(Span::styled(format!(" {} ", tab.title()), STYLE_MUTED));
        }
    }

    let mut lines = vec![Line::from(tabs), Line::raw("")];
    lines.extend(
        detail_lines(&entry.entry, entry.tab)
            .into_iter()
            .map(|l| Line::styled(l, STYLE_TEXT)),
    );

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(STYLE_BORDER)
        .title(Span::styled(" Detail ", STYLE_LABEL))
        .title_bottom(Line::from(vec![
            Span::styled("←→", STYLE_KEY),
            Span::styled(" Tab ", STYLE_DIM),
        ]));

    Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false })
        .render(area, buf);
}

/// Format an entry into a styled Line
fn format_entry(entry: &ConsoleEntry, max_width: usize, selected: bool) -> Line<'static> {
    let log = &entry.entry;
    // "▸ " + time(12) + " " + tag(5) + " " + source(14) + " " = ~36 chars
    let msg_width = max_width.saturating_sub(36);
    let marker = if entry.expanded {
        SYMBOL_EXPANDED
    } else {
        SYMBOL_COLLAPSED
    };

    let line = Line::from(vec![
        Span::styled(format!("{} ", marker), STYLE_DIM),
        Span::styled(format!("{} ", short_time(&log.timestamp)), STYLE_MUTED),
        Span::styled(
            format!("{} ", level_tag(log.level)),
            Style::new().fg(level_color(log.level)),
        ),
        Span::styled(format!("{} ", pad_or_truncate(&log.source, 14)), STYLE_LABEL),
        Span::styled(pad_or_truncate(&log.message, msg_width), STYLE_TEXT),
    ]);

    if selected {
        line.style(STYLE_SELECTED)
    } else {
        line
    }
}

/// `2024-01-01T12:34:56.789Z` -> `12:34:56.789`
fn short_time(timestamp: &str) -> &str {
    timestamp
        .split_once('T')
        .map(|(_, time)| time.trim_end_matches('Z'))
        .unwrap_or(timestamp)
}

/// Pad or truncate a string to exactly the given width
fn pad_or_truncate(s: &str, width: usize) -> String {
    let len = s.chars().count();
    if len <= width {
        format!("{:<width$}", s, width = width)
    } else if width > 3 {
        let head: String = s.chars().take(width - 3).collect();
        format!("{}...", head)
    } else {
        s.chars().take(width).collect()
    }
}
