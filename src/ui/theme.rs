//! UI theme constants - Minimalist dark theme

use crate::logging::LogLevel;
use ratatui::style::{Color, Modifier, Style};

// Base colors - muted grays
pub const COLOR_DIM: Color = Color::Rgb(80, 80, 80); // Borders, secondary
pub const COLOR_MUTED: Color = Color::Rgb(120, 120, 120); // Labels
pub const COLOR_TEXT: Color = Color::Rgb(180, 180, 180); // Normal text
pub const COLOR_BRIGHT: Color = Color::Rgb(220, 220, 220); // Emphasis

// Accent colors - used sparingly
pub const COLOR_ACCENT: Color = Color::Rgb(100, 180, 220); // Keys, INFO
pub const COLOR_SUCCESS: Color = Color::Rgb(100, 180, 100); // Online
pub const COLOR_WARNING: Color = Color::Yellow;
pub const COLOR_ERROR: Color = Color::Red;
pub const COLOR_FATAL: Color = Color::Rgb(200, 40, 40);

// Semantic aliases
pub const COLOR_BORDER: Color = COLOR_DIM;
pub const COLOR_TITLE: Color = COLOR_BRIGHT;
pub const COLOR_LABEL: Color = COLOR_MUTED;
pub const COLOR_VALUE: Color = COLOR_TEXT;

// Connectivity
pub const COLOR_ONLINE: Color = COLOR_SUCCESS;
pub const COLOR_OFFLINE: Color = COLOR_WARNING;

// Action bar
pub const COLOR_KEY: Color = COLOR_ACCENT;
pub const COLOR_ACTION: Color = COLOR_MUTED;

pub const STYLE_DIM: Style = Style::new().fg(COLOR_DIM);
pub const STYLE_MUTED: Style = Style::new().fg(COLOR_MUTED);
pub const STYLE_TEXT: Style = Style::new().fg(COLOR_TEXT);
pub const STYLE_BRIGHT: Style = Style::new().fg(COLOR_BRIGHT);
pub const STYLE_BORDER: Style = Style::new().fg(COLOR_BORDER);
pub const STYLE_LABEL: Style = Style::new().fg(COLOR_LABEL);
pub const STYLE_VALUE: Style = Style::new().fg(COLOR_VALUE);
pub const STYLE_KEY: Style = Style::new().fg(COLOR_KEY);
pub const STYLE_ACTION: Style = Style::new().fg(COLOR_ACTION);
pub const STYLE_SELECTED: Style = Style::new().bg(Color::Rgb(40, 40, 40));

// Status symbols
pub const SYMBOL_ONLINE: &str = "●";
pub const SYMBOL_OFFLINE: &str = "○";
pub const SYMBOL_SYNCING: &str = "◐";
pub const SYMBOL_ERROR: &str = "✖";
pub const SYMBOL_EXPANDED: &str = "▾";
pub const SYMBOL_COLLAPSED: &str = "▸";

pub fn style_bold(color: Color) -> Style {
    Style::new().fg(color).add_modifier(Modifier::BOLD)
}

pub fn level_color(level: LogLevel) -> Color {
    match level {
        LogLevel::Debug => COLOR_MUTED,
        LogLevel::Info => COLOR_ACCENT,
        LogLevel::Warn => COLOR_WARNING,
        LogLevel::Error => COLOR_ERROR,
        LogLevel::Fatal => COLOR_FATAL,
    }
}

/// Fixed-width level tag
pub fn level_tag(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Debug => "[DBG]",
        LogLevel::Info => "[INF]",
        LogLevel::Warn => "[WRN]",
        LogLevel::Error => "[ERR]",
        LogLevel::Fatal => "[FTL]",
    }
}
