//! Key translation and command execution
//!
//! Keys map to a `ConsoleCommand`; `execute_command` turns it into method
//! calls on `DebugConsole`.

use super::DebugConsole;
use crate::constants::PAGE_SCROLL_LINES;
use crate::logging::LogLevel;
use crossterm::event::{KeyCode, KeyEvent};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Quit,

    // Scrolling / selection
    ScrollUp,
    ScrollDown,
    ScrollPageUp,
    ScrollPageDown,
    ScrollToTop,
    ScrollToBottom,
    ToggleExpand,
    NextDetailTab,
    PrevDetailTab,
    NextTab,

    // Filtering
    ToggleLevel(LogLevel),
    EditSource,
    SourceInput(char),
    SourceBackspace,
    SourceDone,

    // Actions
    TogglePause,
    CopyLogs,
    ClearLogs,
    ExportLogs,
    CycleExportFormat,
    CycleExportLevel,
    SyncOffline,
    ToggleAutoClear,

    None,
}

/// Translate a key press; `editing` routes typing to the source filter
pub fn translate_key(key: KeyEvent, editing: bool) -> ConsoleCommand {
    if editing {
        return match key.code {
            KeyCode::Char(c) => ConsoleCommand::SourceInput(c),
            KeyCode::Backspace => ConsoleCommand::SourceBackspace,
            KeyCode::Enter | KeyCode::Esc => ConsoleCommand::SourceDone,
            _ => ConsoleCommand::None,
        };
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => ConsoleCommand::Quit,

        // Scrolling
        KeyCode::Up | KeyCode::Char('k') | KeyCode::Char('K') => ConsoleCommand::ScrollUp,
        KeyCode::Down | KeyCode::Char('j') | KeyCode::Char('J') => ConsoleCommand::ScrollDown,
        KeyCode::PageUp => ConsoleCommand::ScrollPageUp,
        KeyCode::PageDown => ConsoleCommand::ScrollPageDown,
        KeyCode::Home => ConsoleCommand::ScrollToTop,
        KeyCode::End => ConsoleCommand::ScrollToBottom,

        // Detail
        KeyCode::Enter => ConsoleCommand::ToggleExpand,
        KeyCode::Right => ConsoleCommand::NextDetailTab,
        KeyCode::Left => ConsoleCommand::PrevDetailTab,
        KeyCode::Tab => ConsoleCommand::NextTab,

        // Level toggles, in severity order
        KeyCode::Char('1') => ConsoleCommand::ToggleLevel(LogLevel::Debug),
        KeyCode::Char('2') => ConsoleCommand::ToggleLevel(LogLevel::Info),
        KeyCode::Char('3') => ConsoleCommand::ToggleLevel(LogLevel::Warn),
        KeyCode::Char('4') => ConsoleCommand::ToggleLevel(LogLevel::Error),
        KeyCode::Char('5') => ConsoleCommand::ToggleLevel(LogLevel::Fatal),
        KeyCode::Char('/') => ConsoleCommand::EditSource,

        // Actions
        KeyCode::Char('p') | KeyCode::Char('P') => ConsoleCommand::TogglePause,
        KeyCode::Char('c') | KeyCode::Char('C') => ConsoleCommand::CopyLogs,
        KeyCode::Backspace => ConsoleCommand::ClearLogs,
        KeyCode::Char('e') | KeyCode::Char('E') => ConsoleCommand::ExportLogs,
        KeyCode::Char('f') | KeyCode::Char('F') => ConsoleCommand::CycleExportFormat,
        KeyCode::Char('v') | KeyCode::Char('V') => ConsoleCommand::CycleExportLevel,
        KeyCode::Char('s') | KeyCode::Char('S') => ConsoleCommand::SyncOffline,
        KeyCode::Char('a') | KeyCode::Char('A') => ConsoleCommand::ToggleAutoClear,

        _ => ConsoleCommand::None,
    }
}

impl DebugConsole {
    /// Execute a console command. Returns true if the console should close.
    pub fn execute_command(&mut self, cmd: ConsoleCommand) -> bool {
        match cmd {
            ConsoleCommand::Quit => {
                self.close();
                return true;
            }
            ConsoleCommand::ScrollUp => self.view.scroll_up(),
            ConsoleCommand::ScrollDown => self.view.scroll_down(),
            ConsoleCommand::ScrollPageUp => {
                for _ in 0..PAGE_SCROLL_LINES {
                    self.view.scroll_up();
                }
            }
            ConsoleCommand::ScrollPageDown => {
                for _ in 0..PAGE_SCROLL_LINES {
                    self.view.scroll_down();
                }
            }
            ConsoleCommand::ScrollToTop => self.view.scroll_to_top(),
            ConsoleCommand::ScrollToBottom => self.view.scroll_to_bottom(),
            ConsoleCommand::ToggleExpand => {
                self.view.toggle_expanded();
            }
            ConsoleCommand::NextDetailTab => {
                self.view.cycle_detail_tab(true);
            }
            ConsoleCommand::PrevDetailTab => {
                self.view.cycle_detail_tab(false);
            }
            ConsoleCommand::NextTab => self.next_tab(),
            ConsoleCommand::ToggleLevel(level) => {
                let shown = self.view.toggle_level(level);
                self.set_status(format!("{} {}", level, if shown { "shown" } else { "hidden" }));
            }
            ConsoleCommand::EditSource => self.set_editing_source(true),
            ConsoleCommand::SourceInput(c) => self.view.push_source_char(c),
            ConsoleCommand::SourceBackspace => self.view.pop_source_char(),
            ConsoleCommand::SourceDone => self.set_editing_source(false),
            ConsoleCommand::TogglePause => self.toggle_pause(),
            ConsoleCommand::CopyLogs => self.copy_logs(),
            ConsoleCommand::ClearLogs => self.clear_logs(),
            ConsoleCommand::ExportLogs => self.export_logs(),
            ConsoleCommand::CycleExportFormat => self.cycle_export_format(),
            ConsoleCommand::CycleExportLevel => self.cycle_export_level(),
            ConsoleCommand::SyncOffline => self.start_sync(),
            ConsoleCommand::ToggleAutoClear => {
                self.toggle_auto_clear();
            }
            ConsoleCommand::None => {}
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_quit_keys() {
        assert_eq!(translate_key(key(KeyCode::Char('q')), false), ConsoleCommand::Quit);
        assert_eq!(translate_key(key(KeyCode::Esc), false), ConsoleCommand::Quit);
    }

    #[test]
    fn test_level_keys_in_severity_order() {
        assert_eq!(
            translate_key(key(KeyCode::Char('1')), false),
            ConsoleCommand::ToggleLevel(LogLevel::Debug)
        );
        assert_eq!(
            translate_key(key(KeyCode::Char('5')), false),
            ConsoleCommand::ToggleLevel(LogLevel::Fatal)
        );
    }

    #[test]
    fn test_editing_captures_typing() {
        assert_eq!(
            translate_key(key(KeyCode::Char('q')), true),
            ConsoleCommand::SourceInput('q')
        );
        assert_eq!(
            translate_key(key(KeyCode::Backspace), true),
            ConsoleCommand::SourceBackspace
        );
        assert_eq!(translate_key(key(KeyCode::Esc), true), ConsoleCommand::SourceDone);
    }

    #[test]
    fn test_backspace_clears_outside_editing() {
        assert_eq!(
            translate_key(key(KeyCode::Backspace), false),
            ConsoleCommand::ClearLogs
        );
    }
}
