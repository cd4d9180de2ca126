//! Terminal UI using ratatui
//!
//! Thin layer responsible only for terminal I/O. All console logic lives in
//! `DebugConsole` and is reached through handle_key() and handle_scroll().

pub mod theme;
pub mod widgets;

use crate::console::{ConsoleTab, DebugConsole};
use crate::constants::FRAME_DURATION_MS;
use crate::error::{DiagError, Result};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind, MouseEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Layout},
    Frame, Terminal,
};
use std::io;
use std::time::Duration;
use widgets::{
    actions::ActionsWidget, files::FilesWidget, log::LogWidget, settings::SettingsWidget,
    status::StatusWidget,
};

/// Map io::Error to DiagError::Runtime
fn map_io_err(e: io::Error) -> DiagError {
    DiagError::Runtime { source: e }
}

/// Run the console event loop
///
/// Input is polled without blocking. Idle frames sleep on the runtime so
/// live deliveries and replays keep running.
pub async fn run(console: &mut DebugConsole) -> Result<()> {
    enable_raw_mode().map_err(map_io_err)?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture).map_err(map_io_err)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).map_err(map_io_err)?;

    let result = event_loop(&mut terminal, console).await;

    // Restore the terminal even when the loop failed
    disable_raw_mode().map_err(map_io_err)?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )
    .map_err(map_io_err)?;
    terminal.show_cursor().map_err(map_io_err)?;

    result
}

async fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    console: &mut DebugConsole,
) -> Result<()> {
    loop {
        console.poll();

        terminal.draw(|f| draw(f, console)).map_err(map_io_err)?;

        if event::poll(Duration::ZERO).map_err(map_io_err)? {
            match event::read().map_err(map_io_err)? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if console.handle_key(key) {
                        break;
                    }
                }
                Event::Mouse(mouse) => match mouse.kind {
                    MouseEventKind::ScrollUp => console.handle_scroll(true),
                    MouseEventKind::ScrollDown => console.handle_scroll(false),
                    _ => {}
                },
                _ => {}
            }
        } else {
            tokio::time::sleep(Duration::from_millis(FRAME_DURATION_MS)).await;
        }

        if console.should_quit() {
            break;
        }
    }
    Ok(())
}

fn draw(frame: &mut Frame, console: &DebugConsole) {
    let area = frame.area();

    let chunks = Layout::vertical([
        Constraint::Length(7), // Status widget
        Constraint::Min(5),    // Tab body
        Constraint::Length(3), // Actions widget
    ])
    .split(area);

    let state = console.state();
    let config = console.service().config();

    frame.render_widget(StatusWidget::new(&state, &config.app_version), chunks[0]);

    match state.tab {
        ConsoleTab::Logs => {
            frame.render_widget(LogWidget::new(console.view(), state.editing_source), chunks[1])
        }
        ConsoleTab::Files => frame.render_widget(
            FilesWidget::new(config, console.service().file_pending()),
            chunks[1],
        ),
        ConsoleTab::Settings => frame.render_widget(
            SettingsWidget::new(config, console.service().remote_endpoints()),
            chunks[1],
        ),
    }

    frame.render_widget(ActionsWidget::new(&state), chunks[2]);
}
