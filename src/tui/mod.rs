// TUI module - Terminal User Interface
//
// This module manages the terminal UI using ratatui. It handles:
// - Terminal initialization and cleanup
// - Event loop (keyboard input, timer ticks, gateway events)
// - Rendering the dashboard

pub mod app;
pub mod components;
pub mod form;
pub mod input;
pub mod modal;
pub mod views;

use crate::events::AppEvent;
use anyhow::{Context, Result};
use app::App;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use modal::ModalAction;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::time::Duration;
use tokio::sync::mpsc;

/// Run the TUI
///
/// Sets up the terminal, runs the event loop, and cleans up when done.
/// The loop interleaves keyboard input with gateway deliveries arriving
/// on `event_rx`.
pub async fn run_tui(
    mut app: App,
    mut event_rx: mpsc::UnboundedReceiver<AppEvent>,
) -> Result<()> {
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("Failed to setup terminal")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("Failed to create terminal")?;

    let result = run_event_loop(&mut terminal, &mut app, &mut event_rx).await;

    // No callback may land on the loop after this point
    app.teardown();

    disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("Failed to restore terminal")?;
    terminal.show_cursor().context("Failed to show cursor")?;

    result
}

/// Main event loop
///
/// Three sources feed it: keyboard input, a periodic tick (redraw and
/// toast expiry) and gateway events. tokio::select! waits on all of
/// them and applies whichever fires to the single-threaded app state.
async fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    event_rx: &mut mpsc::UnboundedReceiver<AppEvent>,
) -> Result<()> {
    let mut tick_interval = tokio::time::interval(Duration::from_millis(200));

    loop {
        terminal
            .draw(|f| views::draw(f, app))
            .context("Failed to draw terminal")?;

        tokio::select! {
            // Keyboard input
            _ = async {
                if event::poll(Duration::from_millis(10)).unwrap_or(false) {
                    if let Ok(Event::Key(key_event)) = event::read() {
                        handle_key_event(app, key_event);
                    }
                }
            } => {}

            // Periodic tick for redrawing
            _ = tick_interval.tick() => {
                app.clear_expired_toast();
            }

            // Gateway deliveries
            Some(gateway_event) = event_rx.recv() => {
                app.handle_event(gateway_event);
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

/// Handle keyboard input
/// Layered dispatch: Modal → Global → View
fn handle_key_event(app: &mut App, key_event: KeyEvent) {
    // Layer 1: Modal captures all input when active
    if handle_modal_input(app, &key_event) {
        return;
    }

    // Layer 2: Global keys (work on every route)
    if handle_global_keys(app, &key_event) {
        return;
    }

    let key = key_event.code;

    // Layer 3: Table navigation, with hold-to-repeat via InputHandler
    match key_event.kind {
        KeyEventKind::Press => {
            if !app.handle_key_press(key) {
                return;
            }
            match key {
                KeyCode::Up | KeyCode::Char('k') => app.select_previous(),
                KeyCode::Down | KeyCode::Char('j') => app.select_next(),
                _ => {}
            }
        }
        KeyEventKind::Release => {
            app.handle_key_release(key);
        }
        _ => {}
    }
}

/// Handle modal input - returns true if the modal absorbed the input
fn handle_modal_input(app: &mut App, key_event: &KeyEvent) -> bool {
    let Some(ref mut modal) = app.modal else {
        return false;
    };

    // Always process Release events to keep InputHandler in sync.
    // Without this, keys get stuck in "pressed" state after modal closes.
    if key_event.kind == KeyEventKind::Release {
        app.handle_key_release(key_event.code);
        return true;
    }

    if key_event.kind != KeyEventKind::Press {
        return true;
    }

    match modal.handle_input(key_event.code) {
        ModalAction::None => {}
        ModalAction::Close => app.close_modal(),
        ModalAction::SubmitTicket => app.submit_form(),
    }

    true
}

/// Handle global keys - returns true if handled
fn handle_global_keys(app: &mut App, key_event: &KeyEvent) -> bool {
    if key_event.kind != KeyEventKind::Press {
        return false;
    }

    let key = key_event.code;

    match key {
        // Quit
        KeyCode::Char('q') | KeyCode::Char('Q') => {
            if app.handle_key_press(key) {
                app.should_quit = true;
            }
            true
        }
        // New ticket
        KeyCode::Char('n') | KeyCode::Char('N') => {
            if app.handle_key_press(key) {
                app.open_create_form();
            }
            true
        }
        // Logout
        KeyCode::Char('L') => {
            if app.handle_key_press(key) {
                app.request_sign_out();
            }
            true
        }
        // Help modal
        KeyCode::Char('?') => {
            if app.handle_key_press(key) {
                app.modal = Some(modal::Modal::help());
            }
            true
        }
        _ => false,
    }
}
