// Views module - screen-level rendering logic
//
// The shell is a sidebar plus a main column (title, content, status).
// The content area dispatches on the current route: the ticket table
// while signed in, the signed-out surface after redirect. Modal and
// toast overlays render on top of everything.

mod dashboard;
mod login;
mod modal;

use super::app::{App, DashboardState, Route};
use crate::tui::components;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Color, Style};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

/// Main UI render function - called on every frame
pub fn draw(f: &mut Frame, app: &mut App) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(24), Constraint::Min(30)])
        .split(f.area());

    components::sidebar::render(f, columns[0], app);

    let main = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(2),
        ])
        .split(columns[1]);

    render_title(f, main[0], app);

    match app.route {
        Route::Dashboard => match app.state {
            DashboardState::AwaitingSession => render_loading(f, main[1]),
            _ => dashboard::render(f, main[1], app),
        },
        Route::Login => login::render(f, main[1]),
    }

    components::status_bar::render(f, main[2], app);

    // Modal overlay (on top of the main content)
    // Take modal temporarily to avoid borrow conflict with mutable app
    if let Some(modal_state) = app.modal.take() {
        modal::render(f, &modal_state, app);
        app.modal = Some(modal_state);
    }

    // Toast notification (on top of the modal too)
    if let Some(ref toast) = app.toast {
        components::toast::render(f, f.area(), &toast.message);
    }
}

fn render_title(f: &mut Frame, area: ratatui::layout::Rect, app: &App) {
    let who = app
        .session
        .as_ref()
        .map(|s| s.email.clone().unwrap_or_else(|| s.uid.clone()))
        .unwrap_or_else(|| "not signed in".to_string());
    let title = Paragraph::new(format!(" My Tickets · {}", who))
        .style(Style::default().fg(Color::Cyan))
        .block(Block::default().borders(Borders::BOTTOM));
    f.render_widget(title, area);
}

fn render_loading(f: &mut Frame, area: ratatui::layout::Rect) {
    let text = Paragraph::new("Checking session...")
        .style(Style::default().fg(Color::DarkGray))
        .block(Block::default().borders(Borders::NONE));
    f.render_widget(text, area);
}
