// Status bar component
//
// One line at the bottom: uptime, ticket count and the most recent log
// entry. Backend failures are logged and surfaced here rather than
// interrupting the dashboard.

use crate::tui::app::App;
use ratatui::{
    layout::Rect,
    style::{Color, Style},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

pub fn render(f: &mut Frame, area: Rect, app: &App) {
    let uptime = app.uptime();
    let mins = uptime.as_secs() / 60;
    let secs = uptime.as_secs() % 60;

    let last_log = app
        .log_buffer
        .last()
        .map(|entry| format!("{} {}", entry.level.as_str(), entry.message))
        .unwrap_or_default();

    let status_text = format!(
        " ⏱ {:02}:{:02} │ 🎫 {} │ {}",
        mins,
        secs,
        app.tickets.len(),
        last_log,
    );

    let status = Paragraph::new(status_text)
        .style(Style::default().fg(Color::Gray))
        .block(Block::default().borders(Borders::TOP));
    f.render_widget(status, area);
}
