// Sidebar component
//
// Fixed-width navigation column: app name, nav entries and the logout
// control. Only one nav destination exists right now.

use crate::config::VERSION;
use crate::tui::app::{App, DashboardState};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

pub fn render(f: &mut Frame, area: Rect, app: &App) {
    let brand_style = Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::BOLD);
    let active_style = Style::default()
        .fg(Color::White)
        .add_modifier(Modifier::BOLD);
    let hint_style = Style::default().fg(Color::DarkGray);

    let mut lines = vec![
        Line::raw(""),
        Line::from(Span::styled("  tickwatch", brand_style)),
        Line::from(Span::styled(format!("  v{}", VERSION), hint_style)),
        Line::raw(""),
        Line::from(Span::styled("  ▸ Tickets", active_style)),
        Line::raw(""),
    ];

    if app.state == DashboardState::Authenticated {
        lines.push(Line::from(vec![
            Span::styled("  L ", Style::default().fg(Color::Cyan)),
            Span::styled("Logout", hint_style),
        ]));
        lines.push(Line::from(vec![
            Span::styled("  n ", Style::default().fg(Color::Cyan)),
            Span::styled("New ticket", hint_style),
        ]));
    }
    lines.push(Line::from(vec![
        Span::styled("  ? ", Style::default().fg(Color::Cyan)),
        Span::styled("Help", hint_style),
    ]));

    let sidebar = Paragraph::new(Text::from(lines))
        .block(Block::default().borders(Borders::RIGHT));
    f.render_widget(sidebar, area);
}
