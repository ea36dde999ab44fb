// Dashboard view - the signed-in user's ticket table
//
// Each snapshot replaces the whole table; rows keep the store's arrival
// order. Selection is display-only.

use crate::ticket::Priority;
use crate::tui::app::App;
use ratatui::{
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

pub fn render(f: &mut Frame, area: Rect, app: &App) {
    if app.tickets.is_empty() {
        let empty = Paragraph::new("No tickets yet. Press 'n' to create one.")
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL).title(" Tickets "));
        f.render_widget(empty, area);
        return;
    }

    let header = Row::new(vec!["Title", "Description", "Status", "Priority"])
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .bottom_margin(1);

    let rows = app.tickets.iter().map(|ticket| {
        let priority_style = match ticket.priority {
            Priority::High => Style::default().fg(Color::Red),
            Priority::Medium => Style::default().fg(Color::Yellow),
            Priority::Low => Style::default().fg(Color::Green),
        };
        Row::new(vec![
            Cell::from(ticket.title.as_str()),
            Cell::from(truncate(&ticket.description, 40)),
            Cell::from(ticket.status.as_str()),
            Cell::from(ticket.priority.as_str()).style(priority_style),
        ])
    });

    let table = Table::new(
        rows,
        [
            Constraint::Percentage(30),
            Constraint::Percentage(40),
            Constraint::Length(10),
            Constraint::Length(10),
        ],
    )
    .header(header)
    .row_highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!(" Tickets ({}) ", app.tickets.len())),
    );

    let mut state = TableState::default();
    state.select(app.selected);
    f.render_stateful_widget(table, area, &mut state);
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max.saturating_sub(1)).collect();
        format!("{cut}…")
    }
}
