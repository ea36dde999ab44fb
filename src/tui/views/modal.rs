// Modal overlay rendering
//
// Modals render on top of the main content:
// - Create-ticket form: fields, inline validation errors, busy label
// - Help modal: keyboard shortcuts

use crate::tui::app::App;
use crate::tui::form::{Field, TicketForm};
use crate::tui::modal::Modal;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

pub fn render(f: &mut Frame, modal: &Modal, _app: &mut App) {
    match modal {
        Modal::CreateTicket(form) => render_form(f, form),
        Modal::Help => render_help(f),
    }
}

/// Calculate centered rect for a modal dialog
fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(area.width), height.min(area.height))
}

fn render_form(f: &mut Frame, form: &TicketForm) {
    let focused_style = Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::BOLD);
    let label_style = Style::default().fg(Color::Gray);
    let error_style = Style::default().fg(Color::Red);
    let value_style = Style::default().fg(Color::White);

    let mut lines: Vec<Line> = vec![Line::raw("")];
    for field in Field::ORDER {
        let is_focused = form.focus == field;
        let marker = if is_focused { "▸ " } else { "  " };
        let label = if is_focused {
            Span::styled(format!("{}{}", marker, field.label()), focused_style)
        } else {
            Span::styled(format!("{}{}", marker, field.label()), label_style)
        };

        match field {
            Field::Priority => lines.push(Line::from(vec![
                label,
                Span::raw(": "),
                Span::styled(format!("◂ {} ▸", form.priority), value_style),
            ])),
            Field::Category => lines.push(Line::from(vec![
                label,
                Span::raw(": "),
                Span::styled(format!("◂ {} ▸", form.category), value_style),
            ])),
            Field::Submit => {
                lines.push(Line::raw(""));
                let submit_label = if form.is_submitting() {
                    Span::styled(
                        "  [ Submitting... ]",
                        Style::default().fg(Color::DarkGray),
                    )
                } else if form.focus == Field::Submit {
                    Span::styled("  [ Submit Ticket ]", focused_style)
                } else {
                    Span::styled("  [ Submit Ticket ]", label_style)
                };
                lines.push(Line::from(submit_label));
            }
            _ => {
                let cursor = if is_focused && !form.is_submitting() {
                    "▏"
                } else {
                    ""
                };
                lines.push(Line::from(vec![
                    label,
                    Span::raw(": "),
                    Span::styled(format!("{}{}", form.buffer_of(field), cursor), value_style),
                ]));
                // Inline validation error directly under the field
                if let Some(message) = field.error_key().and_then(|key| form.errors.get(key)) {
                    lines.push(Line::from(Span::styled(
                        format!("    ✗ {}", message),
                        error_style,
                    )));
                }
            }
        }
    }
    lines.push(Line::raw(""));
    lines.push(Line::from(Span::styled(
        "  Tab next · Shift+Tab prev · ◂▸ cycle · Esc cancel",
        Style::default().fg(Color::DarkGray),
    )));

    let height = lines.len() as u16 + 2;
    let area = centered_rect(64, height, f.area());
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" New Ticket ");

    f.render_widget(Clear, area);
    f.render_widget(Paragraph::new(Text::from(lines)).block(block), area);
}

fn render_help(f: &mut Frame) {
    let key_style = Style::default().fg(Color::Cyan);
    let desc_style = Style::default().fg(Color::White);
    let header_style = Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD);

    let kb = |key: &str, desc: &str| -> Line {
        Line::from(vec![
            Span::raw("    "),
            Span::styled(format!("{:<12}", key), key_style),
            Span::styled(desc.to_string(), desc_style),
        ])
    };

    let content = Text::from(vec![
        Line::raw(""),
        Line::from(Span::styled("  Tickets", header_style)),
        kb("n", "New ticket"),
        kb("↑/↓, j/k", "Move selection"),
        Line::raw(""),
        Line::from(Span::styled("  Session", header_style)),
        kb("L", "Log out"),
        Line::raw(""),
        Line::from(Span::styled("  General", header_style)),
        kb("?", "Toggle this help"),
        kb("q", "Quit"),
        Line::raw(""),
    ]);

    let height = content.lines.len() as u16 + 2;
    let area = centered_rect(44, height, f.area());
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Help ");

    f.render_widget(Clear, area);
    f.render_widget(Paragraph::new(content).block(block), area);
}
