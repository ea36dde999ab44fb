// Signed-out surface
//
// Shown once the session stream reports no user. Sign-in itself happens
// elsewhere; this screen only points at it.

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

pub fn render(f: &mut Frame, area: Rect) {
    let content = Text::from(vec![
        Line::raw(""),
        Line::from(Span::styled(
            "  You are signed out.",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )),
        Line::raw(""),
        Line::raw("  Sign in from the account portal, then restart the"),
        Line::raw("  dashboard to pick up the new session."),
        Line::raw(""),
        Line::from(vec![
            Span::raw("  Press "),
            Span::styled("q", Style::default().fg(Color::Cyan)),
            Span::raw(" to quit."),
        ]),
    ]);

    let screen = Paragraph::new(content)
        .block(Block::default().borders(Borders::ALL).title(" Session "));
    f.render_widget(screen, area);
}
