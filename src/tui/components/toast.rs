//! Toast notification component
//!
//! A non-blocking overlay that auto-dismisses; expiry is handled by the
//! tick in the event loop. Renders in the bottom-right corner on top of
//! all other content.

use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Style},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

pub fn render(f: &mut Frame, area: Rect, message: &str) {
    // 4 extra cells for padding and border
    let width = (message.chars().count() as u16 + 4).min(area.width.saturating_sub(4));
    let height = 3;

    let x = area.right().saturating_sub(width + 2);
    let y = area.bottom().saturating_sub(height + 2);
    let toast_area = Rect::new(x, y, width, height);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let text = Paragraph::new(message)
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::White))
        .block(block);

    // Clear the area first so the toast appears on top
    f.render_widget(Clear, toast_area);
    f.render_widget(text, toast_area);
}
