mod conversation;
mod helpers;
pub mod input;
mod theme;
pub mod view;

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph},
};

use tm_base::config::STRINGS;

use input::InputLine;
use view::Transcript;

pub fn render(frame: &mut Frame, transcript: &Transcript, input: &InputLine) {
    let area = frame.area();
    frame.render_widget(Block::default().style(Style::default().bg(theme::BG_BASE)), area);

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),    // Conversation
            Constraint::Length(3), // Input
        ])
        .split(area);

    conversation::render_conversation(frame, transcript, layout[0]);
    render_input(frame, input, layout[1]);
}

fn render_input(frame: &mut Frame, input: &InputLine, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(ratatui::widgets::BorderType::Rounded)
        .border_style(Style::default().fg(theme::BORDER_FOCUS))
        .style(Style::default().bg(theme::BG_INPUT));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let line = if input.is_empty() {
        Line::from(Span::styled(STRINGS.input_placeholder.as_str(), Style::default().fg(theme::TEXT_MUTED).italic()))
    } else {
        Line::from(Span::styled(input.as_str(), Style::default().fg(theme::TEXT)))
    };

    // Keep the cursor in view on long input
    let col = input.cursor_col() as u16;
    let hscroll = col.saturating_sub(inner.width.saturating_sub(1));
    frame.render_widget(Paragraph::new(line).scroll((0, hscroll)), inner);
    frame.set_cursor_position((inner.x + col - hscroll, inner.y));
}
