use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph},
};

use tm_base::config::STRINGS;
use tm_base::{Message, Role};

use super::helpers::wrap_text;
use super::theme;
use super::view::Transcript;

/// "You " / "AI  " gutter in front of every message.
const PREFIX_WIDTH: usize = 4;

pub fn render_conversation(frame: &mut Frame, transcript: &Transcript, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(ratatui::widgets::BorderType::Rounded)
        .border_style(Style::default().fg(theme::BORDER))
        .style(Style::default().bg(theme::BG_SURFACE))
        .title(Span::styled(format!(" {} ", STRINGS.title), Style::default().fg(theme::ACCENT).bold()))
        .title_alignment(Alignment::Left);

    let content_area = block.inner(area);
    frame.render_widget(block, area);

    let wrap_width = (content_area.width as usize).saturating_sub(PREFIX_WIDTH + 1);
    let mut lines = conversation_lines(transcript, wrap_width);

    if transcript.is_loading() {
        lines.push(Line::from(Span::styled(
            format!("{:PREFIX_WIDTH$}{}", "", STRINGS.loading),
            Style::default().fg(theme::WARNING).italic(),
        )));
    }

    // Stick to the bottom: newest messages stay visible
    let overflow = lines.len().saturating_sub(content_area.height as usize);
    let scroll = u16::try_from(overflow).unwrap_or(u16::MAX);
    frame.render_widget(Paragraph::new(lines).scroll((scroll, 0)), content_area);
}

/// Pre-wrapped lines, one blank line between messages.
pub fn conversation_lines(transcript: &Transcript, wrap_width: usize) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for msg in &transcript.messages {
        let (label, color) = role_style(msg);
        for (i, chunk) in msg.text.lines().flat_map(|l| wrap_text(l, wrap_width)).enumerate() {
            let gutter = if i == 0 { label } else { "" };
            lines.push(Line::from(vec![
                Span::styled(format!("{:<PREFIX_WIDTH$}", gutter), Style::default().fg(color).bold()),
                Span::styled(chunk, Style::default().fg(theme::TEXT)),
            ]));
        }
        lines.push(Line::from(""));
    }
    lines
}

fn role_style(msg: &Message) -> (&'static str, Color) {
    match msg.role {
        Role::User => ("You", theme::USER),
        Role::Assistant => ("AI", theme::ASSISTANT),
    }
}
