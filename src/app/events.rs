use crossterm::event::{Event, KeyCode, KeyEventKind, KeyModifiers};

/// What one terminal event asks the chat app to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Insert(char),
    Paste(String),
    Backspace,
    Delete,
    CursorLeft,
    CursorRight,
    CursorHome,
    CursorEnd,
    Submit,
    Close,
    Redraw,
}

pub fn handle_event(event: &Event) -> Option<Action> {
    match event {
        Event::Key(key) => {
            if key.kind == KeyEventKind::Release {
                return None;
            }
            let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
            if ctrl {
                return match key.code {
                    KeyCode::Char('c') | KeyCode::Char('q') => Some(Action::Close),
                    KeyCode::Char('a') => Some(Action::CursorHome),
                    KeyCode::Char('e') => Some(Action::CursorEnd),
                    _ => None,
                };
            }
            match key.code {
                KeyCode::Esc => Some(Action::Close),
                KeyCode::Enter => Some(Action::Submit),
                KeyCode::Backspace => Some(Action::Backspace),
                KeyCode::Delete => Some(Action::Delete),
                KeyCode::Left => Some(Action::CursorLeft),
                KeyCode::Right => Some(Action::CursorRight),
                KeyCode::Home => Some(Action::CursorHome),
                KeyCode::End => Some(Action::CursorEnd),
                KeyCode::Char(c) => Some(Action::Insert(c)),
                _ => None,
            }
        }
        Event::Paste(text) => Some(Action::Paste(text.clone())),
        Event::Resize(..) => Some(Action::Redraw),
        _ => None,
    }
}
