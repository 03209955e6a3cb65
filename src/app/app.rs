use std::io;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossterm::event;
use ratatui::prelude::*;

use tm_base::config::constants::EVENT_POLL_MS;

use crate::app::events::{Action, handle_event};
use crate::app::session::SessionController;
use crate::ui;
use crate::ui::input::InputLine;
use crate::ui::view::TerminalView;

/// The chat widget for one video: input line, transcript, and the session behind them.
pub struct ChatApp {
    controller: Arc<SessionController>,
    view: Arc<TerminalView>,
    content_id: String,
    input: InputLine,
}

impl ChatApp {
    pub fn new(controller: Arc<SessionController>, view: Arc<TerminalView>, content_id: String) -> Self {
        Self { controller, view, content_id, input: InputLine::default() }
    }

    pub fn run(&mut self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> io::Result<()> {
        self.controller.open_session(&self.content_id);
        let mut needs_draw = true;

        loop {
            if event::poll(Duration::from_millis(EVENT_POLL_MS))? {
                let evt = event::read()?;
                if let Some(action) = handle_event(&evt) {
                    if action == Action::Close {
                        break;
                    }
                    self.apply(action);
                    needs_draw = true;
                }
            }

            // Worker and poller threads change the transcript behind our back
            if self.view.take_dirty() || needs_draw {
                let transcript = self.view.snapshot();
                terminal.draw(|frame| ui::render(frame, &transcript, &self.input))?;
                needs_draw = false;
            }
        }

        self.controller.close_session(&self.content_id);
        Ok(())
    }

    fn apply(&mut self, action: Action) {
        match action {
            Action::Insert(c) => self.input.insert(c),
            Action::Paste(text) => self.input.insert_str(&text),
            Action::Backspace => self.input.backspace(),
            Action::Delete => self.input.delete(),
            Action::CursorLeft => self.input.left(),
            Action::CursorRight => self.input.right(),
            Action::CursorHome => self.input.home(),
            Action::CursorEnd => self.input.end(),
            Action::Submit => self.submit(),
            Action::Close | Action::Redraw => {}
        }
    }

    /// Clear the input and answer on a worker thread so typing stays responsive.
    fn submit(&mut self) {
        let query = self.input.take();
        if query.trim().is_empty() {
            return;
        }
        let controller = Arc::clone(&self.controller);
        let content_id = self.content_id.clone();
        let spawned = thread::Builder::new().name("submit".to_string()).spawn(move || {
            let outcome = controller.submit_query(&content_id, &query);
            tracing::debug!(content_id = %content_id, ?outcome, "submit finished");
        });
        if let Err(e) = spawned {
            tracing::error!(error = %e, "failed to spawn submit thread");
        }
    }
}
