use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use tm_base::{ChatView, Message};

/// What the terminal currently shows.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    pub messages: Vec<Message>,
    /// Dispatches currently waiting on the backend
    pub in_flight: usize,
}

impl Transcript {
    pub fn is_loading(&self) -> bool {
        self.in_flight > 0
    }
}

/// `ChatView` backed by an in-memory transcript that the render loop draws.
/// Worker and poller threads write to it; the loop redraws when `take_dirty` is set.
#[derive(Default)]
pub struct TerminalView {
    transcript: Mutex<Transcript>,
    dirty: AtomicBool,
}

impl TerminalView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Transcript {
        self.transcript.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Whether anything changed since the last call.
    pub fn take_dirty(&self) -> bool {
        self.dirty.swap(false, Ordering::AcqRel)
    }

    fn with_transcript<R>(&self, f: impl FnOnce(&mut Transcript) -> R) -> R {
        let mut transcript = self.transcript.lock().unwrap_or_else(|e| e.into_inner());
        let result = f(&mut *transcript);
        drop(transcript);
        self.dirty.store(true, Ordering::Release);
        result
    }
}

impl ChatView for TerminalView {
    fn append(&self, message: &Message) {
        self.with_transcript(|t| t.messages.push(message.clone()));
    }

    fn update(&self, message_id: &str, text: &str) -> bool {
        self.with_transcript(|t| match t.messages.iter_mut().find(|m| m.has_id(message_id)) {
            Some(msg) => {
                msg.text = text.to_string();
                true
            }
            None => false,
        })
    }

    fn show_loading(&self) {
        self.with_transcript(|t| t.in_flight += 1);
    }

    fn hide_loading(&self) {
        self.with_transcript(|t| t.in_flight = t.in_flight.saturating_sub(1));
    }

    fn clear(&self) {
        self.with_transcript(|t| *t = Transcript::default());
    }
}
