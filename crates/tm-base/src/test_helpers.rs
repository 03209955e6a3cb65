//! Fakes for the render collaborator and the clock.
//! Not gated behind `#[cfg(test)]` so downstream crates can use them.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::clock::Clock;
use crate::message::Message;
use crate::view::ChatView;

/// Everything a `RecordingView` was asked to do, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    Append(Message),
    Update { id: String, text: String },
    ShowLoading,
    HideLoading,
    Clear,
}

/// In-memory mount point that keeps the rendered transcript and an event log.
#[derive(Default)]
pub struct RecordingView {
    transcript: Mutex<Vec<Message>>,
    /// Outstanding `show_loading` calls
    loading: Mutex<usize>,
    events: Mutex<Vec<ViewEvent>>,
}

impl RecordingView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transcript(&self) -> Vec<Message> {
        self.transcript.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn events(&self) -> Vec<ViewEvent> {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn is_loading(&self) -> bool {
        *self.loading.lock().unwrap_or_else(|e| e.into_inner()) > 0
    }

    pub fn text_of(&self, id: &str) -> Option<String> {
        self.transcript().into_iter().find(|m| m.has_id(id)).map(|m| m.text)
    }

    fn record(&self, event: ViewEvent) {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).push(event);
    }
}

impl ChatView for RecordingView {
    fn append(&self, message: &Message) {
        self.transcript.lock().unwrap_or_else(|e| e.into_inner()).push(message.clone());
        self.record(ViewEvent::Append(message.clone()));
    }

    fn update(&self, message_id: &str, text: &str) -> bool {
        self.record(ViewEvent::Update { id: message_id.to_string(), text: text.to_string() });
        let mut transcript = self.transcript.lock().unwrap_or_else(|e| e.into_inner());
        match transcript.iter_mut().find(|m| m.has_id(message_id)) {
            Some(msg) => {
                msg.text = text.to_string();
                true
            }
            None => false,
        }
    }

    fn show_loading(&self) {
        *self.loading.lock().unwrap_or_else(|e| e.into_inner()) += 1;
        self.record(ViewEvent::ShowLoading);
    }

    fn hide_loading(&self) {
        let mut loading = self.loading.lock().unwrap_or_else(|e| e.into_inner());
        *loading = loading.saturating_sub(1);
        drop(loading);
        self.record(ViewEvent::HideLoading);
    }

    fn clear(&self) {
        self.transcript.lock().unwrap_or_else(|e| e.into_inner()).clear();
        self.record(ViewEvent::Clear);
    }
}

/// Clock that only moves when told to.
pub struct ManualClock {
    ms: AtomicU64,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self { ms: AtomicU64::new(start_ms) }
    }

    pub fn advance(&self, by: Duration) {
        self.ms.fetch_add(by.as_millis() as u64, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.ms.load(Ordering::SeqCst)
    }
}
