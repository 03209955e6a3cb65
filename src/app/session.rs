//! Session controller: turns UI events into history, dispatch and
//! reconciliation work, and pushes every resulting message to the view.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use tm_base::config::STRINGS;
use tm_base::message::next_message_id;
use tm_base::{ChatView, Clock, Message, PendingKey};
use tm_mod_backend::{Dispatcher, Outcome};
use tm_mod_history::HistoryStore;
use tm_mod_reconcile::{PendingQuery, Poller};

/// Whether the widget is currently open for a content id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    NotStarted,
    Active,
}

/// What `submit_query` did with the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Blank input, nothing happened
    Ignored,
    /// The same question is already being answered for this content id
    AlreadyPending,
    Answered,
    Deferred { message_id: String },
    Failed { reason: String },
}

pub struct SessionController {
    history: Arc<HistoryStore>,
    dispatcher: Dispatcher,
    poller: Poller,
    view: Arc<dyn ChatView>,
    clock: Arc<dyn Clock>,
    sessions: Mutex<HashMap<String, SessionState>>,
    /// Queries between "user message stored" and "outcome handled"
    in_flight: Mutex<HashSet<PendingKey>>,
}

/// Removes a key from the in-flight set when the submit finishes, however it ends.
struct InFlightGuard<'a> {
    set: &'a Mutex<HashSet<PendingKey>>,
    key: PendingKey,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.set.lock().unwrap_or_else(|e| e.into_inner()).remove(&self.key);
    }
}

impl SessionController {
    pub fn new(
        history: Arc<HistoryStore>,
        dispatcher: Dispatcher,
        poller: Poller,
        view: Arc<dyn ChatView>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            history,
            dispatcher,
            poller,
            view,
            clock,
            sessions: Mutex::new(HashMap::new()),
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    pub fn poller(&self) -> &Poller {
        &self.poller
    }

    pub fn state(&self, content_id: &str) -> SessionState {
        self.sessions.lock().unwrap_or_else(|e| e.into_inner()).get(content_id).copied().unwrap_or_default()
    }

    /// Activate the session for `content_id` and render its history.
    /// Returns false when it was already active (nothing is rendered twice).
    pub fn open_session(&self, content_id: &str) -> bool {
        {
            let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
            let state = sessions.entry(content_id.to_string()).or_default();
            if *state == SessionState::Active {
                tracing::debug!(content_id, "session already active");
                return false;
            }
            *state = SessionState::Active;
        }

        let messages = match self.history.load(content_id) {
            Ok(messages) => messages,
            Err(e) => {
                tracing::warn!(content_id, error = %e, "failed to load history, showing greeting only");
                vec![Message::assistant(self.history.greeting())]
            }
        };
        for msg in &messages {
            self.view.append(msg);
        }
        tracing::info!(content_id, messages = messages.len(), "session opened");
        true
    }

    /// Close the widget. Pending queries keep polling and still land in history.
    pub fn close_session(&self, content_id: &str) {
        let was_active = self
            .sessions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(content_id.to_string(), SessionState::NotStarted)
            == Some(SessionState::Active);
        if was_active {
            self.view.clear();
            tracing::info!(content_id, "session closed");
        }
    }

    /// Handle one question typed by the viewer. Blocks for the dispatch round trip.
    pub fn submit_query(&self, content_id: &str, raw_query: &str) -> SubmitOutcome {
        let query = raw_query.trim();
        if query.is_empty() {
            return SubmitOutcome::Ignored;
        }

        let key = PendingKey::new(content_id, query);
        let Some(_guard) = self.claim(&key) else {
            tracing::debug!(%key, "identical query still outstanding, ignored");
            return SubmitOutcome::AlreadyPending;
        };

        let user_msg = Message::user(query);
        if let Err(e) = self.history.append(content_id, user_msg.clone()) {
            tracing::warn!(content_id, error = %e, "failed to store user message");
        }
        self.view.append(&user_msg);

        self.view.show_loading();
        let outcome = self.dispatcher.send(content_id, query);
        self.view.hide_loading();

        match outcome {
            Outcome::Answered { text } => {
                self.show_and_store(content_id, Message::assistant(text));
                SubmitOutcome::Answered
            }
            Outcome::Deferred { text } => {
                let message_id = next_message_id(self.clock.now_ms());
                self.show_and_store(content_id, Message::tracked_assistant(message_id.clone(), text));
                self.poller.register(PendingQuery {
                    content_id: content_id.to_string(),
                    query: query.to_string(),
                    message_id: message_id.clone(),
                    created_at_ms: self.clock.now_ms(),
                });
                SubmitOutcome::Deferred { message_id }
            }
            Outcome::Failed { reason } => {
                // Shown inline only; a failed dispatch leaves no trace in history
                self.view.append(&Message::assistant(STRINGS.error_text(&reason)));
                SubmitOutcome::Failed { reason }
            }
        }
    }

    /// Mark `key` as in flight unless it is already in flight or pending.
    fn claim(&self, key: &PendingKey) -> Option<InFlightGuard<'_>> {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        if in_flight.contains(key) || self.poller.is_pending(key) {
            return None;
        }
        in_flight.insert(key.clone());
        Some(InFlightGuard { set: &self.in_flight, key: key.clone() })
    }

    fn show_and_store(&self, content_id: &str, msg: Message) {
        self.view.append(&msg);
        if let Err(e) = self.history.append(content_id, msg) {
            tracing::warn!(content_id, error = %e, "failed to store assistant message");
        }
    }
}
