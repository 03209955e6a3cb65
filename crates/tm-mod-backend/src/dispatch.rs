use std::sync::Arc;

use tm_base::config::STRINGS;

use crate::api::QueryBackend;

/// What became of one dispatched query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Final answer (or the backend's error text, shown verbatim).
    Answered { text: String },
    /// Backend is still processing; `text` is the placeholder to show now.
    Deferred { text: String },
    /// No usable reply at all.
    Failed { reason: String },
}

/// Whether an answer is the backend's "still processing" placeholder.
///
/// The backend signals deferral only through this phrase inside the answer
/// text, so this is the single place to change if it ever sends a
/// structured flag instead.
pub fn is_deferred_answer(text: &str) -> bool {
    text.contains(STRINGS.deferred_marker.as_str())
}

/// Sends queries and classifies replies. Persists nothing.
pub struct Dispatcher {
    backend: Arc<dyn QueryBackend>,
}

impl Dispatcher {
    pub fn new(backend: Arc<dyn QueryBackend>) -> Self {
        Self { backend }
    }

    pub fn send(&self, content_id: &str, query: &str) -> Outcome {
        match self.backend.query(content_id, query) {
            Ok(reply) => {
                let text = reply.into_text(&STRINGS.no_response);
                if is_deferred_answer(&text) {
                    tracing::info!(content_id, query, "answer deferred by backend");
                    Outcome::Deferred { text }
                } else {
                    Outcome::Answered { text }
                }
            }
            Err(e) => {
                tracing::warn!(content_id, query, error = %e, "query dispatch failed");
                Outcome::Failed { reason: e.to_string() }
            }
        }
    }
}
