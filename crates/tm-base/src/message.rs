use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

/// One entry of a conversation history.
///
/// `id` is only set on assistant messages that reconciliation may rewrite later.
/// Persisted as `{ "role": ..., "text": ..., "id"?: ... }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self { role: Role::User, text: text.into(), id: None }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self { role: Role::Assistant, text: text.into(), id: None }
    }

    /// Assistant message that can be located again by `id`.
    pub fn tracked_assistant(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self { role: Role::Assistant, text: text.into(), id: Some(id.into()) }
    }

    pub fn has_id(&self, id: &str) -> bool {
        self.id.as_deref() == Some(id)
    }
}

/// Composite key of a pending query: one outstanding answer per (content, query text).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PendingKey {
    pub content_id: String,
    pub query: String,
}

impl PendingKey {
    pub fn new(content_id: impl Into<String>, query: impl Into<String>) -> Self {
        Self { content_id: content_id.into(), query: query.into() }
    }
}

impl std::fmt::Display for PendingKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.content_id, self.query)
    }
}

/// Generate a message id. Unique within the process even for ids minted in the same millisecond.
pub fn next_message_id(now_ms: u64) -> String {
    static SEQ: AtomicU64 = AtomicU64::new(1);
    format!("msg_{}_{}", now_ms, SEQ.fetch_add(1, Ordering::Relaxed))
}
