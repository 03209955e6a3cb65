use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tm_base::Message;
use tm_base::config::STRINGS;

use crate::error::StorageError;
use crate::store::KeyValueStore;

/// Owner of every conversation history.
///
/// Each operation re-reads the latest persisted list immediately before
/// writing, while holding the lock for that content id.
pub struct HistoryStore {
    store: Arc<dyn KeyValueStore>,
    greeting: String,
    /// One lock per content id, created on first use
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl HistoryStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_greeting(store, STRINGS.greeting.clone())
    }

    pub fn with_greeting(store: Arc<dyn KeyValueStore>, greeting: impl Into<String>) -> Self {
        Self { store, greeting: greeting.into(), locks: Mutex::new(HashMap::new()) }
    }

    /// Text of the first message of every new history.
    pub fn greeting(&self) -> &str {
        &self.greeting
    }

    fn key_lock(&self, content_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        Arc::clone(locks.entry(content_id.to_string()).or_default())
    }

    /// Stored history, or a freshly persisted single-greeting history on first access.
    pub fn load(&self, content_id: &str) -> Result<Vec<Message>, StorageError> {
        let lock = self.key_lock(content_id);
        let _guard = lock.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(history) = self.store.get(content_id)? {
            return Ok(history);
        }

        let history = self.fresh_history();
        self.store.set(content_id, &history)?;
        tracing::debug!(content_id, "created history with greeting");
        Ok(history)
    }

    fn fresh_history(&self) -> Vec<Message> {
        vec![Message::assistant(self.greeting.clone())]
    }

    /// Stored history without creating one.
    pub fn get(&self, content_id: &str) -> Result<Option<Vec<Message>>, StorageError> {
        let lock = self.key_lock(content_id);
        let _guard = lock.lock().unwrap_or_else(|e| e.into_inner());
        self.store.get(content_id)
    }

    pub fn append(&self, content_id: &str, message: Message) -> Result<(), StorageError> {
        let lock = self.key_lock(content_id);
        let _guard = lock.lock().unwrap_or_else(|e| e.into_inner());

        // Appending is a first access too: a missing history starts with the greeting
        let mut history = self.store.get(content_id)?.unwrap_or_else(|| self.fresh_history());
        history.push(message);
        self.store.set(content_id, &history)
    }

    /// Rewrite the text of the message carrying `message_id`.
    /// Returns `Ok(false)` (and logs) when no such message exists.
    pub fn update_by_id(&self, content_id: &str, message_id: &str, new_text: &str) -> Result<bool, StorageError> {
        let lock = self.key_lock(content_id);
        let _guard = lock.lock().unwrap_or_else(|e| e.into_inner());

        let Some(mut history) = self.store.get(content_id)? else {
            tracing::warn!(content_id, message_id, "update_by_id: no history for content id");
            return Ok(false);
        };
        let Some(msg) = history.iter_mut().find(|m| m.has_id(message_id)) else {
            tracing::warn!(content_id, message_id, "update_by_id: no message with that id");
            return Ok(false);
        };
        msg.text = new_text.to_string();
        self.store.set(content_id, &history)?;
        Ok(true)
    }
}
