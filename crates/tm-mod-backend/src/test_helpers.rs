//! Scripted stand-in for the query-answering service.
//! Not gated behind `#[cfg(test)]` so downstream crates can use them.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use tm_base::PendingKey;

use crate::api::QueryBackend;
use crate::error::BackendError;
use crate::types::{CheckReply, QueryReply};

/// Backend whose replies are queued by the test.
///
/// - `query` pops the next scripted reply (a network error when none is left).
/// - `check_result` reports found once `finish` was called for the key,
///   or fails while `set_check_failing(true)` is in effect.
/// Every call is recorded.
#[derive(Default)]
pub struct ScriptedBackend {
    query_replies: Mutex<VecDeque<Result<QueryReply, BackendError>>>,
    finished: Mutex<HashMap<PendingKey, String>>,
    check_failing: Mutex<bool>,
    query_delay: Mutex<Option<Duration>>,
    query_log: Mutex<Vec<PendingKey>>,
    check_log: Mutex<Vec<PendingKey>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_query_reply(&self, reply: Result<QueryReply, BackendError>) {
        self.query_replies.lock().unwrap_or_else(|e| e.into_inner()).push_back(reply);
    }

    /// Make the deferred result for (content_id, query) available.
    pub fn finish(&self, content_id: &str, query: &str, answer: &str) {
        self.finished
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(PendingKey::new(content_id, query), answer.to_string());
    }

    pub fn set_check_failing(&self, failing: bool) {
        *self.check_failing.lock().unwrap_or_else(|e| e.into_inner()) = failing;
    }

    /// Sleep inside every `query` call, to keep a dispatch in flight.
    pub fn set_query_delay(&self, delay: Duration) {
        *self.query_delay.lock().unwrap_or_else(|e| e.into_inner()) = Some(delay);
    }

    pub fn query_calls(&self) -> usize {
        self.query_log.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn check_calls(&self) -> usize {
        self.check_log.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn check_log(&self) -> Vec<PendingKey> {
        self.check_log.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl QueryBackend for ScriptedBackend {
    fn query(&self, content_id: &str, query: &str) -> Result<QueryReply, BackendError> {
        self.query_log.lock().unwrap_or_else(|e| e.into_inner()).push(PendingKey::new(content_id, query));
        let delay = *self.query_delay.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }
        self.query_replies
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
            .unwrap_or_else(|| Err(BackendError::Network("no scripted reply".to_string())))
    }

    fn check_result(&self, content_id: &str, query: &str) -> Result<CheckReply, BackendError> {
        let key = PendingKey::new(content_id, query);
        self.check_log.lock().unwrap_or_else(|e| e.into_inner()).push(key.clone());
        if *self.check_failing.lock().unwrap_or_else(|e| e.into_inner()) {
            return Err(BackendError::Network("connection reset".to_string()));
        }
        let finished = self.finished.lock().unwrap_or_else(|e| e.into_inner());
        Ok(match finished.get(&key) {
            Some(answer) => CheckReply::found(answer.clone()),
            None => CheckReply::not_found(),
        })
    }
}
