//! Shared polling loop for deferred answers.
//!
//! One background thread exists while the registry is non-empty. Each tick it
//! snapshots the registry, releases the lock, polls the backend for every
//! snapshotted entry, and settles the ones that resolved or expired. The stop
//! decision and `register` take the same lock, so an entry registered while
//! the thread is winding down always gets a new thread.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::thread;

use tm_base::config::STRINGS;
use tm_base::settings::ExpiryPolicy;
use tm_base::{ChatView, Clock, PendingKey};
use tm_mod_backend::QueryBackend;
use tm_mod_history::HistoryStore;

use crate::pending::{PendingQuery, PollerConfig, TickReport};

#[derive(Default)]
struct Registry {
    entries: BTreeMap<PendingKey, PendingQuery>,
    /// A polling thread is alive (or about to be)
    running: bool,
}

struct Inner {
    registry: Mutex<Registry>,
    backend: Arc<dyn QueryBackend>,
    history: Arc<HistoryStore>,
    view: Arc<dyn ChatView>,
    clock: Arc<dyn Clock>,
    config: PollerConfig,
}

/// Handle to the pending registry and its polling thread. Cheap to clone.
#[derive(Clone)]
pub struct Poller {
    inner: Arc<Inner>,
}

impl Poller {
    pub fn new(
        backend: Arc<dyn QueryBackend>,
        history: Arc<HistoryStore>,
        view: Arc<dyn ChatView>,
        clock: Arc<dyn Clock>,
        config: PollerConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner { registry: Mutex::new(Registry::default()), backend, history, view, clock, config }),
        }
    }

    /// Track a deferred query and make sure the polling thread runs.
    /// Returns false (and changes nothing) if the same (content, query) is already pending.
    pub fn register(&self, pending: PendingQuery) -> bool {
        let key = pending.key();
        let start_thread = {
            let mut registry = self.inner.registry.lock().unwrap_or_else(|e| e.into_inner());
            if registry.entries.contains_key(&key) {
                tracing::debug!(%key, "already pending, registration ignored");
                return false;
            }
            registry.entries.insert(key.clone(), pending);
            !std::mem::replace(&mut registry.running, true)
        };
        tracing::debug!(%key, "registered pending query");

        if start_thread {
            self.spawn_loop();
        }
        true
    }

    pub fn is_pending(&self, key: &PendingKey) -> bool {
        self.inner.registry.lock().unwrap_or_else(|e| e.into_inner()).entries.contains_key(key)
    }

    pub fn pending(&self) -> Vec<PendingQuery> {
        self.inner.registry.lock().unwrap_or_else(|e| e.into_inner()).entries.values().cloned().collect()
    }

    pub fn pending_count(&self) -> usize {
        self.inner.registry.lock().unwrap_or_else(|e| e.into_inner()).entries.len()
    }

    pub fn is_running(&self) -> bool {
        self.inner.registry.lock().unwrap_or_else(|e| e.into_inner()).running
    }

    /// Run one sweep now, independent of the polling thread.
    pub fn tick(&self) -> TickReport {
        sweep(&self.inner)
    }

    fn spawn_loop(&self) {
        let inner = Arc::clone(&self.inner);
        let spawned = thread::Builder::new().name("reconcile-poller".to_string()).spawn(move || poll_loop(inner));
        if let Err(e) = spawned {
            // Leave `running` false so the next registration tries again
            tracing::error!(error = %e, "failed to spawn reconcile poller thread");
            self.inner.registry.lock().unwrap_or_else(|e| e.into_inner()).running = false;
        }
    }
}

/// Background polling loop. Exits once a sweep leaves the registry empty.
fn poll_loop(inner: Arc<Inner>) {
    tracing::debug!("reconcile poller started");
    loop {
        thread::sleep(inner.config.interval);

        sweep(&inner);

        let mut registry = inner.registry.lock().unwrap_or_else(|e| e.into_inner());
        if registry.entries.is_empty() {
            registry.running = false;
            break;
        }
    }
    tracing::debug!("reconcile poller stopped");
}

/// Check every registered entry once: expire, resolve, or leave pending.
fn sweep(inner: &Inner) -> TickReport {
    let now = inner.clock.now_ms();
    let snapshot: Vec<PendingQuery> = {
        let registry = inner.registry.lock().unwrap_or_else(|e| e.into_inner());
        registry.entries.values().cloned().collect()
    };

    let mut report = TickReport::default();
    for pending in snapshot {
        let key = pending.key();

        if pending.is_expired(now, inner.config.timeout) {
            expire(inner, &pending);
            remove(inner, &key);
            report.expired.push(key);
            continue;
        }

        match inner.backend.check_result(&pending.content_id, &pending.query) {
            Ok(reply) if reply.found => {
                let text = reply.answer.filter(|a| !a.is_empty()).unwrap_or_else(|| STRINGS.no_response.clone());
                resolve(inner, &pending, &text);
                remove(inner, &key);
                report.resolved.push(key);
            }
            Ok(_) => tracing::trace!(%key, "not ready yet"),
            // Retried next tick; failures never expire an entry early
            Err(e) => tracing::warn!(%key, error = %e, "check_result failed"),
        }
    }

    report.remaining = inner.registry.lock().unwrap_or_else(|e| e.into_inner()).entries.len();
    report
}

fn remove(inner: &Inner, key: &PendingKey) {
    inner.registry.lock().unwrap_or_else(|e| e.into_inner()).entries.remove(key);
}

/// Show the final answer, then persist it so view and history agree.
fn resolve(inner: &Inner, pending: &PendingQuery, text: &str) {
    tracing::info!(content_id = %pending.content_id, message_id = %pending.message_id, "deferred answer resolved");
    rewrite_placeholder(inner, pending, text);
}

fn expire(inner: &Inner, pending: &PendingQuery) {
    tracing::info!(
        content_id = %pending.content_id,
        message_id = %pending.message_id,
        policy = ?inner.config.expiry_policy,
        "pending query expired"
    );
    match inner.config.expiry_policy {
        ExpiryPolicy::RewritePlaceholder => rewrite_placeholder(inner, pending, &STRINGS.expired_notice),
        ExpiryPolicy::LeavePlaceholder => {}
    }
}

fn rewrite_placeholder(inner: &Inner, pending: &PendingQuery, text: &str) {
    if !inner.view.update(&pending.message_id, text) {
        tracing::debug!(message_id = %pending.message_id, "placeholder not on screen, history only");
    }
    if let Err(e) = inner.history.update_by_id(&pending.content_id, &pending.message_id, text) {
        tracing::warn!(content_id = %pending.content_id, error = %e, "failed to persist reconciled message");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};
    use tm_base::Message;
    use tm_base::test_helpers::{ManualClock, RecordingView};
    use tm_mod_backend::test_helpers::ScriptedBackend;
    use tm_mod_history::{KeyValueStore, MemoryStore};

    const PLACEHOLDER: &str = "I'm analyzing this long video (it may take a minute).";
    const START_MS: u64 = 1_700_000_000_000;

    struct Fixture {
        backend: Arc<ScriptedBackend>,
        store: Arc<MemoryStore>,
        history: Arc<HistoryStore>,
        view: Arc<RecordingView>,
        clock: Arc<ManualClock>,
        poller: Poller,
    }

    fn fixture(interval: Duration, policy: ExpiryPolicy) -> Fixture {
        let backend = Arc::new(ScriptedBackend::new());
        let store = Arc::new(MemoryStore::new());
        let history = Arc::new(HistoryStore::with_greeting(Arc::clone(&store) as Arc<dyn KeyValueStore>, "Hi"));
        let view = Arc::new(RecordingView::new());
        let clock = Arc::new(ManualClock::new(START_MS));
        let config = PollerConfig { interval, timeout: Duration::from_secs(120), expiry_policy: policy };
        let poller = Poller::new(
            Arc::clone(&backend) as Arc<dyn QueryBackend>,
            Arc::clone(&history),
            Arc::clone(&view) as Arc<dyn ChatView>,
            Arc::clone(&clock) as Arc<dyn Clock>,
            config,
        );
        Fixture { backend, store, history, view, clock, poller }
    }

    /// Manual ticks only: the background thread sleeps far longer than any test.
    fn manual_fixture() -> Fixture {
        fixture(Duration::from_secs(3600), ExpiryPolicy::RewritePlaceholder)
    }

    /// Placeholder in view and history, then registered, as the session does it.
    fn defer(f: &Fixture, content_id: &str, query: &str, message_id: &str) -> bool {
        let placeholder = Message::tracked_assistant(message_id, PLACEHOLDER);
        f.history.load(content_id).unwrap();
        f.history.append(content_id, placeholder.clone()).unwrap();
        f.view.append(&placeholder);
        f.poller.register(PendingQuery {
            content_id: content_id.into(),
            query: query.into(),
            message_id: message_id.into(),
            created_at_ms: f.clock.now_ms(),
        })
    }

    fn stored_text(f: &Fixture, content_id: &str, message_id: &str) -> Option<String> {
        f.store.snapshot(content_id)?.into_iter().find(|m| m.has_id(message_id)).map(|m| m.text)
    }

    fn wait_until(timeout: Duration, cond: impl Fn() -> bool) -> bool {
        let start = Instant::now();
        while start.elapsed() < timeout {
            if cond() {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        cond()
    }

    #[test]
    fn register_starts_poller_once_and_rejects_duplicates() {
        let f = manual_fixture();
        assert!(!f.poller.is_running());

        assert!(defer(&f, "vid", "q", "msg_1"));
        assert!(f.poller.is_running());
        assert_eq!(f.poller.pending_count(), 1);

        let dup = PendingQuery { content_id: "vid".into(), query: "q".into(), message_id: "msg_2".into(), created_at_ms: 0 };
        assert!(!f.poller.register(dup));
        assert_eq!(f.poller.pending()[0].message_id, "msg_1");
    }

    #[test]
    fn found_result_rewrites_view_and_history() {
        let f = manual_fixture();
        defer(&f, "vid", "why?", "msg_1");
        f.backend.finish("vid", "why?", "final text");

        let report = f.poller.tick();

        assert_eq!(report.resolved, vec![PendingKey::new("vid", "why?")]);
        assert_eq!(report.remaining, 0);
        assert_eq!(f.view.text_of("msg_1").as_deref(), Some("final text"));
        assert_eq!(stored_text(&f, "vid", "msg_1").as_deref(), Some("final text"));
        assert!(!f.poller.is_pending(&PendingKey::new("vid", "why?")));
    }

    #[test]
    fn unfinished_query_stays_pending() {
        let f = manual_fixture();
        defer(&f, "vid", "q", "msg_1");

        let report = f.poller.tick();

        assert!(report.resolved.is_empty() && report.expired.is_empty());
        assert_eq!(report.remaining, 1);
        assert_eq!(f.view.text_of("msg_1").as_deref(), Some(PLACEHOLDER));
        assert_eq!(f.backend.check_calls(), 1);
    }

    #[test]
    fn poll_failures_are_retried_not_expired() {
        let f = manual_fixture();
        defer(&f, "vid", "q", "msg_1");
        f.backend.set_check_failing(true);

        for _ in 0..3 {
            f.clock.advance(Duration::from_secs(5));
            assert_eq!(f.poller.tick().remaining, 1);
        }
        assert_eq!(f.backend.check_calls(), 3);

        f.backend.set_check_failing(false);
        f.backend.finish("vid", "q", "late answer");
        assert_eq!(f.poller.tick().resolved.len(), 1);
        assert_eq!(stored_text(&f, "vid", "msg_1").as_deref(), Some("late answer"));
    }

    #[test]
    fn expired_query_is_dropped_without_polling() {
        let f = manual_fixture();
        defer(&f, "vid", "q", "msg_1");
        f.poller.tick();
        assert_eq!(f.backend.check_calls(), 1);

        f.clock.advance(Duration::from_secs(121));
        let report = f.poller.tick();

        assert_eq!(report.expired, vec![PendingKey::new("vid", "q")]);
        assert_eq!(report.remaining, 0);
        assert_eq!(f.backend.check_calls(), 1);

        f.poller.tick();
        assert!(f.backend.check_log().iter().all(|k| k == &PendingKey::new("vid", "q")));
        assert_eq!(f.backend.check_calls(), 1);
    }

    #[test]
    fn expiry_rewrites_placeholder_by_default() {
        let f = manual_fixture();
        defer(&f, "vid", "q", "msg_1");
        f.clock.advance(Duration::from_secs(121));
        f.poller.tick();

        assert_eq!(f.view.text_of("msg_1"), Some(STRINGS.expired_notice.clone()));
        assert_eq!(stored_text(&f, "vid", "msg_1"), Some(STRINGS.expired_notice.clone()));
    }

    #[test]
    fn leave_policy_keeps_placeholder_text() {
        let f = fixture(Duration::from_secs(3600), ExpiryPolicy::LeavePlaceholder);
        defer(&f, "vid", "q", "msg_1");
        f.clock.advance(Duration::from_secs(121));

        assert_eq!(f.poller.tick().expired.len(), 1);
        assert_eq!(f.view.text_of("msg_1").as_deref(), Some(PLACEHOLDER));
        assert_eq!(stored_text(&f, "vid", "msg_1").as_deref(), Some(PLACEHOLDER));
    }

    #[test]
    fn entries_settle_independently() {
        let f = manual_fixture();
        defer(&f, "vid", "first", "msg_1");
        defer(&f, "vid", "second", "msg_2");
        defer(&f, "other", "first", "msg_3");
        f.backend.finish("vid", "second", "answer two");

        let report = f.poller.tick();

        assert_eq!(report.resolved, vec![PendingKey::new("vid", "second")]);
        assert_eq!(report.remaining, 2);
        assert_eq!(stored_text(&f, "vid", "msg_2").as_deref(), Some("answer two"));
        assert_eq!(stored_text(&f, "vid", "msg_1").as_deref(), Some(PLACEHOLDER));
    }

    #[test]
    fn resolved_while_widget_closed_still_persists() {
        let f = manual_fixture();
        defer(&f, "vid", "q", "msg_1");
        f.view.clear();
        f.backend.finish("vid", "q", "final text");

        f.poller.tick();

        assert!(f.view.transcript().is_empty());
        assert_eq!(stored_text(&f, "vid", "msg_1").as_deref(), Some("final text"));
    }

    #[test]
    fn thread_stops_after_last_resolution_and_stops_polling() {
        let f = fixture(Duration::from_millis(20), ExpiryPolicy::RewritePlaceholder);
        defer(&f, "vid", "q", "msg_1");
        assert!(f.poller.is_running());

        // A couple of empty polls first
        assert!(wait_until(Duration::from_secs(2), || f.backend.check_calls() >= 2));
        assert!(f.poller.is_running());

        f.backend.finish("vid", "q", "final text");
        assert!(wait_until(Duration::from_secs(2), || !f.poller.is_running()));
        assert_eq!(f.view.text_of("msg_1").as_deref(), Some("final text"));
        assert_eq!(stored_text(&f, "vid", "msg_1").as_deref(), Some("final text"));

        let calls = f.backend.check_calls();
        thread::sleep(Duration::from_millis(150));
        assert_eq!(f.backend.check_calls(), calls);
    }

    #[test]
    fn thread_stops_after_expiry() {
        let f = fixture(Duration::from_millis(20), ExpiryPolicy::RewritePlaceholder);
        defer(&f, "vid", "q", "msg_1");
        f.clock.advance(Duration::from_secs(121));

        assert!(wait_until(Duration::from_secs(2), || !f.poller.is_running()));
        assert_eq!(f.poller.pending_count(), 0);
        assert_eq!(f.backend.check_calls(), 0);
    }

    #[test]
    fn thread_restarts_for_new_registration() {
        let f = fixture(Duration::from_millis(20), ExpiryPolicy::RewritePlaceholder);
        defer(&f, "vid", "q1", "msg_1");
        f.backend.finish("vid", "q1", "one");
        assert!(wait_until(Duration::from_secs(2), || !f.poller.is_running()));

        defer(&f, "vid", "q2", "msg_2");
        assert!(f.poller.is_running());
        f.backend.finish("vid", "q2", "two");
        assert!(wait_until(Duration::from_secs(2), || !f.poller.is_running()));
        assert_eq!(stored_text(&f, "vid", "msg_2").as_deref(), Some("two"));
    }
}
