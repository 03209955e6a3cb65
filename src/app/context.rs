//! Builds the long-lived services from `Settings`.

use std::sync::Arc;

use thiserror::Error;
use tm_base::settings::Settings;
use tm_base::{ChatView, Clock, SystemClock};
use tm_mod_backend::{BackendError, Dispatcher, HttpBackend, QueryBackend};
use tm_mod_history::{HistoryStore, JsonFileStore, KeyValueStore, MemoryStore};
use tm_mod_reconcile::{Poller, PollerConfig};

use super::session::SessionController;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("cannot build HTTP client: {0}")]
    Backend(#[from] BackendError),
}

/// On-disk history under the store directory, or an in-memory store
/// (with a warning) when that directory cannot be created.
pub fn open_store(settings: &Settings) -> Arc<dyn KeyValueStore> {
    let dir = settings.history_dir();
    match std::fs::create_dir_all(&dir) {
        Ok(()) => Arc::new(JsonFileStore::new(dir)),
        Err(e) => {
            tracing::warn!(dir = %dir.display(), error = %e, "history directory unavailable, history will not survive restart");
            Arc::new(MemoryStore::new())
        }
    }
}

pub fn build_controller(settings: &Settings, view: Arc<dyn ChatView>) -> Result<SessionController, StartupError> {
    let backend: Arc<dyn QueryBackend> = Arc::new(HttpBackend::new(&settings.backend_url, settings.request_timeout)?);
    let history = Arc::new(HistoryStore::new(open_store(settings)));
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let poller = Poller::new(
        Arc::clone(&backend),
        Arc::clone(&history),
        Arc::clone(&view),
        Arc::clone(&clock),
        PollerConfig::from(settings),
    );
    tracing::info!(backend = %settings.backend_url, store = %settings.store_dir.display(), "services ready");
    Ok(SessionController::new(history, Dispatcher::new(backend), poller, view, clock))
}
