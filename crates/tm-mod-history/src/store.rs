//! Key-value backends: one ordered message list per key.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use sha2::{Digest, Sha256};

use tm_base::Message;

use crate::error::StorageError;

/// Flat key → message list storage.
///
/// Implementations only need plain get/set. Serializing concurrent
/// read-modify-write cycles is the job of `HistoryStore`.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Vec<Message>>, StorageError>;

    fn set(&self, key: &str, messages: &[Message]) -> Result<(), StorageError>;
}

// ============================================================================
// JSON files
// ============================================================================

/// One `<key>.json` file per content id under `dir`.
///
/// Keys that are not plain `[A-Za-z0-9_-]` identifiers are stored under the
/// SHA-256 of the key so they can never escape the directory.
pub struct JsonFileStore {
    dir: PathBuf,
}

/// Longest key used verbatim as a file name
const MAX_PLAIN_KEY_LEN: usize = 128;

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        let plain = !key.is_empty()
            && key.len() <= MAX_PLAIN_KEY_LEN
            && key.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
        let stem = if plain { key.to_string() } else { format!("{:x}", Sha256::digest(key.as_bytes())) };
        self.dir.join(format!("{}.json", stem))
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<Vec<Message>>, StorageError> {
        let path = self.path_for(key);
        let json = match fs::read_to_string(&path) {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(StorageError::Io { path, source }),
        };
        serde_json::from_str(&json).map(Some).map_err(|source| StorageError::Parse { path, source })
    }

    fn set(&self, key: &str, messages: &[Message]) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir).map_err(|source| StorageError::Io { path: self.dir.clone(), source })?;

        let json = serde_json::to_string_pretty(messages)
            .map_err(|source| StorageError::Serialize { key: key.to_string(), source })?;

        // Write-then-rename so a crash mid-write never leaves a truncated history.
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|source| StorageError::Io { path: tmp.clone(), source })?;
        fs::rename(&tmp, &path).map_err(|source| StorageError::Io { path, source })
    }
}

// ============================================================================
// In memory
// ============================================================================

/// Process-local store. Used by tests, and by the host when the store
/// directory cannot be used.
///
/// `with_read_delay` stretches every `get` so tests can force overlapping
/// read-modify-write cycles.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Vec<Message>>>,
    read_delay: Option<Duration>,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_read_delay(mut self, delay: Duration) -> Self {
        self.read_delay = Some(delay);
        self
    }

    /// Make every subsequent `set` fail with `StorageError::Unavailable`.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful `set` calls so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self, key: &str) -> Option<Vec<Message>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).get(key).cloned()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<Message>>, StorageError> {
        let value = self.snapshot(key);
        if let Some(delay) = self.read_delay {
            std::thread::sleep(delay);
        }
        Ok(value)
    }

    fn set(&self, key: &str, messages: &[Message]) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable(format!("writes disabled for '{}'", key)));
        }
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).insert(key.to_string(), messages.to_vec());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
