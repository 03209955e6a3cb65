use std::path::PathBuf;

/// Failure of the key-value store backing the histories.
///
/// Never fatal for a session: callers log it and keep going.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("I/O error on {}: {source}", path.display())]
    Io { path: PathBuf, source: std::io::Error },

    #[error("corrupt history file {}: {source}", path.display())]
    Parse { path: PathBuf, source: serde_json::Error },

    #[error("failed to serialize history for '{key}': {source}")]
    Serialize { key: String, source: serde_json::Error },

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}
