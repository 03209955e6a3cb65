//! Durable per-content conversation histories.
//!
//! A history is a flat, ordered list of messages stored under the content id.
//! Every mutation is a read-modify-write performed under a per-key lock, so
//! overlapping appends for the same video never lose a message.
pub mod error;
pub mod history;
pub mod store;

pub use error::StorageError;
pub use history::HistoryStore;
pub use store::{JsonFileStore, KeyValueStore, MemoryStore};
