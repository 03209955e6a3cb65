//! Reconciliation of deferred answers.
//!
//! A deferred query leaves a placeholder assistant message behind. The
//! `Poller` keeps one `PendingQuery` per (content id, query text), asks the
//! backend for each of them every interval, and rewrites the placeholder in
//! both the rendered view and the stored history once the answer exists.
//! Entries that outlive the timeout are dropped.
pub mod pending;
pub mod poller;

pub use pending::{PendingQuery, PollerConfig, TickReport};
pub use poller::Poller;
