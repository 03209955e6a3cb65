//! Client side of the query-answering service.
//!
//! `api` talks HTTP, `dispatch` turns a raw reply into an `Outcome` the
//! session can act on.
pub mod api;
pub mod dispatch;
pub mod error;
pub mod test_helpers;
pub mod types;

pub use api::{HttpBackend, QueryBackend};
pub use dispatch::{Dispatcher, Outcome, is_deferred_answer};
pub use error::BackendError;
pub use types::{CheckReply, QueryReply};
