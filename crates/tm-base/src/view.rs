//! Render collaborator seen by the session core.
//!
//! The host owns the mount point (a DOM container, a terminal pane, ...).
//! The core only appends, rewrites and clears messages through this trait.

use crate::message::Message;

pub trait ChatView: Send + Sync {
    /// Append a message at the bottom of the mount.
    fn append(&self, message: &Message);

    /// Rewrite the text of the rendered message carrying `message_id`.
    /// Returns false when no such message is currently rendered.
    fn update(&self, message_id: &str, text: &str) -> bool;

    /// Transient indicator while a query is in flight. Calls nest: the
    /// indicator stays up until every `show_loading` has its `hide_loading`.
    fn show_loading(&self);

    fn hide_loading(&self);

    /// Drop everything rendered so far (the widget was closed).
    fn clear(&self);
}
