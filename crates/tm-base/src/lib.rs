pub mod clock;
pub mod config;
pub mod message;
pub mod settings;
pub mod test_helpers;
pub mod view;

pub use clock::{Clock, SystemClock, now_ms};
pub use message::{Message, PendingKey, Role};
pub use view::ChatView;
