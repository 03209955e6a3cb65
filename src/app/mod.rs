pub mod activation;
mod app;
pub mod context;
pub mod events;
pub mod session;

pub use app::ChatApp;
