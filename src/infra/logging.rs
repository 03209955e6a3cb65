//! File logging. The terminal belongs to the chat UI, so nothing is written to stdout.

use std::fs::{self, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

/// Filter directives, e.g. `TUBEMATE_LOG=debug` or `TUBEMATE_LOG=tm_mod_reconcile=trace`.
pub const ENV_LOG: &str = "TUBEMATE_LOG";

fn build_env_filter() -> EnvFilter {
    EnvFilter::try_from_env(ENV_LOG).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Append log lines to `path`, creating its directory.
pub fn init_file_logging(path: &Path) -> io::Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(Mutex::new(file)).with_ansi(false).compact();
    tracing_subscriber::registry()
        .with(build_env_filter())
        .with(fmt_layer)
        .try_init()
        .map_err(io::Error::other)
}
