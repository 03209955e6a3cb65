use std::io::{self, Write};
use std::path::PathBuf;

use crossterm::ExecutableCommand;
use crossterm::event::DisableBracketedPaste;
use crossterm::terminal::{LeaveAlternateScreen, disable_raw_mode};

/// Restore the terminal and append the panic to `<errors_dir>/panic.log`.
/// Without this, a panic leaves the terminal in raw mode and the message is lost
/// behind the alternate screen.
pub fn install_panic_hook(errors_dir: PathBuf) {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = io::stdout().execute(DisableBracketedPaste);
        let _ = io::stdout().execute(LeaveAlternateScreen);

        let _ = std::fs::create_dir_all(&errors_dir);
        let ts = std::time::SystemTime::now().duration_since(std::time::UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0);
        let backtrace = std::backtrace::Backtrace::force_capture();
        let msg = format!("[{}] {}\n\n{}\n\n---\n", ts, info, backtrace);
        let _ = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(errors_dir.join("panic.log"))
            .and_then(|mut f| f.write_all(msg.as_bytes()));

        tracing::error!("panic: {}", info);
        default_hook(info);
    }));
}
