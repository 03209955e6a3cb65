mod app;
mod infra;
mod ui;

use std::io;
use std::sync::Arc;

use crossterm::{
    ExecutableCommand,
    event::{DisableBracketedPaste, EnableBracketedPaste},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::*;

use tm_base::ChatView;
use tm_base::settings::Settings;
use tm_mod_history::HistoryStore;

use app::ChatApp;
use app::activation::content_id_from_url;
use ui::view::TerminalView;

const USAGE: &str = "Usage:\n  tubemate <youtube-url | video-id>\n  tubemate history <youtube-url | video-id>";

fn main() -> io::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let settings = Settings::from_env();

    if let Err(e) = infra::logging::init_file_logging(&settings.log_path()) {
        eprintln!("warning: file logging disabled: {}", e);
    }
    // Parsing ran before the subscriber existed, so its rejections are reported here
    settings.log_summary();

    match args.get(1).map(String::as_str) {
        Some("history") => run_print_history(&settings, &args[2..]),
        Some("-h" | "--help") | None => {
            println!("{}", USAGE);
            Ok(())
        }
        Some(target) => run_chat(&settings, target),
    }
}

/// Open the chat widget for one video.
fn run_chat(settings: &Settings, target: &str) -> io::Result<()> {
    let content_id = match content_id_from_url(target) {
        Ok(id) => id,
        Err(e) => {
            // Not a video page: the widget never activates
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    let view = Arc::new(TerminalView::new());
    let controller = match app::context::build_controller(settings, Arc::clone(&view) as Arc<dyn ChatView>) {
        Ok(c) => Arc::new(c),
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    infra::panic::install_panic_hook(settings.errors_dir());
    tracing::info!(content_id = %content_id, "starting chat");

    enable_raw_mode()?;
    io::stdout().execute(EnterAlternateScreen)?;
    io::stdout().execute(EnableBracketedPaste)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;

    let result = ChatApp::new(controller, view, content_id).run(&mut terminal);

    // Cleanup. Any still-pending queries end with the process.
    disable_raw_mode()?;
    io::stdout().execute(DisableBracketedPaste)?;
    io::stdout().execute(LeaveAlternateScreen)?;
    result
}

/// Print the stored history for a video as JSON, without creating one.
/// Usage: tubemate history <youtube-url | video-id>
fn run_print_history(settings: &Settings, args: &[String]) -> io::Result<()> {
    let Some(target) = args.first() else {
        eprintln!("{}", USAGE);
        std::process::exit(1);
    };
    let content_id = match content_id_from_url(target) {
        Ok(id) => id,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    let history = HistoryStore::new(app::context::open_store(settings));
    match history.get(&content_id) {
        Ok(Some(messages)) => {
            let json = serde_json::to_string_pretty(&messages).map_err(io::Error::other)?;
            println!("{}", json);
            Ok(())
        }
        Ok(None) => {
            eprintln!("No history for {}", content_id);
            Ok(())
        }
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }
}
