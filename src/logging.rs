//! Tracing subscriber setup.
//!
//! One-shot modes log to stderr. The TUI owns the terminal, so it logs to a
//! file under the user's local data directory instead.

use crate::cli::Cli;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const LOG_DIR: &str = "blink-captions";
const LOG_FILE: &str = "blink-captions.log";

/// Filter precedence: `RUST_LOG`, then `--log-level`, then the mode default.
fn build_filter(args: &Cli) -> EnvFilter {
    let fallback = args
        .log_level
        .clone()
        .unwrap_or_else(|| default_level(args).to_string());
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback))
}

fn default_level(args: &Cli) -> &'static str {
    if args.is_oneshot() {
        "info"
    } else {
        "warn"
    }
}

pub fn log_file_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join(LOG_DIR).join(LOG_FILE))
}

pub fn init(args: &Cli) {
    let filter = build_filter(args);

    if args.is_oneshot() || cfg!(not(feature = "tui")) {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
        return;
    }

    let file = log_file_path().and_then(|path| {
        std::fs::create_dir_all(path.parent()?).ok()?;
        std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .ok()
    });

    // No writable log location: stay silent rather than draw over the TUI.
    if let Some(file) = file {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(std::sync::Mutex::new(file))
            .try_init();
    }
}
