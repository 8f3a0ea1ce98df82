mod api;
mod cli;
mod logging;
mod model;
mod orchestrator;
mod text_summary;
#[cfg(feature = "tui")]
mod tui;

use anyhow::Result;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();
    let is_oneshot = args.is_oneshot();
    logging::init(&args);

    match cli::run(args).await {
        Ok(()) => {
            // Explicitly exit with code 0 on success, especially for non-TUI modes
            if is_oneshot {
                std::process::exit(0);
            }
            Ok(())
        }
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "run failed");
            Err(e)
        }
    }
}
