use crate::api::{CaptionApi, ClientConfig, HttpCaptionClient};
use crate::model::{GenerationParameters, Length, Platform, Tone, VariantCount};
use crate::orchestrator::{HistorySynchronizer, RequestOrchestrator, Settlement};
use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;

/// Output line routing for stdout/stderr writer.
enum OutputLine {
    Stdout(String),
    Stderr(String),
}

/// Spawn a blocking writer for stdout/stderr to avoid blocking async tasks.
fn spawn_output_writer() -> (
    mpsc::UnboundedSender<OutputLine>,
    tokio::task::JoinHandle<()>,
) {
    let (tx, mut rx) = mpsc::unbounded_channel::<OutputLine>();
    let handle = tokio::task::spawn_blocking(move || {
        let stdout = std::io::stdout();
        let stderr = std::io::stderr();
        let mut out = std::io::LineWriter::new(stdout.lock());
        let mut err = std::io::LineWriter::new(stderr.lock());

        while let Some(line) = rx.blocking_recv() {
            match line {
                OutputLine::Stdout(msg) => {
                    let _ = writeln!(out, "{}", msg);
                }
                OutputLine::Stderr(msg) => {
                    let _ = writeln!(err, "{}", msg);
                }
            }
        }

        let _ = out.flush();
        let _ = err.flush();
    });
    (tx, handle)
}

#[derive(Debug, Parser, Clone)]
#[command(
    name = "blink-captions",
    version,
    about = "Generate marketing captions in a blink, with an optional TUI"
)]
pub struct Cli {
    /// Base URL of the caption service
    #[arg(long, env = "BLINK_BACKEND_URL", default_value = "http://localhost:8000")]
    pub base_url: String,

    /// What the post is about
    #[arg(long, default_value = "Summer sale essentials for small brands")]
    pub topic: String,

    #[arg(long, value_enum, default_value_t = Tone::Friendly)]
    pub tone: Tone,

    #[arg(long, value_enum, default_value_t = Platform::Instagram)]
    pub platform: Platform,

    #[arg(long, value_enum, default_value_t = Length::Medium)]
    pub length: Length,

    /// Number of variants (1-10); out-of-range or non-numeric values are normalized
    #[arg(long, default_value = "3")]
    pub variants: VariantCount,

    /// Use --emojis true or --emojis false to override
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub emojis: bool,

    /// Use --hashtags true or --hashtags false to override
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub hashtags: bool,

    /// Generate once, print JSON and exit (no TUI)
    #[arg(long)]
    pub json: bool,

    /// Generate once, print numbered captions and exit (no TUI)
    #[arg(long)]
    pub text: bool,

    /// Print recent generations and exit (JSON with --json)
    #[arg(long)]
    pub history: bool,

    /// Favorite a history record by id, then print the refreshed record
    #[arg(long, value_name = "ID")]
    pub favorite: Option<String>,

    /// Variant index sent along with --favorite
    #[arg(long, default_value_t = 0, requires = "favorite")]
    pub index: usize,

    /// Log filter (e.g. info, debug, blink_captions=trace); RUST_LOG takes precedence
    #[arg(long)]
    pub log_level: Option<String>,
}

impl Cli {
    /// Whether this invocation runs without the terminal UI.
    pub fn is_oneshot(&self) -> bool {
        self.json || self.text || self.history || self.favorite.is_some()
    }
}

pub async fn run(args: Cli) -> Result<()> {
    let api: Arc<dyn CaptionApi> = Arc::new(HttpCaptionClient::new(&build_client_config(&args))?);

    if let Some(id) = args.favorite.as_deref() {
        return run_favorite(api.as_ref(), id, args.index, args.json).await;
    }
    if args.history {
        return run_history(api.as_ref(), args.json).await;
    }

    if !args.json && !args.text {
        #[cfg(feature = "tui")]
        {
            return crate::tui::run(args, api).await;
        }
        #[cfg(not(feature = "tui"))]
        {
            // Fallback when built without TUI support.
            return run_generate(&args, api.as_ref()).await;
        }
    }

    run_generate(&args, api.as_ref()).await
}

pub fn build_client_config(args: &Cli) -> ClientConfig {
    ClientConfig {
        base_url: args.base_url.clone(),
        user_agent: format!("blink-captions/{}", env!("CARGO_PKG_VERSION")),
    }
}

/// Build generation parameters from the CLI defaults.
pub fn build_params(args: &Cli) -> Result<GenerationParameters> {
    GenerationParameters::new(
        args.topic.clone(),
        args.tone,
        args.platform,
        args.length,
        args.emojis,
        args.hashtags,
        args.variants,
    )
    .context("invalid --topic")
}

async fn run_generate(args: &Cli, api: &dyn CaptionApi) -> Result<()> {
    let params = build_params(args)?;
    let (out_tx, out_handle) = spawn_output_writer();

    let mut orchestrator = RequestOrchestrator::default();
    let started = Instant::now();
    let settled = orchestrator.generate(api, &params).await?;

    let res = match settled {
        Settlement::Success => {
            let variants = orchestrator.results();
            let _ = out_tx.send(OutputLine::Stderr(crate::text_summary::generation_status(
                variants.len(),
                started.elapsed(),
            )));
            if args.json {
                let out = serde_json::to_string_pretty(&serde_json::json!({ "variants": variants }))?;
                let _ = out_tx.send(OutputLine::Stdout(out));
            } else {
                for line in crate::text_summary::build_results_summary(variants).lines {
                    let _ = out_tx.send(OutputLine::Stdout(line));
                }
            }
            Ok(())
        }
        Settlement::Failed => Err(anyhow::anyhow!(
            "{}",
            orchestrator.error().unwrap_or_default()
        )),
    };

    drop(out_tx);
    let _ = out_handle.await;
    res
}

async fn run_history(api: &dyn CaptionApi, json: bool) -> Result<()> {
    let mut history = HistorySynchronizer::default();
    let records = history.refresh(api).await;
    print_records(records, json).await
}

async fn run_favorite(api: &dyn CaptionApi, id: &str, index: usize, json: bool) -> Result<()> {
    let mut history = HistorySynchronizer::default();
    history.refresh(api).await;
    if !history.can_favorite(id) {
        tracing::info!(id, "record is already favorited or unknown; nothing sent");
    } else {
        history.favorite(api, id, index).await;
    }
    let record: Vec<_> = history
        .records()
        .iter()
        .filter(|r| r.id == id)
        .cloned()
        .collect();
    if record.is_empty() {
        return Err(anyhow::anyhow!("no history record with id {id}"));
    }
    print_records(&record, json).await
}

async fn print_records(records: &[crate::model::HistoryRecord], json: bool) -> Result<()> {
    let (out_tx, out_handle) = spawn_output_writer();
    if json {
        let out = serde_json::to_string_pretty(&serde_json::json!({ "items": records }))?;
        let _ = out_tx.send(OutputLine::Stdout(out));
    } else {
        for line in crate::text_summary::build_history_summary(records).lines {
            let _ = out_tx.send(OutputLine::Stdout(line));
        }
    }
    drop(out_tx);
    let _ = out_handle.await;
    Ok(())
}
