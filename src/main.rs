//! CLI entry point for fetchlog.

use std::io::{self, IsTerminal};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use fetchlog::config::is_dumb_terminal;
use fetchlog::download::BarProgress;
use fetchlog::input::{STDIN_PROMPT, collect_urls};
use fetchlog::output::{self, Line};
use fetchlog::{Event, HistoryStore, HttpClient, Interrupt, NoProgress, Orchestrator, ProgressSink};
use tracing::{debug, warn};

mod cli;

use cli::Args;

/// Process exit outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProcessExit {
    Success,
    Failure,
    Interrupted,
}

impl ProcessExit {
    fn code(self) -> u8 {
        match self {
            Self::Success => 0,
            Self::Failure => 1,
            Self::Interrupted => 130,
        }
    }
}

impl From<ProcessExit> for ExitCode {
    fn from(exit: ProcessExit) -> Self {
        ExitCode::from(exit.code())
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    match run(&args).await {
        Ok(exit) => exit.into(),
        Err(error) => {
            eprintln!("Error: {error:#}");
            ProcessExit::Failure.into()
        }
    }
}

fn init_tracing(default_level: &str) {
    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (warn)
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(filter)
        .try_init();
}

async fn run(args: &Args) -> Result<ProcessExit> {
    let config = args.to_run_config(io::stderr().is_terminal(), is_dumb_terminal());
    init_tracing(config.log_level);
    debug!(?config, "configuration resolved");

    std::fs::create_dir_all(&config.output_dir).with_context(|| {
        format!(
            "creating output directory {}",
            config.output_dir.display()
        )
    })?;

    let (store, needs_save) = HistoryStore::open(&config.history_path)
        .with_context(|| format!("loading history {}", config.history_path.display()))?;
    if needs_save && let Err(error) = store.save() {
        eprintln!("Warning: could not save migrated history: {error}");
    }

    if config.list_only {
        print!("{}", output::render_history(store.history()));
        return Ok(ProcessExit::Success);
    }

    if args.urls.is_empty() {
        println!("{STDIN_PROMPT}");
    }
    let urls = collect_urls(&args.urls, io::stdin().lock()).context("reading URLs from stdin")?;
    if urls.iter().all(|url| url.trim().is_empty()) {
        println!("No URLs provided");
        let _ = Args::command().print_help();
        return Ok(ProcessExit::Failure);
    }

    let client = HttpClient::with_timeouts(config.connect_timeout_secs, config.read_timeout_secs)
        .context("building HTTP client")?;

    let interrupt = Interrupt::new();
    let listener = interrupt.listen_for_ctrl_c();

    let progress: Box<dyn ProgressSink> = if config.show_progress {
        Box::new(BarProgress::new())
    } else {
        Box::new(NoProgress)
    };

    let mut orchestrator = Orchestrator::new(&client, store, &config.output_dir)
        .force(config.force)
        .with_interrupt(interrupt)
        .with_progress(progress);

    let summary = orchestrator
        .run(&urls, |event| match event {
            Event::Downloading(job) => output::downloading_line(job).emit(),
            Event::Finished(outcome) => {
                output::outcome_lines(outcome).iter().for_each(Line::emit);
            }
        })
        .await;
    listener.abort();

    if summary.interrupted {
        warn!(
            succeeded = summary.succeeded,
            skipped = summary.skipped,
            "stopped by interrupt"
        );
        return Ok(ProcessExit::Interrupted);
    }
    Ok(ProcessExit::Success)
}
