use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use finq_core::Question;
use finq_pipeline::{OutcomeStatus, Pipeline, PipelineReport};

mod config;
mod wiring;

use config::Config;

/// Log level for tracing output
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// Everything, including request bodies
    Trace,
    /// Per-call detail: retries, fetch sizes, thread selection
    Debug,
    /// Source start/finish and the final outcome
    Info,
    /// Quiet: only warnings and errors
    Warn,
    /// Minimal: only errors
    Error,
}

impl LogLevel {
    fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Parser)]
#[command(name = "finq")]
#[command(
    author,
    version,
    about = "Answer personal-finance questions from Google, Bing and Reddit",
    long_about = None
)]
pub struct Cli {
    /// The question to research
    #[arg(required = true, num_args = 1..)]
    pub question: Vec<String>,

    /// Config file (defaults to ~/.config/finq/config.toml)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Model to use (overrides config)
    #[arg(short, long)]
    pub model: Option<String>,

    /// Base URL for the OpenAI-compatible API (overrides config)
    #[arg(long)]
    pub base_url: Option<String>,

    /// Per-call timeout for the reasoning service, in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Skip the Reddit thread triage and analyze the search listing directly
    #[arg(long)]
    pub no_triage: bool,

    /// Print per-source outcomes, token usage and timing after the answer
    #[arg(long)]
    pub report: bool,

    /// Print the full run report as JSON
    #[arg(long, conflicts_with = "report")]
    pub json: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, value_enum, default_value = "warn")]
    pub log_level: LogLevel,

    /// Enable debug logging (shorthand for --log-level debug)
    #[arg(short, long)]
    pub debug: bool,

    /// Write logs to file (JSON-lines format)
    #[arg(long)]
    pub log_file: Option<std::path::PathBuf>,
}

impl Cli {
    fn question(&self) -> Question {
        Question::new(self.question.join(" "))
    }

    /// Command-line flags win over file and environment.
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(model) = &self.model {
            config.provider.model = Some(model.clone());
        }
        if let Some(base_url) = &self.base_url {
            config.provider.base_url = Some(base_url.clone());
        }
        if let Some(timeout) = self.timeout {
            config.pipeline.call_timeout_secs = timeout;
        }
        if self.no_triage {
            config.pipeline.reddit_triage = false;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.debug {
        LogLevel::Debug
    } else {
        cli.log_level
    };
    let filter = EnvFilter::new(log_level.as_filter());

    if let Some(log_path) = &cli.log_file {
        let file = std::fs::File::create(log_path)
            .with_context(|| format!("Failed to create log file: {:?}", log_path))?;
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::sync::Mutex::new(file)))
            .init();
    } else {
        // stdout carries the answer
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    let mut config = Config::load(cli.config.as_deref())?;
    cli.apply_overrides(&mut config);
    debug!(pipeline = ?config.pipeline, "Loaded configuration");

    let pipeline = Pipeline::new(
        Arc::new(wiring::provider(&config)?),
        wiring::google(&config),
        wiring::bing(&config),
        wiring::reddit(&config),
        config.pipeline.clone(),
    );

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted");
            on_interrupt.cancel();
        }
    });

    let report = pipeline.answer_with_cancel(cli.question(), &cancel).await?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", report.answer);
        if cli.report {
            println!("\n{}", format_report(&report));
        }
    }

    Ok(())
}

fn format_report(report: &PipelineReport) -> String {
    let mut lines = vec!["Run report:".to_string()];
    for outcome in &report.outcomes {
        let status = match &outcome.status {
            OutcomeStatus::Analyzed { chars, usage } => {
                format!("analyzed ({} chars, {} tokens)", chars, usage.total_tokens)
            }
            OutcomeStatus::Failed { reason } => format!("failed: {}", reason),
            OutcomeStatus::NotRun => "not run".to_string(),
        };
        lines.push(format!("  {:<22} {}", outcome.source.label(), status));
    }
    let usage = report.total_usage();
    lines.push(format!(
        "  Tokens: {} prompt + {} completion = {}",
        usage.prompt_tokens, usage.completion_tokens, usage.total_tokens
    ));
    lines.push(format!(
        "  Started {}, took {:.1}s",
        report.started_at.format("%Y-%m-%d %H:%M:%S UTC"),
        report.elapsed.as_secs_f64()
    ));
    lines.join("\n")
}
