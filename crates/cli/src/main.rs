//! Developer tool for the receipt OCR integrator.
//!
//! Reads OCR results (or raw text) from a file or stdin and prints the
//! integration output as JSON on stdout. Logs go to stderr.

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ryoshu_core::{parse_results, IntegrationPolicy};
use ryoshu_ocr::{ExtractedFields, Integrator};

#[derive(Parser)]
#[command(name = "ryoshu", version, about = "Reconcile receipt OCR results from several providers")]
struct Cli {
    /// Policy TOML overriding the default weights.
    #[arg(short, long, global = true, env = "RYOSHU_POLICY")]
    config: Option<PathBuf>,

    /// Log scoring decisions to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Integrate a JSON array of OCR results (`-` for stdin).
    Integrate { input: String },
    /// Extract fields from one raw OCR transcription (`-` for stdin).
    Extract { input: String },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExtractOutput {
    store_name: Option<String>,
    date: Option<String>,
    amount: Option<i64>,
}

impl From<ExtractedFields> for ExtractOutput {
    fn from(f: ExtractedFields) -> Self {
        Self { date: f.date_string(), store_name: f.store_name, amount: f.amount }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "ryoshu=debug,ryoshu_ocr=debug" } else { "ryoshu=warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let policy = match &cli.config {
        Some(path) => load_policy(path)?,
        None => IntegrationPolicy::default(),
    };
    let integrator = Integrator::new(policy);

    let json = match &cli.command {
        Command::Integrate { input } => {
            let raw = read_input(input)?;
            let results = parse_results(&raw).context("Invalid OCR results")?;
            tracing::info!("Integrating {} OCR results", results.len());
            serde_json::to_string_pretty(&integrator.scan(&results))?
        }
        Command::Extract { input } => {
            let raw = read_input(input)?;
            let fields = integrator.extractor().extract(&raw);
            serde_json::to_string_pretty(&ExtractOutput::from(fields))?
        }
    };

    println!("{json}");
    Ok(())
}

fn load_policy(path: &Path) -> anyhow::Result<IntegrationPolicy> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read policy file {}", path.display()))?;
    IntegrationPolicy::from_toml(&content)
        .with_context(|| format!("Invalid policy file {}", path.display()))
}

fn read_input(input: &str) -> anyhow::Result<String> {
    if input == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf).context("Failed to read stdin")?;
        return Ok(buf);
    }
    std::fs::read_to_string(input).with_context(|| format!("Failed to read {input}"))
}
