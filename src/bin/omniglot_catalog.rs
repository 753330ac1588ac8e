//! Omniglot catalog command line
//!
//! Builds the entity catalog from a directory of scraped feeds and writes
//! the full run output as JSON.
//!
//! # Usage
//!
//! ```bash
//! omniglot-catalog --input-dir data/stage0 \
//!     --iso639 iso-639-3_Name_Index.tab --iso15924 iso15924-codes.tsv \
//!     --output catalog.json
//!
//! RUST_LOG=omniglot_catalog=debug omniglot-catalog --input-dir data/stage0
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::path::PathBuf;
use std::process::ExitCode;

use omniglot_catalog::feeds;
use omniglot_catalog::{
    CatalogConfig, CatalogInputs, CatalogPipeline, Confidence, PipelineOutput, ResolvedType,
};

#[derive(Parser)]
#[command(name = "omniglot-catalog")]
#[command(version)]
#[command(about = "Build a deduplicated language / writing-system catalog from scraped feeds")]
struct Cli {
    /// Directory holding language.csv, writing.csv, langalphSingle.csv,
    /// langalphMap.json and optionally redirects.csv
    #[arg(long, short = 'i')]
    input_dir: PathBuf,

    /// Pipeline configuration (YAML)
    #[arg(long, short = 'c', env = "CATALOG_CONFIG")]
    config: Option<PathBuf>,

    /// Path corrections (JSON object), replacing the configured table
    #[arg(long)]
    corrections: Option<PathBuf>,

    /// ISO 639-3 name index (tab-separated)
    #[arg(long)]
    iso639: Option<PathBuf>,

    /// ISO 15924 code list (tab-separated)
    #[arg(long)]
    iso15924: Option<PathBuf>,

    /// Matching worker threads (overrides the configuration)
    #[arg(long, short = 'w')]
    workers: Option<usize>,

    /// Output file (stdout if not provided)
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,

    /// Skip the summary on stderr
    #[arg(long, short)]
    quiet: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(output) => {
            if !cli.quiet {
                print_summary(&output);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}: {:#}", "error".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<PipelineOutput> {
    let mut config = match &cli.config {
        Some(path) => CatalogConfig::load(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => CatalogConfig::default(),
    };
    if let Some(workers) = cli.workers {
        config.matching.workers = workers;
    }
    if let Some(path) = &cli.corrections {
        config.corrections = feeds::load_corrections(path)
            .with_context(|| format!("Failed to load corrections: {}", path.display()))?;
    }

    let inputs = CatalogInputs {
        feeds: feeds::load_feed_dir(&cli.input_dir)
            .with_context(|| format!("Failed to load feeds from {}", cli.input_dir.display()))?,
        redirects: feeds::load_redirects(&cli.input_dir.join(feeds::REDIRECTS_FILE))
            .context("Failed to load redirects")?,
        iso639_3: cli
            .iso639
            .as_ref()
            .map(|path| {
                feeds::load_iso639_3(path)
                    .with_context(|| format!("Failed to load ISO 639-3 table: {}", path.display()))
            })
            .transpose()?,
        iso15924: cli
            .iso15924
            .as_ref()
            .map(|path| {
                feeds::load_iso15924(path)
                    .with_context(|| format!("Failed to load ISO 15924 table: {}", path.display()))
            })
            .transpose()?,
    };

    let output = CatalogPipeline::new(config)
        .context("Invalid configuration")?
        .run(&inputs)?;

    let json = serde_json::to_string_pretty(&output).context("Failed to serialize output")?;
    match &cli.output {
        Some(path) => std::fs::write(path, json)
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => println!("{}", json),
    }
    Ok(output)
}

fn print_summary(output: &PipelineOutput) {
    let diagnostics = &output.diagnostics;
    let count_of = |resolved_type: ResolvedType| {
        diagnostics
            .by_type
            .get(&resolved_type)
            .copied()
            .unwrap_or(0)
    };
    let confidence_of = |c: Confidence| diagnostics.confidence.get(&c).copied().unwrap_or(0);

    eprintln!();
    eprintln!("{}", "Catalog".bold());
    eprintln!(
        "  {} entities ({} languages, {} writing systems)",
        output.catalog.len().to_string().green(),
        count_of(ResolvedType::Language),
        count_of(ResolvedType::WritingSystem)
    );
    eprintln!(
        "  confidence: {} high, {} medium, {} low",
        confidence_of(Confidence::High),
        confidence_of(Confidence::Medium),
        confidence_of(Confidence::Low)
    );

    eprintln!("{}", "Categories".bold());
    for code in output.category_frequency.codes.iter().take(10) {
        eprintln!("  {:>12}  {}", code.code.cyan(), code.count);
    }

    eprintln!("{}", "Matching".bold());
    let summary = &output.match_report.summary;
    eprintln!(
        "  {} mapped, {} unmapped, {} fragments skipped",
        summary.mapped().to_string().green(),
        summary.unmapped().to_string().yellow(),
        summary.skipped_fragments
    );

    eprintln!("{}", "Diagnostics".bold());
    eprintln!(
        "  {} dropped links, {} anomalies, {} type conflicts",
        diagnostics.dropped_links,
        diagnostics.anomalies.len(),
        diagnostics.type_conflicts.len()
    );
    if !diagnostics.missing_feeds.is_empty() {
        let missing: Vec<&str> = diagnostics
            .missing_feeds
            .iter()
            .map(|feed| feed.feed_name())
            .collect();
        eprintln!("  {} {}", "missing feeds:".yellow(), missing.join(", "));
    }
    let review = diagnostics.requires_review.len();
    if review > 0 {
        eprintln!("  {} entities need review", review.to_string().yellow());
    }
    eprintln!("  fingerprint {}", output.fingerprint.dimmed());
}
