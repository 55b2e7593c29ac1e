//! Intern-Scout main entry point
//!
//! This is the command-line interface for the internship listing acquisition pipeline.

use anyhow::Context;
use clap::Parser;
use futures::future::join_all;
use intern_scout::config::{load_config_with_hash, Config};
use intern_scout::output::{print_summary, JsonLinesSink, RecordSink, RunSummary};
use intern_scout::{Acquisition, SourceName};
use std::io::{self, BufWriter};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Intern-Scout: internship listing acquisition
///
/// Collects internship listings from Chinese job boards by keyword and writes
/// them as JSON lines, one record per line.
#[derive(Parser, Debug)]
#[command(name = "intern-scout")]
#[command(version = "1.0.0")]
#[command(about = "Internship listing acquisition", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (built-in defaults when omitted)
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Search keyword
    #[arg(short, long)]
    keyword: String,

    /// Number of result pages to fetch per source
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..))]
    pages: u32,

    /// Source to acquire from (repeatable: shixiseng, lagou, lagou-api)
    #[arg(short, long = "source", value_name = "SOURCE")]
    sources: Vec<SourceName>,

    /// Write records here instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be acquired without fetching anything
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays a clean record stream
    setup_logging(cli.verbose, cli.quiet);

    let config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => {
            tracing::info!("No configuration file given, using defaults");
            Config::default()
        }
    };

    let sources = if cli.sources.is_empty() {
        vec![SourceName::Shixiseng, SourceName::Lagou]
    } else {
        dedup(cli.sources.clone())
    };

    if cli.dry_run {
        handle_dry_run(&config, &cli, &sources);
        return Ok(());
    }

    handle_acquire(config, &cli, &sources).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("intern_scout=info,warn"),
            1 => EnvFilter::new("intern_scout=debug,info"),
            2 => EnvFilter::new("intern_scout=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

fn dedup(sources: Vec<SourceName>) -> Vec<SourceName> {
    let mut unique = Vec::with_capacity(sources.len());
    for source in sources {
        if !unique.contains(&source) {
            unique.push(source);
        }
    }
    unique
}

/// Handles the --dry-run mode: shows what would be acquired
fn handle_dry_run(config: &Config, cli: &Cli, sources: &[SourceName]) {
    println!("=== Intern-Scout Dry Run ===\n");

    println!("Request:");
    println!("  Keyword: {}", cli.keyword);
    println!("  Pages per source: {}", cli.pages);
    match &cli.output {
        Some(path) => println!("  Output: {}", path.display()),
        None => println!("  Output: stdout"),
    }

    println!("\nSources ({}):", sources.len());
    for source in sources {
        let (strategy, base) = match source {
            SourceName::Shixiseng => ("http", &config.sources.shixiseng_base_url),
            SourceName::Lagou => ("browser", &config.sources.lagou_base_url),
            SourceName::LagouApi => ("api", &config.sources.lagou_api_base_url),
        };
        println!(
            "  - {} ({}) via {} at {}",
            source,
            source.display_name(),
            strategy,
            base
        );
    }
    if sources.contains(&SourceName::Lagou) {
        println!(
            "  Lagou API fallback: {}",
            if config.sources.lagou_api_fallback {
                "enabled"
            } else {
                "disabled"
            }
        );
    }

    println!("\nPacing:");
    println!(
        "  Delay: {}-{}ms",
        config.pacing.min_delay_ms, config.pacing.max_delay_ms
    );
    println!("  Request timeout: {}s", config.timeouts.request_secs);
    println!("  Element wait: {}s", config.timeouts.element_wait_secs);

    println!("\nBrowser:");
    println!(
        "  Executable: {}",
        config.browser.executable.as_deref().unwrap_or("(search PATH)")
    );
    println!("  Headless: {}", config.browser.headless);

    println!("\n✓ Configuration is valid");
}

/// Runs every requested source concurrently and writes the merged records
async fn handle_acquire(config: Config, cli: &Cli, sources: &[SourceName]) -> anyhow::Result<()> {
    let acquisition = Acquisition::new(config).context("failed to prepare acquisition")?;

    tracing::info!(
        "Acquiring '{}' from {} source(s), {} page(s) each",
        cli.keyword,
        sources.len(),
        cli.pages
    );

    let runs = sources
        .iter()
        .map(|&source| acquisition.acquire(&cli.keyword, source, cli.pages));
    let results = join_all(runs).await;

    let mut sink: Box<dyn RecordSink> = match &cli.output {
        Some(path) => Box::new(JsonLinesSink::create(path)?),
        None => Box::new(JsonLinesSink::new(BufWriter::new(io::stdout().lock()))),
    };

    let mut summary = RunSummary::new(cli.keyword.clone());
    for (source, result) in sources.iter().zip(results) {
        match result {
            Ok(report) => {
                sink.write_all(report.records())?;
                summary.add_report(&report);
            }
            Err(e) => {
                tracing::error!("Acquisition from {} failed: {}", source, e);
                summary.add_failure(*source, e.to_string());
            }
        }
    }
    sink.finish()?;

    if !cli.quiet {
        print_summary(&summary);
    }

    if summary.total_records() == 0 && !summary.failures.is_empty() {
        anyhow::bail!("no records acquired");
    }
    Ok(())
}
