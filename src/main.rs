//! Ripple-Crawl main entry point
//!
//! This is the command-line interface for the Ripple-Crawl link crawler.

use anyhow::Context;
use clap::Parser;
use ripple_crawl::config::{load_config_with_hash, validate, Config};
use ripple_crawl::output::log_report;
use ripple_crawl::{Coordinator, Fetcher, FixtureFetcher, HttpFetcher, StdoutSink};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Depth used by `--demo` when none is given
const DEMO_DEPTH: u32 = 4;

/// Ripple-Crawl: a depth-bounded concurrent link crawler
///
/// Starting from a seed URL, Ripple-Crawl fetches every linked page in
/// parallel up to the requested depth, visiting each page at most once.
/// Found pages are printed to stdout; logs go to stderr.
#[derive(Parser, Debug)]
#[command(name = "ripple-crawl")]
#[command(version)]
#[command(about = "A depth-bounded concurrent link crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// URL to start from (overrides crawl.seed)
    #[arg(short, long, value_name = "URL")]
    seed: Option<String>,

    /// Number of hops to follow from the seed (overrides crawl.max-depth)
    #[arg(short, long, value_name = "N")]
    depth: Option<u32>,

    /// Fail any single fetch that takes longer than this (milliseconds)
    #[arg(long, value_name = "MS")]
    timeout_ms: Option<u64>,

    /// Only follow links on the seed's host
    #[arg(long)]
    same_host: bool,

    /// Crawl the built-in sample site instead of the network
    #[arg(long)]
    demo: bool,

    /// Validate settings and show what would be crawled without crawling
    #[arg(long)]
    dry_run: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = resolve_config(&cli).context("invalid settings")?;
    let seed = resolve_seed(&config, cli.demo)?;

    if cli.dry_run {
        handle_dry_run(&config, &seed, cli.demo);
        return Ok(());
    }

    handle_crawl(&config, &seed, cli.demo).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Logs go to stderr so stdout carries only crawl output.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("ripple_crawl=info,warn"),
            1 => EnvFilter::new("ripple_crawl=debug,info"),
            2 => EnvFilter::new("ripple_crawl=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Loads the config file (if any) and applies command-line overrides
fn resolve_config(cli: &Cli) -> ripple_crawl::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path).map_err(|e| {
                tracing::error!("Failed to load configuration: {}", e);
                e
            })?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    if cli.demo {
        config
            .crawl
            .seed
            .get_or_insert_with(|| FixtureFetcher::SAMPLE_ROOT.to_string());
        if cli.config.is_none() {
            config.crawl.max_depth = DEMO_DEPTH;
        }
    }

    if let Some(seed) = &cli.seed {
        config.crawl.seed = Some(seed.clone());
    }
    if let Some(depth) = cli.depth {
        config.crawl.max_depth = depth;
    }
    if let Some(timeout_ms) = cli.timeout_ms {
        config.crawl.fetch_timeout_ms = Some(timeout_ms);
    }
    if cli.same_host {
        config.crawl.same_host_only = true;
    }

    validate(&config)?;
    Ok(config)
}

/// Returns the seed to crawl from
///
/// Links reported by the HTTP fetcher are normalized, so the seed must be too.
fn resolve_seed(config: &Config, demo: bool) -> ripple_crawl::Result<String> {
    let seed = config.require_seed()?;
    if demo {
        Ok(seed.to_string())
    } else {
        Ok(HttpFetcher::normalize_seed(seed)?)
    }
}

/// Handles the --dry-run mode: shows the resolved settings
fn handle_dry_run(config: &Config, seed: &str, demo: bool) {
    println!("=== Ripple-Crawl Dry Run ===\n");

    println!("Crawl:");
    println!("  Seed: {}", seed);
    println!("  Max depth: {}", config.crawl.max_depth);
    match config.crawl.fetch_timeout_ms {
        Some(ms) => println!("  Fetch timeout: {}ms", ms),
        None => println!("  Fetch timeout: none"),
    }
    println!("  Same host only: {}", config.crawl.same_host_only);
    println!(
        "  Source: {}",
        if demo { "built-in sample site" } else { "HTTP" }
    );

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\n✓ Configuration is valid");
}

/// Handles the main crawl operation
async fn handle_crawl(config: &Config, seed: &str, demo: bool) -> anyhow::Result<()> {
    let fetcher: Arc<dyn Fetcher> = if demo {
        tracing::info!("Crawling the built-in sample site");
        Arc::new(FixtureFetcher::sample_site())
    } else {
        let mut http = HttpFetcher::from_config(&config.user_agent, config.crawl.fetch_timeout())
            .context("failed to build HTTP client")?;
        if config.crawl.same_host_only {
            http = http.restrict_to_host_of(seed);
        }
        Arc::new(http)
    };

    let mut coordinator = Coordinator::from_shared(fetcher);
    if let Some(timeout) = config.crawl.fetch_timeout() {
        coordinator = coordinator.with_fetch_timeout(timeout);
    }

    let cancel = coordinator.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping crawl");
            cancel.cancel();
        }
    });

    let mut sink = StdoutSink::new();
    let report = coordinator
        .run(seed, config.crawl.max_depth, &mut sink)
        .await;

    log_report(&report);
    Ok(())
}
