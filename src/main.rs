//! Sumi-Harvest main entry point
//!
//! This is the command-line interface for the Sumi-Harvest content harvester.

use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};
use sumi_harvest::config::{compute_config_hash, read_config, validate, Config, DiscoveryMode};
use sumi_harvest::crawler::crawl;
use sumi_harvest::output::{load_store_summary, print_statistics, print_store_summary};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Sumi-Harvest: A polite, resumable content harvester
///
/// Sumi-Harvest discovers the content pages of one site from its sitemaps or
/// by following links, honors robots.txt and crawl-delay, and appends a
/// structured record per page to a newline-delimited JSON file.
#[derive(Parser, Debug)]
#[command(name = "sumi-harvest")]
#[command(version)]
#[command(about = "A polite, resumable content harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Site origin to harvest (overrides the config file)
    #[arg(long, value_name = "URL")]
    origin: Option<String>,

    /// Record store path (overrides the config file)
    #[arg(long, value_name = "PATH")]
    out: Option<PathBuf>,

    /// Maximum number of pages to fetch
    #[arg(long, value_name = "N")]
    max_pages: Option<usize>,

    /// Delay between requests in seconds, replacing robots.txt crawl-delay
    #[arg(long, value_name = "SECS")]
    delay: Option<f64>,

    /// How content URLs are discovered
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Start from an empty record store instead of resuming
    #[arg(long)]
    fresh: bool,

    /// Validate the configuration and show what would be harvested
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Summarize the existing record store and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    Sitemap,
    Frontier,
    Auto,
}

impl From<ModeArg> for DiscoveryMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Sitemap => DiscoveryMode::Sitemap,
            ModeArg::Frontier => DiscoveryMode::Frontier,
            ModeArg::Auto => DiscoveryMode::Auto,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let config = read_config(path).map_err(|e| {
                tracing::error!("Failed to load configuration: {}", e);
                e
            })?;
            let hash = compute_config_hash(path)?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    apply_overrides(&mut config, &cli)?;

    if let Err(e) = validate(&config) {
        tracing::error!("Invalid configuration: {}", e);
        return Err(e.into());
    }

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else {
        handle_crawl(config, cli.fresh).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sumi_harvest=info,warn"),
            1 => EnvFilter::new("sumi_harvest=debug,info"),
            2 => EnvFilter::new("sumi_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Applies command-line values on top of the file configuration
fn apply_overrides(config: &mut Config, cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(origin) = &cli.origin {
        config.crawler.origin = origin.clone();
    }
    if let Some(out) = &cli.out {
        config.output.records_path = out.display().to_string();
    }
    if let Some(max_pages) = cli.max_pages {
        config.crawler.max_pages = max_pages;
    }
    if let Some(delay) = cli.delay {
        if !delay.is_finite() || delay < 0.0 {
            return Err(format!("--delay must be a non-negative number, got {}", delay).into());
        }
        config.crawler.delay_ms = Some((delay * 1000.0).round() as u64);
    }
    if let Some(mode) = cli.mode {
        config.crawler.mode = mode.into();
    }
    Ok(())
}

/// Handles the --dry-run mode: shows the effective configuration
fn handle_dry_run(config: &Config) {
    println!("=== Sumi-Harvest Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Origin: {}", config.crawler.origin);
    println!("  Mode: {:?}", config.crawler.mode);
    println!("  Max pages: {}", config.crawler.max_pages);
    match config.crawler.delay_ms {
        Some(ms) => println!("  Delay: {}ms (override)", ms),
        None => println!("  Delay: from robots.txt crawl-delay"),
    }
    println!("  Pacing: {:?}", config.crawler.pacing);
    println!(
        "  Max connections per host: {}",
        config.crawler.max_connections_per_host
    );
    println!("  Include subdomains: {}", config.crawler.include_subdomains);
    println!(
        "  When robots.txt is unavailable: {:?}",
        config.crawler.on_policy_unavailable
    );
    println!("  Query policy: {:?}", config.crawler.query_policy);

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nExtraction:");
    println!("  Minimum populated fields: {}", config.extraction.min_fields);
    println!(
        "  Selector overrides: {}",
        config.extraction.selectors.len()
    );

    println!("\nOutput:");
    println!("  Records: {}", config.output.records_path);

    println!("\nSeeds ({}):", config.crawler.seeds.len());
    for seed in &config.crawler.seeds {
        println!("  - {}", seed);
    }

    println!("\nSitemaps ({}):", config.crawler.sitemaps.len());
    for sitemap in &config.crawler.sitemaps {
        println!("  - {}", sitemap);
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode: summarizes the record store
fn handle_stats(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("Records: {}\n", config.output.records_path);

    let summary = load_store_summary(Path::new(&config.output.records_path))?;
    print_store_summary(&summary);

    Ok(())
}

/// Handles the main harvest operation
async fn handle_crawl(config: Config, fresh: bool) -> Result<(), Box<dyn std::error::Error>> {
    if fresh {
        tracing::info!("Starting fresh harvest (truncating {})", config.output.records_path);
    } else {
        tracing::info!("Starting harvest (resuming {} if present)", config.output.records_path);
    }

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received, stopping after the current request");
            on_signal.cancel();
        }
    });

    match crawl(config, fresh, cancel).await {
        Ok(stats) => {
            print_statistics(&stats);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Harvest failed: {}", e);
            Err(e.into())
        }
    }
}
