//! YCrawler main entry point
//!
//! This is the command-line interface for the YCrawler news archiver.

use anyhow::Context;
use clap::Parser;
use std::any::Any;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use ycrawler::config::{parse_config_with_hash, validate, Config};
use ycrawler::crawler::{crawl, StopReason};

/// YCrawler: archive top news stories and their comment links
///
/// YCrawler polls the front page of a news aggregator, saves the top stories
/// and every page linked from their comments, and skips stories it already
/// saved during this run.
#[derive(Parser, Debug)]
#[command(name = "ycrawler")]
#[command(version)]
#[command(about = "Archive top news stories and their comment links", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Count of top news to download
    #[arg(short, long)]
    count: Option<usize>,

    /// Period in seconds between checks
    #[arg(short, long)]
    period: Option<u64>,

    /// Folder to save downloaded pages
    #[arg(short, long)]
    root: Option<String>,

    /// Log file name (logs go to stderr when omitted)
    #[arg(short, long, value_name = "FILE")]
    log: Option<PathBuf>,

    /// Run once
    #[arg(short, long)]
    once: bool,

    /// Proxy URL for all requests
    #[arg(long, value_name = "URL")]
    proxy: Option<String>,

    /// Maximum number of concurrent requests
    #[arg(long, value_name = "N")]
    max_concurrent: Option<u32>,

    /// Write index.md listing archived stories after each cycle
    #[arg(long)]
    index: bool,

    /// Validate config and show what would be crawled without actually crawling
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

    setup_logging(cli.verbose, cli.quiet, cli.log.as_deref())?;
    install_panic_hook();

    let config = match load_effective_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{:#}", e);
            return Err(e);
        }
    };

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    handle_crawl(config).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool, log_file: Option<&Path>) -> anyhow::Result<()> {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("ycrawler=info,warn"),
            1 => EnvFilter::new("ycrawler=debug,info"),
            2 => EnvFilter::new("ycrawler=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false);

    match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        None => builder.init(),
    }

    Ok(())
}

/// Routes panics through tracing so they reach the log file as well
fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let location = info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()))
            .unwrap_or_else(|| "unknown location".to_string());

        tracing::error!(
            "Unexpected fault at {}: {}",
            location,
            panic_message(info.payload())
        );
        default_hook(info);
    }));
}

/// Text carried by a panic payload
fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string())
}

/// Loads the configuration file (if any), applies command-line overrides and
/// validates the result
fn load_effective_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = parse_config_with_hash(path)
                .with_context(|| format!("Failed to load config file {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    if let Some(count) = cli.count {
        config.crawler.top_news_count = count;
    }
    if let Some(period) = cli.period {
        config.crawler.poll_interval = period;
    }
    if let Some(root) = &cli.root {
        config.output.archive_root = root.clone();
    }
    if cli.once {
        config.crawler.run_once = true;
    }
    if let Some(proxy) = &cli.proxy {
        config.crawler.proxy = Some(proxy.clone());
    }
    if let Some(max_concurrent) = cli.max_concurrent {
        config.crawler.max_concurrent_fetches = max_concurrent;
    }
    if cli.index {
        config.output.write_index = true;
    }

    validate(&config).context("Invalid configuration")?;
    Ok(config)
}

/// Handles the --dry-run mode: shows the effective configuration
fn handle_dry_run(config: &Config) {
    println!("=== YCrawler Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Site: {}", config.crawler.site);
    println!("  Top news count: {}", config.crawler.top_news_count);
    println!("  Poll interval: {}s", config.crawler.poll_interval);
    println!(
        "  Max concurrent fetches: {}",
        config.crawler.max_concurrent_fetches
    );
    println!(
        "  Comment fanout: {}",
        config.crawler.effective_comment_fanout()
    );
    println!("  Request timeout: {}s", config.crawler.request_timeout);
    println!("  Run once: {}", config.crawler.run_once);
    println!(
        "  Proxy: {}",
        config.crawler.proxy.as_deref().unwrap_or("(none)")
    );

    println!("\nUser Agent:");
    println!(
        "  {}",
        ycrawler::crawler::format_user_agent(&config.user_agent)
    );

    println!("\nOutput:");
    println!("  Archive root: {}", config.output.archive_root);
    println!("  Write index: {}", config.output.write_index);

    println!("\n✓ Configuration is valid");
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config) -> anyhow::Result<()> {
    let cancel = CancellationToken::new();

    let signal_token = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Interrupt received, stopping");
                signal_token.cancel();
            }
            Err(e) => tracing::error!("Unable to listen for shutdown signal: {}", e),
        }
    });

    println!("Starting YCrawler, press Ctrl+C to exit");

    match crawl(config, cancel).await {
        Ok(StopReason::Completed) => {
            tracing::info!("Crawl completed successfully");
            Ok(())
        }
        Ok(StopReason::Cancelled) => {
            tracing::info!("YCrawler was stopped by user");
            Ok(())
        }
        Err(e) => {
            let e = anyhow::Error::new(e).context("Crawl failed");
            tracing::error!("{:#}", e);
            Err(e)
        }
    }
}
