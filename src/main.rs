//! Webtrawl main entry point
//!
//! This is the command-line interface for the Webtrawl crawler.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use webtrawl::config::{load_config_with_hash, Config};
use webtrawl::hooks::ProxyTarget;
use webtrawl::output::print_statistics;
use webtrawl::url::RootDomainSet;
use webtrawl::{Crawler, HookError};

/// Webtrawl: a bounded-concurrency web crawler
///
/// Webtrawl crawls outward from the configured roots, staying on the hosts
/// they name, and prints every page it fetches.
#[derive(Parser, Debug)]
#[command(name = "webtrawl")]
#[command(version)]
#[command(about = "A bounded-concurrency web crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,

    /// User-Agent sent with every request
    #[arg(long, value_name = "UA")]
    user_agent: Option<String>,

    /// Route every request through this proxy
    #[arg(long, value_name = "HOST:PORT", value_parser = parse_proxy)]
    proxy: Option<ProxyTarget>,
}

fn parse_proxy(value: &str) -> std::result::Result<ProxyTarget, String> {
    ProxyTarget::parse(value).ok_or_else(|| format!("expected HOST:PORT, got '{}'", value))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    handle_crawl(config, cli.user_agent, cli.proxy).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("webtrawl=info,warn"),
            1 => EnvFilter::new("webtrawl=debug,info"),
            2 => EnvFilter::new("webtrawl=trace,debug"),
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

/// Handles the --dry-run mode: shows the resolved configuration and allowed hosts
fn handle_dry_run(config: &Config) {
    let crawler = &config.crawler;

    println!("=== Webtrawl Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Strict host matching: {}", crawler.strict);
    println!("  Max redirects: {}", crawler.max_redirect);
    println!("  Max tries: {}", crawler.max_tries);
    println!("  Max concurrent fetches: {}", crawler.max_tasks);
    println!("  Retry delay: {}ms", crawler.retry_delay_ms);
    println!(
        "  Exclude pattern: {}",
        crawler.exclude.as_deref().unwrap_or("(none)")
    );

    println!("\nHTTP:");
    println!("  User agent: {}", config.http.user_agent);
    println!("  Request timeout: {}s", config.http.request_timeout_secs);
    println!("  Connect timeout: {}s", config.http.connect_timeout_secs);

    println!("\nRoots ({}):", crawler.roots.len());
    for root in &crawler.roots {
        println!("  - {}", root);
    }

    let domains = RootDomainSet::from_roots(&crawler.roots, crawler.strict);
    let mut domains: Vec<_> = domains.iter().collect();
    domains.sort_unstable();
    println!("\nAllowed Root Domains ({}):", domains.len());
    for domain in domains {
        println!("  - {}", domain);
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the main crawl operation
async fn handle_crawl(
    config: Config,
    user_agent: Option<String>,
    proxy: Option<ProxyTarget>,
) -> Result<()> {
    let mut crawler = Crawler::new(config).context("Failed to build crawler")?;

    if let Some(agent) = user_agent {
        tracing::info!("Using User-Agent: {}", agent);
        crawler.use_agent(move || {
            let agent = agent.clone();
            async move { Ok::<_, HookError>(agent) }
        });
    }

    if let Some(target) = proxy {
        tracing::info!("Using proxy: {}", target);
        crawler.use_proxy(move || {
            let target = target.clone();
            async move { Ok::<_, HookError>(target) }
        });
    }

    crawler.on_fetch(|url: String, _body: String| async move {
        println!("{}", url);
        Ok::<_, HookError>(())
    });
    crawler.on_error(|url: String, error: String| async move {
        println!("{} {}", url, error);
        Ok::<_, HookError>(())
    });

    // Stop dispatching new fetches on Ctrl-C
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received, finishing in-flight fetches");
            trigger.cancel();
        }
    });

    let summary = crawler.start_with_cancellation(cancel).await;

    print_statistics(&summary);

    if summary.cancelled {
        tracing::info!("Crawl interrupted");
    } else {
        tracing::info!("Crawl completed successfully");
    }

    Ok(())
}
