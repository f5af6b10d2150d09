//! Sumi-Audit main entry point
//!
//! This is the command-line interface for the Sumi-Audit site crawler and
//! SEO auditor.

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::Parser;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use sumi_audit::audit::audit;
use sumi_audit::config::{load_config_with_hash, Config, CrawlTask};
use sumi_audit::crawler::{Coordinator, CrawlOutcome, CrawlStage, ProgressSink};
use sumi_audit::optimize::optimize_page;
use sumi_audit::output::{package, print_summary, publish, write_artifacts};
use sumi_audit::page::Corpus;
use sumi_audit::sitemap::{entries_from_corpus, split_sitemap};
use sumi_audit::url::{same_site, UrlPolicy};
use tracing_subscriber::EnvFilter;
use url::Url;

/// Sumi-Audit: a polite site crawler and SEO auditor
///
/// Sumi-Audit crawls one website within page and depth budgets while
/// respecting robots.txt, audits every page it fetched, writes optimized
/// HTML and sitemap artifacts, and can publish the resulting bundle.
#[derive(Parser, Debug)]
#[command(name = "sumi-audit")]
#[command(version = "1.0.0")]
#[command(about = "A polite site crawler and SEO auditor", long_about = None)]
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

    /// Validate config and show what would be crawled without crawling
    #[arg(long)]
    dry_run: bool,

    /// Skip packaging the optimized site
    #[arg(long, conflicts_with = "publish")]
    no_bundle: bool,

    /// Publish the bundle to the configured [publish] target
    #[arg(long)]
    publish: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load configuration from {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    handle_audit(&cli, config, config_hash).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sumi_audit=info,warn"),
            1 => EnvFilter::new("sumi_audit=debug,info"),
            2 => EnvFilter::new("sumi_audit=trace,debug"),
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

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config) {
    println!("=== Sumi-Audit Dry Run ===\n");

    let crawler = &config.crawler;
    println!("Crawler Configuration:");
    println!("  Seed URL: {}", crawler.seed_url);
    println!("  Max pages: {}", crawler.max_pages);
    println!("  Max depth: {}", crawler.max_depth);
    println!("  Follow external links: {}", crawler.follow_external_links);
    println!("  Request delay: {}ms", crawler.request_delay);
    println!("  Max concurrent requests: {}", crawler.max_concurrent_requests);
    println!("  Retry attempts: {}", crawler.retry_attempts);
    println!("  Request timeout: {}ms", crawler.request_timeout);
    println!("  Use sitemap: {}", crawler.use_sitemap);

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.user_agent_string());

    println!("\nURL Normalization:");
    println!("  Strip www: {}", config.url.strip_www);
    println!("  Extra tracking params: {:?}", config.url.tracking_params);

    println!("\nOutput:");
    println!("  Directory: {}", config.output.directory);
    println!("  Sitemap chunk size: {}", config.output.sitemap_chunk_size);

    match &config.publish {
        Some(target) => println!(
            "\nPublish target: {}://{} (user {})",
            target.scheme, target.host, target.username
        ),
        None => println!("\nPublish target: none"),
    }

    println!("\n✓ Configuration is valid");
}

/// Runs the crawl, listening for Ctrl-C and logging progress
async fn run_crawl(config: &Config) -> Result<CrawlOutcome> {
    let task = CrawlTask::from_config(&config.crawler);
    let (progress, mut events) = ProgressSink::channel(64);
    let coordinator = Coordinator::new(task, &config.user_agent)
        .context("failed to set up the crawler")?
        .with_url_policy(UrlPolicy::from_config(&config.url))
        .with_progress(progress);

    let handle = coordinator.handle();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, cancelling crawl (partial results are kept)");
            handle.cancel();
        }
    });

    let reporter = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event.stage {
                CrawlStage::Crawling => tracing::debug!(
                    "[{}/{}] {}",
                    event.pages_scanned,
                    event.total_urls_estimate,
                    event.current_url.as_deref().unwrap_or("-")
                ),
                stage => tracing::info!(
                    "Stage {:?}: {} pages scanned",
                    stage,
                    event.pages_scanned
                ),
            }
        }
    });

    let outcome = coordinator.run().await.context("crawl failed");
    interrupt.abort();
    reporter.abort();
    outcome
}

/// Handles the main crawl, audit and export operation
async fn handle_audit(cli: &Cli, config: Config, config_hash: String) -> Result<()> {
    let mut outcome = run_crawl(&config).await?;
    outcome.result.metadata.config_hash = Some(config_hash);

    let domain = outcome.result.metadata.domain.clone();
    let corpus = &outcome.corpus;

    // Audit
    let result = audit(corpus);

    // Optimize every page we hold the HTML of
    let mut optimized = BTreeMap::new();
    let mut changes = 0;
    for (url, page) in corpus {
        if let Some(html) = outcome.documents.get(url) {
            let page_result = optimize_page(page, html);
            changes += page_result.changes.len();
            optimized.insert(url.clone(), page_result.html);
        }
    }
    tracing::info!(
        "Optimized {} pages ({} changes)",
        optimized.len(),
        changes
    );

    // Sitemaps cover the crawled site only
    let site_corpus: Corpus = corpus
        .iter()
        .filter(|(_, page)| {
            Url::parse(&page.url)
                .ok()
                .and_then(|u| u.host_str().map(|h| same_site(h, &domain)))
                .unwrap_or(false)
        })
        .map(|(url, page)| (url.clone(), page.clone()))
        .collect();
    let entries = entries_from_corpus(
        &site_corpus,
        &outcome.sitemap_lastmods,
        &Utc::now().format("%Y-%m-%d").to_string(),
    );
    let base = Url::parse(&config.crawler.seed_url)
        .and_then(|seed| seed.join("/"))
        .context("seed URL cannot serve as sitemap base")?;
    let sitemaps = split_sitemap(&entries, config.output.sitemap_chunk_size, &base);

    let output_dir = Path::new(&config.output.directory);
    write_artifacts(
        output_dir,
        &outcome.result,
        &result,
        &sitemaps,
        &entries,
        &domain,
    )
    .with_context(|| format!("failed to write artifacts to {}", output_dir.display()))?;

    // Bundle
    if !cli.no_bundle {
        let bundle = package(&domain, corpus, &optimized);
        let archive = output_dir.join(format!("{}.tar.gz", domain));
        bundle
            .write_tar_gz(&archive)
            .with_context(|| format!("failed to write bundle {}", archive.display()))?;

        if cli.publish {
            let Some(target) = &config.publish else {
                bail!("--publish requires a [publish] section in the configuration");
            };
            if !publish(&bundle, target).await {
                bail!("publishing the bundle to {} failed", target.host);
            }
            println!("✓ Bundle published to {}", target.host);
        }
    }

    if !cli.quiet {
        print_summary(&outcome.result, &result);
    }

    Ok(())
}
