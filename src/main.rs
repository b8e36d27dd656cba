//! Contact-Crawler main entry point
//!
//! This is the command-line interface for crawling sites and querying the
//! harvested contact store.

use anyhow::{Context, Result};
use clap::Parser;
use contact_crawler::config::{load_config_with_hash, validate_seeds, Config};
use contact_crawler::output::{print_crawl_summary, print_records, print_statistics};
use contact_crawler::storage::ContactStore;
use contact_crawler::{CrawlService, SortField};
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// Contact-Crawler: a bounded concurrent contact harvester
///
/// Crawls seed URLs to a bounded depth, extracts phone numbers, emails and
/// address snippets from every page, and keeps them in a queryable store.
#[derive(Parser, Debug)]
#[command(name = "contact-crawler")]
#[command(version = "1.0.0")]
#[command(about = "A bounded concurrent contact harvester", long_about = None)]
#[command(group(clap::ArgGroup::new("mode").multiple(false)))]
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

    /// Additional seed URL (repeatable)
    #[arg(long = "seed", value_name = "URL")]
    seeds: Vec<String>,

    /// Override the configured maximum depth
    #[arg(long, value_name = "N")]
    max_depth: Option<u32>,

    /// Override the configured page budget
    #[arg(long, value_name = "N")]
    max_pages: Option<usize>,

    /// Validate config and show what would be crawled without crawling
    #[arg(long, group = "mode")]
    dry_run: bool,

    /// List stored records and exit
    #[arg(long, group = "mode")]
    list: bool,

    /// Sort field for --list: url, title, phones, emails, timestamp
    #[arg(long, value_name = "FIELD", value_parser = parse_sort_field, requires = "list")]
    sort_by: Option<SortField>,

    /// Sort --list output in descending order
    #[arg(long, requires = "list")]
    desc: bool,

    /// List records containing TERM in any field and exit
    #[arg(long, value_name = "TERM", group = "mode")]
    filter: Option<String>,

    /// Show store statistics and exit
    #[arg(long, group = "mode")]
    stats: bool,

    /// Export stored records to a pipe-delimited file and exit
    #[arg(long, value_name = "PATH", group = "mode")]
    export: Option<PathBuf>,

    /// Delete every stored record and exit
    #[arg(long, group = "mode")]
    clear: bool,
}

fn parse_sort_field(value: &str) -> Result<SortField, String> {
    value.parse::<SortField>().map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    apply_overrides(&mut config, &cli)?;

    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.list {
        let store = open_store(&config)?;
        let records = store.sorted_by(cli.sort_by.unwrap_or(SortField::Url), !cli.desc);
        print_records(&records);
    } else if let Some(term) = &cli.filter {
        let store = open_store(&config)?;
        print_records(&store.filter(term));
    } else if cli.stats {
        let store = open_store(&config)?;
        println!("Store: {}\n", config.storage.path);
        print_statistics(&store.stats());
    } else if let Some(path) = &cli.export {
        let store = open_store(&config)?;
        let written = store
            .export_flat_file(path)
            .with_context(|| format!("Failed to export to {}", path.display()))?;
        println!("✓ Exported {} records to {}", written, path.display());
    } else if cli.clear {
        let store = open_store(&config)?;
        store.clear().context("Failed to clear the contact store")?;
        println!("✓ Contact store cleared");
    } else {
        handle_crawl(config).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("contact_crawler=info,warn"),
            1 => EnvFilter::new("contact_crawler=debug,info"),
            2 => EnvFilter::new("contact_crawler=trace,debug"),
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

/// Folds command-line seeds and limits into the loaded configuration
fn apply_overrides(config: &mut Config, cli: &Cli) -> Result<()> {
    validate_seeds(&cli.seeds).context("Invalid --seed")?;
    config.seeds.extend(cli.seeds.iter().cloned());

    if let Some(max_depth) = cli.max_depth {
        config.crawler.max_depth = max_depth;
    }
    if let Some(max_pages) = cli.max_pages {
        anyhow::ensure!(max_pages >= 1, "--max-pages must be at least 1");
        config.crawler.max_pages = max_pages;
    }
    Ok(())
}

fn open_store(config: &Config) -> Result<ContactStore> {
    ContactStore::open(&config.storage)
        .with_context(|| format!("Failed to open contact store {}", config.storage.path))
}

/// Handles the --dry-run mode: shows what would be crawled
fn handle_dry_run(config: &Config) {
    println!("=== Contact-Crawler Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Max depth: {}", config.crawler.max_depth);
    println!("  Max pages: {}", config.crawler.max_pages);
    println!("  Fetch concurrency: {}", config.crawler.io_concurrency);
    println!(
        "  Compute workers: {}",
        config.crawler.effective_compute_threads()
    );
    println!("  Shutdown grace: {}s", config.crawler.shutdown_grace_secs);

    println!("\nFetcher:");
    println!("  User agent: {}", config.fetcher.user_agent);
    println!(
        "  Timeouts: connect {}ms, read {}ms",
        config.fetcher.connect_timeout_ms, config.fetcher.read_timeout_ms
    );

    println!("\nStorage:");
    println!("  Backend: {:?}", config.storage.backend);
    println!("  Path: {}", config.storage.path);

    println!("\nSeeds ({}):", config.seeds.len());
    for seed in &config.seeds {
        println!("  - {}", seed);
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config) -> Result<()> {
    anyhow::ensure!(
        !config.seeds.is_empty(),
        "No seed URLs: add `seeds` to the config or pass --seed"
    );

    let service = CrawlService::new(config).context("Failed to start crawl service")?;
    service.start_monitor();

    let started = Instant::now();
    let handle = service
        .start_configured_session()
        .context("Failed to start crawl session")?;

    tokio::select! {
        _ = handle.join() => tracing::info!("Crawl completed in {:?}", started.elapsed()),
        _ = tokio::signal::ctrl_c() => tracing::warn!("Interrupted, shutting down"),
    }

    service.shutdown_gracefully().await;
    print_crawl_summary(&service.status(), &service.stats(), started.elapsed());

    Ok(())
}
