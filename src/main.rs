//! Intrasearch main entry point
//!
//! This is the command-line interface for the Intrasearch crawler and
//! search engine.

use anyhow::Context;
use clap::Parser;
use intrasearch::config::{load_config_with_hash, Config};
use intrasearch::crawler::{run_crawl, Coordinator};
use intrasearch::search::{search, AppState, JiebaTokenizer, SearchServer, Tokenizer};
use intrasearch::stats::{load_statistics, print_statistics};
use intrasearch::storage::{open_storage, SharedStorage};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Intrasearch: an intranet crawler and full-text search engine
///
/// Intrasearch crawls the hosts of one institution, indexes the text of
/// every HTML page it reaches, and answers ranked search queries over HTTP
/// or from the command line.
#[derive(Parser, Debug)]
#[command(name = "intrasearch")]
#[command(version = "1.0.0")]
#[command(about = "An intranet crawler and full-text search engine", long_about = None)]
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

    /// Serve the search API, crawling in the background
    #[arg(long, conflicts_with_all = ["dry_run", "stats", "search"])]
    serve: bool,

    /// With --serve, only answer queries
    #[arg(long, requires = "serve")]
    no_crawl: bool,

    /// Run one query against the index and print the JSON result
    #[arg(long, value_name = "QUERY", conflicts_with_all = ["dry_run", "stats"])]
    search: Option<String>,

    /// Result page for --search
    #[arg(long, default_value_t = 1, requires = "search")]
    page: i64,

    /// Rows per page for --search; zero prints only the count
    #[arg(long, default_value_t = 10, requires = "search")]
    pagesize: i64,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long)]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load and validate configuration
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet, config.logging.file.as_deref())?;
    tracing::info!(
        "Configuration loaded from {} (hash: {})",
        cli.config.display(),
        config_hash
    );

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else if let Some(query) = &cli.search {
        handle_search(&config, query, cli.page, cli.pagesize)?;
    } else if cli.serve {
        handle_serve(config, !cli.no_crawl).await?;
    } else {
        handle_crawl(&config).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Events also go to `log_file` when one is configured.
fn setup_logging(verbose: u8, quiet: bool, log_file: Option<&str>) -> anyhow::Result<()> {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("intrasearch=info,warn"),
            1 => EnvFilter::new("intrasearch=debug,info"),
            2 => EnvFilter::new("intrasearch=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    let file_layer = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_ansi(false)
                    .with_target(false),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false),
        )
        .with(file_layer)
        .init();

    Ok(())
}

fn open_shared(config: &Config) -> anyhow::Result<SharedStorage> {
    let path = Path::new(&config.storage.database_path);
    let storage = open_storage(path)
        .with_context(|| format!("Failed to open database {}", path.display()))?;
    Ok(Arc::new(Mutex::new(storage)))
}

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config) {
    println!("=== Intrasearch Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Seed URL: {}", config.crawler.seed_url);
    println!(
        "  Max concurrent fetches: {}",
        config.crawler.max_concurrent_fetches
    );
    println!("  Request timeout: {}s", config.crawler.request_timeout_secs);
    println!("  Page deadline: {}s", config.crawler.page_deadline_secs);
    println!("  User agent: {}", config.crawler.user_agent);

    println!("\nLink Filter:");
    println!("  Institution domain: {}", config.filter.institution_domain);
    println!("  Excluded hosts ({}):", config.filter.excluded_hosts.len());
    for host in &config.filter.excluded_hosts {
        println!("    - {}", host);
    }
    println!(
        "  Private IPv4 prefixes ({}):",
        config.filter.private_prefixes.len()
    );
    for prefix in &config.filter.private_prefixes {
        println!("    - {}", prefix);
    }

    println!("\nStorage:");
    println!("  Database: {}", config.storage.database_path);

    println!("\nServer:");
    println!("  Bind: {}", config.server.bind);

    if let Some(file) = &config.logging.file {
        println!("\nLogging:");
        println!("  File: {}", file);
    }

    println!("\n✓ Configuration is valid");
    println!("✓ Would start crawling from {}", config.crawler.seed_url);
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.storage.database_path);

    let storage = open_storage(Path::new(&config.storage.database_path))?;
    let stats = load_statistics(&storage)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the --search mode: prints one result page as JSON
fn handle_search(config: &Config, query: &str, page: i64, page_size: i64) -> anyhow::Result<()> {
    let storage = open_storage(Path::new(&config.storage.database_path))?;
    let tokenizer = JiebaTokenizer::new();

    let result = search(&storage, &tokenizer, query, page, page_size)?;
    println!("{}", serde_json::to_string_pretty(&result)?);

    Ok(())
}

/// Handles the --serve mode: answers queries until interrupted
///
/// The crawler and the server each get their own connection to the store.
async fn handle_serve(config: Config, crawl: bool) -> anyhow::Result<()> {
    let tokenizer: Arc<dyn Tokenizer> = Arc::new(JiebaTokenizer::new());

    let state = AppState {
        storage: open_shared(&config)?,
        tokenizer: Arc::clone(&tokenizer),
    };
    let server = SearchServer::start(&config.server.bind, state).await?;

    if crawl {
        let coordinator = Coordinator::new(&config, open_shared(&config)?, tokenizer)?;
        tokio::spawn(async move {
            match coordinator.run().await {
                Ok(_) => tracing::info!("Background crawl finished, still serving"),
                Err(e) => tracing::error!("Background crawl failed: {}", e),
            }
        });
    }

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down search API on {}", server.addr());
    server.shutdown();

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: &Config) -> anyhow::Result<()> {
    tracing::info!(
        "Crawling from {} with up to {} concurrent fetches",
        config.crawler.seed_url,
        config.crawler.max_concurrent_fetches
    );

    match run_crawl(config).await {
        Ok(summary) => {
            tracing::info!(
                "Crawl completed: {} pages committed out of {} dispatched",
                summary.committed,
                summary.dispatched
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
