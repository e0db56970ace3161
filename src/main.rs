//! Fleet-Sounding main entry point
//!
//! This is the command-line interface for roster discovery and vessel search.

use anyhow::Context;
use clap::Parser;
use fleet_sounding::config::{load_config_with_hash, Config};
use fleet_sounding::discovery::{build_http_client, DiscoveryCoordinator};
use fleet_sounding::events::TracingSink;
use fleet_sounding::output::{load_statistics, print_record, print_report, print_statistics};
use fleet_sounding::search::{ResultCache, SearchOptions, SearchOrchestrator};
use fleet_sounding::sources::{SourcePerformanceTracker, SourceRegistry};
use fleet_sounding::storage::open_storage;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Fleet-Sounding: vessel discovery from a company roster
///
/// Fleet-Sounding resolves company websites, extracts the vessels they list
/// and enriches each vessel with data from public maritime sources, fusing
/// everything into one scored record per vessel.
#[derive(Parser, Debug)]
#[command(name = "fleet-sounding")]
#[command(version = "1.0.0")]
#[command(about = "Vessel and company discovery from weak seeds", long_about = None)]
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

    /// Validate config and show what would be discovered without any requests
    #[arg(long, conflicts_with_all = ["stats", "imo"])]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with_all = ["dry_run", "imo"])]
    stats: bool,

    /// Search every source for one IMO number and print the fused record
    #[arg(long, value_name = "IMO", conflicts_with_all = ["dry_run", "stats"])]
    imo: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);

    if cli.dry_run {
        handle_dry_run(&config)
    } else if cli.stats {
        handle_stats(&config)
    } else if let Some(imo) = cli.imo.as_deref() {
        handle_search(&config, imo).await
    } else {
        handle_discovery(&config).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("fleet_sounding=info,warn"),
            1 => EnvFilter::new("fleet_sounding=debug,info"),
            2 => EnvFilter::new("fleet_sounding=trace,debug"),
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

/// Handles the --dry-run mode: validates config and parses the rosters
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    println!("=== Fleet-Sounding Dry Run ===\n");

    println!("HTTP:");
    println!(
        "  User agent: {}/{} (+{}; {})",
        config.http.crawler_name,
        config.http.crawler_version,
        config.http.contact_url,
        config.http.contact_email
    );
    println!("  Request timeout: {}s", config.http.request_timeout_secs);
    println!("  Probe timeout: {}s", config.http.probe_timeout_secs);

    println!("\nDiscovery:");
    println!("  Batch width: {}", config.discovery.batch_width);
    println!(
        "  Max pages per company: {}",
        config.discovery.max_pages_per_company
    );
    println!("  Enrichment: {}", config.discovery.enrich);

    println!("\nSearch:");
    println!("  Cache TTL: {}h", config.search.cache_ttl_hours);
    println!("  Deadline: {}s", config.search.deadline_secs);
    println!("  Photos: {}", config.search.include_photos);
    println!("  Tracking: {}", config.search.include_tracking);

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);

    let registry = SourceRegistry::builtin();
    println!(
        "\nSource registry {} ({} sources)",
        registry.version(),
        registry.len()
    );

    println!("\nRosters ({}):", config.roster.len());
    let mut total = 0;
    for entry in &config.roster {
        let seeds = fleet_sounding::roster::parse_document(Path::new(&entry.path), entry.member_class)
            .with_context(|| format!("Failed to read roster {}", entry.path))?;
        println!(
            "  - {} ({}): {} companies",
            entry.path,
            entry.member_class.to_db_string(),
            seeds.len()
        );
        total += seeds.len();
    }

    println!("\n✓ Configuration is valid");
    println!("✓ Would start discovery with {} companies", total);

    Ok(())
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.output.database_path);

    let storage = open_storage(Path::new(&config.output.database_path))?;
    let stats = load_statistics(&storage, &storage)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the --imo mode: one comprehensive search
async fn handle_search(config: &Config, imo: &str) -> anyhow::Result<()> {
    let storage = Arc::new(open_storage(Path::new(&config.output.database_path))?);
    let orchestrator = build_orchestrator(config, storage)?;

    let cancel = tokio_util::sync::CancellationToken::new();
    tokio::spawn(cancel_on_ctrl_c(cancel.clone()));

    let record = orchestrator
        .search_with_cancel(imo, &SearchOptions::from(&config.search), &cancel)
        .await?;
    print_record(&record);

    Ok(())
}

/// Handles the main discovery run over every configured roster
async fn handle_discovery(config: &Config) -> anyhow::Result<()> {
    let mut seeds = Vec::new();
    for entry in &config.roster {
        let parsed = fleet_sounding::roster::parse_document(Path::new(&entry.path), entry.member_class)
            .with_context(|| format!("Failed to read roster {}", entry.path))?;
        tracing::info!(
            "Loaded {} {} companies from {}",
            parsed.len(),
            entry.member_class.to_db_string(),
            entry.path
        );
        seeds.extend(parsed);
    }

    if seeds.is_empty() {
        tracing::warn!("No companies to discover; add a [[roster]] entry to the config");
        return Ok(());
    }

    let storage = Arc::new(open_storage(Path::new(&config.output.database_path))?);
    let client = build_http_client(&config.http)?;

    let mut coordinator = DiscoveryCoordinator::from_config(config, client, storage.clone())
        .with_progress(Arc::new(TracingSink));
    if config.discovery.enrich {
        let orchestrator = build_orchestrator(config, storage)?;
        coordinator =
            coordinator.with_enrichment(Arc::new(orchestrator), SearchOptions::from(&config.search));
    }

    tokio::spawn(cancel_on_ctrl_c(coordinator.cancel_token()));

    let report = coordinator.run(seeds).await;
    print_report(&report);

    Ok(())
}

fn build_orchestrator(
    config: &Config,
    storage: Arc<fleet_sounding::storage::SqliteStorage>,
) -> anyhow::Result<SearchOrchestrator> {
    let client = build_http_client(&config.http)?;
    let tracker = SourcePerformanceTracker::with_store(storage.clone());
    let cache = ResultCache::with_default_ttl(storage, config.search.cache_ttl());

    Ok(SearchOrchestrator::new(
        client,
        Arc::new(SourceRegistry::builtin()),
        Arc::new(tracker),
        cache,
    )
    .with_progress(Arc::new(TracingSink)))
}

async fn cancel_on_ctrl_c(cancel: tokio_util::sync::CancellationToken) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C, stopping after in-flight requests");
            cancel.cancel();
        }
        Err(e) => tracing::warn!("Failed to install Ctrl+C handler: {}", e),
    }
}
