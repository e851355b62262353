//! BuildTiles - per-branch CI build summaries
//!
//! A CLI tool that fetches the recent builds behind every tile of a
//! dashboard view and prints one representative build per branch.
//!
//! Exit codes:
//!   0 - Success (including tiles shown empty after a failed fetch)
//!   1 - Runtime error (bad arguments, config, unknown view, etc.)

use anyhow::{Context, Result};
use buildtiles::cli::{Args, OutputFormat};
use buildtiles::config::{Config, CONFIG_FILE_NAME};
use buildtiles::models::Dashboard;
use buildtiles::provider::{BuildDataProvider, FileProvider, TeamCityClient, TeamCityConfig};
use buildtiles::report;
use buildtiles::tiles::TileService;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("BuildTiles v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    if let Err(e) = run(args).await {
        error!("Dashboard failed: {}", e);
        eprintln!("\nError: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .buildtiles.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!("{} already exists. Remove it first or edit it manually.", CONFIG_FILE_NAME);
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("Created {} with default settings.", CONFIG_FILE_NAME);
    println!("Add [[views.tiles]] entries for the build configurations to show.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Aggregate the selected view and print it.
async fn run(args: Args) -> Result<()> {
    let start_time = Instant::now();

    let mut config = load_config(&args)?;
    config.merge_with_args(&args);
    config.validate()?;

    let view = config
        .find_view(args.view.as_deref())
        .cloned()
        .with_context(|| match args.view {
            Some(ref name) => format!("No view named '{}' in configuration", name),
            None => "Configuration contains no views".to_string(),
        })?;

    if view.tiles.is_empty() {
        warn!("View '{}' has no tiles", view.name);
    }

    let provider = build_provider(&args, &config)?;
    let service = TileService::new(provider);

    info!(
        "Aggregating {} tiles of view '{}' ({} branches per tile)",
        view.tiles.len(),
        view.name,
        view.default_number_of_branches_per_tile
    );

    let outcomes = service.get_dashboard(&view).await;
    for outcome in &outcomes {
        debug!("Tile {}", outcome);
    }
    let dashboard = Dashboard::from_outcomes(&view, outcomes);

    let output = match args.format {
        OutputFormat::Json => report::generate_json_report(&dashboard)?,
        OutputFormat::Text => report::generate_text_report(&dashboard),
    };
    println!("{}", output);

    info!(
        "{} builds across {} tiles in {:.1}s",
        dashboard.build_count(),
        dashboard.tiles.len(),
        start_time.elapsed().as_secs_f64()
    );

    Ok(())
}

/// Pick the build-data provider: a local file or a TeamCity server.
fn build_provider(args: &Args, config: &Config) -> Result<Arc<dyn BuildDataProvider>> {
    if let Some(ref path) = args.from_file {
        info!("Reading builds from {}", path.display());
        return Ok(Arc::new(FileProvider::new(path.clone())));
    }

    let client = TeamCityClient::new(TeamCityConfig::from(&config.server))
        .context("Failed to create TeamCity client")?;
    Ok(Arc::new(client))
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE_NAME);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
