//! Market-data ingester - Entry Point

use anyhow::Result;
use clap::Parser;
use cmc_ingester::{AppConfig, IngestionEngine};
use cmc_persistence::DirBlobStore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Rate-limited market-data ingester
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via CMC_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,

    /// Load configuration from this object in the blob store instead of a file
    #[arg(long)]
    config_blob: Option<String>,

    /// Directory hosting blob buckets, used with --config-blob
    #[arg(long, default_value = "./data/buckets")]
    blob_root: String,

    /// Bucket holding the configuration object, used with --config-blob
    #[arg(long, default_value = "config")]
    config_bucket: String,
}

/// Returns the configuration and where it came from.
fn load_config(args: &Args) -> Result<(AppConfig, String)> {
    if let Some(name) = &args.config_blob {
        let store = DirBlobStore::open(&args.blob_root, args.config_bucket.clone())?;
        let config = AppConfig::from_blob(&store, name)?;
        return Ok((config, format!("blob {}/{name}", args.config_bucket)));
    }

    // CLI arg > CMC_CONFIG env var > default
    let config_path = args
        .config
        .clone()
        .or_else(|| std::env::var("CMC_CONFIG").ok())
        .unwrap_or_else(|| "config/default.toml".to_string());

    let config = AppConfig::from_file(&config_path)?;
    Ok((config, config_path))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let (config, source) = load_config(&args)?;

    // RUST_LOG still wins over the configured level
    cmc_telemetry::init_logging(&config.telemetry.log_level)?;

    info!("Starting cmc-ingester v{}", env!("CARGO_PKG_VERSION"));
    info!(
        source = %source,
        global = %config.api.global.address,
        listing = %config.api.listing.address,
        ticker = %config.api.ticker.address,
        log_level = %config.telemetry.log_level,
        "Configuration loaded"
    );

    let engine = IngestionEngine::from_config(config)?;

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Shutdown signal received");
                signal_token.cancel();
            }
            Err(e) => warn!(error = %e, "Failed to listen for shutdown signal"),
        }
    });

    engine.run(shutdown).await?;

    if let Ok(text) = cmc_telemetry::Metrics::render() {
        debug!(metrics = %text, "Final metrics");
    }
    info!("Ingester stopped");
    Ok(())
}
