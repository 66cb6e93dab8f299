//! GFS map pipeline.
//!
//! One invocation runs every enabled product once (or just those named
//! with `--product`): fetch the newest available GFS run from NOMADS,
//! render a map per forecast step and write the animation. Scheduling is
//! left to cron or a systemd timer.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use gfs_pipeline::{
    load_product_configs, FilterService, GribSource, HttpGribSource, Pipeline, PipelineError,
    SourceOptions, DEFAULT_BASE_URL,
};
use renderer::StyleConfig;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "gfs-pipeline")]
#[command(about = "Fetch GFS grids, render map frames and build the animations")]
struct Args {
    /// Product id to run (repeatable; default: all enabled products)
    #[arg(short, long)]
    product: Vec<String>,

    /// Configuration directory (contains products/*.yaml and styles/*.json)
    #[arg(long, env = "CONFIG_DIR", default_value = "config")]
    config_dir: PathBuf,

    /// Public directory the web backend serves
    #[arg(long, env = "PUBLIC_DIR", default_value = "public")]
    public_dir: PathBuf,

    /// NOMADS filter endpoint (or a mirror of it)
    #[arg(long, env = "GFS_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Per-request timeout in seconds
    #[arg(long, default_value = "300")]
    request_timeout_secs: u64,

    /// Connect timeout in seconds
    #[arg(long, default_value = "30")]
    connect_timeout_secs: u64,

    /// Pretend the wall clock reads this time (RFC 3339), for replays
    #[arg(long)]
    now: Option<DateTime<Utc>>,

    /// Log level
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

fn init_tracing(args: &Args) -> Result<()> {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true);

    if args.log_json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();
    init_tracing(&args)?;

    let filter = FilterService::new(&args.base_url);
    info!(
        config_dir = %args.config_dir.display(),
        public_dir = %args.public_dir.display(),
        base_url = filter.base_url(),
        "Starting GFS map pipeline"
    );

    let styles = StyleConfig::load_dir(args.config_dir.join("styles"))
        .context("Failed to load color styles")?;

    let mut products = load_product_configs(&args.config_dir)
        .context("Failed to load product configs")?;
    if !args.product.is_empty() {
        for id in &args.product {
            if !products.iter().any(|p| p.id() == id) {
                bail!("Unknown or disabled product: {}", id);
            }
        }
        products.retain(|p| args.product.iter().any(|id| id == p.id()));
    }
    if products.is_empty() {
        warn!("No products to run");
        return Ok(());
    }

    let source: Arc<dyn GribSource> = Arc::new(
        HttpGribSource::new(&SourceOptions {
            request_timeout: Duration::from_secs(args.request_timeout_secs),
            connect_timeout: Duration::from_secs(args.connect_timeout_secs),
        })
        .context("Failed to create HTTP client")?,
    );
    let now = args.now.unwrap_or_else(Utc::now);

    let mut failed = Vec::new();
    for product in products {
        let id = product.id().to_string();
        let pipeline = Pipeline::new(
            product,
            source.clone(),
            filter.clone(),
            &args.public_dir,
            &styles,
        )
        .with_context(|| format!("Failed to set up product {}", id))?;

        match pipeline.run(now).await {
            Ok(report) => {
                info!(
                    product = %report.product,
                    run = %report.run,
                    downloaded = report.downloaded.len(),
                    images = report.images.len(),
                    animation = ?report.animation,
                    "Product finished"
                );
            }
            Err(PipelineError::NoRunAvailable) => {
                error!(product = %id, "{}", PipelineError::NoRunAvailable);
                failed.push(id);
            }
            Err(e) => {
                error!(product = %id, error = %e, "Product failed");
                failed.push(id);
            }
        }
    }

    if !failed.is_empty() {
        bail!("{} product(s) failed: {}", failed.len(), failed.join(", "));
    }

    Ok(())
}
