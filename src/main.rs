use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use gold_price_backend::app;
use gold_price_backend::config::AppConfig;
use gold_price_backend::external::yahoo::YahooProvider;
use gold_price_backend::logging::{self, LoggingConfig};
use gold_price_backend::services::job_scheduler_service::{JobContext, JobSchedulerService};
use gold_price_backend::services::table_handle::TableHandle;
use gold_price_backend::services::updater_service::{UpdateOutcome, UpdaterService};
use gold_price_backend::state::AppState;
use gold_price_backend::store::PriceStore;

#[derive(Debug, Parser)]
#[command(name = "gold-price-backend", version, about = "Daily gold price updater and query API")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the read-only HTTP API (default)
    Serve,
    /// Fetch the full lookback window and replace the stored table
    Backfill {
        /// Lookback window in years (defaults to BACKUP_YEARS)
        #[arg(long)]
        years: Option<u32>,
    },
    /// Fetch and merge prices newer than the checkpoint
    Update,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Initialize logging FIRST
    let logging_config = LoggingConfig::from_env().map_err(anyhow::Error::msg)?;
    logging::init_logging(logging_config)
        .map_err(|e| anyhow::anyhow!("failed to initialise logging: {}", e))?;

    let config = AppConfig::from_env();
    config.validate().map_err(anyhow::Error::msg)?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::Backfill { years } => {
            let updater = build_updater(&config)?;
            let report = updater
                .backfill(years.unwrap_or(config.backup_years))
                .await
                .context("backfill failed")?;
            info!(
                "📊 Backfill stored {} records ({} to {}), {} rows dropped",
                report.table.len(),
                report.start,
                report.end,
                report.dropped_rows
            );
            Ok(())
        }
        Command::Update => {
            let updater = build_updater(&config)?;
            match updater.incremental_update().await {
                Ok(UpdateOutcome::UpToDate { checkpoint }) => {
                    info!("✓ Nothing to merge, checkpoint stays at {}", checkpoint);
                    Ok(())
                }
                Ok(UpdateOutcome::Merged(report)) => {
                    info!(
                        "📊 Checkpoint {} -> {}, {} records in table",
                        report.previous_checkpoint,
                        report.checkpoint,
                        report.summary.total_records
                    );
                    Ok(())
                }
                Err(e) => {
                    error!("❌ Incremental update failed: {}", e);
                    Err(e).context("incremental update failed")
                }
            }
        }
    }
}

fn build_updater(config: &AppConfig) -> anyhow::Result<UpdaterService> {
    let provider = YahooProvider::new(config.fetch_timeout).context("failed to build HTTP client")?;
    Ok(UpdaterService::new(
        Arc::new(provider),
        PriceStore::new(&config.data_dir),
        config.ticker.clone(),
    )
    .with_retry(config.fetch_max_retries, Duration::from_secs(5)))
}

async fn serve(config: AppConfig) -> anyhow::Result<()> {
    let store = PriceStore::new(&config.data_dir);
    let table = Arc::new(TableHandle::new(store));
    if let Err(e) = table.reload() {
        // keep serving; the reload job retries
        warn!("⚠️ Initial table load failed: {}", e);
    }

    let updater = match config.update_schedule {
        Some(_) => Some(Arc::new(build_updater(&config)?)),
        None => None,
    };

    let mut scheduler = JobSchedulerService::new(JobContext::new(table.clone(), updater)).await?;
    scheduler.start(&config).await?;

    let state = AppState {
        table,
        max_page_limit: config.max_page_limit,
    };
    let app = app::create_app(state);

    let addr = format!("{}:{}", config.api_host, config.api_port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("🚀 Gold price API running at http://{}/", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.stop().await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutting down");
}
