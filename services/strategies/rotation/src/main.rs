//! Rotation monitor binary
//!
//! Usage:
//!   rotation_monitor --config configs/rotation.toml
//!   rotation_monitor --log-level debug --json-logs

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use rotation_adapters::{BinanceCandleSource, TelegramNotifier};
use rotation_config::RotationConfig;
use rotation_strategy::logging::init_logging;
use rotation_strategy::{log_metrics, RotationMonitor};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "rotation_monitor")]
#[command(about = "L2 sector rotation monitor")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "configs/rotation.toml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(short, long)]
    log_level: Option<String>,

    /// Enable JSON logging format
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = RotationConfig::load(Some(args.config.as_path()))
        .with_context(|| format!("Failed to load configuration from {:?}", args.config))?;

    let level = args
        .log_level
        .clone()
        .unwrap_or_else(|| config.logging.level.clone());
    init_logging(&level, args.json_logs || config.logging.json)?;

    info!("Starting rotation monitor");
    info!("Configuration: {:?}", args.config);
    info!(
        "Gate: |{} return| <= {:.2}%, storage at {}",
        config.gate.reference_symbol,
        config.gate.abs_return_threshold * 100.0,
        config.storage.dir.display()
    );

    let source = BinanceCandleSource::new(&config.exchange)
        .context("Failed to create Binance candle source")?;
    let alerts =
        TelegramNotifier::new(&config.alerts).context("Failed to create Telegram notifier")?;

    let mut monitor = RotationMonitor::new(config, source, alerts, Local::now());

    tokio::select! {
        _ = monitor.run() => {}
        result = tokio::signal::ctrl_c() => {
            result.context("Failed to listen for shutdown signal")?;
            info!("Received shutdown signal");
        }
    }

    let metrics = monitor.metrics();
    log_metrics!(
        "Shutdown: {} polls, {} cycles, {} signals, {} skips, {} fetch failures",
        metrics.polls,
        metrics.cycles_evaluated,
        metrics.signals_emitted,
        metrics.skips,
        metrics.fetch_failures
    );

    Ok(())
}
