//! # CRSF MAVLink Bridge
//!
//! Forward CRSF (Crossfire/ELRS) receiver telemetry to a ground station as MAVLink.
//!
//! # Control Flow
//!
//! 1. **Initialization**
//!    - Load configuration (first argument, `config/default.toml`, or built-in defaults)
//!    - Set up logging with tracing subscriber
//!    - Open the MAVLink output port
//!    - Spawn the CRSF receiver task feeding the telemetry store
//!
//! 2. **Main Loop**
//!    - Every period (100ms by default) send HEARTBEAT, SYS_STATUS,
//!      GPS_RAW_INT, GLOBAL_POSITION_INT, VFR_HUD and ATTITUDE
//!    - Log status every `status_log_interval_ticks` ticks
//!    - Handle Ctrl+C for graceful shutdown
//!
//! # Examples
//!
//! ```bash
//! cargo run --release -- config/default.toml
//! ```
//!
//! Expected output:
//! ```text
//! INFO crsf_mavlink_bridge: CRSF MAVLink Bridge v0.1.0 starting...
//! INFO crsf_mavlink_bridge::serial: Opened MAVLink output at /dev/ttyUSB0 (57600 baud)
//! INFO crsf_mavlink_bridge::crsf::receiver: CRSF receiver started
//! INFO crsf_mavlink_bridge::bridge: Starting MAVLink telemetry loop every 100ms on /dev/ttyUSB0
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crsf_mavlink_bridge::bridge::TelemetryBridge;
use crsf_mavlink_bridge::config::{Config, LoggingConfig};
use crsf_mavlink_bridge::crsf::receiver::run_receiver;
use crsf_mavlink_bridge::serial::{open_crsf_input, MavlinkSerial};
use crsf_mavlink_bridge::telemetry::TelemetryStore;

/// Configuration file used when no path is given
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

#[tokio::main]
async fn main() -> Result<()> {
    let (config, config_source) = load_config()?;
    let _log_guard = init_logging(&config.logging)?;

    info!("CRSF MAVLink Bridge v{} starting...", env!("CARGO_PKG_VERSION"));
    info!("Configuration: {}", config_source);

    let store = Arc::new(TelemetryStore::new());

    if config.crsf.enabled {
        let (port, path) = open_crsf_input(&config.crsf)?;
        let receiver_store = Arc::clone(&store);
        tokio::spawn(async move {
            match run_receiver(port, receiver_store).await {
                Ok(()) => warn!("CRSF input {} closed", path),
                Err(e) => error!("CRSF receiver on {} failed: {}", path, e),
            }
        });
    } else {
        info!("CRSF input disabled, reporting power-on defaults");
    }

    let output = MavlinkSerial::open(&config.mavlink)?;
    let mut bridge = TelemetryBridge::new(output, store, &config);

    info!("Press Ctrl+C to exit");

    let stats = bridge
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            }
            info!("Received Ctrl+C, shutting down...");
        })
        .await;

    info!(
        "Total: {} ticks, {} frames sent, {} write failures",
        stats.ticks, stats.frames_sent, stats.write_failures
    );

    Ok(())
}

/// Pick the configuration source
fn load_config() -> Result<(Config, String)> {
    if let Some(path) = std::env::args().nth(1).map(PathBuf::from) {
        let config = Config::load(&path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
        return Ok((config, path.display().to_string()));
    }

    if Path::new(DEFAULT_CONFIG_PATH).exists() {
        let config = Config::load(DEFAULT_CONFIG_PATH)
            .with_context(|| format!("Failed to load configuration from {}", DEFAULT_CONFIG_PATH))?;
        return Ok((config, DEFAULT_CONFIG_PATH.to_string()));
    }

    Ok((Config::default(), "built-in defaults".to_string()))
}

/// Initialize logging to stderr or to the configured file
///
/// The returned guard flushes the file writer on drop and must live until exit.
fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());

    match &config.file {
        Some(path) => {
            let directory = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or(Path::new("."));
            let file_name = path
                .file_name()
                .context("logging.file must name a file")?;

            let appender = tracing_appender::rolling::never(directory, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);

            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .init();

            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();

            Ok(None)
        }
    }
}
