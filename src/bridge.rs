//! # Scheduler Loop
//!
//! Drives the telemetry translation at a fixed cadence.
//!
//! Each tick reads one snapshot from the store and sends, in this order:
//!
//! 1. HEARTBEAT
//! 2. SYS_STATUS
//! 3. GPS_RAW_INT
//! 4. GLOBAL_POSITION_INT
//! 5. VFR_HUD
//! 6. ATTITUDE
//!
//! Every frame is written as soon as it is composed. After the last frame the
//! loop sleeps for the configured period; there is no catch-up for slow ticks
//! and no back-pressure. A frame that fails to encode or write is logged and
//! dropped.

use std::future::Future;
use std::sync::Arc;

use mavlink::common::MavMessage;
use tokio::time::{sleep, Duration, Instant};
use tracing::{debug, info, warn};

use crate::composer::{self, encoder::FrameEncoder};
use crate::config::{Config, TelemetryDefaults, UavConfig};
use crate::serial::{port_trait::SerialPortIO, MavlinkSerial};
use crate::telemetry::{dump::dump_lines, TelemetryStore};

/// Frames written per tick
pub const FRAMES_PER_TICK: usize = 6;

/// Counters reported by the scheduler
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BridgeStats {
    pub ticks: u64,
    pub frames_sent: u64,
    pub encode_failures: u64,
    pub write_failures: u64,
}

/// Telemetry scheduler: snapshot → composer → encoder → serial
pub struct TelemetryBridge<P: SerialPortIO> {
    output: MavlinkSerial<P>,
    store: Arc<TelemetryStore>,
    encoder: FrameEncoder,
    uav: UavConfig,
    defaults: TelemetryDefaults,
    period: Duration,
    debug_dump: bool,
    status_log_interval: u64,
    started: Instant,
    stats: BridgeStats,
}

impl<P: SerialPortIO> TelemetryBridge<P> {
    pub fn new(output: MavlinkSerial<P>, store: Arc<TelemetryStore>, config: &Config) -> Self {
        Self {
            output,
            store,
            encoder: FrameEncoder::new(config.uav.system_id, config.uav.component_id),
            uav: config.uav.clone(),
            defaults: config.telemetry.clone(),
            period: Duration::from_millis(config.scheduler.period_ms),
            debug_dump: config.scheduler.debug_dump,
            status_log_interval: config.scheduler.status_log_interval_ticks,
            started: Instant::now(),
            stats: BridgeStats::default(),
        }
    }

    pub fn stats(&self) -> BridgeStats {
        self.stats
    }

    /// Milliseconds since the bridge was created, or 0 when uptime reporting is off
    pub fn uptime_ms(&self) -> u32 {
        if !self.defaults.report_uptime {
            return 0;
        }
        // Wraps after ~49 days, like MAVLink's time_boot_ms
        self.started.elapsed().as_millis() as u32
    }

    /// Run one iteration: dump, compose and send all frames
    pub async fn tick(&mut self) {
        let snapshot = self.store.snapshot();
        let uptime_ms = self.uptime_ms();

        if self.debug_dump {
            for line in dump_lines(&snapshot) {
                info!(target: "crsf_mavlink_bridge::dump", "{}", line);
            }
        }

        self.emit(composer::heartbeat(&self.uav)).await;
        self.emit(composer::sys_status(&snapshot)).await;
        for message in composer::gps(&self.defaults, &snapshot, uptime_ms).into_array() {
            self.emit(message).await;
        }
        self.emit(composer::hud(&self.defaults, &snapshot)).await;
        self.emit(composer::attitude(&snapshot, uptime_ms)).await;

        self.stats.ticks += 1;
    }

    async fn emit(&mut self, message: MavMessage) {
        let frame = match self.encoder.encode(&message) {
            Ok(frame) => frame,
            Err(e) => {
                self.stats.encode_failures += 1;
                warn!("Failed to encode MAVLink message: {}", e);
                return;
            }
        };

        match self.output.send_frame(&frame).await {
            Ok(()) => self.stats.frames_sent += 1,
            Err(e) => {
                self.stats.write_failures += 1;
                debug!("Failed to send frame: {}", e);
            }
        }
    }

    /// Tick forever, sleeping one period between ticks, until `shutdown` resolves
    pub async fn run<F>(&mut self, shutdown: F) -> BridgeStats
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        info!(
            "Starting MAVLink telemetry loop every {}ms on {}",
            self.period.as_millis(),
            self.output.device_path()
        );

        let mut last_log_ticks: u64 = 0;

        loop {
            self.tick().await;

            if self.stats.ticks - last_log_ticks >= self.status_log_interval {
                info!(
                    "Sent {} frames in {} ticks ({} write failures, {} CRSF updates)",
                    self.stats.frames_sent,
                    self.stats.ticks,
                    self.stats.write_failures,
                    self.store.version()
                );
                last_log_ticks = self.stats.ticks;
            }

            tokio::select! {
                _ = sleep(self.period) => {}
                _ = &mut shutdown => break,
            }
        }

        info!(
            "Telemetry loop stopped after {} ticks ({} frames sent)",
            self.stats.ticks, self.stats.frames_sent
        );
        self.stats
    }
}
