//! # CRSF Telemetry Receiver
//!
//! Reads CRSF bytes from the receiver link and keeps the telemetry store up
//! to date. This is the only writer of the store.

use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, info, trace};

use super::decoder::decode_telemetry;
use super::protocol::{CrsfFrame, TelemetryPacket};
use super::reader::FrameReader;
use crate::error::Result;
use crate::telemetry::TelemetryStore;

/// Read buffer size per `read` call
const READ_CHUNK_SIZE: usize = 256;

/// Apply one decoded telemetry packet to the store
pub fn apply_packet(store: &TelemetryStore, packet: &TelemetryPacket) {
    match packet {
        TelemetryPacket::Gps(gps) => store.update_gps(gps),
        TelemetryPacket::Vario(vario) => store.update_vario(vario),
        TelemetryPacket::Battery(battery) => store.update_battery(battery),
        TelemetryPacket::LinkStatistics(stats) => store.update_link_statistics(stats),
        TelemetryPacket::Attitude(attitude) => store.update_attitude(attitude),
        TelemetryPacket::FlightMode(mode) => {
            debug!("Flight mode: {}", mode);
            store.update_flight_mode(mode);
        }
    }
}

/// Decode a validated frame and apply it to the store
///
/// # Returns
///
/// * `Ok(true)` - The frame updated the store
/// * `Ok(false)` - The frame type is not used by the bridge
pub fn apply_frame(store: &TelemetryStore, frame: &CrsfFrame) -> Result<bool> {
    match decode_telemetry(frame)? {
        Some(packet) => {
            apply_packet(store, &packet);
            Ok(true)
        }
        None => {
            trace!("Ignoring CRSF frame type 0x{:02X}", frame.frame_type);
            Ok(false)
        }
    }
}

/// Receive CRSF telemetry until the stream ends
///
/// Malformed frames are logged and skipped.
///
/// # Errors
///
/// Returns error if reading from the stream fails
pub async fn run_receiver<R>(mut stream: R, store: Arc<TelemetryStore>) -> Result<()>
where
    R: AsyncRead + Unpin,
{
    let mut reader = FrameReader::new();
    let mut chunk = [0u8; READ_CHUNK_SIZE];
    let mut rejected: u64 = 0;

    info!("CRSF receiver started");

    loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            info!("CRSF stream closed ({} frames applied, {} rejected)", store.version(), rejected);
            return Ok(());
        }

        reader.extend(&chunk[..n]);

        while let Some(result) = reader.next_frame() {
            let outcome = result.and_then(|frame| apply_frame(&store, &frame));
            if let Err(e) = outcome {
                rejected += 1;
                debug!("Dropped CRSF frame: {}", e);
            }
        }
    }
}
