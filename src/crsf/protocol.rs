//! # CRSF Protocol Constants and Types
//!
//! Core protocol definitions for the CRSF (Crossfire) telemetry frames the
//! bridge consumes.

use crate::error::{BridgeError, Result};

/// Sync byte used for frames addressed to the flight controller
pub const CRSF_SYNC_BYTE: u8 = 0xC8;

/// Address byte of the radio handset, also seen as sync on telemetry links
pub const CRSF_ADDRESS_RADIO: u8 = 0xEA;

/// Address byte of the TX module
pub const CRSF_ADDRESS_TX_MODULE: u8 = 0xEE;

/// GPS packet type
pub const CRSF_FRAMETYPE_GPS: u8 = 0x02;

/// Variometer packet type
pub const CRSF_FRAMETYPE_VARIO: u8 = 0x07;

/// Battery sensor packet type
pub const CRSF_FRAMETYPE_BATTERY_SENSOR: u8 = 0x08;

/// Link Statistics packet type
pub const CRSF_FRAMETYPE_LINK_STATISTICS: u8 = 0x14;

/// RC Channels packet type
pub const CRSF_FRAMETYPE_RC_CHANNELS_PACKED: u8 = 0x16;

/// Attitude packet type
pub const CRSF_FRAMETYPE_ATTITUDE: u8 = 0x1E;

/// Flight mode packet type
pub const CRSF_FRAMETYPE_FLIGHT_MODE: u8 = 0x21;

/// Maximum CRSF payload size
/// Frame structure: sync(1) + length(1) + type(1) + payload(N) + crc(1)
/// Maximum frame size is 64 bytes, so max payload = 64 - 4 = 60 bytes
pub const CRSF_MAX_PAYLOAD_SIZE: usize = 60;

/// Maximum complete frame size (sync + length + 62)
pub const CRSF_MAX_FRAME_SIZE: usize = 64;

/// Smallest valid length field (type + crc)
pub const CRSF_MIN_LENGTH_FIELD: usize = 2;

/// Largest valid length field (type + 60-byte payload + crc)
pub const CRSF_MAX_LENGTH_FIELD: usize = CRSF_MAX_PAYLOAD_SIZE + 2;

/// Link Statistics payload size
pub const CRSF_LINK_STATS_PAYLOAD_SIZE: usize = 10;

/// Battery Sensor payload size
pub const CRSF_BATTERY_SENSOR_PAYLOAD_SIZE: usize = 8;

/// GPS payload size
pub const CRSF_GPS_PAYLOAD_SIZE: usize = 15;

/// Attitude payload size
pub const CRSF_ATTITUDE_PAYLOAD_SIZE: usize = 6;

/// Variometer payload size
pub const CRSF_VARIO_PAYLOAD_SIZE: usize = 2;

/// Check whether `byte` can start a CRSF frame
pub fn is_sync_byte(byte: u8) -> bool {
    matches!(byte, CRSF_SYNC_BYTE | CRSF_ADDRESS_RADIO | CRSF_ADDRESS_TX_MODULE)
}

/// Link statistics telemetry data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkStatistics {
    /// Uplink RSSI (antenna 1) in -dBm
    pub uplink_rssi_1: u8,

    /// Uplink RSSI (antenna 2) in -dBm (diversity)
    pub uplink_rssi_2: u8,

    /// Uplink link quality (0-100%)
    pub uplink_lq: u8,

    /// Uplink SNR in dB
    pub uplink_snr: i8,

    /// Active antenna (0 or 1)
    pub active_antenna: u8,

    /// RF mode / packet rate
    pub rf_mode: u8,

    /// Uplink TX power in mW (encoded)
    pub uplink_tx_power: u8,

    /// Downlink RSSI in -dBm
    pub downlink_rssi: u8,

    /// Downlink link quality (0-100%)
    pub downlink_lq: u8,

    /// Downlink SNR in dB
    pub downlink_snr: i8,
}

/// Battery sensor telemetry data
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatterySensor {
    /// Battery voltage in volts
    pub voltage: f32,

    /// Current draw in amperes
    pub current: f32,

    /// Capacity used in mAh
    pub capacity_used: u32,

    /// Battery remaining percentage (0-100%)
    pub remaining_percent: u8,
}

/// GPS telemetry data
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GpsData {
    /// Latitude in degrees
    pub latitude: f64,

    /// Longitude in degrees
    pub longitude: f64,

    /// Ground speed in km/h
    pub ground_speed: f32,

    /// Heading in degrees
    pub heading: f32,

    /// Altitude in meters
    pub altitude: i32,

    /// Number of satellites
    pub satellites: u8,
}

/// Attitude telemetry data, in degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Attitude {
    pub roll: f32,
    pub pitch: f32,
    pub yaw: f32,
}

/// Variometer telemetry data
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vario {
    /// Vertical speed in m/s (positive up)
    pub vertical_speed: f32,
}

/// Decoded telemetry payload
#[derive(Debug, Clone, PartialEq)]
pub enum TelemetryPacket {
    Gps(GpsData),
    Vario(Vario),
    Battery(BatterySensor),
    LinkStatistics(LinkStatistics),
    Attitude(Attitude),
    FlightMode(String),
}

/// CRSF frame structure
#[derive(Debug, Clone)]
pub struct CrsfFrame {
    /// Frame type
    pub frame_type: u8,

    /// Payload data
    pub payload: Vec<u8>,
}

impl CrsfFrame {
    /// Create a new CRSF frame
    ///
    /// # Errors
    ///
    /// Returns error if payload exceeds CRSF_MAX_PAYLOAD_SIZE (60 bytes)
    pub fn new(frame_type: u8, payload: Vec<u8>) -> Result<Self> {
        if payload.len() > CRSF_MAX_PAYLOAD_SIZE {
            return Err(BridgeError::CrsfProtocol(format!(
                "Payload size {} exceeds maximum {}",
                payload.len(),
                CRSF_MAX_PAYLOAD_SIZE
            )));
        }

        Ok(Self {
            frame_type,
            payload,
        })
    }

    /// Get frame length (type + payload + crc)
    ///
    /// This is guaranteed not to overflow since payload is validated to be ≤ 60 bytes
    pub fn length(&self) -> u8 {
        (1 + self.payload.len() + 1) as u8
    }
}
