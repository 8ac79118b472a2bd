//! # CRSF Packet Decoder
//!
//! Decodes CRSF telemetry packets (GPS, Vario, Battery, Link Statistics,
//! Attitude, Flight Mode). All multi-byte fields are big-endian.

use super::crc::crc8_dvb_s2;
use super::protocol::*;
use crate::error::{BridgeError, Result};

/// Decode a complete CRSF frame
///
/// # Arguments
///
/// * `frame` - Complete CRSF frame bytes (including sync, length, type, payload, crc)
///
/// # Errors
///
/// Returns error if:
/// - Frame is too short
/// - Sync byte is incorrect
/// - Length field is out of range
/// - CRC check fails
pub fn decode_frame(frame: &[u8]) -> Result<CrsfFrame> {
    // Minimum frame size: sync(1) + length(1) + type(1) + crc(1) = 4 bytes
    if frame.len() < 4 {
        return Err(BridgeError::CrsfProtocol("Frame too short".to_string()));
    }

    if !is_sync_byte(frame[0]) {
        return Err(BridgeError::CrsfProtocol(format!(
            "Invalid sync byte: 0x{:02X}",
            frame[0]
        )));
    }

    let length = frame[1] as usize;

    if !(CRSF_MIN_LENGTH_FIELD..=CRSF_MAX_LENGTH_FIELD).contains(&length) {
        return Err(BridgeError::CrsfProtocol(format!(
            "Invalid length field: {}",
            length
        )));
    }

    // Frame should be: sync(1) + length(1) + [length bytes]
    // where [length bytes] = type(1) + payload(N) + crc(1)
    if frame.len() < 2 + length {
        return Err(BridgeError::CrsfProtocol(format!(
            "Frame too short: expected {} bytes, got {}",
            2 + length,
            frame.len()
        )));
    }

    let received_crc = frame[1 + length];

    // CRC covers Type + Payload
    let calculated_crc = crc8_dvb_s2(&frame[2..1 + length]);

    if calculated_crc != received_crc {
        return Err(BridgeError::CrsfProtocol(format!(
            "CRC mismatch: expected 0x{:02X}, got 0x{:02X}",
            calculated_crc, received_crc
        )));
    }

    let frame_type = frame[2];
    let payload = frame[3..1 + length].to_vec();

    CrsfFrame::new(frame_type, payload)
}

/// Decode the payload of a telemetry frame
///
/// # Returns
///
/// * `Ok(Some(packet))` - Decoded telemetry
/// * `Ok(None)` - Frame type carries nothing the bridge uses
///
/// # Errors
///
/// Returns error if a known payload is too short
pub fn decode_telemetry(frame: &CrsfFrame) -> Result<Option<TelemetryPacket>> {
    let packet = match frame.frame_type {
        CRSF_FRAMETYPE_GPS => TelemetryPacket::Gps(decode_gps(&frame.payload)?),
        CRSF_FRAMETYPE_VARIO => TelemetryPacket::Vario(decode_vario(&frame.payload)?),
        CRSF_FRAMETYPE_BATTERY_SENSOR => {
            TelemetryPacket::Battery(decode_battery_sensor(&frame.payload)?)
        }
        CRSF_FRAMETYPE_LINK_STATISTICS => {
            TelemetryPacket::LinkStatistics(decode_link_statistics(&frame.payload)?)
        }
        CRSF_FRAMETYPE_ATTITUDE => TelemetryPacket::Attitude(decode_attitude(&frame.payload)?),
        CRSF_FRAMETYPE_FLIGHT_MODE => {
            TelemetryPacket::FlightMode(decode_flight_mode(&frame.payload))
        }
        _ => return Ok(None),
    };

    Ok(Some(packet))
}

/// Decode Link Statistics telemetry packet (10 bytes)
pub fn decode_link_statistics(payload: &[u8]) -> Result<LinkStatistics> {
    if payload.len() < CRSF_LINK_STATS_PAYLOAD_SIZE {
        return Err(BridgeError::CrsfProtocol(format!(
            "Link stats payload too short: {} bytes",
            payload.len()
        )));
    }

    Ok(LinkStatistics {
        uplink_rssi_1: payload[0],
        uplink_rssi_2: payload[1],
        uplink_lq: payload[2],
        uplink_snr: payload[3] as i8,
        active_antenna: payload[4],
        rf_mode: payload[5],
        uplink_tx_power: payload[6],
        downlink_rssi: payload[7],
        downlink_lq: payload[8],
        downlink_snr: payload[9] as i8,
    })
}

/// Decode Battery Sensor telemetry packet (8 bytes)
pub fn decode_battery_sensor(payload: &[u8]) -> Result<BatterySensor> {
    if payload.len() < CRSF_BATTERY_SENSOR_PAYLOAD_SIZE {
        return Err(BridgeError::CrsfProtocol(format!(
            "Battery sensor payload too short: {} bytes",
            payload.len()
        )));
    }

    // Voltage: 2 bytes, in deci-volts
    let voltage_dv = u16::from_be_bytes([payload[0], payload[1]]);
    let voltage = voltage_dv as f32 / 10.0;

    // Current: 2 bytes, in deci-amps
    let current_da = u16::from_be_bytes([payload[2], payload[3]]);
    let current = current_da as f32 / 10.0;

    // Capacity: 3 bytes, in mAh
    let capacity_used = u32::from_be_bytes([0, payload[4], payload[5], payload[6]]);

    let remaining_percent = payload[7];

    Ok(BatterySensor {
        voltage,
        current,
        capacity_used,
        remaining_percent,
    })
}

/// Decode GPS telemetry packet (15 bytes)
pub fn decode_gps(payload: &[u8]) -> Result<GpsData> {
    if payload.len() < CRSF_GPS_PAYLOAD_SIZE {
        return Err(BridgeError::CrsfProtocol(format!(
            "GPS payload too short: {} bytes",
            payload.len()
        )));
    }

    // Latitude: 4 bytes, degrees × 10^7
    let lat_raw = i32::from_be_bytes([payload[0], payload[1], payload[2], payload[3]]);
    let latitude = lat_raw as f64 / 10_000_000.0;

    // Longitude: 4 bytes, degrees × 10^7
    let lon_raw = i32::from_be_bytes([payload[4], payload[5], payload[6], payload[7]]);
    let longitude = lon_raw as f64 / 10_000_000.0;

    // Ground speed: 2 bytes, km/h × 10
    let speed_raw = u16::from_be_bytes([payload[8], payload[9]]);
    let ground_speed = speed_raw as f32 / 10.0;

    // Heading: 2 bytes, degrees × 100
    let heading_raw = u16::from_be_bytes([payload[10], payload[11]]);
    let heading = heading_raw as f32 / 100.0;

    // Altitude: 2 bytes, meters + 1000
    let altitude_raw = u16::from_be_bytes([payload[12], payload[13]]);
    let altitude = altitude_raw as i32 - 1000;

    let satellites = payload[14];

    Ok(GpsData {
        latitude,
        longitude,
        ground_speed,
        heading,
        altitude,
        satellites,
    })
}

/// Decode Attitude telemetry packet (6 bytes)
///
/// Wire order is pitch, roll, yaw, each in radians × 10000.
pub fn decode_attitude(payload: &[u8]) -> Result<Attitude> {
    if payload.len() < CRSF_ATTITUDE_PAYLOAD_SIZE {
        return Err(BridgeError::CrsfProtocol(format!(
            "Attitude payload too short: {} bytes",
            payload.len()
        )));
    }

    let to_degrees = |hi: u8, lo: u8| (i16::from_be_bytes([hi, lo]) as f32 / 10_000.0).to_degrees();

    Ok(Attitude {
        pitch: to_degrees(payload[0], payload[1]),
        roll: to_degrees(payload[2], payload[3]),
        yaw: to_degrees(payload[4], payload[5]),
    })
}

/// Decode Variometer telemetry packet (2 bytes, cm/s)
pub fn decode_vario(payload: &[u8]) -> Result<Vario> {
    if payload.len() < CRSF_VARIO_PAYLOAD_SIZE {
        return Err(BridgeError::CrsfProtocol(format!(
            "Vario payload too short: {} bytes",
            payload.len()
        )));
    }

    let vertical_speed_cms = i16::from_be_bytes([payload[0], payload[1]]);

    Ok(Vario {
        vertical_speed: vertical_speed_cms as f32 / 100.0,
    })
}

/// Decode Flight Mode telemetry packet (NUL-terminated ASCII)
pub fn decode_flight_mode(payload: &[u8]) -> String {
    let end = payload.iter().position(|&b| b == 0).unwrap_or(payload.len());
    String::from_utf8_lossy(&payload[..end]).into_owned()
}
