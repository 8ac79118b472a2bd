//! # MAVLink Frame Encoder
//!
//! Serializes composed messages into MAVLink v2 frames.

use mavlink::common::MavMessage;
use mavlink::MavHeader;

use crate::error::{BridgeError, Result};

/// Maximum MAVLink v2 packet length (header + 255-byte payload + crc + signature)
pub const MAVLINK_MAX_PACKET_LEN: usize = 280;

/// MAVLink v2 start-of-frame marker
pub const MAVLINK_V2_STX: u8 = 0xFD;

/// Stamps messages with the vehicle identity and a running sequence number
#[derive(Debug, Clone)]
pub struct FrameEncoder {
    system_id: u8,
    component_id: u8,
    sequence: u8,
}

impl FrameEncoder {
    pub fn new(system_id: u8, component_id: u8) -> Self {
        Self {
            system_id,
            component_id,
            sequence: 0,
        }
    }

    /// Sequence number the next frame will carry
    pub fn sequence(&self) -> u8 {
        self.sequence
    }

    /// Encode one message into a complete MAVLink v2 frame
    ///
    /// The sequence number advances (wrapping) on every successful encode.
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails or the frame exceeds
    /// [`MAVLINK_MAX_PACKET_LEN`]
    pub fn encode(&mut self, message: &MavMessage) -> Result<Vec<u8>> {
        let header = MavHeader {
            system_id: self.system_id,
            component_id: self.component_id,
            sequence: self.sequence,
        };

        let mut frame = Vec::with_capacity(MAVLINK_MAX_PACKET_LEN);
        mavlink::write_v2_msg(&mut frame, header, message)
            .map_err(|e| BridgeError::MavlinkEncode(format!("{:?}", e)))?;

        if frame.len() > MAVLINK_MAX_PACKET_LEN {
            return Err(BridgeError::MavlinkEncode(format!(
                "Frame length {} exceeds maximum {}",
                frame.len(),
                MAVLINK_MAX_PACKET_LEN
            )));
        }

        self.sequence = self.sequence.wrapping_add(1);
        Ok(frame)
    }
}

/// Message id of an encoded MAVLink v2 frame
///
/// Returns `None` if the bytes are not a v2 frame header.
pub fn frame_message_id(frame: &[u8]) -> Option<u32> {
    if frame.len() < 10 || frame[0] != MAVLINK_V2_STX {
        return None;
    }
    Some(u32::from_le_bytes([frame[7], frame[8], frame[9], 0]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composer;
    use crate::config::UavConfig;
    use crate::telemetry::SensorSnapshot;

    #[test]
    fn test_encode_heartbeat_header() {
        let mut encoder = FrameEncoder::new(1, 0);
        let frame = encoder.encode(&composer::heartbeat(&UavConfig::default())).unwrap();

        assert_eq!(frame[0], MAVLINK_V2_STX);
        assert_eq!(frame[4], 0, "first frame has sequence 0");
        assert_eq!(frame[5], 1, "system id");
        assert_eq!(frame[6], 0, "component id");
        assert_eq!(frame_message_id(&frame), Some(0));
        assert!(frame.len() <= MAVLINK_MAX_PACKET_LEN);
    }

    #[test]
    fn test_sequence_increments_and_wraps() {
        let mut encoder = FrameEncoder::new(3, 190);
        let message = composer::sys_status(&SensorSnapshot::default());

        for expected in 0..=255u8 {
            let frame = encoder.encode(&message).unwrap();
            assert_eq!(frame[4], expected);
            assert_eq!(frame[5], 3);
            assert_eq!(frame[6], 190);
        }

        assert_eq!(encoder.sequence(), 0);
        let frame = encoder.encode(&message).unwrap();
        assert_eq!(frame[4], 0);
    }

    #[test]
    fn test_message_ids() {
        let snapshot = SensorSnapshot::default();
        let defaults = crate::config::TelemetryDefaults::default();
        let mut encoder = FrameEncoder::new(1, 0);

        let gps = composer::gps(&defaults, &snapshot, 0);
        let cases = [
            (composer::sys_status(&snapshot), 1),
            (gps.raw, 24),
            (gps.global, 33),
            (composer::hud(&defaults, &snapshot), 74),
            (composer::attitude(&snapshot, 0), 30),
        ];

        for (message, id) in cases {
            let frame = encoder.encode(&message).unwrap();
            assert_eq!(frame_message_id(&frame), Some(id));
        }
    }

    #[test]
    fn test_frame_message_id_rejects_non_v2() {
        assert_eq!(frame_message_id(&[0xFE, 9, 0, 1, 0, 0]), None);
        assert_eq!(frame_message_id(&[0xFD, 0, 0]), None);
    }
}
