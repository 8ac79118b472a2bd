//! # CRC8-DVB-S2 Implementation
//!
//! Checksum used by every CRSF frame, computed over Type + Payload.
//!
//! **Polynomial**: 0xD5 (x^8 + x^7 + x^6 + x^4 + x^2 + 1)
//! **Initial Value**: 0x00

/// CRC-8-DVB-S2 polynomial
const CRC8_POLY: u8 = 0xD5;

/// Lookup table generated at compile time
const CRC8_TABLE: [u8; 256] = generate_crc8_table();

const fn generate_crc8_table() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;

    while i < 256 {
        let mut crc = i as u8;
        let mut j = 0;

        while j < 8 {
            if (crc & 0x80) != 0 {
                crc = (crc << 1) ^ CRC8_POLY;
            } else {
                crc <<= 1;
            }
            j += 1;
        }

        table[i] = crc;
        i += 1;
    }

    table
}

/// Calculate CRC8-DVB-S2 checksum
///
/// # Examples
///
/// ```
/// use crsf_mavlink_bridge::crsf::crc::crc8_dvb_s2;
///
/// // Type (vario) + payload
/// let crc = crc8_dvb_s2(&[0x07, 0x00, 0x64]);
/// assert_eq!(crc, crc8_dvb_s2(&[0x07, 0x00, 0x64]));
/// ```
pub fn crc8_dvb_s2(data: &[u8]) -> u8 {
    data.iter()
        .fold(0u8, |crc, &byte| CRC8_TABLE[(crc ^ byte) as usize])
}
