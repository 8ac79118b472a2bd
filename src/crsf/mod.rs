//! # CRSF Protocol Module
//!
//! Implementation of the receiving side of the Crossfire (CRSF) protocol.
//!
//! This module handles:
//! - Frame synchronization and validation on a raw byte stream
//! - CRC8-DVB-S2 checksum calculation
//! - Telemetry packet decoding (GPS, Battery, Attitude, Vario, Link Stats, Flight Mode)
//! - Feeding decoded values into the shared telemetry store

pub mod protocol;
pub mod decoder;
pub mod reader;
pub mod receiver;
pub mod crc;
