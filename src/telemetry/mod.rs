//! # Telemetry Module
//!
//! Live sensor state shared between the CRSF receiver and the scheduler.
//!
//! This module handles:
//! - Holding the latest decoded CRSF values in a lock-free store
//! - Taking (possibly torn) snapshots for each scheduler tick
//! - Formatting the human-readable diagnostic dump

pub mod dump;
pub mod store;

pub use store::{LinkQuality, SensorSnapshot, TelemetryStore};
