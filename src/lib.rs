//! # CRSF MAVLink Bridge Library
//!
//! Forward CRSF (Crossfire/ELRS) receiver telemetry to a ground station as MAVLink.
//!
//! This library provides the telemetry translation layer: decoding CRSF
//! telemetry into a shared sensor store, mapping each snapshot into
//! correctly scaled MAVLink messages, and sending them at a fixed rate.

pub mod bridge;
pub mod composer;
pub mod config;
pub mod crsf;
pub mod error;
pub mod serial;
pub mod telemetry;
