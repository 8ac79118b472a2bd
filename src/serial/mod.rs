//! # Serial Communication Module
//!
//! Opens the two serial links of the bridge.
//!
//! This module handles:
//! - Opening the MAVLink output port (ground station / companion computer)
//! - Opening the CRSF input port (receiver telemetry)
//! - Writing encoded frames, flushed one frame at a time

pub mod port_trait;

use crate::config::{CrsfConfig, MavlinkConfig};
use crate::error::{BridgeError, Result};
use port_trait::{SerialPortIO, TokioSerialPort};
use tokio_serial::SerialPortBuilderExt;
use tracing::{debug, info, warn};

/// MAVLink Output Port Handler
pub struct MavlinkSerial<P: SerialPortIO = TokioSerialPort> {
    port: P,
    device_path: String,
}

impl<P: SerialPortIO> std::fmt::Debug for MavlinkSerial<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MavlinkSerial")
            .field("device_path", &self.device_path)
            .finish_non_exhaustive()
    }
}

impl MavlinkSerial<TokioSerialPort> {
    /// Open the MAVLink output port described by `config`
    ///
    /// # Errors
    ///
    /// Returns error if the device cannot be opened
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use crsf_mavlink_bridge::config::MavlinkConfig;
    /// use crsf_mavlink_bridge::serial::MavlinkSerial;
    ///
    /// fn main() -> anyhow::Result<()> {
    ///     let serial = MavlinkSerial::open(&MavlinkConfig::default())?;
    ///     println!("Connected to: {}", serial.device_path());
    ///     Ok(())
    /// }
    /// ```
    pub fn open(config: &MavlinkConfig) -> Result<Self> {
        let port = open_port(&config.port, config.baud_rate)?;
        info!("Opened MAVLink output at {} ({} baud)", config.port, config.baud_rate);
        Ok(Self::with_port(TokioSerialPort::new(port), config.port.clone()))
    }
}

impl<P: SerialPortIO> MavlinkSerial<P> {
    /// Wrap an already opened port
    pub fn with_port(port: P, device_path: impl Into<String>) -> Self {
        Self {
            port,
            device_path: device_path.into(),
        }
    }

    /// Send one encoded MAVLink frame
    ///
    /// # Errors
    ///
    /// Returns error if the write or flush fails
    pub async fn send_frame(&mut self, frame: &[u8]) -> Result<()> {
        self.port
            .write_all(frame)
            .await
            .map_err(|e| BridgeError::Serial(format!("Failed to write frame: {}", e)))?;

        self.port
            .flush()
            .await
            .map_err(|e| BridgeError::Serial(format!("Failed to flush serial port: {}", e)))?;

        debug!("Sent MAVLink frame ({} bytes)", frame.len());
        Ok(())
    }

    /// Get the device path of the opened serial port
    pub fn device_path(&self) -> &str {
        &self.device_path
    }
}

/// Open the CRSF input port described by `config`
///
/// Tries the configured path first, then the common receiver device paths.
///
/// # Errors
///
/// Returns error if none of the candidate devices can be opened
pub fn open_crsf_input(config: &CrsfConfig) -> Result<(tokio_serial::SerialStream, String)> {
    let mut candidates = vec![config.port.as_str()];
    candidates.extend(
        DEFAULT_CRSF_DEVICE_PATHS
            .iter()
            .copied()
            .filter(|path| *path != config.port),
    );
    open_first(&candidates, config.baud_rate)
}

/// Fallback CRSF device paths (in order of preference)
const DEFAULT_CRSF_DEVICE_PATHS: &[&str] = &[
    "/dev/ttyUSB1", // USB-to-serial adapter next to the MAVLink one
    "/dev/ttyACM0", // USB CDC receivers
];

/// Open the first path that succeeds
fn open_first(paths: &[&str], baud_rate: u32) -> Result<(tokio_serial::SerialStream, String)> {
    for path in paths {
        debug!("Trying to open serial port: {}", path);

        match open_port(path, baud_rate) {
            Ok(port) => {
                info!("Opened CRSF input at {} ({} baud)", path, baud_rate);
                return Ok((port, path.to_string()));
            }
            Err(e) => {
                warn!("Failed to open {}: {}", path, e);
                continue;
            }
        }
    }

    Err(BridgeError::SerialPortNotFound(paths.join(", ")))
}

/// Open a specific serial port as 8N1 without flow control
fn open_port(path: &str, baud_rate: u32) -> Result<tokio_serial::SerialStream> {
    tokio_serial::new(path, baud_rate)
        .data_bits(tokio_serial::DataBits::Eight)
        .parity(tokio_serial::Parity::None)
        .stop_bits(tokio_serial::StopBits::One)
        .flow_control(tokio_serial::FlowControl::None)
        .open_native_async()
        .map_err(|e| BridgeError::Serial(format!("Failed to open {}: {}", path, e)))
}

#[cfg(test)]
mod tests {
    use super::port_trait::mocks::RecordingPort;
    use super::port_trait::MockSerialPortIO;
    use super::*;
    use std::io;

    #[test]
    fn test_open_first_with_invalid_paths_returns_error() {
        let invalid_paths = &["/dev/nonexistent0", "/dev/nonexistent1"];
        let result = open_first(invalid_paths, 115200);

        match result {
            Err(BridgeError::SerialPortNotFound(msg)) => {
                assert!(msg.contains("/dev/nonexistent0"));
                assert!(msg.contains("/dev/nonexistent1"));
            }
            other => panic!("Expected SerialPortNotFound error, got: {:?}", other.err()),
        }
    }

    #[test]
    fn test_open_first_with_empty_paths_returns_error() {
        let empty_paths: &[&str] = &[];
        let result = open_first(empty_paths, 115200);
        assert!(matches!(result, Err(BridgeError::SerialPortNotFound(_))));
    }

    #[test]
    fn test_open_port_with_invalid_path_returns_error() {
        let result = open_port("/dev/nonexistent_serial_device_12345", 57600);

        match result {
            Err(BridgeError::Serial(msg)) => {
                assert!(msg.contains("/dev/nonexistent_serial_device_12345"));
                assert!(msg.contains("Failed to open"));
            }
            other => panic!("Expected Serial error, got: {:?}", other.err()),
        }
    }

    #[test]
    fn test_open_mavlink_with_invalid_path_returns_error() {
        let config = MavlinkConfig {
            port: "/dev/nonexistent_mavlink".to_string(),
            baud_rate: 57600,
        };
        assert!(MavlinkSerial::open(&config).is_err());
    }

    #[test]
    fn test_default_crsf_paths() {
        assert_eq!(DEFAULT_CRSF_DEVICE_PATHS[0], "/dev/ttyUSB1");
        assert_eq!(DEFAULT_CRSF_DEVICE_PATHS[1], "/dev/ttyACM0");
    }

    #[tokio::test]
    async fn test_send_frame_writes_bytes() {
        let port = RecordingPort::new();
        let mut serial = MavlinkSerial::with_port(port.clone(), "mock");

        serial.send_frame(&[0xFD, 0x09, 0x00]).await.unwrap();
        serial.send_frame(&[0xFD, 0x1C, 0x00]).await.unwrap();

        assert_eq!(port.get_written_data(), vec![vec![0xFD, 0x09, 0x00], vec![0xFD, 0x1C, 0x00]]);
        assert_eq!(serial.device_path(), "mock");
    }

    #[tokio::test]
    async fn test_send_frame_write_error() {
        let mut port = MockSerialPortIO::new();
        port.expect_write_all()
            .times(1)
            .returning(|_| Err(io::Error::new(io::ErrorKind::TimedOut, "stalled")));
        port.expect_flush().never();

        let mut serial = MavlinkSerial::with_port(port, "mock");
        let result = serial.send_frame(&[0xFD]).await;

        match result {
            Err(BridgeError::Serial(msg)) => assert!(msg.contains("Failed to write frame")),
            other => panic!("Expected Serial error, got: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_send_frame_flush_error() {
        let mut port = MockSerialPortIO::new();
        port.expect_write_all().times(1).returning(|_| Ok(()));
        port.expect_flush()
            .times(1)
            .returning(|| Err(io::Error::new(io::ErrorKind::Other, "flush failed")));

        let mut serial = MavlinkSerial::with_port(port, "mock");
        let result = serial.send_frame(&[0xFD]).await;

        match result {
            Err(BridgeError::Serial(msg)) => assert!(msg.contains("Failed to flush")),
            other => panic!("Expected Serial error, got: {:?}", other),
        }
    }

    // Integration test - only runs if a serial adapter is connected
    #[tokio::test]
    #[ignore] // Run with: cargo test -- --ignored
    async fn test_send_frame_with_real_hardware() {
        match MavlinkSerial::open(&MavlinkConfig::default()) {
            Ok(mut serial) => {
                let send_result = serial.send_frame(&[0xFD, 0x00]).await;
                assert!(send_result.is_ok(), "Failed to send frame: {:?}", send_result);
            }
            Err(_) => println!("No serial hardware detected (skipping send test)"),
        }
    }
}
