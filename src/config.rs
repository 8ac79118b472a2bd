//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.
//!
//! Every value has a default, so an empty file (or no file at all) yields a
//! working bridge: MAVLink out on `/dev/ttyUSB0` at 57600 baud, CRSF in on
//! `/dev/ttyUSB1` at 115200 baud, 10 Hz telemetry.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{BridgeError, Result};

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub mavlink: MavlinkConfig,
    pub crsf: CrsfConfig,
    pub uav: UavConfig,
    pub telemetry: TelemetryDefaults,
    pub scheduler: SchedulerConfig,
    pub logging: LoggingConfig,
}

/// MAVLink output port configuration
#[derive(Debug, Deserialize, Clone)]
pub struct MavlinkConfig {
    #[serde(default = "default_mavlink_port")]
    pub port: String,

    #[serde(default = "default_mavlink_baud_rate")]
    pub baud_rate: u32,
}

/// CRSF input port configuration
#[derive(Debug, Deserialize, Clone)]
pub struct CrsfConfig {
    #[serde(default = "default_crsf_enabled")]
    pub enabled: bool,

    #[serde(default = "default_crsf_port")]
    pub port: String,

    #[serde(default = "default_crsf_baud_rate")]
    pub baud_rate: u32,
}

/// MAVLink vehicle type announced in the heartbeat
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VehicleType {
    Generic,
    FixedWing,
    Quadrotor,
    Helicopter,
    GroundRover,
}

/// MAVLink autopilot class announced in the heartbeat
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AutopilotType {
    Generic,
    Ardupilotmega,
    Px4,
    Invalid,
}

/// MAVLink system state announced in the heartbeat
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SystemState {
    Uninit,
    Boot,
    Calibrating,
    Standby,
    Active,
    Critical,
    Emergency,
    Poweroff,
}

/// Static vehicle identity
///
/// Set once at startup and passed unchanged into every frame.
#[derive(Debug, Deserialize, Clone)]
pub struct UavConfig {
    #[serde(default = "default_system_id")]
    pub system_id: u8,

    #[serde(default = "default_component_id")]
    pub component_id: u8,

    #[serde(default = "default_vehicle_type")]
    pub vehicle_type: VehicleType,

    #[serde(default = "default_autopilot")]
    pub autopilot: AutopilotType,

    /// MAV_MODE_FLAG bitmask (4 = auto, 8 = guided, 16 = stabilize, 64 = manual)
    #[serde(default = "default_base_mode")]
    pub base_mode: u8,

    #[serde(default)]
    pub custom_mode: u32,

    #[serde(default = "default_system_state")]
    pub system_state: SystemState,
}

/// Values CRSF does not carry, reported as constants
#[derive(Debug, Deserialize, Clone)]
pub struct TelemetryDefaults {
    /// Airspeed in m/s
    #[serde(default)]
    pub airspeed: f32,

    /// Throttle percentage
    #[serde(default)]
    pub throttle: f32,

    /// Climb rate in m/s
    #[serde(default)]
    pub climb_rate: f32,

    /// Horizontal dilution of precision
    #[serde(default = "default_gps_hdop")]
    pub gps_hdop: f32,

    /// Report the CRSF vario reading as HUD climb rate instead of `climb_rate`
    #[serde(default)]
    pub use_vario_climb: bool,

    /// Report milliseconds since start instead of a constant 0
    #[serde(default = "default_report_uptime")]
    pub report_uptime: bool,
}

/// Scheduler loop configuration
#[derive(Debug, Deserialize, Clone)]
pub struct SchedulerConfig {
    #[serde(default = "default_period_ms")]
    pub period_ms: u64,

    /// Log a human-readable sensor dump every tick
    #[serde(default)]
    pub debug_dump: bool,

    #[serde(default = "default_status_log_interval_ticks")]
    pub status_log_interval_ticks: u64,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone, Default)]
pub struct LoggingConfig {
    /// Optional log file; logs go to stderr when unset
    #[serde(default)]
    pub file: Option<PathBuf>,
}

// Default value functions
fn default_mavlink_port() -> String { "/dev/ttyUSB0".to_string() }
fn default_mavlink_baud_rate() -> u32 { 57600 }

fn default_crsf_enabled() -> bool { true }
fn default_crsf_port() -> String { "/dev/ttyUSB1".to_string() }
fn default_crsf_baud_rate() -> u32 { 115200 }

fn default_system_id() -> u8 { 1 }
fn default_component_id() -> u8 { 0 }
fn default_vehicle_type() -> VehicleType { VehicleType::Quadrotor }
fn default_autopilot() -> AutopilotType { AutopilotType::Generic }
fn default_base_mode() -> u8 { 16 }
fn default_system_state() -> SystemState { SystemState::Active }

fn default_gps_hdop() -> f32 { 100.0 }
fn default_report_uptime() -> bool { false }

fn default_period_ms() -> u64 { 100 }
fn default_status_log_interval_ticks() -> u64 { 100 }

const MAVLINK_BAUD_RATES: &[u32] = &[9600, 19200, 38400, 57600, 115200, 230400, 460800, 921600];
const CRSF_BAUD_RATES: &[u32] = &[115200, 400000, 420000];

impl Default for MavlinkConfig {
    fn default() -> Self {
        Self {
            port: default_mavlink_port(),
            baud_rate: default_mavlink_baud_rate(),
        }
    }
}

impl Default for CrsfConfig {
    fn default() -> Self {
        Self {
            enabled: default_crsf_enabled(),
            port: default_crsf_port(),
            baud_rate: default_crsf_baud_rate(),
        }
    }
}

impl Default for UavConfig {
    fn default() -> Self {
        Self {
            system_id: default_system_id(),
            component_id: default_component_id(),
            vehicle_type: default_vehicle_type(),
            autopilot: default_autopilot(),
            base_mode: default_base_mode(),
            custom_mode: 0,
            system_state: default_system_state(),
        }
    }
}

impl Default for TelemetryDefaults {
    fn default() -> Self {
        Self {
            airspeed: 0.0,
            throttle: 0.0,
            climb_rate: 0.0,
            gps_hdop: default_gps_hdop(),
            use_vario_climb: false,
            report_uptime: default_report_uptime(),
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            period_ms: default_period_ms(),
            debug_dump: false,
            status_log_interval_ticks: default_status_log_interval_ticks(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use crsf_mavlink_bridge::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        if self.mavlink.port.is_empty() {
            return Err(invalid("mavlink port cannot be empty"));
        }

        if !MAVLINK_BAUD_RATES.contains(&self.mavlink.baud_rate) {
            return Err(invalid(format!(
                "mavlink baud_rate must be one of: {:?}",
                MAVLINK_BAUD_RATES
            )));
        }

        // The CRSF port settings only matter when the receiver is enabled
        if self.crsf.enabled && self.crsf.port.is_empty() {
            return Err(invalid("crsf port cannot be empty when enabled"));
        }

        if self.crsf.enabled && !CRSF_BAUD_RATES.contains(&self.crsf.baud_rate) {
            return Err(invalid(format!(
                "crsf baud_rate must be one of: {:?}",
                CRSF_BAUD_RATES
            )));
        }

        if self.scheduler.period_ms == 0 || self.scheduler.period_ms > 10000 {
            return Err(invalid("period_ms must be between 1 and 10000"));
        }

        if self.scheduler.status_log_interval_ticks == 0 {
            return Err(invalid("status_log_interval_ticks must be greater than 0"));
        }

        if !self.telemetry.gps_hdop.is_finite() || self.telemetry.gps_hdop < 0.0 {
            return Err(invalid("gps_hdop must be a non-negative number"));
        }

        Ok(())
    }
}

fn invalid(msg: impl std::fmt::Display) -> BridgeError {
    BridgeError::Config(toml::de::Error::custom(msg))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.uav.system_id, 1);
        assert_eq!(config.uav.component_id, 0);
        assert_eq!(config.uav.vehicle_type, VehicleType::Quadrotor);
        assert_eq!(config.uav.autopilot, AutopilotType::Generic);
        assert_eq!(config.uav.base_mode, 16);
        assert_eq!(config.uav.system_state, SystemState::Active);
        assert_eq!(config.scheduler.period_ms, 100);
        assert!(!config.scheduler.debug_dump);
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config.mavlink.port, "/dev/ttyUSB0");
        assert_eq!(config.mavlink.baud_rate, 57600);
        assert_eq!(config.crsf.baud_rate, 115200);
        assert_eq!(config.telemetry.gps_hdop, 100.0);
        assert!(config.logging.file.is_none());
    }

    #[test]
    fn test_load_config_from_file() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let toml_content = r#"
[mavlink]
port = "/dev/ttyAMA0"
baud_rate = 115200

[crsf]
enabled = false

[uav]
system_id = 7
vehicle_type = "fixed_wing"
system_state = "standby"

[telemetry]
use_vario_climb = true

[scheduler]
period_ms = 50
debug_dump = true
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = Config::load(temp_file.path()).unwrap();
        assert_eq!(config.mavlink.port, "/dev/ttyAMA0");
        assert_eq!(config.mavlink.baud_rate, 115200);
        assert!(!config.crsf.enabled);
        assert_eq!(config.uav.system_id, 7);
        assert_eq!(config.uav.vehicle_type, VehicleType::FixedWing);
        assert_eq!(config.uav.system_state, SystemState::Standby);
        assert!(config.telemetry.use_vario_climb);
        assert_eq!(config.scheduler.period_ms, 50);
        assert!(config.scheduler.debug_dump);
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load("/nonexistent/bridge.toml");
        assert!(matches!(result, Err(BridgeError::Io(_))));
    }

    #[test]
    fn test_unknown_vehicle_type_rejected() {
        let result = Config::from_toml_str("[uav]\nvehicle_type = \"submarine\"\n");
        assert!(matches!(result, Err(BridgeError::Config(_))));
    }

    #[test]
    fn test_empty_mavlink_port() {
        let mut config = Config::default();
        config.mavlink.port = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_crsf_port_when_enabled() {
        let mut config = Config::default();
        config.crsf.port = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_crsf_port_when_disabled() {
        let mut config = Config::default();
        config.crsf.enabled = false;
        config.crsf.port = String::new();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_mavlink_baud_rate() {
        let mut config = Config::default();
        config.mavlink.baud_rate = 420000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_valid_crsf_baud_rates() {
        for &baud in CRSF_BAUD_RATES {
            let mut config = Config::default();
            config.crsf.baud_rate = baud;
            assert!(config.validate().is_ok(), "Baud rate {} should be valid", baud);
        }
    }

    #[test]
    fn test_invalid_crsf_baud_rate() {
        let mut config = Config::default();
        config.crsf.baud_rate = 57600;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_crsf_baud_rate_ignored_when_disabled() {
        let mut config = Config::default();
        config.crsf.enabled = false;
        config.crsf.baud_rate = 57600;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_period_zero() {
        let mut config = Config::default();
        config.scheduler.period_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_period_too_high() {
        let mut config = Config::default();
        config.scheduler.period_ms = 10001;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_status_log_interval_zero() {
        let mut config = Config::default();
        config.scheduler.status_log_interval_ticks = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_negative_hdop() {
        let mut config = Config::default();
        config.telemetry.gps_hdop = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_nan_hdop() {
        let mut config = Config::default();
        config.telemetry.gps_hdop = f32::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_functions() {
        assert_eq!(default_mavlink_port(), "/dev/ttyUSB0");
        assert_eq!(default_mavlink_baud_rate(), 57600);
        assert!(default_crsf_enabled());
        assert_eq!(default_crsf_port(), "/dev/ttyUSB1");
        assert_eq!(default_crsf_baud_rate(), 115200);
        assert_eq!(default_system_id(), 1);
        assert_eq!(default_component_id(), 0);
        assert_eq!(default_base_mode(), 16);
        assert_eq!(default_gps_hdop(), 100.0);
        assert!(!default_report_uptime());
        assert_eq!(default_period_ms(), 100);
        assert_eq!(default_status_log_interval_ticks(), 100);
    }
}
