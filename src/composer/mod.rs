//! # Frame Composer
//!
//! Pure mapping from a [`SensorSnapshot`] plus static configuration to the
//! MAVLink messages sent every tick.
//!
//! | Message | Scaling |
//! |---------|---------|
//! | SYS_STATUS | V → mV (×1000), A → cA (×10) |
//! | GPS_RAW_INT | deg → 1e-7 deg, m → mm, HDOP ×100, km/h ÷ 3.6 |
//! | GLOBAL_POSITION_INT | deg → 1e-7 deg, m → mm |
//! | VFR_HUD | altitude m → mm |
//! | ATTITUDE | deg ÷ 57.2958 |
//!
//! No input is validated or clamped. Scaled values are rounded to the nearest
//! integer and cast to the field type, so a value outside the field's range
//! saturates at the field boundary.

pub mod encoder;

use mavlink::common::{
    GpsFixType, MavAutopilot, MavMessage, MavModeFlag, MavState, MavSysStatusSensor, MavType,
    ATTITUDE_DATA, GLOBAL_POSITION_INT_DATA, GPS_RAW_INT_DATA, HEARTBEAT_DATA, SYS_STATUS_DATA,
    VFR_HUD_DATA,
};

use crate::config::{AutopilotType, SystemState, TelemetryDefaults, UavConfig, VehicleType};
use crate::telemetry::SensorSnapshot;

/// Satellite count from which a 3D fix is reported
pub const MIN_SATS_FOR_3D_FIX: u32 = 6;

/// Degrees per radian as used for attitude conversion
pub const DEGREES_PER_RADIAN: f64 = 57.2958;

/// Sensor present/enabled/health bitmask reported as "all present"
pub const SENSORS_ALL_PRESENT: u32 = 32767;

/// Reported CPU load (50.0%)
pub const SYSTEM_LOAD: u16 = 500;

/// "Unknown" sentinel for course over ground and VDOP
pub const UNKNOWN_U16: u16 = u16::MAX;

/// MAVLink protocol version announced in the heartbeat
pub const MAVLINK_VERSION: u8 = 3;

/// GPS_RAW_INT and GLOBAL_POSITION_INT, always emitted together in this order
#[derive(Debug, Clone, PartialEq)]
pub struct GpsFrames {
    pub raw: MavMessage,
    pub global: MavMessage,
}

impl GpsFrames {
    /// Both messages in emission order
    pub fn into_array(self) -> [MavMessage; 2] {
        [self.raw, self.global]
    }
}

/// Infer the GPS fix type from the satellite count
///
/// Six or more satellites report a 3D fix; anything less reports no fix.
pub fn infer_fix_type(satellites: u32) -> GpsFixType {
    if satellites >= MIN_SATS_FOR_3D_FIX {
        GpsFixType::GPS_FIX_TYPE_3D_FIX
    } else {
        GpsFixType::GPS_FIX_TYPE_NO_FIX
    }
}

/// HEARTBEAT: announces vehicle identity
pub fn heartbeat(uav: &UavConfig) -> MavMessage {
    MavMessage::HEARTBEAT(HEARTBEAT_DATA {
        custom_mode: uav.custom_mode,
        mavtype: uav.vehicle_type.into(),
        autopilot: uav.autopilot.into(),
        base_mode: MavModeFlag::from_bits_truncate(uav.base_mode),
        system_status: uav.system_state.into(),
        mavlink_version: MAVLINK_VERSION,
    })
}

/// SYS_STATUS: battery voltage, current and remaining capacity
pub fn sys_status(snapshot: &SensorSnapshot) -> MavMessage {
    let sensors = MavSysStatusSensor::from_bits_truncate(SENSORS_ALL_PRESENT);

    MavMessage::SYS_STATUS(SYS_STATUS_DATA {
        onboard_control_sensors_present: sensors,
        onboard_control_sensors_enabled: sensors,
        onboard_control_sensors_health: sensors,
        load: SYSTEM_LOAD,
        voltage_battery: (snapshot.voltage * 1000.0).round() as u16,
        current_battery: (snapshot.current * 10.0).round() as i16,
        battery_remaining: snapshot.fuel.round() as i8,
        ..Default::default()
    })
}

/// GPS_RAW_INT followed by GLOBAL_POSITION_INT
///
/// The altitude reading is used for both the MSL and the relative altitude of
/// GLOBAL_POSITION_INT since CRSF carries a single altitude.
pub fn gps(
    defaults: &TelemetryDefaults,
    snapshot: &SensorSnapshot,
    uptime_ms: u32,
) -> GpsFrames {
    let raw = MavMessage::GPS_RAW_INT(GPS_RAW_INT_DATA {
        time_usec: uptime_ms as u64 * 1000,
        fix_type: infer_fix_type(snapshot.satellites),
        lat: scale_degrees(snapshot.latitude),
        lon: scale_degrees(snapshot.longitude),
        alt: meters_to_mm(snapshot.altitude),
        eph: (defaults.gps_hdop as f64 * 100.0).round() as u16,
        epv: UNKNOWN_U16,
        vel: (snapshot.ground_speed / 3.6).round() as u16,
        cog: UNKNOWN_U16,
        satellites_visible: snapshot.satellites.min(u8::MAX as u32) as u8,
        ..Default::default()
    });

    let msl_altitude = snapshot.altitude;
    let global = global_position(snapshot, msl_altitude, uptime_ms);

    GpsFrames { raw, global }
}

fn global_position(snapshot: &SensorSnapshot, msl_altitude: f64, uptime_ms: u32) -> MavMessage {
    MavMessage::GLOBAL_POSITION_INT(GLOBAL_POSITION_INT_DATA {
        time_boot_ms: uptime_ms,
        lat: scale_degrees(snapshot.latitude),
        lon: scale_degrees(snapshot.longitude),
        alt: meters_to_mm(msl_altitude),
        relative_alt: meters_to_mm(snapshot.altitude),
        // Velocity is not tracked
        vx: 0,
        vy: 0,
        vz: 0,
        hdg: snapshot.heading.round() as u16,
    })
}

/// VFR_HUD: speeds, heading, throttle, altitude and climb rate
///
/// Ground speed is reported as received from CRSF (km/h).
pub fn hud(defaults: &TelemetryDefaults, snapshot: &SensorSnapshot) -> MavMessage {
    let climb = if defaults.use_vario_climb {
        snapshot.vertical_speed as f32
    } else {
        defaults.climb_rate
    };

    MavMessage::VFR_HUD(VFR_HUD_DATA {
        airspeed: defaults.airspeed,
        groundspeed: snapshot.ground_speed as f32,
        alt: (snapshot.altitude * 1000.0) as f32,
        climb,
        heading: snapshot.heading.round() as i16,
        throttle: defaults.throttle.round() as u16,
    })
}

/// ATTITUDE: roll, pitch and yaw in radians
pub fn attitude(snapshot: &SensorSnapshot, uptime_ms: u32) -> MavMessage {
    MavMessage::ATTITUDE(ATTITUDE_DATA {
        time_boot_ms: uptime_ms,
        roll: (snapshot.roll / DEGREES_PER_RADIAN) as f32,
        pitch: (snapshot.pitch / DEGREES_PER_RADIAN) as f32,
        yaw: (snapshot.yaw / DEGREES_PER_RADIAN) as f32,
        // Angular rates are not tracked
        rollspeed: 0.0,
        pitchspeed: 0.0,
        yawspeed: 0.0,
    })
}

fn scale_degrees(degrees: f64) -> i32 {
    (degrees * 10_000_000.0).round() as i32
}

fn meters_to_mm(meters: f64) -> i32 {
    (meters * 1000.0).round() as i32
}

impl From<VehicleType> for MavType {
    fn from(value: VehicleType) -> Self {
        match value {
            VehicleType::Generic => MavType::MAV_TYPE_GENERIC,
            VehicleType::FixedWing => MavType::MAV_TYPE_FIXED_WING,
            VehicleType::Quadrotor => MavType::MAV_TYPE_QUADROTOR,
            VehicleType::Helicopter => MavType::MAV_TYPE_HELICOPTER,
            VehicleType::GroundRover => MavType::MAV_TYPE_GROUND_ROVER,
        }
    }
}

impl From<AutopilotType> for MavAutopilot {
    fn from(value: AutopilotType) -> Self {
        match value {
            AutopilotType::Generic => MavAutopilot::MAV_AUTOPILOT_GENERIC,
            AutopilotType::Ardupilotmega => MavAutopilot::MAV_AUTOPILOT_ARDUPILOTMEGA,
            AutopilotType::Px4 => MavAutopilot::MAV_AUTOPILOT_PX4,
            AutopilotType::Invalid => MavAutopilot::MAV_AUTOPILOT_INVALID,
        }
    }
}

impl From<SystemState> for MavState {
    fn from(value: SystemState) -> Self {
        match value {
            SystemState::Uninit => MavState::MAV_STATE_UNINIT,
            SystemState::Boot => MavState::MAV_STATE_BOOT,
            SystemState::Calibrating => MavState::MAV_STATE_CALIBRATING,
            SystemState::Standby => MavState::MAV_STATE_STANDBY,
            SystemState::Active => MavState::MAV_STATE_ACTIVE,
            SystemState::Critical => MavState::MAV_STATE_CRITICAL,
            SystemState::Emergency => MavState::MAV_STATE_EMERGENCY,
            SystemState::Poweroff => MavState::MAV_STATE_POWEROFF,
        }
    }
}
