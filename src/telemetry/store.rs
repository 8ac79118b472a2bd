//! # Telemetry Store
//!
//! Single-writer/single-reader store of the latest sensor values.
//!
//! Every field is an independent atomic. The CRSF receiver updates fields as
//! frames arrive and the scheduler reads them without ever blocking the
//! writer. A [`SensorSnapshot`] is only consistent field by field: a read that
//! races with an update may return a value set spanning two different CRSF
//! frames (for example a new latitude next to the previous longitude).

use std::sync::atomic::{AtomicU32, AtomicU64, AtomicU8, Ordering};
use std::sync::Mutex;

use crate::crsf::protocol::{Attitude, BatterySensor, GpsData, LinkStatistics, Vario};

/// `f64` stored as its bit pattern
#[derive(Debug, Default)]
struct AtomicF64(AtomicU64);

impl AtomicF64 {
    fn new(value: f64) -> Self {
        Self(AtomicU64::new(value.to_bits()))
    }

    fn load(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Relaxed))
    }

    fn store(&self, value: f64) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }
}

/// Link quality values forwarded from CRSF link statistics
///
/// Not encoded into any MAVLink frame yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkQuality {
    pub rssi_1: u8,
    pub rssi_2: u8,
    pub uplink_quality: u8,
    pub uplink_snr: i8,
    pub active_antenna: u8,
    pub rf_mode: u8,
    pub tx_power: u8,
    pub downlink_rssi: u8,
    pub downlink_quality: u8,
    pub downlink_snr: i8,
}

/// Sensor values read by one scheduler tick
#[derive(Debug, Clone, PartialEq)]
pub struct SensorSnapshot {
    /// Roll in degrees
    pub roll: f64,
    /// Pitch in degrees
    pub pitch: f64,
    /// Yaw in degrees
    pub yaw: f64,

    /// Latitude in degrees
    pub latitude: f64,
    /// Longitude in degrees
    pub longitude: f64,
    /// Altitude in meters
    pub altitude: f64,
    /// Heading in degrees
    pub heading: f64,
    /// Ground speed in km/h
    pub ground_speed: f64,
    /// Vertical speed in m/s
    pub vertical_speed: f64,
    pub satellites: u32,

    /// Battery voltage in volts
    pub voltage: f64,
    /// Battery current in amperes
    pub current: f64,
    /// Remaining battery in percent
    pub fuel: f64,
    /// Capacity used in mAh
    pub capacity_used: u32,

    pub link: LinkQuality,
    pub flight_mode: String,

    /// Number of CRSF frames applied to the store so far
    pub version: u64,
}

impl Default for SensorSnapshot {
    fn default() -> Self {
        Self {
            roll: 0.0,
            pitch: 0.0,
            yaw: 0.0,
            latitude: DEFAULT_LATITUDE,
            longitude: DEFAULT_LONGITUDE,
            altitude: 0.0,
            heading: 0.0,
            ground_speed: 0.0,
            vertical_speed: 0.0,
            satellites: 0,
            voltage: 0.0,
            current: 0.0,
            fuel: 0.0,
            capacity_used: 0,
            link: LinkQuality::default(),
            flight_mode: String::new(),
            version: 0,
        }
    }
}

/// Position reported before the first GPS frame arrives
pub const DEFAULT_LATITUDE: f64 = 47.379945;
pub const DEFAULT_LONGITUDE: f64 = 8.539970;

/// Lock-free store of the latest CRSF telemetry
#[derive(Debug)]
pub struct TelemetryStore {
    roll: AtomicF64,
    pitch: AtomicF64,
    yaw: AtomicF64,

    latitude: AtomicF64,
    longitude: AtomicF64,
    altitude: AtomicF64,
    heading: AtomicF64,
    ground_speed: AtomicF64,
    vertical_speed: AtomicF64,
    satellites: AtomicU32,

    voltage: AtomicF64,
    current: AtomicF64,
    fuel: AtomicF64,
    capacity_used: AtomicU32,

    rssi_1: AtomicU8,
    rssi_2: AtomicU8,
    uplink_quality: AtomicU8,
    uplink_snr: AtomicU8,
    active_antenna: AtomicU8,
    rf_mode: AtomicU8,
    tx_power: AtomicU8,
    downlink_rssi: AtomicU8,
    downlink_quality: AtomicU8,
    downlink_snr: AtomicU8,

    // Text is rare (mode changes) and not part of any encoded frame
    flight_mode: Mutex<String>,

    version: AtomicU64,
}

impl Default for TelemetryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetryStore {
    /// Create a store holding power-on defaults
    pub fn new() -> Self {
        Self::from_snapshot(&SensorSnapshot::default())
    }

    /// Create a store pre-loaded with `snapshot`
    pub fn from_snapshot(snapshot: &SensorSnapshot) -> Self {
        Self {
            roll: AtomicF64::new(snapshot.roll),
            pitch: AtomicF64::new(snapshot.pitch),
            yaw: AtomicF64::new(snapshot.yaw),
            latitude: AtomicF64::new(snapshot.latitude),
            longitude: AtomicF64::new(snapshot.longitude),
            altitude: AtomicF64::new(snapshot.altitude),
            heading: AtomicF64::new(snapshot.heading),
            ground_speed: AtomicF64::new(snapshot.ground_speed),
            vertical_speed: AtomicF64::new(snapshot.vertical_speed),
            satellites: AtomicU32::new(snapshot.satellites),
            voltage: AtomicF64::new(snapshot.voltage),
            current: AtomicF64::new(snapshot.current),
            fuel: AtomicF64::new(snapshot.fuel),
            capacity_used: AtomicU32::new(snapshot.capacity_used),
            rssi_1: AtomicU8::new(snapshot.link.rssi_1),
            rssi_2: AtomicU8::new(snapshot.link.rssi_2),
            uplink_quality: AtomicU8::new(snapshot.link.uplink_quality),
            uplink_snr: AtomicU8::new(snapshot.link.uplink_snr as u8),
            active_antenna: AtomicU8::new(snapshot.link.active_antenna),
            rf_mode: AtomicU8::new(snapshot.link.rf_mode),
            tx_power: AtomicU8::new(snapshot.link.tx_power),
            downlink_rssi: AtomicU8::new(snapshot.link.downlink_rssi),
            downlink_quality: AtomicU8::new(snapshot.link.downlink_quality),
            downlink_snr: AtomicU8::new(snapshot.link.downlink_snr as u8),
            flight_mode: Mutex::new(snapshot.flight_mode.clone()),
            version: AtomicU64::new(snapshot.version),
        }
    }

    /// Read every field once
    ///
    /// Fields are loaded one after another with no lock, so the result may mix
    /// values from before and after a concurrent update.
    pub fn snapshot(&self) -> SensorSnapshot {
        let flight_mode = self
            .flight_mode
            .lock()
            .map(|mode| mode.clone())
            .unwrap_or_default();

        SensorSnapshot {
            roll: self.roll.load(),
            pitch: self.pitch.load(),
            yaw: self.yaw.load(),
            latitude: self.latitude.load(),
            longitude: self.longitude.load(),
            altitude: self.altitude.load(),
            heading: self.heading.load(),
            ground_speed: self.ground_speed.load(),
            vertical_speed: self.vertical_speed.load(),
            satellites: self.satellites.load(Ordering::Relaxed),
            voltage: self.voltage.load(),
            current: self.current.load(),
            fuel: self.fuel.load(),
            capacity_used: self.capacity_used.load(Ordering::Relaxed),
            link: LinkQuality {
                rssi_1: self.rssi_1.load(Ordering::Relaxed),
                rssi_2: self.rssi_2.load(Ordering::Relaxed),
                uplink_quality: self.uplink_quality.load(Ordering::Relaxed),
                uplink_snr: self.uplink_snr.load(Ordering::Relaxed) as i8,
                active_antenna: self.active_antenna.load(Ordering::Relaxed),
                rf_mode: self.rf_mode.load(Ordering::Relaxed),
                tx_power: self.tx_power.load(Ordering::Relaxed),
                downlink_rssi: self.downlink_rssi.load(Ordering::Relaxed),
                downlink_quality: self.downlink_quality.load(Ordering::Relaxed),
                downlink_snr: self.downlink_snr.load(Ordering::Relaxed) as i8,
            },
            flight_mode,
            version: self.version.load(Ordering::Relaxed),
        }
    }

    /// Number of CRSF frames applied so far
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Relaxed)
    }

    pub fn update_gps(&self, gps: &GpsData) {
        self.latitude.store(gps.latitude);
        self.longitude.store(gps.longitude);
        self.ground_speed.store(gps.ground_speed as f64);
        self.heading.store(gps.heading as f64);
        self.altitude.store(gps.altitude as f64);
        self.satellites.store(gps.satellites as u32, Ordering::Relaxed);
        self.bump();
    }

    pub fn update_battery(&self, battery: &BatterySensor) {
        self.voltage.store(battery.voltage as f64);
        self.current.store(battery.current as f64);
        self.capacity_used.store(battery.capacity_used, Ordering::Relaxed);
        self.fuel.store(battery.remaining_percent as f64);
        self.bump();
    }

    pub fn update_attitude(&self, attitude: &Attitude) {
        self.roll.store(attitude.roll as f64);
        self.pitch.store(attitude.pitch as f64);
        self.yaw.store(attitude.yaw as f64);
        self.bump();
    }

    pub fn update_vario(&self, vario: &Vario) {
        self.vertical_speed.store(vario.vertical_speed as f64);
        self.bump();
    }

    pub fn update_link_statistics(&self, stats: &LinkStatistics) {
        self.rssi_1.store(stats.uplink_rssi_1, Ordering::Relaxed);
        self.rssi_2.store(stats.uplink_rssi_2, Ordering::Relaxed);
        self.uplink_quality.store(stats.uplink_lq, Ordering::Relaxed);
        self.uplink_snr.store(stats.uplink_snr as u8, Ordering::Relaxed);
        self.active_antenna.store(stats.active_antenna, Ordering::Relaxed);
        self.rf_mode.store(stats.rf_mode, Ordering::Relaxed);
        self.tx_power.store(stats.uplink_tx_power, Ordering::Relaxed);
        self.downlink_rssi.store(stats.downlink_rssi, Ordering::Relaxed);
        self.downlink_quality.store(stats.downlink_lq, Ordering::Relaxed);
        self.downlink_snr.store(stats.downlink_snr as u8, Ordering::Relaxed);
        self.bump();
    }

    pub fn update_flight_mode(&self, mode: &str) {
        if let Ok(mut current) = self.flight_mode.lock() {
            current.clear();
            current.push_str(mode);
        }
        self.bump();
    }

    fn bump(&self) {
        self.version.fetch_add(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_store_has_power_on_defaults() {
        let store = TelemetryStore::new();
        let snapshot = store.snapshot();

        assert_eq!(snapshot, SensorSnapshot::default());
        assert_eq!(snapshot.latitude, DEFAULT_LATITUDE);
        assert_eq!(snapshot.longitude, DEFAULT_LONGITUDE);
        assert_eq!(snapshot.satellites, 0);
        assert_eq!(store.version(), 0);
    }

    #[test]
    fn test_from_snapshot_round_trips_every_field() {
        let snapshot = SensorSnapshot {
            roll: -12.5,
            pitch: 3.25,
            yaw: 270.0,
            latitude: -33.8688,
            longitude: 151.2093,
            altitude: -4.0,
            heading: 361.0,
            ground_speed: 72.0,
            vertical_speed: -1.5,
            satellites: 14,
            voltage: 16.8,
            current: 22.4,
            fuel: 64.0,
            capacity_used: 850,
            link: LinkQuality {
                rssi_1: 60,
                rssi_2: 62,
                uplink_quality: 100,
                uplink_snr: -7,
                active_antenna: 1,
                rf_mode: 4,
                tx_power: 3,
                downlink_rssi: 55,
                downlink_quality: 98,
                downlink_snr: -3,
            },
            flight_mode: "ACRO".to_string(),
            version: 9,
        };

        let store = TelemetryStore::from_snapshot(&snapshot);
        assert_eq!(store.snapshot(), snapshot);
    }

    #[test]
    fn test_update_gps() {
        let store = TelemetryStore::new();
        store.update_gps(&GpsData {
            latitude: 37.7749,
            longitude: -122.4194,
            ground_speed: 25.5,
            heading: 90.0,
            altitude: 100,
            satellites: 12,
        });

        let snapshot = store.snapshot();
        assert_eq!(snapshot.latitude, 37.7749);
        assert_eq!(snapshot.longitude, -122.4194);
        assert_eq!(snapshot.ground_speed, 25.5);
        assert_eq!(snapshot.heading, 90.0);
        assert_eq!(snapshot.altitude, 100.0);
        assert_eq!(snapshot.satellites, 12);
        assert_eq!(snapshot.version, 1);
    }

    #[test]
    fn test_update_battery() {
        let store = TelemetryStore::new();
        store.update_battery(&BatterySensor {
            voltage: 12.5,
            current: 5.0,
            capacity_used: 1000,
            remaining_percent: 80,
        });

        let snapshot = store.snapshot();
        assert_eq!(snapshot.voltage, 12.5);
        assert_eq!(snapshot.current, 5.0);
        assert_eq!(snapshot.capacity_used, 1000);
        assert_eq!(snapshot.fuel, 80.0);
    }

    #[test]
    fn test_update_attitude_vario_and_mode() {
        let store = TelemetryStore::new();
        store.update_attitude(&Attitude { roll: 10.0, pitch: -5.0, yaw: 180.0 });
        store.update_vario(&Vario { vertical_speed: 2.5 });
        store.update_flight_mode("ANGL");

        let snapshot = store.snapshot();
        assert_eq!(snapshot.roll, 10.0);
        assert_eq!(snapshot.pitch, -5.0);
        assert_eq!(snapshot.yaw, 180.0);
        assert_eq!(snapshot.vertical_speed, 2.5);
        assert_eq!(snapshot.flight_mode, "ANGL");
        assert_eq!(snapshot.version, 3);
    }

    #[test]
    fn test_update_link_statistics_keeps_signed_snr() {
        let store = TelemetryStore::new();
        store.update_link_statistics(&LinkStatistics {
            uplink_rssi_1: 70,
            uplink_rssi_2: 72,
            uplink_lq: 99,
            uplink_snr: -10,
            active_antenna: 1,
            rf_mode: 2,
            uplink_tx_power: 4,
            downlink_rssi: 80,
            downlink_lq: 97,
            downlink_snr: -2,
        });

        let link = store.snapshot().link;
        assert_eq!(link.rssi_1, 70);
        assert_eq!(link.rssi_2, 72);
        assert_eq!(link.uplink_quality, 99);
        assert_eq!(link.uplink_snr, -10);
        assert_eq!(link.downlink_snr, -2);
        assert_eq!(link.tx_power, 4);
    }

    #[test]
    fn test_concurrent_writer_does_not_block_reader() {
        use std::sync::Arc;
        use std::thread;

        let store = Arc::new(TelemetryStore::new());
        let writer_store = Arc::clone(&store);

        let writer = thread::spawn(move || {
            for i in 0..1000u32 {
                writer_store.update_gps(&GpsData {
                    latitude: i as f64,
                    longitude: i as f64,
                    ground_speed: 0.0,
                    heading: 0.0,
                    altitude: 0,
                    satellites: (i % 20) as u8,
                });
            }
        });

        for _ in 0..1000 {
            let snapshot = store.snapshot();
            assert!(snapshot.satellites < 20);
        }

        writer.join().unwrap();
        assert_eq!(store.version(), 1000);
        assert_eq!(store.snapshot().latitude, 999.0);
    }
}
