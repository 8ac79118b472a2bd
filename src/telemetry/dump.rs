//! Human-readable sensor dump for the diagnostic log

use super::SensorSnapshot;

/// One `LABEL: value` line per reported sensor
pub fn dump_lines(snapshot: &SensorSnapshot) -> Vec<String> {
    vec![
        format!("VOLTAGE: {:.2}", snapshot.voltage),
        format!("SPEED: {:.2}", snapshot.ground_speed / 3.6),
        format!("ALT: {:.2}", snapshot.altitude),
        format!("HEADING: {:.2}", snapshot.heading),
        format!("SATS: {}", snapshot.satellites),
        format!("LAT: {:.7}", snapshot.latitude),
        format!("LON: {:.7}", snapshot.longitude),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dump_lines() {
        let snapshot = SensorSnapshot {
            voltage: 12.6,
            ground_speed: 36.0,
            altitude: 100.0,
            heading: 90.0,
            satellites: 8,
            latitude: 47.379945,
            longitude: 8.53997,
            ..Default::default()
        };

        assert_eq!(
            dump_lines(&snapshot),
            vec![
                "VOLTAGE: 12.60",
                "SPEED: 10.00",
                "ALT: 100.00",
                "HEADING: 90.00",
                "SATS: 8",
                "LAT: 47.3799450",
                "LON: 8.5399700",
            ]
        );
    }
}
