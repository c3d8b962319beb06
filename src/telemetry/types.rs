//! # Telemetry Data Types
//!
//! Snapshots read from the vehicle and position fixes read from the
//! location service. Both are produced outside the logger and only read here.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single point-in-time reading of the vehicle's telemetry fields.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TelemetrySample {
    /// Speed in km/h
    pub speed: f64,
    /// Battery voltage in volts
    pub voltage: f64,
    /// Phase current in amps
    pub current: f64,
    /// Power in watts
    pub power: f64,
    /// Battery level in percent
    pub battery_level: i32,
    /// Trip distance in km
    pub distance: f64,
    /// Controller temperature in °C
    pub temperature: i32,
}

/// Source of a location fix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationProvider {
    Gps,
    Network,
}

impl fmt::Display for LocationProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocationProvider::Gps => write!(f, "gps"),
            LocationProvider::Network => write!(f, "network"),
        }
    }
}

/// A single geographic position reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationFix {
    pub latitude: f64,
    pub longitude: f64,
    /// Acquisition time in milliseconds since the Unix epoch
    pub fix_time_millis: i64,
    pub provider: LocationProvider,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_from_json() {
        let json = r#"{
            "speed": 21.5, "voltage": 84.1, "current": 3.2, "power": 269.0,
            "battery_level": 87, "distance": 12.03, "temperature": 34
        }"#;
        let sample: TelemetrySample = serde_json::from_str(json).unwrap();

        assert_eq!(sample.speed, 21.5);
        assert_eq!(sample.battery_level, 87);
        assert_eq!(sample.temperature, 34);
    }

    #[test]
    fn test_fix_provider_tag() {
        let json = r#"{"latitude": 52.1, "longitude": 4.3, "fix_time_millis": 100, "provider": "gps"}"#;
        let fix: LocationFix = serde_json::from_str(json).unwrap();
        assert_eq!(fix.provider, LocationProvider::Gps);

        let json = r#"{"latitude": 52.1, "longitude": 4.3, "fix_time_millis": 100, "provider": "network"}"#;
        let fix: LocationFix = serde_json::from_str(json).unwrap();
        assert_eq!(fix.provider, LocationProvider::Network);
    }

    #[test]
    fn test_provider_display() {
        assert_eq!(LocationProvider::Gps.to_string(), "gps");
        assert_eq!(LocationProvider::Network.to_string(), "network");
    }
}
