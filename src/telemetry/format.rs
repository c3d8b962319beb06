//! # Row Formatting
//!
//! Turns a [`TelemetrySample`] (and optionally a [`LocationFix`]) into one
//! comma-separated line of the session log.
//!
//! ## Row Layout
//!
//! ```text
//! date,time,[latitude,longitude,]speed,voltage,current,power,battery_level,distance,temperature
//! 2024-05-01,14:03:22.117,52.37,4.90,21.50,84.10,3.20,269.00,87,12.03,34
//! ```
//!
//! Real-valued fields are written with two decimals, rounded half away from
//! zero on the value's shortest decimal representation (so `12.345` becomes
//! `12.35`, even though the nearest `f64` is slightly below it). Fields never
//! contain commas, so nothing is quoted or escaped.

use chrono::NaiveDateTime;

use super::types::{LocationFix, TelemetrySample};

/// Header for sessions without location columns
pub const HEADER: &str = "date,time,speed,voltage,current,power,battery_level,distance,temperature";

/// Header for sessions that log location
pub const HEADER_WITH_LOCATION: &str =
    "date,time,latitude,longitude,speed,voltage,current,power,battery_level,distance,temperature";

/// Row timestamp: date and wall-clock time, millisecond precision
const ROW_TIMESTAMP_FORMAT: &str = "%Y-%m-%d,%H:%M:%S%.3f";

/// Session file name stem, derived from the session start instant
const FILE_NAME_FORMAT: &str = "%Y_%m_%d_%H_%M_%S";

/// Extension of session log files
pub const FILE_EXTENSION: &str = "csv";

/// Returns the header line for a session.
#[must_use]
pub fn header(log_location: bool) -> &'static str {
    if log_location {
        HEADER_WITH_LOCATION
    } else {
        HEADER
    }
}

/// Builds the session file name, e.g. `2024_05_01_14_03_22.csv`.
#[must_use]
pub fn session_file_name(started_at: NaiveDateTime) -> String {
    format!("{}.{}", started_at.format(FILE_NAME_FORMAT), FILE_EXTENSION)
}

/// Formats a real value with exactly two decimals.
///
/// Rounds half away from zero using the shortest decimal representation of
/// `value`, matching what a user typing the number would expect.
///
/// # Examples
///
/// ```
/// use wheel_logger::telemetry::format::fixed2;
///
/// assert_eq!(fixed2(12.345), "12.35");
/// assert_eq!(fixed2(-1.005), "-1.01");
/// assert_eq!(fixed2(3.0), "3.00");
/// ```
#[must_use]
pub fn fixed2(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    // Display for f64 never uses exponent notation and prints the shortest
    // digits that round-trip
    let repr = value.abs().to_string();
    let (int_part, frac_part) = repr.split_once('.').unwrap_or((repr.as_str(), ""));
    let frac = frac_part.as_bytes();

    let mut digits: Vec<u8> = int_part
        .bytes()
        .chain((0..2).map(|i| frac.get(i).copied().unwrap_or(b'0')))
        .map(|b| b - b'0')
        .collect();

    if frac.get(2).is_some_and(|&d| d >= b'5') {
        let mut carried = true;
        for digit in digits.iter_mut().rev() {
            if *digit == 9 {
                *digit = 0;
            } else {
                *digit += 1;
                carried = false;
                break;
            }
        }
        if carried {
            digits.insert(0, 1);
        }
    }

    let split = digits.len() - 2;
    // Sign follows the input, so small negatives print as "-0.00"
    let mut out = String::with_capacity(digits.len() + 2);
    if value < 0.0 {
        out.push('-');
    }
    out.extend(digits[..split].iter().map(|d| char::from(b'0' + d)));
    out.push('.');
    out.extend(digits[split..].iter().map(|d| char::from(b'0' + d)));
    out
}

/// Formats one data row (without the trailing newline).
///
/// When `log_location` is true the latitude/longitude columns are present;
/// an absent fix leaves both of them empty.
#[must_use]
pub fn format_row(
    timestamp: NaiveDateTime,
    sample: &TelemetrySample,
    log_location: bool,
    fix: Option<&LocationFix>,
) -> String {
    let mut fields: Vec<String> = Vec::with_capacity(10);
    fields.push(timestamp.format(ROW_TIMESTAMP_FORMAT).to_string());

    if log_location {
        match fix {
            Some(fix) => {
                fields.push(fixed2(fix.latitude));
                fields.push(fixed2(fix.longitude));
            }
            None => {
                fields.push(String::new());
                fields.push(String::new());
            }
        }
    }

    fields.push(fixed2(sample.speed));
    fields.push(fixed2(sample.voltage));
    fields.push(fixed2(sample.current));
    fields.push(fixed2(sample.power));
    fields.push(sample.battery_level.to_string());
    fields.push(fixed2(sample.distance));
    fields.push(sample.temperature.to_string());

    fields.join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::types::LocationProvider;
    use chrono::NaiveDate;

    fn timestamp() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_milli_opt(14, 3, 22, 117)
            .unwrap()
    }

    fn sample() -> TelemetrySample {
        TelemetrySample {
            speed: 12.345,
            voltage: 84.1,
            current: 3.2,
            power: 269.0,
            battery_level: 87,
            distance: 12.03,
            temperature: 34,
        }
    }

    #[test]
    fn test_fixed2_rounds_half_away_from_zero() {
        assert_eq!(fixed2(12.345), "12.35");
        assert_eq!(fixed2(0.125), "0.13");
        assert_eq!(fixed2(-0.125), "-0.13");
        assert_eq!(fixed2(2.344), "2.34");
    }

    #[test]
    fn test_fixed2_pads_short_fractions() {
        assert_eq!(fixed2(0.0), "0.00");
        assert_eq!(fixed2(7.0), "7.00");
        assert_eq!(fixed2(7.5), "7.50");
    }

    #[test]
    fn test_fixed2_carries_into_integer_part() {
        assert_eq!(fixed2(9.995), "10.00");
        assert_eq!(fixed2(99.999), "100.00");
        assert_eq!(fixed2(0.999), "1.00");
    }

    #[test]
    fn test_fixed2_negative_zero() {
        assert_eq!(fixed2(-0.0), "0.00");
    }

    #[test]
    fn test_fixed2_small_negative_keeps_sign() {
        assert_eq!(fixed2(-0.001), "-0.00");
        assert_eq!(fixed2(-0.004), "-0.00");
        assert_eq!(fixed2(-0.005), "-0.01");
    }

    #[test]
    fn test_header_columns() {
        assert_eq!(header(false).split(',').count(), 9);
        assert_eq!(header(true).split(',').count(), 11);
        assert!(!header(false).contains("latitude"));
        assert!(header(true).starts_with("date,time,latitude,longitude,"));
    }

    #[test]
    fn test_session_file_name() {
        let started = NaiveDate::from_ymd_opt(2024, 1, 9)
            .unwrap()
            .and_hms_opt(7, 5, 3)
            .unwrap();
        assert_eq!(session_file_name(started), "2024_01_09_07_05_03.csv");
    }

    #[test]
    fn test_row_without_location() {
        let row = format_row(timestamp(), &sample(), false, None);
        assert_eq!(row, "2024-05-01,14:03:22.117,12.35,84.10,3.20,269.00,87,12.03,34");
        assert_eq!(row.split(',').count(), header(false).split(',').count());
    }

    #[test]
    fn test_row_with_location_fix() {
        let fix = LocationFix {
            latitude: 52.3731,
            longitude: 4.8922,
            fix_time_millis: 1_000,
            provider: LocationProvider::Network,
        };
        let row = format_row(timestamp(), &sample(), true, Some(&fix));
        assert_eq!(
            row,
            "2024-05-01,14:03:22.117,52.37,4.89,12.35,84.10,3.20,269.00,87,12.03,34"
        );
    }

    #[test]
    fn test_row_with_absent_fix_has_empty_coordinates() {
        let row = format_row(timestamp(), &sample(), true, None);
        let fields: Vec<&str> = row.split(',').collect();

        assert_eq!(fields.len(), 11);
        assert_eq!(fields[2], "", "latitude should be empty, not zero");
        assert_eq!(fields[3], "", "longitude should be empty, not zero");
        assert_eq!(fields[4], "12.35");
        assert_eq!(fields[8], "87");
        assert_eq!(fields[10], "34");
    }

    #[test]
    fn test_row_timestamp_keeps_milliseconds() {
        let ts = NaiveDate::from_ymd_opt(2024, 12, 31)
            .unwrap()
            .and_hms_milli_opt(23, 59, 59, 5)
            .unwrap();
        let row = format_row(ts, &TelemetrySample::default(), false, None);
        assert!(row.starts_with("2024-12-31,23:59:59.005,"));
    }
}
