//! # Wheel Logger Library
//!
//! Session-scoped CSV telemetry logging for personal electric vehicles.
//!
//! While a session runs, every "snapshot available" signal appends one
//! time-stamped row (speed, voltage, current, power, battery level, distance,
//! temperature and, optionally, position) to a file named after the session
//! start time.

pub mod collaborators;
pub mod config;
pub mod error;
pub mod host;
pub mod location;
pub mod session;
pub mod telemetry;

#[cfg(test)]
mod test_support;
