//! # Telemetry Module
//!
//! Handles telemetry logging to session-scoped CSV files.
//!
//! This module handles:
//! - Telemetry snapshot and location fix types
//! - Formatting snapshots as CSV rows
//! - Appending rows to the session log file

pub mod format;
pub mod recorder;
pub mod sink;
pub mod types;
