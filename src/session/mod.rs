//! # Session Module
//!
//! Session lifecycle for the telemetry logger.
//!
//! This module handles:
//! - Start preflight checks and location downgrades
//! - Opening the session log and writing its header
//! - Subscribing to snapshot and location events
//! - Serializing requests onto a single worker task
//! - Publishing start/stop transitions

pub mod controller;
pub mod status;
pub mod worker;
