//! # External Collaborators
//!
//! The logger only consumes these; implementations live with the host
//! application (see [`crate::host`] for the ones the binary uses).

use chrono::NaiveDateTime;
#[cfg(test)]
use mockall::automock;

use crate::location::slot::LocationListener;
use crate::session::worker::SnapshotNotifier;
use crate::telemetry::types::{LocationFix, LocationProvider, TelemetrySample};

/// Exposes the single current telemetry snapshot (no history).
pub trait SensorSnapshotProvider: Send + Sync {
    fn latest(&self) -> TelemetrySample;
}

/// The "snapshot available" stream.
///
/// The controller registers a [`SnapshotNotifier`] when a session starts and
/// unregisters it when the session ends.
pub trait SnapshotFeed: Send + Sync {
    fn register(&self, notifier: SnapshotNotifier);
    fn unregister(&self);
}

/// User settings, read at every start request.
#[cfg_attr(test, automock)]
pub trait SettingsStore: Send + Sync {
    fn log_location_enabled(&self) -> bool;
    fn prefer_gps(&self) -> bool;
}

/// Results of the host's permission checks.
#[cfg_attr(test, automock)]
pub trait PermissionChecker: Send + Sync {
    fn has_storage_permission(&self) -> bool;
    fn has_location_permission(&self) -> bool;
}

/// Whether the log storage is mounted and usable.
#[cfg_attr(test, automock)]
pub trait StorageAvailability: Send + Sync {
    fn is_readable(&self) -> bool;
    fn is_writable(&self) -> bool;
}

/// Ephemeral user-visible messages.
#[cfg_attr(test, automock)]
pub trait UserNotifier: Send + Sync {
    fn notify(&self, message: &str);
}

/// Continuous update parameters passed to the location service.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UpdateRequest {
    pub min_interval_ms: u64,
    pub min_distance_m: f64,
}

/// OS/runtime location service.
///
/// Fixes delivered through the registered [`LocationListener`] may arrive on
/// any thread.
pub trait LocationService: Send + Sync {
    fn is_provider_enabled(&self, provider: LocationProvider) -> bool;
    fn last_known_fix(&self, provider: LocationProvider) -> Option<LocationFix>;
    fn request_updates(
        &self,
        provider: LocationProvider,
        request: UpdateRequest,
        listener: LocationListener,
    );
    fn remove_updates(&self);
}

/// Wall clock used for file names and row timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// Local wall-clock time
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        chrono::Local::now().naive_local()
    }
}
