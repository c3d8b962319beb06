//! Shared fakes for unit tests.

use chrono::{NaiveDate, NaiveDateTime};
use std::sync::{Arc, Mutex};

use crate::collaborators::{
    Clock, PermissionChecker, SensorSnapshotProvider, SettingsStore, SnapshotFeed,
    StorageAvailability, UserNotifier,
};
use crate::session::worker::SnapshotNotifier;
use crate::telemetry::types::TelemetrySample;

/// Clock frozen at 2024-05-01 14:03:22.117
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Default for FixedClock {
    fn default() -> Self {
        Self(
            NaiveDate::from_ymd_opt(2024, 5, 1)
                .unwrap()
                .and_hms_milli_opt(14, 3, 22, 117)
                .unwrap(),
        )
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

/// Current sample that tests can swap out
#[derive(Debug, Clone, Default)]
pub struct SharedSample(Arc<Mutex<TelemetrySample>>);

impl SharedSample {
    pub fn new(sample: TelemetrySample) -> Self {
        Self(Arc::new(Mutex::new(sample)))
    }

    pub fn set(&self, sample: TelemetrySample) {
        *self.0.lock().unwrap() = sample;
    }
}

impl SensorSnapshotProvider for SharedSample {
    fn latest(&self) -> TelemetrySample {
        *self.0.lock().unwrap()
    }
}

/// Snapshot feed that counts registrations
#[derive(Clone, Default)]
pub struct MockSnapshotFeed {
    pub notifier: Arc<Mutex<Option<SnapshotNotifier>>>,
    pub registrations: Arc<Mutex<usize>>,
    pub unregistrations: Arc<Mutex<usize>>,
}

impl MockSnapshotFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_registered(&self) -> bool {
        self.notifier.lock().unwrap().is_some()
    }

    pub fn registration_count(&self) -> usize {
        *self.registrations.lock().unwrap()
    }

    pub fn unregistration_count(&self) -> usize {
        *self.unregistrations.lock().unwrap()
    }

    /// Fire "snapshot available" through the registered notifier
    pub fn fire(&self) {
        if let Some(notifier) = self.notifier.lock().unwrap().as_ref() {
            notifier.notify();
        }
    }
}

impl SnapshotFeed for MockSnapshotFeed {
    fn register(&self, notifier: SnapshotNotifier) {
        *self.registrations.lock().unwrap() += 1;
        *self.notifier.lock().unwrap() = Some(notifier);
    }

    fn unregister(&self) {
        *self.unregistrations.lock().unwrap() += 1;
        *self.notifier.lock().unwrap() = None;
    }
}

/// Settings with fixed values
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedSettings {
    pub log_location: bool,
    pub prefer_gps: bool,
}

impl SettingsStore for FixedSettings {
    fn log_location_enabled(&self) -> bool {
        self.log_location
    }

    fn prefer_gps(&self) -> bool {
        self.prefer_gps
    }
}

/// Permission answers that tests can flip mid-session
#[derive(Debug, Clone)]
pub struct SwitchablePermissions {
    pub storage: Arc<Mutex<bool>>,
    pub location: Arc<Mutex<bool>>,
}

impl SwitchablePermissions {
    pub fn new(storage: bool, location: bool) -> Self {
        Self {
            storage: Arc::new(Mutex::new(storage)),
            location: Arc::new(Mutex::new(location)),
        }
    }

    pub fn set_location(&self, granted: bool) {
        *self.location.lock().unwrap() = granted;
    }
}

impl PermissionChecker for SwitchablePermissions {
    fn has_storage_permission(&self) -> bool {
        *self.storage.lock().unwrap()
    }

    fn has_location_permission(&self) -> bool {
        *self.location.lock().unwrap()
    }
}

/// Storage that is always mounted read/write
#[derive(Debug, Clone, Copy, Default)]
pub struct MountedStorage;

impl StorageAvailability for MountedStorage {
    fn is_readable(&self) -> bool {
        true
    }

    fn is_writable(&self) -> bool {
        true
    }
}

/// Collects every user notification
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier(pub Arc<Mutex<Vec<String>>>);

impl RecordingNotifier {
    pub fn messages(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

impl UserNotifier for RecordingNotifier {
    fn notify(&self, message: &str) {
        self.0.lock().unwrap().push(message.to_string());
    }
}
