//! # Host Collaborators
//!
//! Concrete collaborators for running the logger as a standalone process.
//!
//! - [`LatestSnapshot`]: current sample plus the "snapshot available" feed
//! - [`DirectoryStorage`]: storage checks against the log directory
//! - [`StaticPermissions`]: fixed permission answers
//! - [`TracingNotifier`]: user messages as tracing warnings
//! - [`ReplayLocationService`]: location provider fed with recorded fixes

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

use crate::collaborators::{
    LocationService, PermissionChecker, SensorSnapshotProvider, SnapshotFeed,
    StorageAvailability, UpdateRequest, UserNotifier,
};
use crate::location::slot::LocationListener;
use crate::session::worker::SnapshotNotifier;
use crate::telemetry::types::{LocationFix, LocationProvider, TelemetrySample};

/// Mean Earth radius used for displacement filtering
const EARTH_RADIUS_M: f64 = 6_371_000.0;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Default)]
struct SnapshotState {
    sample: TelemetrySample,
    notifier: Option<SnapshotNotifier>,
}

/// Current telemetry sample and its "snapshot available" feed
#[derive(Clone, Default)]
pub struct LatestSnapshot {
    state: Arc<Mutex<SnapshotState>>,
}

impl LatestSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current sample and signal the registered subscriber.
    pub fn publish(&self, sample: TelemetrySample) {
        let notifier = {
            let mut state = lock(&self.state);
            state.sample = sample;
            state.notifier.clone()
        };

        if let Some(notifier) = notifier {
            notifier.notify();
        }
    }
}

impl SensorSnapshotProvider for LatestSnapshot {
    fn latest(&self) -> TelemetrySample {
        lock(&self.state).sample
    }
}

impl SnapshotFeed for LatestSnapshot {
    fn register(&self, notifier: SnapshotNotifier) {
        lock(&self.state).notifier = Some(notifier);
    }

    fn unregister(&self) {
        lock(&self.state).notifier = None;
    }
}

/// Storage checks for a log directory.
///
/// The directory may not exist yet; its nearest existing ancestor is checked
/// instead, since the session file opener creates missing directories.
#[derive(Debug, Clone)]
pub struct DirectoryStorage {
    dir: PathBuf,
}

impl DirectoryStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn existing_ancestor(&self) -> Option<&Path> {
        self.dir.ancestors().find(|p| !p.as_os_str().is_empty() && p.exists())
    }
}

impl StorageAvailability for DirectoryStorage {
    fn is_readable(&self) -> bool {
        let dir = self.existing_ancestor().unwrap_or(Path::new("."));
        std::fs::read_dir(dir).is_ok()
    }

    fn is_writable(&self) -> bool {
        let dir = self.existing_ancestor().unwrap_or(Path::new("."));
        match std::fs::metadata(dir) {
            Ok(meta) => meta.is_dir() && !meta.permissions().readonly(),
            Err(_) => false,
        }
    }
}

/// Permission checker with fixed answers
#[derive(Debug, Clone, Copy)]
pub struct StaticPermissions {
    pub storage: bool,
    pub location: bool,
}

impl PermissionChecker for StaticPermissions {
    fn has_storage_permission(&self) -> bool {
        self.storage
    }

    fn has_location_permission(&self) -> bool {
        self.location
    }
}

/// Shows user messages as warnings in the diagnostic log
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl UserNotifier for TracingNotifier {
    fn notify(&self, message: &str) {
        warn!(target: "wheel_logger::user", "{}", message);
    }
}

struct Subscription {
    provider: LocationProvider,
    request: UpdateRequest,
    listener: LocationListener,
    last_delivered: Option<LocationFix>,
}

#[derive(Default)]
struct ReplayState {
    last_known: HashMap<LocationProvider, LocationFix>,
    subscription: Option<Subscription>,
}

/// Location service fed with recorded fixes.
///
/// Every fix becomes its provider's last known fix; fixes from the
/// subscribed provider are delivered to the listener unless they fall
/// inside the requested minimum interval or displacement.
#[derive(Clone)]
pub struct ReplayLocationService {
    gps_enabled: bool,
    network_enabled: bool,
    state: Arc<Mutex<ReplayState>>,
}

impl ReplayLocationService {
    pub fn new(gps_enabled: bool, network_enabled: bool) -> Self {
        Self {
            gps_enabled,
            network_enabled,
            state: Arc::new(Mutex::new(ReplayState::default())),
        }
    }

    /// Record a fix and deliver it to the subscriber if it qualifies.
    pub fn publish_fix(&self, fix: LocationFix) {
        let delivery = {
            let mut state = lock(&self.state);
            state.last_known.insert(fix.provider, fix);

            match state.subscription.as_mut() {
                Some(sub) if sub.provider == fix.provider => {
                    if qualifies(sub, &fix) {
                        sub.last_delivered = Some(fix);
                        Some(sub.listener.clone())
                    } else {
                        None
                    }
                }
                _ => None,
            }
        };

        match delivery {
            Some(listener) => listener.on_location_changed(fix),
            None => debug!("Fix from {} not delivered", fix.provider),
        }
    }
}

fn qualifies(sub: &Subscription, fix: &LocationFix) -> bool {
    let Some(last) = sub.last_delivered else {
        return true;
    };

    let elapsed_ms = fix.fix_time_millis.saturating_sub(last.fix_time_millis);
    if elapsed_ms < sub.request.min_interval_ms as i64 {
        return false;
    }

    distance_m(&last, fix) >= sub.request.min_distance_m
}

/// Great-circle distance between two fixes (haversine)
fn distance_m(a: &LocationFix, b: &LocationFix) -> f64 {
    let (lat1, lat2) = (a.latitude.to_radians(), b.latitude.to_radians());
    let d_lat = lat2 - lat1;
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().asin()
}

impl LocationService for ReplayLocationService {
    fn is_provider_enabled(&self, provider: LocationProvider) -> bool {
        match provider {
            LocationProvider::Gps => self.gps_enabled,
            LocationProvider::Network => self.network_enabled,
        }
    }

    fn last_known_fix(&self, provider: LocationProvider) -> Option<LocationFix> {
        lock(&self.state).last_known.get(&provider).copied()
    }

    fn request_updates(
        &self,
        provider: LocationProvider,
        request: UpdateRequest,
        listener: LocationListener,
    ) {
        lock(&self.state).subscription = Some(Subscription {
            provider,
            request,
            listener,
            last_delivered: None,
        });
    }

    fn remove_updates(&self) {
        lock(&self.state).subscription = None;
    }
}
