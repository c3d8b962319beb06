//! Shared "current best fix" slot.
//!
//! Written by location callbacks, read by the recorder. Every write replaces
//! the whole fix (last writer wins); nothing ever clears it within a session.

use std::sync::{Arc, RwLock};
use tracing::debug;

use crate::telemetry::types::LocationFix;

/// Latest known location fix, shared between threads
#[derive(Debug, Clone, Default)]
pub struct BestFix {
    inner: Arc<RwLock<Option<LocationFix>>>,
}

impl BestFix {
    pub fn new() -> Self {
        Self::default()
    }

    /// Slot pre-filled with the fix resolved at session start
    pub fn with_initial(fix: Option<LocationFix>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(fix)),
        }
    }

    /// Replace the current fix.
    pub fn replace(&self, fix: LocationFix) {
        // A poisoned lock still holds a whole fix, so keep using it
        let mut slot = self.inner.write().unwrap_or_else(|e| e.into_inner());
        *slot = Some(fix);
    }

    /// Copy of the current fix, if any.
    pub fn current(&self) -> Option<LocationFix> {
        *self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    /// Listener handle that writes into this slot
    pub fn listener(&self) -> LocationListener {
        LocationListener { slot: self.clone() }
    }
}

/// Callback handle registered with a [`crate::collaborators::LocationService`]
#[derive(Debug, Clone)]
pub struct LocationListener {
    slot: BestFix,
}

impl LocationListener {
    /// Called by the location service whenever a new fix is available.
    pub fn on_location_changed(&self, fix: LocationFix) {
        debug!(
            "Location update from {}: {:.5},{:.5} @ {}",
            fix.provider, fix.latitude, fix.longitude, fix.fix_time_millis
        );
        self.slot.replace(fix);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::types::LocationProvider;
    use std::thread;

    fn fix(lat: f64, time: i64, provider: LocationProvider) -> LocationFix {
        LocationFix {
            latitude: lat,
            longitude: lat / 2.0,
            fix_time_millis: time,
            provider,
        }
    }

    #[test]
    fn test_slot_starts_empty() {
        assert_eq!(BestFix::new().current(), None);
    }

    #[test]
    fn test_last_writer_wins_without_staleness_check() {
        let slot = BestFix::new();
        slot.replace(fix(1.0, 500, LocationProvider::Gps));
        // Older timestamp still replaces the newer one
        slot.replace(fix(2.0, 100, LocationProvider::Network));

        let current = slot.current().unwrap();
        assert_eq!(current.latitude, 2.0);
        assert_eq!(current.fix_time_millis, 100);
        assert_eq!(current.provider, LocationProvider::Network);
    }

    #[test]
    fn test_listener_writes_into_shared_slot() {
        let slot = BestFix::with_initial(Some(fix(1.0, 1, LocationProvider::Network)));
        let listener = slot.listener();

        listener.on_location_changed(fix(3.0, 2, LocationProvider::Gps));
        assert_eq!(slot.current().unwrap().latitude, 3.0);
    }

    #[test]
    fn test_concurrent_updates_never_tear() {
        let slot = BestFix::new();
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let listener = slot.listener();
                thread::spawn(move || {
                    for i in 0..250 {
                        let value = (t * 1000 + i) as f64;
                        listener.on_location_changed(LocationFix {
                            latitude: value,
                            longitude: value,
                            fix_time_millis: value as i64,
                            provider: LocationProvider::Gps,
                        });
                    }
                })
            })
            .collect();

        for _ in 0..1000 {
            if let Some(fix) = slot.current() {
                assert_eq!(fix.latitude, fix.longitude);
                assert_eq!(fix.latitude as i64, fix.fix_time_millis);
            }
        }

        for handle in handles {
            handle.join().unwrap();
        }
        assert!(slot.current().is_some());
    }
}
