//! # Location Module
//!
//! Location source selection and the shared latest-fix slot.
//!
//! This module handles:
//! - Choosing GPS or Network (or neither) for a session
//! - Resolving the initial fix from last known positions
//! - Holding the most recent fix for the recorder

pub mod arbiter;
pub mod slot;

#[cfg(test)]
pub mod mocks {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use crate::collaborators::{LocationService, UpdateRequest};
    use crate::location::slot::LocationListener;
    use crate::telemetry::types::{LocationFix, LocationProvider};

    /// Mock location service; clones share state
    #[derive(Clone, Default)]
    pub struct MockLocationService {
        pub enabled: Arc<Mutex<HashMap<LocationProvider, bool>>>,
        pub last_known: Arc<Mutex<HashMap<LocationProvider, LocationFix>>>,
        pub requests: Arc<Mutex<Vec<(LocationProvider, UpdateRequest)>>>,
        pub listener: Arc<Mutex<Option<LocationListener>>>,
        pub removals: Arc<Mutex<usize>>,
    }

    impl MockLocationService {
        pub fn new(gps_enabled: bool, network_enabled: bool) -> Self {
            let service = Self::default();
            {
                let mut enabled = service.enabled.lock().unwrap();
                enabled.insert(LocationProvider::Gps, gps_enabled);
                enabled.insert(LocationProvider::Network, network_enabled);
            }
            service
        }

        pub fn set_last_known(&self, provider: LocationProvider, fix: Option<LocationFix>) {
            let mut last_known = self.last_known.lock().unwrap();
            match fix {
                Some(fix) => last_known.insert(provider, fix),
                None => last_known.remove(&provider),
            };
        }

        /// Deliver a fix through the registered listener, as the OS would
        pub fn push_fix(&self, fix: LocationFix) {
            if let Some(listener) = self.listener.lock().unwrap().as_ref() {
                listener.on_location_changed(fix);
            }
        }

        pub fn requests(&self) -> Vec<(LocationProvider, UpdateRequest)> {
            self.requests.lock().unwrap().clone()
        }

        pub fn removal_count(&self) -> usize {
            *self.removals.lock().unwrap()
        }

        pub fn is_subscribed(&self) -> bool {
            self.listener.lock().unwrap().is_some()
        }
    }

    impl LocationService for MockLocationService {
        fn is_provider_enabled(&self, provider: LocationProvider) -> bool {
            self.enabled.lock().unwrap().get(&provider).copied().unwrap_or(false)
        }

        fn last_known_fix(&self, provider: LocationProvider) -> Option<LocationFix> {
            self.last_known.lock().unwrap().get(&provider).copied()
        }

        fn request_updates(
            &self,
            provider: LocationProvider,
            request: UpdateRequest,
            listener: LocationListener,
        ) {
            self.requests.lock().unwrap().push((provider, request));
            *self.listener.lock().unwrap() = Some(listener);
        }

        fn remove_updates(&self) {
            *self.removals.lock().unwrap() += 1;
            *self.listener.lock().unwrap() = None;
        }
    }
}
