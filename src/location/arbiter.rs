//! # Location Provider Arbitration
//!
//! Decides whether a session logs location, and from which provider.
//!
//! ## Decision Table
//!
//! Evaluated in order, first match wins:
//!
//! | # | Condition                         | Logging  | Provider | Warning                          |
//! |---|-----------------------------------|----------|----------|----------------------------------|
//! | 1 | neither provider enabled          | disabled | none     | all location providers disabled  |
//! | 2 | prefer GPS, GPS disabled          | enabled  | Network  | GPS disabled, falling back       |
//! | 3 | prefer Network, Network disabled  | disabled | none     | network disabled                 |
//! | 4 | otherwise                         | enabled  | preferred| none                             |
//!
//! A GPS preference degrades to Network; a Network preference never
//! escalates to GPS.
//!
//! ## Initial Fix
//!
//! The last known fixes of both providers are compared by timestamp. GPS wins
//! only when strictly newer; every other case (ties, missing GPS fix) yields
//! the Network fix, which may itself be absent.

use tracing::{info, warn};

use crate::collaborators::{LocationService, UpdateRequest};
use crate::telemetry::types::{LocationFix, LocationProvider};

/// Warning for rule 1
pub const WARN_ALL_PROVIDERS_DISABLED: &str = "all location providers disabled";

/// Warning for rule 2
pub const WARN_GPS_FALLBACK: &str = "GPS disabled, falling back";

/// Warning for rule 3
pub const WARN_NETWORK_DISABLED: &str = "network disabled";

/// Default minimum interval between continuous location updates
pub const DEFAULT_MIN_UPDATE_INTERVAL_MS: u64 = 100;

/// Default minimum displacement between continuous location updates
pub const DEFAULT_MIN_DISTANCE_M: f64 = 0.0;

/// Outcome of provider arbitration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderDecision {
    pub enabled: bool,
    pub chosen_provider: Option<LocationProvider>,
    pub warning: Option<&'static str>,
}

impl ProviderDecision {
    fn disabled(warning: &'static str) -> Self {
        Self {
            enabled: false,
            chosen_provider: None,
            warning: Some(warning),
        }
    }

    fn enabled(provider: LocationProvider, warning: Option<&'static str>) -> Self {
        Self {
            enabled: true,
            chosen_provider: Some(provider),
            warning,
        }
    }
}

/// Applies the decision table to provider availability and user preference.
///
/// # Examples
///
/// ```
/// use wheel_logger::location::arbiter::decide;
/// use wheel_logger::telemetry::types::LocationProvider;
///
/// // GPS preferred but off: fall back to Network
/// let decision = decide(false, true, true);
/// assert!(decision.enabled);
/// assert_eq!(decision.chosen_provider, Some(LocationProvider::Network));
/// assert!(decision.warning.is_some());
/// ```
#[must_use]
pub fn decide(gps_enabled: bool, network_enabled: bool, prefer_gps: bool) -> ProviderDecision {
    if !gps_enabled && !network_enabled {
        ProviderDecision::disabled(WARN_ALL_PROVIDERS_DISABLED)
    } else if prefer_gps && !gps_enabled {
        ProviderDecision::enabled(LocationProvider::Network, Some(WARN_GPS_FALLBACK))
    } else if !prefer_gps && !network_enabled {
        ProviderDecision::disabled(WARN_NETWORK_DISABLED)
    } else if prefer_gps {
        ProviderDecision::enabled(LocationProvider::Gps, None)
    } else {
        ProviderDecision::enabled(LocationProvider::Network, None)
    }
}

/// Picks the initial fix from the providers' last known fixes.
///
/// GPS is returned only when its timestamp is strictly greater than the
/// Network one; a missing fix counts as time zero.
#[must_use]
pub fn resolve_initial_fix(
    gps: Option<LocationFix>,
    network: Option<LocationFix>,
) -> Option<LocationFix> {
    let gps_time = gps.map_or(0, |fix| fix.fix_time_millis);
    let network_time = network.map_or(0, |fix| fix.fix_time_millis);

    if gps_time > network_time {
        gps
    } else {
        network
    }
}

/// Arbitrates between the location service's providers for one session
pub struct LocationProviderArbiter<'a> {
    service: &'a dyn LocationService,
    request: UpdateRequest,
}

impl<'a> LocationProviderArbiter<'a> {
    pub fn new(service: &'a dyn LocationService, request: UpdateRequest) -> Self {
        Self { service, request }
    }

    /// Reads provider availability from the service and applies [`decide`].
    pub fn arbitrate(&self, prefer_gps: bool) -> ProviderDecision {
        let gps_enabled = self.service.is_provider_enabled(LocationProvider::Gps);
        let network_enabled = self.service.is_provider_enabled(LocationProvider::Network);
        let decision = decide(gps_enabled, network_enabled, prefer_gps);

        match (decision.chosen_provider, decision.warning) {
            (Some(provider), None) => info!("Logging location from {} provider", provider),
            (Some(provider), Some(warning)) => {
                warn!("{}; logging location from {} provider", warning, provider)
            }
            (None, Some(warning)) => warn!("{}; location logging disabled", warning),
            (None, None) => {}
        }

        decision
    }

    /// Initial fix from the service's last known fixes.
    pub fn initial_fix(&self) -> Option<LocationFix> {
        resolve_initial_fix(
            self.service.last_known_fix(LocationProvider::Gps),
            self.service.last_known_fix(LocationProvider::Network),
        )
    }

    /// Update parameters used when subscribing to the chosen provider
    pub fn update_request(&self) -> UpdateRequest {
        self.request
    }
}

impl Default for UpdateRequest {
    fn default() -> Self {
        Self {
            min_interval_ms: DEFAULT_MIN_UPDATE_INTERVAL_MS,
            min_distance_m: DEFAULT_MIN_DISTANCE_M,
        }
    }
}
