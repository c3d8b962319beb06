//! # Session Lifecycle
//!
//! State machine behind start/stop requests and snapshot events.
//!
//! ## States
//!
//! ```text
//! Stopped --start()--> Starting --preflight ok--> Running
//!    ^                     |                         |
//!    +----preflight fail---+                         |
//!    +--------------stop() / write failure-----------+
//! ```
//!
//! ## Start Sequence
//!
//! 1. Storage permission (fatal)
//! 2. Storage readable and writable (fatal)
//! 3. Location permission when location logging is requested (downgrade)
//! 4. Open `<log_dir>/YYYY_MM_DD_HH_MM_SS.csv` for append (fatal)
//! 5. Provider arbitration when location logging is still requested (downgrade)
//! 6. Header matching the final location setting
//! 7. Subscribe to snapshot events and, if enabled, location updates
//! 8. Publish "started"
//!
//! Every operation takes `&mut self`; the worker in
//! [`crate::session::worker`] owns the controller and feeds it one request
//! at a time.

use chrono::NaiveDateTime;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::collaborators::{
    Clock, LocationService, PermissionChecker, SensorSnapshotProvider, SettingsStore,
    SnapshotFeed, StorageAvailability, UpdateRequest, UserNotifier,
};
use crate::config::Config;
use crate::error::{LoggerError, Result};
use crate::location::arbiter::LocationProviderArbiter;
use crate::location::slot::BestFix;
use crate::session::status::StatusNotifier;
use crate::session::worker::SnapshotNotifier;
use crate::telemetry::format::session_file_name;
use crate::telemetry::recorder::SampleRecorder;
use crate::telemetry::sink::LogSinkFactory;
use crate::telemetry::types::LocationProvider;

/// Shown when location logging is requested without location permission
pub const MSG_NO_LOCATION_PERMISSION: &str = "no location permission, logging without location";

/// Lifecycle state of the logger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Stopped,
    Starting,
    Running,
}

/// One start-to-stop run of the logger, bound to one file
#[derive(Debug, Clone, PartialEq)]
pub struct LogSession {
    pub session_id: u64,
    /// Absolute path of the session file
    pub file_path: PathBuf,
    pub started_at: NaiveDateTime,
    /// Fixed for the session's lifetime once start completes
    pub location_logging_enabled: bool,
    pub location_provider: Option<LocationProvider>,
    pub header_written: bool,
    /// Degradation warnings surfaced while starting
    pub warnings: Vec<String>,
}

/// Everything outside the logger that a session talks to
#[derive(Clone)]
pub struct Collaborators {
    pub snapshots: Arc<dyn SensorSnapshotProvider>,
    pub feed: Arc<dyn SnapshotFeed>,
    pub settings: Arc<dyn SettingsStore>,
    pub permissions: Arc<dyn PermissionChecker>,
    pub storage: Arc<dyn StorageAvailability>,
    pub notifier: Arc<dyn UserNotifier>,
    pub location: Arc<dyn LocationService>,
    pub sinks: Arc<dyn LogSinkFactory>,
    pub clock: Arc<dyn Clock>,
}

/// Session parameters taken from configuration
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub log_dir: PathBuf,
    pub update_request: UpdateRequest,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from("./logs"),
            update_request: UpdateRequest::default(),
        }
    }
}

impl From<&Config> for SessionConfig {
    fn from(config: &Config) -> Self {
        Self {
            log_dir: PathBuf::from(&config.logging.log_dir),
            update_request: UpdateRequest {
                min_interval_ms: config.location.min_update_interval_ms,
                min_distance_m: config.location.min_distance_m,
            },
        }
    }
}

struct ActiveSession {
    session: LogSession,
    recorder: SampleRecorder,
}

/// Session state machine
pub struct SessionController {
    collab: Collaborators,
    config: SessionConfig,
    status: StatusNotifier,
    snapshot_notifier: SnapshotNotifier,
    state: watch::Sender<SessionState>,
    active: Option<ActiveSession>,
    snapshot_registered: bool,
    location_registered: bool,
    next_session_id: u64,
}

impl SessionController {
    pub fn new(
        collab: Collaborators,
        config: SessionConfig,
        status: StatusNotifier,
        snapshot_notifier: SnapshotNotifier,
    ) -> Self {
        let (state, _) = watch::channel(SessionState::Stopped);
        Self {
            collab,
            config,
            status,
            snapshot_notifier,
            state,
            active: None,
            snapshot_registered: false,
            location_registered: false,
            next_session_id: 1,
        }
    }

    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// Receiver mirroring every state transition
    pub fn watch_state(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// The running session, if any
    pub fn session(&self) -> Option<&LogSession> {
        self.active.as_ref().map(|active| &active.session)
    }

    fn set_state(&self, state: SessionState) {
        self.state.send_replace(state);
    }

    /// Start a session using the current settings.
    ///
    /// # Errors
    ///
    /// - `AlreadyRunning`: a session is running; nothing is changed
    /// - `StoragePermissionDenied`, `StorageUnavailable`, `LogFileOpen`,
    ///   `LogWrite`: the session did not start and the user was notified
    pub async fn start(&mut self) -> Result<LogSession> {
        if self.state() != SessionState::Stopped {
            warn!("Start requested while a session is running; ignoring");
            return Err(LoggerError::AlreadyRunning);
        }

        self.set_state(SessionState::Starting);

        match self.try_start().await {
            Ok(session) => {
                self.set_state(SessionState::Running);
                Ok(session)
            }
            Err(e) => {
                error!("Logging session failed to start: {}", e);
                self.collab.notifier.notify(&e.to_string());
                self.set_state(SessionState::Stopped);
                Err(e)
            }
        }
    }

    async fn try_start(&mut self) -> Result<LogSession> {
        if !self.collab.permissions.has_storage_permission() {
            return Err(LoggerError::StoragePermissionDenied);
        }

        if !self.collab.storage.is_readable() || !self.collab.storage.is_writable() {
            return Err(LoggerError::StorageUnavailable);
        }

        let mut warnings = Vec::new();
        let mut log_location = self.collab.settings.log_location_enabled();
        let prefer_gps = self.collab.settings.prefer_gps();

        if log_location && !self.collab.permissions.has_location_permission() {
            warn!("Location permission missing; logging without location");
            self.warn_user(&mut warnings, MSG_NO_LOCATION_PERMISSION);
            log_location = false;
        }

        let started_at = self.collab.clock.now();
        let path = self.config.log_dir.join(session_file_name(started_at));
        let sink = self
            .collab
            .sinks
            .open_append(&path)
            .await
            .map_err(|source| LoggerError::LogFileOpen {
                path: path.clone(),
                source,
            })?;
        let file_path = absolute_path(&path).await;

        let mut provider = None;
        let mut initial_fix = None;
        if log_location {
            let arbiter =
                LocationProviderArbiter::new(&*self.collab.location, self.config.update_request);
            let decision = arbiter.arbitrate(prefer_gps);

            if let Some(warning) = decision.warning {
                self.warn_user(&mut warnings, warning);
            }

            if decision.enabled {
                provider = decision.chosen_provider;
                initial_fix = arbiter.initial_fix();
            } else {
                log_location = false;
            }
        }

        let best_fix = log_location.then(|| BestFix::with_initial(initial_fix));
        let mut recorder = SampleRecorder::new(
            sink,
            Arc::clone(&self.collab.snapshots),
            Arc::clone(&self.collab.clock),
            best_fix.clone(),
        );
        recorder.write_header().await?;

        self.collab.feed.register(self.snapshot_notifier.clone());
        self.snapshot_registered = true;

        if let (Some(provider), Some(slot)) = (provider, best_fix.as_ref()) {
            self.collab
                .location
                .request_updates(provider, self.config.update_request, slot.listener());
            self.location_registered = true;
        }

        let session = LogSession {
            session_id: self.next_session_id,
            file_path: file_path.clone(),
            started_at,
            location_logging_enabled: log_location,
            location_provider: provider,
            header_written: recorder.header_written(),
            warnings,
        };
        self.next_session_id += 1;

        self.active = Some(ActiveSession {
            session: session.clone(),
            recorder,
        });

        self.status.publish_started(file_path.clone());
        info!(
            "Logging session {} started: {} (location: {})",
            session.session_id,
            file_path.display(),
            provider.map_or_else(|| "off".to_string(), |p| p.to_string())
        );

        Ok(session)
    }

    /// Stop the running session.
    ///
    /// Safe to call in any state; only subscriptions that were actually made
    /// are released. Always publishes "stopped".
    pub async fn stop(&mut self) {
        if self.snapshot_registered {
            self.collab.feed.unregister();
            self.snapshot_registered = false;
        }

        if self.location_registered {
            if self.collab.permissions.has_location_permission() {
                self.collab.location.remove_updates();
            } else {
                warn!("Location permission revoked; cannot cancel location updates");
            }
            self.location_registered = false;
        }

        self.status.publish_stopped();
        self.set_state(SessionState::Stopped);

        if let Some(active) = self.active.take() {
            let rows = active.recorder.rows_written();
            if let Err(e) = active.recorder.close().await {
                warn!("Failed to flush session log on stop: {}", e);
            }
            info!(
                "Logging session {} stopped after {} row(s)",
                active.session.session_id, rows
            );
        } else {
            debug!("Stop requested with no running session");
        }
    }

    /// Handle one "snapshot available" event.
    ///
    /// A write failure ends the session as if `stop()` had been called.
    pub async fn on_snapshot_available(&mut self) {
        let result = match self.active.as_mut() {
            Some(active) => active.recorder.on_snapshot_event().await,
            None => {
                debug!("Snapshot event with no running session; ignoring");
                return;
            }
        };

        if let Err(e) = result {
            error!("Logging session terminated: {}", e);
            self.collab.notifier.notify(&e.to_string());
            self.stop().await;
        }
    }

    fn warn_user(&self, warnings: &mut Vec<String>, message: &str) {
        self.collab.notifier.notify(message);
        warnings.push(message.to_string());
    }
}

async fn absolute_path(path: &Path) -> PathBuf {
    match tokio::fs::canonicalize(path).await {
        Ok(absolute) => absolute,
        Err(_) => std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf()),
    }
}
