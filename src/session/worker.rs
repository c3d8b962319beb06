//! # Session Worker
//!
//! Serializes start/stop requests and snapshot events onto a single task.
//!
//! Requests may come from any thread: the [`LoggerHandle`] and every
//! [`SnapshotNotifier`] only push commands onto one queue, and a single tokio
//! task owns the [`SessionController`] and applies them in arrival order. A
//! stop therefore never interleaves with an in-flight start, and rows are
//! written one after another.
//!
//! The worker exits on [`LoggerHandle::shutdown`] or once every handle has
//! been dropped, stopping a running session first.

use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::error::{LoggerError, Result};
use crate::session::controller::{
    Collaborators, LogSession, SessionConfig, SessionController, SessionState,
};
use crate::session::status::{LoggingToggled, StatusNotifier};

pub(crate) enum Command {
    Start(oneshot::Sender<Result<LogSession>>),
    Stop(oneshot::Sender<()>),
    SnapshotAvailable,
    Sync(oneshot::Sender<()>),
    Shutdown(oneshot::Sender<()>),
}

/// Callback handle given to the snapshot feed.
///
/// Holds only a weak reference to the worker queue, so a registered feed
/// never keeps the worker alive on its own.
#[derive(Clone)]
pub struct SnapshotNotifier {
    tx: mpsc::WeakUnboundedSender<Command>,
}

impl std::fmt::Debug for SnapshotNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotNotifier").finish_non_exhaustive()
    }
}

impl SnapshotNotifier {
    pub(crate) fn new(tx: mpsc::WeakUnboundedSender<Command>) -> Self {
        Self { tx }
    }

    /// Signal that a new telemetry snapshot is available.
    ///
    /// Never blocks; a signal sent after the worker exited is dropped.
    pub fn notify(&self) {
        if let Some(tx) = self.tx.upgrade() {
            let _ = tx.send(Command::SnapshotAvailable);
        }
    }
}

/// Handle to a running logger worker.
///
/// Cheap to clone; every clone talks to the same worker.
#[derive(Clone)]
pub struct LoggerHandle {
    tx: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<SessionState>,
    status: StatusNotifier,
}

impl std::fmt::Debug for LoggerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoggerHandle")
            .field("state", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}

impl LoggerHandle {
    /// Spawn the worker task on the current tokio runtime.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # async fn run(collab: wheel_logger::session::controller::Collaborators) -> wheel_logger::error::Result<()> {
    /// use wheel_logger::session::controller::SessionConfig;
    /// use wheel_logger::session::worker::LoggerHandle;
    ///
    /// let (logger, _worker) = LoggerHandle::spawn(collab, SessionConfig::default());
    /// let session = logger.start().await?;
    /// println!("Logging to {}", session.file_path.display());
    /// logger.stop().await?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn spawn(collab: Collaborators, config: SessionConfig) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let status = StatusNotifier::new();
        let controller = SessionController::new(
            collab,
            config,
            status.clone(),
            SnapshotNotifier::new(tx.downgrade()),
        );
        let state = controller.watch_state();

        let worker = tokio::spawn(run(controller, rx));
        (Self { tx, state, status }, worker)
    }

    /// Start a logging session with the current settings.
    pub async fn start(&self) -> Result<LogSession> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Start(reply))?;
        rx.await.map_err(|_| LoggerError::WorkerGone)?
    }

    /// Stop the running session. Safe to call when nothing is running.
    pub async fn stop(&self) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Stop(reply))?;
        rx.await.map_err(|_| LoggerError::WorkerGone)
    }

    /// Wait until every command queued before this call has been handled.
    pub async fn sync(&self) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Sync(reply))?;
        rx.await.map_err(|_| LoggerError::WorkerGone)
    }

    /// Stop any running session and end the worker task.
    pub async fn shutdown(self) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Shutdown(reply))?;
        rx.await.map_err(|_| LoggerError::WorkerGone)
    }

    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    pub fn is_running(&self) -> bool {
        self.state() == SessionState::Running
    }

    /// Receiver for state transitions
    pub fn watch_state(&self) -> watch::Receiver<SessionState> {
        self.state.clone()
    }

    /// Subscribe to "logging toggled" events
    pub fn subscribe_status(&self) -> broadcast::Receiver<LoggingToggled> {
        self.status.subscribe()
    }

    fn send(&self, command: Command) -> Result<()> {
        self.tx.send(command).map_err(|_| LoggerError::WorkerGone)
    }
}

async fn run(mut controller: SessionController, mut rx: mpsc::UnboundedReceiver<Command>) {
    debug!("Logging worker started");

    while let Some(command) = rx.recv().await {
        match command {
            Command::Start(reply) => {
                let _ = reply.send(controller.start().await);
            }
            Command::Stop(reply) => {
                controller.stop().await;
                let _ = reply.send(());
            }
            Command::SnapshotAvailable => controller.on_snapshot_available().await,
            Command::Sync(reply) => {
                let _ = reply.send(());
            }
            Command::Shutdown(reply) => {
                if controller.state() != SessionState::Stopped {
                    controller.stop().await;
                }
                let _ = reply.send(());
                info!("Logging worker shut down");
                return;
            }
        }
    }

    // Every handle dropped
    if controller.state() != SessionState::Stopped {
        controller.stop().await;
    }
    info!("Logging worker exited");
}
