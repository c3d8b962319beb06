//! Start/stop status broadcasting.

use std::path::PathBuf;
use tokio::sync::broadcast;
use tracing::debug;

/// Buffered status events per subscriber before old ones are dropped
const STATUS_CHANNEL_CAPACITY: usize = 16;

/// "Logging toggled" event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingToggled {
    pub is_running: bool,
    /// Absolute path of the session file, present only when started
    pub file_path: Option<PathBuf>,
}

/// Publishes session transitions to any number of subscribers.
///
/// Fire-and-forget: events go only to current subscribers and are never
/// replayed.
#[derive(Debug, Clone)]
pub struct StatusNotifier {
    tx: broadcast::Sender<LoggingToggled>,
}

impl Default for StatusNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusNotifier {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(STATUS_CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LoggingToggled> {
        self.tx.subscribe()
    }

    pub fn publish_started(&self, file_path: PathBuf) {
        self.publish(LoggingToggled {
            is_running: true,
            file_path: Some(file_path),
        });
    }

    pub fn publish_stopped(&self) {
        self.publish(LoggingToggled {
            is_running: false,
            file_path: None,
        });
    }

    fn publish(&self, event: LoggingToggled) {
        // No subscribers is fine
        if let Ok(count) = self.tx.send(event) {
            debug!("Status published to {} subscriber(s)", count);
        }
    }
}
