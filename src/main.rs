//! # Wheel Logger
//!
//! Logs vehicle telemetry to session-scoped CSV files.
//!
//! Reads JSON lines from stdin, one event per line:
//!
//! ```text
//! {"kind":"sample","speed":21.5,"voltage":84.1,"current":3.2,"power":269.0,"battery_level":87,"distance":12.03,"temperature":34}
//! {"kind":"fix","latitude":52.37,"longitude":4.89,"fix_time_millis":1714572202117,"provider":"gps"}
//! ```
//!
//! Each sample becomes the current snapshot and appends one row; fixes feed
//! the location providers. The session stops on EOF or Ctrl+C.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use wheel_logger::collaborators::SystemClock;
use wheel_logger::error::LoggerError;
use wheel_logger::config::{Config, TomlSettings};
use wheel_logger::host::{
    DirectoryStorage, LatestSnapshot, ReplayLocationService, StaticPermissions, TracingNotifier,
};
use wheel_logger::session::controller::{Collaborators, SessionConfig};
use wheel_logger::session::worker::LoggerHandle;
use wheel_logger::telemetry::sink::CsvFileFactory;
use wheel_logger::telemetry::types::{LocationFix, TelemetrySample};

/// Configuration file used when no path is given
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// One line of stdin input
#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum InputEvent {
    Sample(TelemetrySample),
    Fix(LocationFix),
}

fn load_config() -> Result<Config> {
    match std::env::args().nth(1) {
        Some(path) => Config::load(&path).with_context(|| format!("loading {}", path)),
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
            Config::load(DEFAULT_CONFIG_PATH).context("loading default configuration")
        }
        None => Ok(Config::default()),
    }
}

/// Install stderr logging plus an optional daily-rolling diagnostics file.
///
/// The returned guard must live until exit so buffered lines are flushed.
fn init_tracing(config: &Config) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.diagnostics.level.to_ascii_lowercase()));

    let (file_layer, guard) = match &config.diagnostics.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "wheel-logger.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = load_config()?;
    let _guard = init_tracing(&config);

    info!("Wheel Logger v{} starting...", env!("CARGO_PKG_VERSION"));

    let snapshots = LatestSnapshot::new();
    let location = ReplayLocationService::new(
        config.location.gps_enabled,
        config.location.network_enabled,
    );

    let collab = Collaborators {
        snapshots: Arc::new(snapshots.clone()),
        feed: Arc::new(snapshots.clone()),
        settings: Arc::new(TomlSettings(config.settings)),
        permissions: Arc::new(StaticPermissions {
            storage: true,
            location: true,
        }),
        storage: Arc::new(DirectoryStorage::new(&config.logging.log_dir)),
        notifier: Arc::new(TracingNotifier),
        location: Arc::new(location.clone()),
        sinks: Arc::new(CsvFileFactory),
        clock: Arc::new(SystemClock),
    };

    let (logger, worker) = LoggerHandle::spawn(collab, SessionConfig::from(&config));

    let mut status = logger.subscribe_status();
    tokio::spawn(async move {
        while let Ok(event) = status.recv().await {
            match event.file_path {
                Some(path) => info!("Logging started: {}", path.display()),
                None => info!("Logging stopped"),
            }
        }
    });

    let session = match logger.start().await {
        Ok(session) => session,
        Err(e) => {
            let context = start_error_context(&e);
            return Err(anyhow::Error::new(e).context(context));
        }
    };
    info!(
        "Session {} writing to {}",
        session.session_id,
        session.file_path.display()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut line_no: u64 = 0;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("reading stdin")? else {
                    info!("End of input, stopping...");
                    break;
                };
                line_no += 1;

                if line.trim().is_empty() {
                    continue;
                }

                match serde_json::from_str::<InputEvent>(&line) {
                    Ok(InputEvent::Sample(sample)) => snapshots.publish(sample),
                    Ok(InputEvent::Fix(fix)) => location.publish_fix(fix),
                    Err(e) => warn!("Skipping line {}: {}", line_no, e),
                }

                if !logger.is_running() {
                    warn!("Logging session ended, exiting");
                    break;
                }
            }

            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                break;
            }
        }
    }

    logger.shutdown().await?;
    worker.await.context("joining logging worker")?;
    debug!("Processed {} input line(s)", line_no);

    Ok(())
}

/// Context line for a failed start, separating environment problems from
/// worker failures.
fn start_error_context(err: &LoggerError) -> &'static str {
    if err.is_preflight_failure() {
        "log storage is not usable, check [logging] log_dir and permissions"
    } else {
        "starting logging session"
    }
}
