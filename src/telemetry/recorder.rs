//! # Sample Recorder
//!
//! Appends one row per "snapshot available" event to the session log.
//!
//! The event carries no data: the recorder pulls the current sample from the
//! [`SensorSnapshotProvider`] and, for location sessions, the latest fix from
//! the shared [`BestFix`] slot. Several events before the sample changes give
//! identical rows; they are not suppressed.

use std::sync::Arc;
use tracing::debug;

use crate::collaborators::{Clock, SensorSnapshotProvider};
use crate::error::{LoggerError, Result};
use crate::location::slot::BestFix;
use crate::telemetry::format::{format_row, header};
use crate::telemetry::sink::LogSink;

/// Formats and appends rows for one session
pub struct SampleRecorder {
    sink: Box<dyn LogSink>,
    source: Arc<dyn SensorSnapshotProvider>,
    clock: Arc<dyn Clock>,
    /// Present only when the session logs location
    location: Option<BestFix>,
    header_written: bool,
    rows_written: u64,
}

impl std::fmt::Debug for SampleRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SampleRecorder")
            .field("log_location", &self.location.is_some())
            .field("header_written", &self.header_written)
            .field("rows_written", &self.rows_written)
            .finish_non_exhaustive()
    }
}

impl SampleRecorder {
    pub fn new(
        sink: Box<dyn LogSink>,
        source: Arc<dyn SensorSnapshotProvider>,
        clock: Arc<dyn Clock>,
        location: Option<BestFix>,
    ) -> Self {
        Self {
            sink,
            source,
            clock,
            location,
            header_written: false,
            rows_written: 0,
        }
    }

    pub fn logs_location(&self) -> bool {
        self.location.is_some()
    }

    pub fn header_written(&self) -> bool {
        self.header_written
    }

    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    /// Write the header line matching this session's columns.
    ///
    /// Only the first call writes; later calls are no-ops.
    pub async fn write_header(&mut self) -> Result<()> {
        if self.header_written {
            return Ok(());
        }

        self.sink
            .write_line(header(self.logs_location()))
            .await
            .map_err(LoggerError::LogWrite)?;
        self.sink.flush().await.map_err(LoggerError::LogWrite)?;
        self.header_written = true;
        Ok(())
    }

    /// Append a row for the current sample.
    pub async fn on_snapshot_event(&mut self) -> Result<()> {
        let sample = self.source.latest();
        let fix = self.location.as_ref().and_then(BestFix::current);
        let row = format_row(self.clock.now(), &sample, self.logs_location(), fix.as_ref());

        self.sink.write_line(&row).await.map_err(LoggerError::LogWrite)?;
        self.sink.flush().await.map_err(LoggerError::LogWrite)?;
        self.rows_written += 1;

        debug!("Appended row {}: {}", self.rows_written, row);
        Ok(())
    }

    /// Flush and release the log sink.
    pub async fn close(mut self) -> Result<()> {
        self.sink.flush().await.map_err(LoggerError::LogWrite)
    }
}
