//! Trait abstraction for the session log file to enable testing

use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Trait for appending lines to a session log
#[async_trait]
pub trait LogSink: Send {
    /// Append `line` followed by a newline
    async fn write_line(&mut self, line: &str) -> io::Result<()>;

    /// Flush buffered output
    async fn flush(&mut self) -> io::Result<()>;
}

/// Opens session log sinks.
///
/// The controller asks for a sink once per session; failing to obtain one is
/// fatal to that start request.
#[async_trait]
pub trait LogSinkFactory: Send + Sync {
    async fn open_append(&self, path: &Path) -> io::Result<Box<dyn LogSink>>;
}

/// CSV file opened in append mode
pub struct CsvLogFile {
    file: File,
    path: PathBuf,
}

impl std::fmt::Debug for CsvLogFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CsvLogFile")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl CsvLogFile {
    /// Open (creating if needed) `path` for append, creating missing parent
    /// directories first.
    pub async fn open(path: &Path) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let file = OpenOptions::new().create(true).append(true).open(path).await?;
        debug!("Opened session log {}", path.display());

        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl LogSink for CsvLogFile {
    async fn write_line(&mut self, line: &str) -> io::Result<()> {
        let mut buf = Vec::with_capacity(line.len() + 1);
        buf.extend_from_slice(line.as_bytes());
        buf.push(b'\n');
        self.file.write_all(&buf).await
    }

    async fn flush(&mut self) -> io::Result<()> {
        self.file.flush().await
    }
}

/// Opens [`CsvLogFile`]s on the local file system
#[derive(Debug, Default, Clone, Copy)]
pub struct CsvFileFactory;

#[async_trait]
impl LogSinkFactory for CsvFileFactory {
    async fn open_append(&self, path: &Path) -> io::Result<Box<dyn LogSink>> {
        Ok(Box::new(CsvLogFile::open(path).await?))
    }
}
