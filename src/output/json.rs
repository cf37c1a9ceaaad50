//! Streaming JSON array writer
//!
//! Writes `[`, then messages as comma-separated compact JSON as pages arrive,
//! then `]`. The closing bracket is written by [`JsonArrayWriter::finish`], or
//! by `Drop` when the writer is abandoned on an error path, so the file on
//! disk is always a terminated array.

use crate::output::{CrawlSummary, MessageBound, OutputError, OutputResult};
use crate::Message;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const DEFAULT_BUFFER_SIZE: usize = 64 * 1024; // 64KB buffer

/// Incremental writer for one JSON array of messages
pub struct JsonArrayWriter {
    writer: Option<BufWriter<File>>,
    path: PathBuf,
    summary: CrawlSummary,
    pages_written: u64,
}

impl JsonArrayWriter {
    /// Create the destination and write the opening bracket.
    ///
    /// The file is opened for exclusive creation; an existing path fails with
    /// [`OutputError::Conflict`] and is left untouched.
    pub fn create<P: AsRef<Path>>(path: P) -> OutputResult<Self> {
        let path = path.as_ref().to_path_buf();
        info!("Creating JSON writer: path={}", path.display());

        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|source| match source.kind() {
                io::ErrorKind::AlreadyExists => OutputError::Conflict { path: path.clone() },
                _ => OutputError::Io {
                    path: path.clone(),
                    source,
                },
            })?;

        let mut writer = BufWriter::with_capacity(DEFAULT_BUFFER_SIZE, file);
        writer.write_all(b"[").map_err(|source| OutputError::Io {
            path: path.clone(),
            source,
        })?;

        Ok(Self {
            writer: Some(writer),
            path,
            summary: CrawlSummary::default(),
            pages_written: 0,
        })
    }

    /// Statistics so far
    pub fn summary(&self) -> &CrawlSummary {
        &self.summary
    }

    /// Pages handed to [`write_page`](Self::write_page), empty ones included
    pub fn pages_written(&self) -> u64 {
        self.pages_written
    }

    /// Append a page's messages as array elements and flush.
    ///
    /// An empty page writes nothing, not even a separator.
    pub fn write_page(&mut self, page: &[Message]) -> OutputResult<()> {
        let writer = self.writer.as_mut().ok_or_else(|| OutputError::Io {
            path: self.path.clone(),
            source: io::Error::new(io::ErrorKind::Other, "writer already closed"),
        })?;

        for message in page {
            if self.summary.message_count > 0 {
                writer.write_all(b",").map_err(|source| OutputError::Io {
                    path: self.path.clone(),
                    source,
                })?;
            }
            serde_json::to_writer(&mut *writer, message)
                .map_err(|e| OutputError::Serialization(format!("Failed to write message: {e}")))?;
            self.summary.message_count += 1;
        }

        if let (Some(first), Some(last)) = (page.first(), page.last()) {
            if self.summary.newest.is_none() {
                self.summary.newest = Some(bound(first));
            }
            self.summary.oldest = Some(bound(last));
        }

        writer.flush().map_err(|source| OutputError::Io {
            path: self.path.clone(),
            source,
        })?;

        self.pages_written += 1;
        debug!(
            "Progress: page {} with {} messages, {} total",
            self.pages_written,
            page.len(),
            self.summary.message_count
        );
        Ok(())
    }

    /// Write the closing bracket, sync to disk, and return the summary
    pub fn finish(mut self) -> OutputResult<CrawlSummary> {
        let Some(mut writer) = self.writer.take() else {
            return Ok(std::mem::take(&mut self.summary));
        };

        let path = self.path.clone();
        let io_err = |source: io::Error| OutputError::Io {
            path: path.clone(),
            source,
        };

        writer.write_all(b"]").map_err(io_err)?;
        let file = writer.into_inner().map_err(|e| io_err(e.into_error()))?;
        file.sync_all().map_err(io_err)?;

        info!(
            "JSON writer closed successfully: {} messages written to {}",
            self.summary.message_count,
            self.path.display()
        );
        Ok(std::mem::take(&mut self.summary))
    }
}

impl Drop for JsonArrayWriter {
    fn drop(&mut self) {
        if let Some(mut writer) = self.writer.take() {
            warn!(
                "Closing {} early after {} messages",
                self.path.display(),
                self.summary.message_count
            );
            if let Err(e) = writer.write_all(b"]").and_then(|()| writer.flush()) {
                warn!("Failed to terminate {}: {}", self.path.display(), e);
            }
        }
    }
}

fn bound(message: &Message) -> MessageBound {
    MessageBound {
        // Pages reaching the writer have passed the ID filter.
        id: message.id().unwrap_or_default(),
        timestamp: message.timestamp().unwrap_or_default().to_string(),
    }
}
