use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::constants::LOAD_PROGRESS_INTERVAL_RECORDS;
use crate::diff::{DiffConfig, StreamItem};
use crate::error::{Result, SnapshotError};
use crate::line::{is_header_line, Line};

/// Outcome of feeding one snapshot file into its channel.
#[derive(Debug)]
pub struct LoadReport {
    pub path: PathBuf,
    pub records_sent: u64,
    pub outcome: Result<()>,
}

impl LoadReport {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Sends the end-of-stream sentinel when dropped, whichever way the loader exits.
pub(super) struct EndOfStreamGuard {
    tx: mpsc::Sender<StreamItem>,
}

impl EndOfStreamGuard {
    pub(super) fn new(tx: mpsc::Sender<StreamItem>) -> Self {
        Self { tx }
    }
}

impl Drop for EndOfStreamGuard {
    fn drop(&mut self) {
        // Fails only when the receiver is gone, in which case nobody is waiting.
        let _ = self.tx.blocking_send(StreamItem::EndOfStream);
    }
}

/// Reads a sorted snapshot file into a bounded channel.
///
/// Must run on a thread that may block (`spawn_blocking` or a plain OS
/// thread), since a full channel parks the loader until the merger catches up.
pub struct SnapshotLoader {
    path: PathBuf,
    delimiter: char,
    date_format: String,
    has_header: bool,
    header_key: String,
    read_buffer_size: usize,
}

impl SnapshotLoader {
    pub fn new(path: &Path, config: &DiffConfig) -> Self {
        Self {
            path: path.to_path_buf(),
            delimiter: config.delimiter,
            date_format: config.date_format.clone(),
            has_header: config.has_header,
            header_key: config.header_key.clone(),
            read_buffer_size: config.read_buffer_size_bytes(),
        }
    }

    pub fn run(self, tx: mpsc::Sender<StreamItem>) -> LoadReport {
        let guard = EndOfStreamGuard::new(tx);
        let mut records_sent = 0;

        info!("reading from: {}", self.path.display());
        let outcome = self.send_all(&guard.tx, &mut records_sent);

        match &outcome {
            Ok(()) => info!(
                "{} records loaded from {}, sending end of stream",
                records_sent,
                self.path.display()
            ),
            Err(e) => error!(
                "loading {} failed after {} records: {}",
                self.path.display(),
                records_sent,
                e
            ),
        }

        drop(guard);

        LoadReport {
            path: self.path,
            records_sent,
            outcome,
        }
    }

    fn send_all(&self, tx: &mpsc::Sender<StreamItem>, records_sent: &mut u64) -> Result<()> {
        let file = File::open(&self.path)?;
        let reader = BufReader::with_capacity(self.read_buffer_size, file);

        for (index, line_result) in reader.lines().enumerate() {
            let line = line_result?;

            if index == 0 && self.is_header(&line) {
                debug!("skipping header of {}: {}", self.path.display(), line);
                continue;
            }

            if line.trim().is_empty() {
                continue;
            }

            let record = Line::parse(&line, self.delimiter, &self.date_format)?;
            tx.blocking_send(StreamItem::Record(record))
                .map_err(|_| SnapshotError::ChannelClosed)?;

            *records_sent += 1;
            if *records_sent % LOAD_PROGRESS_INTERVAL_RECORDS == 0 {
                info!(
                    "read {} from {}: {}",
                    records_sent,
                    self.path.display(),
                    line
                );
            }
        }

        Ok(())
    }

    fn is_header(&self, line: &str) -> bool {
        is_header_line(line, self.has_header, self.delimiter, 0, &self.header_key)
    }
}
