pub mod config;
pub mod loader;
pub mod merger;


pub use config::DiffConfig;
pub use loader::{LoadReport, SnapshotLoader};
pub use merger::DiffMerger;

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::constants::{DELETED_SUFFIX, NEW_OR_UPDATED_SUFFIX};
use crate::error::{Result, SnapshotError};
use crate::line::Line;

/// Message carried by a loader channel. `EndOfStream` is the sentinel that
/// tells the merger a stream is exhausted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamItem {
    Record(Line),
    EndOfStream,
}

/// A blocking source of snapshot lines, terminated by [`StreamItem::EndOfStream`].
pub trait LineSource {
    fn next_item(&mut self) -> StreamItem;
}

impl LineSource for mpsc::Receiver<StreamItem> {
    fn next_item(&mut self) -> StreamItem {
        // A closed channel means every sender is gone, which ends the stream too.
        self.blocking_recv().unwrap_or(StreamItem::EndOfStream)
    }
}

impl LineSource for std::vec::IntoIter<Line> {
    fn next_item(&mut self) -> StreamItem {
        self.next().map_or(StreamItem::EndOfStream, StreamItem::Record)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffStats {
    pub added: u64,
    pub updated: u64,
    pub deleted: u64,
    pub unchanged: u64,
}

impl DiffStats {
    pub fn new_or_updated(&self) -> u64 {
        self.added + self.updated
    }
}

/// Destination files for the two diff lists.
#[derive(Debug, Clone)]
pub struct DiffOutputs {
    pub new_or_updated: PathBuf,
    pub deleted: PathBuf,
}

impl DiffOutputs {
    pub fn new(new_or_updated: impl Into<PathBuf>, deleted: impl Into<PathBuf>) -> Self {
        Self {
            new_or_updated: new_or_updated.into(),
            deleted: deleted.into(),
        }
    }

    /// `<dir>/<prefix>_new-or-updated.tsv` and `<dir>/<prefix>_deleted.tsv`.
    pub fn in_directory(dir: &Path, prefix: &str) -> Self {
        Self::new(
            dir.join(format!("{}{}", prefix, NEW_OR_UPDATED_SUFFIX)),
            dir.join(format!("{}{}", prefix, DELETED_SUFFIX)),
        )
    }

    fn discard(&self) {
        for path in [&self.new_or_updated, &self.deleted] {
            if path.exists() {
                if let Err(e) = std::fs::remove_file(path) {
                    warn!("failed to remove partial output {}: {}", path.display(), e);
                }
            }
        }
    }
}

/// One diff run between a previous and a latest sorted snapshot.
///
/// Each call to [`SnapshotDiff::compare`] owns its own task group: two
/// blocking loader tasks feeding bounded channels and one blocking merger
/// task draining them. Nothing outlives the call.
pub struct SnapshotDiff {
    config: DiffConfig,
}

impl SnapshotDiff {
    pub fn new(config: DiffConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub async fn compare(
        &self,
        previous: &Path,
        latest: &Path,
        outputs: &DiffOutputs,
    ) -> Result<DiffStats> {
        info!("comparing: {} and {}", previous.display(), latest.display());
        let start = Instant::now();

        let (prev_tx, mut prev_rx) = mpsc::channel(self.config.channel_capacity);
        let (next_tx, mut next_rx) = mpsc::channel(self.config.channel_capacity);

        let mut loaders = JoinSet::new();
        let prev_loader = SnapshotLoader::new(previous, &self.config);
        let next_loader = SnapshotLoader::new(latest, &self.config);
        loaders.spawn_blocking(move || prev_loader.run(prev_tx));
        loaders.spawn_blocking(move || next_loader.run(next_tx));

        let new_or_updated_path = outputs.new_or_updated.clone();
        let deleted_path = outputs.deleted.clone();
        let buffer_size = self.config.output_buffer_size_bytes();

        // The receivers move into the merger; once it returns they are dropped,
        // which unblocks any loader still waiting on a full channel.
        let merge = tokio::task::spawn_blocking(move || -> Result<DiffStats> {
            let new_writer = BufWriter::with_capacity(buffer_size, File::create(&new_or_updated_path)?);
            let del_writer = BufWriter::with_capacity(buffer_size, File::create(&deleted_path)?);
            DiffMerger::new(new_writer, del_writer).merge(&mut prev_rx, &mut next_rx)
        });

        let merge_result = merge.await.map_err(SnapshotError::from).and_then(|r| r);

        let mut load_failure = None;
        while let Some(joined) = loaders.join_next().await {
            match joined {
                Ok(report) if report.is_success() => {}
                Ok(report) => {
                    if load_failure.is_none() {
                        if let Err(source) = report.outcome {
                            load_failure = Some(SnapshotError::SnapshotLoad {
                                path: report.path,
                                source: Box::new(source),
                            });
                        }
                    }
                }
                Err(e) => {
                    if load_failure.is_none() {
                        load_failure = Some(SnapshotError::from(e));
                    }
                }
            }
        }

        let stats = match merge_result {
            Ok(stats) => stats,
            Err(e) => {
                error!("diff aborted: {}", e);
                outputs.discard();
                return Err(e);
            }
        };

        if let Some(e) = load_failure {
            error!("diff discarded, a snapshot could not be read completely: {}", e);
            outputs.discard();
            return Err(e);
        }

        info!(
            "new records found: {} listed in {}",
            stats.new_or_updated(),
            outputs.new_or_updated.display()
        );
        info!(
            "records to be deleted: {} listed in {}",
            stats.deleted,
            outputs.deleted.display()
        );
        info!("diff took {:.2}s", start.elapsed().as_secs_f64());

        Ok(stats)
    }
}

pub async fn compare_snapshots(
    previous: &Path,
    latest: &Path,
    outputs: &DiffOutputs,
    config: DiffConfig,
) -> Result<DiffStats> {
    SnapshotDiff::new(config)?.compare(previous, latest, outputs).await
}
