pub mod chunk;
pub mod config;
pub mod constants;
pub mod merger;
pub mod processor;
pub mod record;
pub mod verify;


pub use config::ExternalSortConfig;
pub use processor::ExternalSortProcessor;
pub use record::SortRecord;
pub use verify::verify_sorted;

use std::path::{Path, PathBuf};

use crate::error::Result;

#[derive(Debug, Clone, Default)]
pub struct ExternalSortStats {
    pub total_records: usize,
    pub records_written: usize,
    pub chunks_created: usize,
    pub header_preserved: bool,
    pub processing_time_ms: u64,
    pub sort_time_ms: u64,
    pub merge_time_ms: u64,
    pub disk_usage_mb: f64,
}

/// Sorts a snapshot file on the blocking pool so async callers are not stalled.
pub async fn sort_snapshot(
    input_file: &Path,
    output_file: &Path,
    config: ExternalSortConfig,
) -> Result<ExternalSortStats> {
    let processor = ExternalSortProcessor::new(config)?;
    let input: PathBuf = input_file.to_path_buf();
    let output: PathBuf = output_file.to_path_buf();
    tokio::task::spawn_blocking(move || processor.sort(&input, &output)).await?
}
