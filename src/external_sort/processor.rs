use std::io::BufWriter;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

use crate::constants::{BYTES_PER_KB, BYTES_PER_MB};
use crate::error::{Result, SnapshotError};
use crate::external_sort::chunk::{build_sort_pool, ChunkProcessor};
use crate::external_sort::constants::*;
use crate::external_sort::merger::ChunkMerger;
use crate::external_sort::{ExternalSortConfig, ExternalSortStats};

pub struct ExternalSortProcessor {
    config: ExternalSortConfig,
}

impl ExternalSortProcessor {
    pub fn new(config: ExternalSortConfig) -> Result<Self> {
        config.validate()?;
        std::fs::create_dir_all(&config.temp_directory)?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ExternalSortConfig {
        &self.config
    }

    /// Sorts `input_file` by key into `output_file`.
    ///
    /// The output appears only once the merge has fully succeeded; on any
    /// error the scratch chunks and the half-written output are removed and
    /// the input is left as it was.
    pub fn sort(&self, input_file: &Path, output_file: &Path) -> Result<ExternalSortStats> {
        self.sort_with_chunk_size(input_file, output_file, self.config.effective_chunk_size_bytes())
    }

    pub fn sort_with_chunk_size(
        &self,
        input_file: &Path,
        output_file: &Path,
        chunk_size_bytes: usize,
    ) -> Result<ExternalSortStats> {
        if chunk_size_bytes == 0 {
            return Err(SnapshotError::config("chunk size must be positive"));
        }

        let start_time = Instant::now();
        info!("sorting {} to {}", input_file.display(), output_file.display());

        // Dropped on every exit path, taking the chunk files with it.
        let run_dir = tempfile::Builder::new()
            .prefix(RUN_DIR_PREFIX)
            .tempdir_in(&self.config.temp_directory)?;

        let chunk_processor = ChunkProcessor::new(
            chunk_size_bytes,
            self.config.io_buffer_size_bytes(),
            run_dir.path().to_path_buf(),
            self.config.delimiter,
            self.config.key_field,
        );
        let pool = build_sort_pool(self.config.processing_threads)?;

        let input_size = std::fs::metadata(input_file)?.len();
        debug!(
            "input is {} bytes, expecting about {} chunks of {:.1} MB",
            input_size,
            chunk_processor.estimate_chunk_count(input_size),
            chunk_size_bytes as f64 / BYTES_PER_MB as f64
        );

        let chunking = chunk_processor.process_file_to_chunks(
            input_file,
            self.config.has_header,
            &self.config.header_key,
            &pool,
        )?;
        let sort_time = start_time.elapsed();
        info!(
            "{} records split into {} sorted chunks",
            chunking.total_records,
            chunking.chunks.len()
        );

        let merge_start = Instant::now();
        let merger = ChunkMerger::new(
            self.config.merge_buffer_size_bytes(),
            self.config.delimiter,
            self.config.key_field,
            self.config.merge_progress_interval_seconds,
        );

        let output_dir = match output_file.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => std::env::current_dir()?,
        };
        let mut staged = tempfile::Builder::new()
            .prefix(OUTPUT_TEMP_PREFIX)
            .tempfile_in(&output_dir)?;

        let records_written = {
            let mut writer = BufWriter::with_capacity(
                OUTPUT_BUFFER_SIZE_KB * BYTES_PER_KB,
                staged.as_file_mut(),
            );
            merger.merge_chunks(&chunking.chunks, chunking.header.as_deref(), &mut writer)?
        };
        staged.as_file().sync_all()?;
        staged
            .persist(output_file)
            .map_err(|e| SnapshotError::Io(e.error))?;
        let merge_time = merge_start.elapsed();

        let disk_usage_bytes: u64 = chunking.chunks.iter().map(|c| c.file_size_bytes).sum();
        let stats = ExternalSortStats {
            total_records: chunking.total_records,
            records_written,
            chunks_created: chunking.chunks.len(),
            header_preserved: chunking.header.is_some(),
            processing_time_ms: start_time.elapsed().as_millis() as u64,
            sort_time_ms: sort_time.as_millis() as u64,
            merge_time_ms: merge_time.as_millis() as u64,
            disk_usage_mb: disk_usage_bytes as f64 / BYTES_PER_MB as f64,
        };

        info!(
            "sorted {} records into {} in {:.2}s",
            stats.records_written,
            output_file.display(),
            start_time.elapsed().as_secs_f64()
        );

        Ok(stats)
    }
}

