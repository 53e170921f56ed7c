use rayon::prelude::*;
use rayon::ThreadPool;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{Result, SnapshotError};
use crate::external_sort::constants::*;
use crate::external_sort::record::SortRecord;
use crate::line::is_header_line;

#[derive(Debug, Clone)]
pub struct ChunkMetadata {
    pub chunk_id: usize,
    pub file_path: PathBuf,
    pub record_count: usize,
    pub file_size_bytes: u64,
}

/// First pass of the external sort: cuts the input into memory-sized runs,
/// sorts each run in parallel and spills it to the scratch directory.
pub struct ChunkProcessor {
    chunk_size_bytes: usize,
    io_buffer_size: usize,
    temp_directory: PathBuf,
    delimiter: char,
    key_field: usize,
}

#[derive(Debug, Default)]
pub struct ChunkingOutcome {
    pub header: Option<String>,
    pub chunks: Vec<ChunkMetadata>,
    pub total_records: usize,
}

impl ChunkProcessor {
    pub fn new(
        chunk_size_bytes: usize,
        io_buffer_size: usize,
        temp_directory: PathBuf,
        delimiter: char,
        key_field: usize,
    ) -> Self {
        Self {
            chunk_size_bytes,
            io_buffer_size,
            temp_directory,
            delimiter,
            key_field,
        }
    }

    pub fn process_file_to_chunks(
        &self,
        file_path: &Path,
        has_header: bool,
        header_key: &str,
        pool: &ThreadPool,
    ) -> Result<ChunkingOutcome> {
        let file = File::open(file_path)?;
        let mut reader = BufReader::with_capacity(self.io_buffer_size, file);
        let mut outcome = ChunkingOutcome::default();
        let mut current_chunk = Vec::new();
        let mut current_size = 0;
        let mut line_count = 0;

        let mut line = String::new();
        loop {
            line.clear();
            if reader.read_line(&mut line)? == 0 {
                break;
            }
            line_count += 1;

            if line_count == 1
                && is_header_line(&line, has_header, self.delimiter, self.key_field, header_key)
            {
                outcome.header = Some(line.trim_end_matches(&['\r', '\n'][..]).to_string());
                continue;
            }

            if line.trim().is_empty() {
                continue;
            }

            let record = SortRecord::from_line(&line, self.delimiter, self.key_field)?;
            let record_size = record.estimated_size();

            if current_size + record_size > self.chunk_size_bytes && !current_chunk.is_empty() {
                let chunk_id = outcome.chunks.len();
                let chunk_metadata =
                    self.sort_and_write_chunk(chunk_id, std::mem::take(&mut current_chunk), pool)?;
                outcome.chunks.push(chunk_metadata);
                current_size = 0;
            }

            current_chunk.push(record);
            current_size += record_size;
            outcome.total_records += 1;

            if line_count % PROGRESS_REPORT_INTERVAL_RECORDS == 0 {
                debug!(
                    "{} lines read, {} chunks spilled",
                    line_count,
                    outcome.chunks.len()
                );
            }
        }

        if !current_chunk.is_empty() {
            let chunk_id = outcome.chunks.len();
            let chunk_metadata = self.sort_and_write_chunk(chunk_id, current_chunk, pool)?;
            outcome.chunks.push(chunk_metadata);
        }

        Ok(outcome)
    }

    pub fn sort_and_write_chunk(
        &self,
        chunk_id: usize,
        mut records: Vec<SortRecord>,
        pool: &ThreadPool,
    ) -> Result<ChunkMetadata> {
        pool.install(|| records.par_sort_unstable());

        let chunk_file = self.temp_directory.join(format!(
            "{}{}{}",
            CHUNK_FILE_PREFIX,
            chunk_id,
            CHUNK_FILE_EXTENSION
        ));

        let file = File::create(&chunk_file)?;
        let mut writer = BufWriter::with_capacity(self.io_buffer_size, file);

        for record in &records {
            writeln!(writer, "{}", record.line)?;
        }

        writer.flush()?;
        let file_size = std::fs::metadata(&chunk_file)?.len();
        debug!(
            "chunk {} written: {} records, {} bytes",
            chunk_id,
            records.len(),
            file_size
        );

        Ok(ChunkMetadata {
            chunk_id,
            file_path: chunk_file,
            record_count: records.len(),
            file_size_bytes: file_size,
        })
    }

    pub fn estimate_chunk_count(&self, file_size: u64) -> usize {
        if file_size == 0 {
            return 1;
        }

        let file_size_usize = file_size.min(usize::MAX as u64) as usize;
        let estimated_chunks =
            file_size_usize.saturating_add(self.chunk_size_bytes - 1) / self.chunk_size_bytes;
        estimated_chunks.max(1)
    }
}

pub fn build_sort_pool(threads: usize) -> Result<ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("chunk-sort-{}", i))
        .build()
        .map_err(SnapshotError::from)
}
