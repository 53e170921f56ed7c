use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::constants::{BYTES_PER_KB, BYTES_PER_MB, DEFAULT_FIELD_DELIMITER, DEFAULT_HEADER_KEY};
use crate::error::{Result, SnapshotError};
use crate::external_sort::constants::*;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExternalSortConfig {
    pub memory_usage_percent: f64,
    pub chunk_size_mb: usize,
    pub io_buffer_size_kb: usize,
    pub merge_buffer_size_kb: usize,
    pub processing_threads: usize,
    pub temp_directory: PathBuf,
    pub delimiter: char,
    pub key_field: usize,
    /// Forces line 1 to be treated as a header. Without it, line 1 is a
    /// header only when its key field equals `header_key`.
    pub has_header: bool,
    pub header_key: String,
    pub merge_progress_interval_seconds: u64,
}

impl Default for ExternalSortConfig {
    fn default() -> Self {
        Self {
            memory_usage_percent: DEFAULT_MEMORY_USAGE_PERCENT,
            chunk_size_mb: DEFAULT_CHUNK_SIZE_MB,
            io_buffer_size_kb: DEFAULT_IO_BUFFER_SIZE_KB,
            merge_buffer_size_kb: DEFAULT_MERGE_BUFFER_SIZE_KB,
            processing_threads: DEFAULT_PROCESSING_THREADS,
            temp_directory: std::env::temp_dir().join(TEMP_DIR_NAME),
            delimiter: DEFAULT_FIELD_DELIMITER,
            key_field: 0,
            has_header: false,
            header_key: DEFAULT_HEADER_KEY.to_string(),
            merge_progress_interval_seconds: DEFAULT_MERGE_PROGRESS_INTERVAL_SECONDS,
        }
    }
}

impl ExternalSortConfig {
    pub fn validate(&self) -> Result<()> {
        if self.memory_usage_percent < MIN_MEMORY_USAGE_PERCENT
            || self.memory_usage_percent > MAX_MEMORY_USAGE_PERCENT {
            return Err(SnapshotError::config(format!(
                "Memory usage percent must be between {} and {}",
                MIN_MEMORY_USAGE_PERCENT, MAX_MEMORY_USAGE_PERCENT
            )));
        }

        if self.chunk_size_mb < MIN_CHUNK_SIZE_MB || self.chunk_size_mb > MAX_CHUNK_SIZE_MB {
            return Err(SnapshotError::config(format!(
                "Chunk size must be between {} and {} MB",
                MIN_CHUNK_SIZE_MB, MAX_CHUNK_SIZE_MB
            )));
        }

        if self.processing_threads < MIN_PROCESSING_THREADS
            || self.processing_threads > MAX_PROCESSING_THREADS {
            return Err(SnapshotError::config(format!(
                "Processing threads must be between {} and {}",
                MIN_PROCESSING_THREADS, MAX_PROCESSING_THREADS
            )));
        }

        if self.io_buffer_size_kb == 0 || self.merge_buffer_size_kb == 0 {
            return Err(SnapshotError::config("Buffer sizes must be at least 1 KB"));
        }

        if self.delimiter == '\n' || self.delimiter == '\r' {
            return Err(SnapshotError::config("Delimiter cannot be a line terminator"));
        }

        Ok(())
    }

    pub fn memory_limit_bytes(&self) -> usize {
        use sysinfo::System;
        let mut system = System::new();
        system.refresh_memory();

        let total_memory = system.total_memory() as f64;
        (total_memory * self.memory_usage_percent / 100.0) as usize
    }

    pub fn chunk_size_bytes(&self) -> usize {
        self.chunk_size_mb * BYTES_PER_MB
    }

    /// Configured chunk size, capped by the share of system memory we may use.
    pub fn effective_chunk_size_bytes(&self) -> usize {
        let memory_limit = self.memory_limit_bytes();
        if memory_limit == 0 {
            return self.chunk_size_bytes();
        }
        self.chunk_size_bytes().min(memory_limit).max(BYTES_PER_MB)
    }

    pub fn io_buffer_size_bytes(&self) -> usize {
        self.io_buffer_size_kb * BYTES_PER_KB
    }

    pub fn merge_buffer_size_bytes(&self) -> usize {
        self.merge_buffer_size_kb * BYTES_PER_KB
    }
}
