use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::{Result, SnapshotError};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffConfig {
    pub channel_capacity: usize,
    pub delimiter: char,
    pub date_format: String,
    pub has_header: bool,
    pub header_key: String,
    pub read_buffer_size_kb: usize,
    pub output_buffer_size_kb: usize,
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            delimiter: DEFAULT_FIELD_DELIMITER,
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            has_header: false,
            header_key: DEFAULT_HEADER_KEY.to_string(),
            read_buffer_size_kb: SNAPSHOT_READ_BUFFER_SIZE_KB,
            output_buffer_size_kb: DIFF_OUTPUT_BUFFER_SIZE_KB,
        }
    }
}

impl DiffConfig {
    pub fn validate(&self) -> Result<()> {
        if self.channel_capacity == 0 {
            return Err(SnapshotError::config("channel_capacity must be at least 1"));
        }

        if self.date_format.trim().is_empty() {
            return Err(SnapshotError::config("date_format must not be empty"));
        }

        if self.read_buffer_size_kb == 0 || self.output_buffer_size_kb == 0 {
            return Err(SnapshotError::config("buffer sizes must be at least 1 KB"));
        }

        Ok(())
    }

    pub fn read_buffer_size_bytes(&self) -> usize {
        self.read_buffer_size_kb * BYTES_PER_KB
    }

    pub fn output_buffer_size_bytes(&self) -> usize {
        self.output_buffer_size_kb * BYTES_PER_KB
    }
}
