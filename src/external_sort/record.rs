use std::cmp::Ordering;

use crate::error::{Result, SnapshotError};
use crate::external_sort::constants::ESTIMATED_RECORD_OVERHEAD_BYTES;
use crate::line::extract_key;

/// A raw delimited line together with its extracted sort key.
///
/// The line is carried verbatim so sorting never rewrites record content.
#[derive(Debug, Clone)]
pub struct SortRecord {
    pub key: String,
    pub line: String,
}

impl SortRecord {
    pub fn from_line(line: &str, delimiter: char, key_field: usize) -> Result<Self> {
        let line = line.trim_end_matches(&['\r', '\n'][..]);
        let key = extract_key(line, delimiter, key_field).ok_or_else(|| {
            SnapshotError::malformed(line, format!("missing key field {}", key_field))
        })?;

        Ok(Self {
            key: key.to_string(),
            line: line.to_string(),
        })
    }

    pub fn estimated_size(&self) -> usize {
        self.key.len() + self.line.len() + ESTIMATED_RECORD_OVERHEAD_BYTES
    }
}

impl PartialEq for SortRecord {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.line == other.line
    }
}

impl Eq for SortRecord {}

impl PartialOrd for SortRecord {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SortRecord {
    // Key first; the full line only breaks ties so output is deterministic.
    fn cmp(&self, other: &Self) -> Ordering {
        self.key
            .cmp(&other.key)
            .then_with(|| self.line.cmp(&other.line))
    }
}
