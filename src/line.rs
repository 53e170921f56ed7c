use chrono::NaiveDate;
use std::cmp::Ordering;

use crate::constants::SNAPSHOT_FIELD_COUNT;
use crate::error::{Result, SnapshotError};

/// One snapshot record: an accession and the date it was last updated.
///
/// Two lines are equal only when both the key and the date match, while
/// ordering across streams is decided by [`Line::compare_key`] alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    key: String,
    value: NaiveDate,
}

impl Line {
    pub fn new(key: impl Into<String>, value: NaiveDate) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }

    /// Parses `key<delimiter>date`, with the date in `date_format`.
    pub fn parse(raw_line: &str, delimiter: char, date_format: &str) -> Result<Self> {
        let trimmed = raw_line.trim_end_matches(&['\r', '\n'][..]);
        let fields: Vec<&str> = trimmed.split(delimiter).collect();

        if fields.len() != SNAPSHOT_FIELD_COUNT {
            return Err(SnapshotError::malformed(
                trimmed,
                format!(
                    "expected {} fields, found {}",
                    SNAPSHOT_FIELD_COUNT,
                    fields.len()
                ),
            ));
        }

        let key = key_of(fields[0]);
        if key.is_empty() {
            return Err(SnapshotError::malformed(trimmed, "empty key"));
        }

        let value = NaiveDate::parse_from_str(fields[1].trim(), date_format).map_err(|e| {
            SnapshotError::malformed(trimmed, format!("bad date {:?}: {}", fields[1], e))
        })?;

        Ok(Self::new(key, value))
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> NaiveDate {
        self.value
    }

    pub fn compare_key(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }

    pub fn into_key(self) -> String {
        self.key
    }
}

/// The key proper of a raw key field. Sort, verify and diff all compare this.
pub fn key_of(field: &str) -> &str {
    field.trim()
}

/// Extracts field `key_field` of `raw_line` as a key.
pub fn extract_key(raw_line: &str, delimiter: char, key_field: usize) -> Option<&str> {
    raw_line
        .trim_end_matches(&['\r', '\n'][..])
        .split(delimiter)
        .nth(key_field)
        .map(key_of)
}

/// Decides whether the first line of a snapshot is a header: either the
/// caller declared one, or its key field reads `header_key`.
pub fn is_header_line(
    raw_line: &str,
    has_header: bool,
    delimiter: char,
    key_field: usize,
    header_key: &str,
) -> bool {
    has_header || extract_key(raw_line, delimiter, key_field) == Some(header_key)
}
