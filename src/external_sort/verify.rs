use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{Result, SnapshotError};
use crate::external_sort::record::SortRecord;
use crate::external_sort::ExternalSortConfig;
use crate::line::is_header_line;

/// Streams `path` and checks that keys are strictly increasing, which is the
/// precondition the diff relies on. Returns the number of records seen.
pub fn verify_sorted(path: &Path, config: &ExternalSortConfig) -> Result<u64> {
    let file = File::open(path)?;
    let reader = BufReader::with_capacity(config.io_buffer_size_bytes(), file);

    let mut previous: Option<String> = None;
    let mut records = 0;

    for (index, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        let header = index == 0
            && is_header_line(
                &line,
                config.has_header,
                config.delimiter,
                config.key_field,
                &config.header_key,
            );
        if header || line.trim().is_empty() {
            continue;
        }

        let record = SortRecord::from_line(&line, config.delimiter, config.key_field)?;
        if let Some(prev) = &previous {
            if prev.as_str() >= record.key.as_str() {
                return Err(SnapshotError::Unsorted {
                    path: path.to_path_buf(),
                    line_number: index as u64 + 1,
                    previous: prev.clone(),
                    current: record.key,
                });
            }
        }

        previous = Some(record.key);
        records += 1;
    }

    Ok(records)
}
