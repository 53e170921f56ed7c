use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::time::{Duration, Instant};
use tracing::info;

use crate::error::Result;
use crate::external_sort::chunk::ChunkMetadata;
use crate::external_sort::constants::*;
use crate::external_sort::record::SortRecord;

/// Second pass of the external sort: k-way merge of sorted chunk files.
pub struct ChunkMerger {
    io_buffer_size: usize,
    delimiter: char,
    key_field: usize,
    progress_interval_seconds: u64,
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
struct MergeEntry {
    record: SortRecord,
    chunk_id: usize,
}

struct ChunkReader {
    reader: BufReader<File>,
    line: String,
}

impl ChunkMerger {
    pub fn new(
        io_buffer_size: usize,
        delimiter: char,
        key_field: usize,
        progress_interval_seconds: u64,
    ) -> Self {
        Self {
            io_buffer_size,
            delimiter,
            key_field,
            progress_interval_seconds,
        }
    }

    /// Writes the optional header and then every record of every chunk in key
    /// order. Returns the number of records written.
    pub fn merge_chunks<W: Write>(
        &self,
        chunks: &[ChunkMetadata],
        header: Option<&str>,
        writer: &mut W,
    ) -> Result<usize> {
        if let Some(header) = header {
            writeln!(writer, "{}", header)?;
        }

        let mut chunk_readers = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            let file = File::open(&chunk.file_path)?;
            chunk_readers.push(ChunkReader {
                reader: BufReader::with_capacity(self.io_buffer_size, file),
                line: String::new(),
            });
        }

        let mut merge_heap = BinaryHeap::with_capacity(MERGE_HEAP_INITIAL_CAPACITY.max(chunks.len()));

        for (chunk_id, reader) in chunk_readers.iter_mut().enumerate() {
            if let Some(record) = self.read_next_record(reader)? {
                merge_heap.push(Reverse(MergeEntry { record, chunk_id }));
            }
        }

        let total_estimated_records: usize = chunks.iter().map(|c| c.record_count).sum();
        let mut records_written = 0;
        let mut last_progress_time = Instant::now();
        let progress_interval = Duration::from_secs(self.progress_interval_seconds);

        while let Some(Reverse(entry)) = merge_heap.pop() {
            writeln!(writer, "{}", entry.record.line)?;
            records_written += 1;

            if let Some(next_record) = self.read_next_record(&mut chunk_readers[entry.chunk_id])? {
                merge_heap.push(Reverse(MergeEntry {
                    record: next_record,
                    chunk_id: entry.chunk_id,
                }));
            }

            if last_progress_time.elapsed() >= progress_interval {
                let progress_pct = if total_estimated_records > 0 {
                    (records_written as f64 / total_estimated_records as f64 * 100.0).min(100.0)
                } else {
                    0.0
                };
                info!(
                    "merge progress: {:.1}% ({} of {} records)",
                    progress_pct, records_written, total_estimated_records
                );
                last_progress_time = Instant::now();
            }
        }

        writer.flush()?;
        Ok(records_written)
    }

    fn read_next_record(&self, chunk: &mut ChunkReader) -> Result<Option<SortRecord>> {
        loop {
            chunk.line.clear();
            if chunk.reader.read_line(&mut chunk.line)? == 0 {
                return Ok(None);
            }
            if chunk.line.trim().is_empty() {
                continue;
            }
            return SortRecord::from_line(&chunk.line, self.delimiter, self.key_field).map(Some);
        }
    }
}
