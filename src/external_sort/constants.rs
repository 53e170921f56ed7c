pub const DEFAULT_MEMORY_USAGE_PERCENT: f64 = 60.0;
pub const DEFAULT_CHUNK_SIZE_MB: usize = 512;
pub const DEFAULT_IO_BUFFER_SIZE_KB: usize = 64;
pub const DEFAULT_PROCESSING_THREADS: usize = 4;
pub const DEFAULT_MERGE_BUFFER_SIZE_KB: usize = 256;
pub const DEFAULT_MERGE_PROGRESS_INTERVAL_SECONDS: u64 = 10;

pub const MIN_MEMORY_USAGE_PERCENT: f64 = 10.0;
pub const MAX_MEMORY_USAGE_PERCENT: f64 = 90.0;
pub const MIN_CHUNK_SIZE_MB: usize = 1;
pub const MAX_CHUNK_SIZE_MB: usize = 4096;
pub const MIN_PROCESSING_THREADS: usize = 1;
pub const MAX_PROCESSING_THREADS: usize = 32;

pub const CHUNK_FILE_PREFIX: &str = "chunk_";
pub const CHUNK_FILE_EXTENSION: &str = ".tsv";
pub const TEMP_DIR_NAME: &str = "snapshot_sort_temp";
pub const RUN_DIR_PREFIX: &str = "sort-run-";
pub const OUTPUT_TEMP_PREFIX: &str = ".sorting-";

pub const PROGRESS_REPORT_INTERVAL_RECORDS: usize = 1_000_000;

// Per-record bookkeeping on top of the raw line bytes.
pub const ESTIMATED_RECORD_OVERHEAD_BYTES: usize = 64;

pub const MERGE_HEAP_INITIAL_CAPACITY: usize = 1024;
pub const OUTPUT_BUFFER_SIZE_KB: usize = 512;
