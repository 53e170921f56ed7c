pub const BYTES_PER_KB: usize = 1024;
pub const BYTES_PER_MB: usize = 1_048_576;

// Snapshot line format
pub const DEFAULT_FIELD_DELIMITER: char = '\t';
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";
pub const DEFAULT_HEADER_KEY: &str = "accession";
pub const SNAPSHOT_FIELD_COUNT: usize = 2;

// Diff pipeline
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;
pub const LOAD_PROGRESS_INTERVAL_RECORDS: u64 = 10_000_000;
pub const DIFF_OUTPUT_BUFFER_SIZE_KB: usize = 256;
pub const SNAPSHOT_READ_BUFFER_SIZE_KB: usize = 256;

// Output naming used by the command-line driver
pub const NEW_OR_UPDATED_SUFFIX: &str = "_new-or-updated.tsv";
pub const DELETED_SUFFIX: &str = "_deleted.tsv";
pub const SNAPSHOT_EXTENSION: &str = ".tsv";

// Logging
pub const LOG_TARGET: &str = "snapshot_diff";
