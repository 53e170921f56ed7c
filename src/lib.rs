// Snapshot diff engine and the external sort that prepares its input
pub mod diff;
pub mod external_sort;
pub mod line;

// Ambient plumbing shared by the library and the binary
pub mod config;
pub mod constants;
pub mod error;
pub mod utils;

// Re-export main types for convenience
pub use config::SnapshotConfig;
pub use diff::{compare_snapshots, DiffConfig, DiffOutputs, DiffStats, SnapshotDiff};
pub use error::{Result, SnapshotError};
pub use external_sort::{sort_snapshot, verify_sorted, ExternalSortConfig, ExternalSortProcessor, ExternalSortStats};
pub use line::Line;
