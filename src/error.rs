//! Error types for snapshot sorting and diffing

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SnapshotError>;

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed record {line:?}: {reason}")]
    MalformedRecord { line: String, reason: String },

    #[error("Failed to load snapshot {path}: {source}")]
    SnapshotLoad {
        path: PathBuf,
        #[source]
        source: Box<SnapshotError>,
    },

    #[error("{path} is not sorted at line {line_number}: {current:?} follows {previous:?}")]
    Unsorted {
        path: PathBuf,
        line_number: u64,
        previous: String,
        current: String,
    },

    #[error("Configuration error: {message}")]
    InvalidConfig { message: String },

    #[error("Stream consumer went away before the snapshot was fully loaded")]
    ChannelClosed,

    #[error("Background task failed: {message}")]
    TaskFailed { message: String },

    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl SnapshotError {
    pub fn malformed(line: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedRecord {
            line: line.into(),
            reason: reason.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: msg.into(),
        }
    }

    pub fn task_failed(msg: impl Into<String>) -> Self {
        Self::TaskFailed {
            message: msg.into(),
        }
    }
}

impl From<tokio::task::JoinError> for SnapshotError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::task_failed(err.to_string())
    }
}
