use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;
use tracing::info;

use crate::diff::DiffConfig;
use crate::external_sort::ExternalSortConfig;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotConfig {
    pub sort: ExternalSortConfig,
    pub diff: DiffConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub verbosity: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            verbosity: "normal".to_string(),
        }
    }
}

impl SnapshotConfig {
    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).await?;
        let config: SnapshotConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads `path` when it exists, otherwise falls back to the defaults.
    pub async fn load_or_default<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        match path {
            Some(path) if path.as_ref().exists() => Self::load(path).await,
            Some(path) => {
                info!(
                    "config file {} not found, using defaults",
                    path.as_ref().display()
                );
                Ok(Self::default())
            }
            None => Ok(Self::default()),
        }
    }

    pub async fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).await?;
        Ok(())
    }

    /// Settings for checking a diff input with `verify_sorted`: the sort's
    /// buffers, with the diff's line format and header rule.
    pub fn sort_check_config(&self) -> ExternalSortConfig {
        ExternalSortConfig {
            delimiter: self.diff.delimiter,
            key_field: 0,
            has_header: self.diff.has_header,
            header_key: self.diff.header_key.clone(),
            ..self.sort.clone()
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.sort.validate()?;
        self.diff.validate()?;

        if !matches!(self.logging.verbosity.as_str(), "silent" | "normal" | "verbose") {
            anyhow::bail!("verbosity must be 'silent', 'normal', or 'verbose'");
        }

        Ok(())
    }
}
