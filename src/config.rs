use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default busy timeout for store connections, in milliseconds
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Locations of the two stores and connection limits
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GraphConfig {
    /// Entity store database file
    pub entity_store: PathBuf,
    /// Blob store database file
    pub blob_store: PathBuf,
    /// How long a lookup may wait on a locked store before failing
    pub busy_timeout_ms: u64,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            entity_store: PathBuf::from("entities.db"),
            blob_store: PathBuf::from("blobs.db"),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
        }
    }
}

impl GraphConfig {
    pub fn new(entity_store: impl Into<PathBuf>, blob_store: impl Into<PathBuf>) -> Self {
        Self {
            entity_store: entity_store.into(),
            blob_store: blob_store.into(),
            ..Self::default()
        }
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("ensemble-graph.toml")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<GraphConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: GraphConfig = toml::from_str(&contents)?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &GraphConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}
