//! Bootstrap configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tether_component::HierarchyConfig;

/// Environment variable naming a block entity hierarchy file.
pub const HIERARCHY_ENV: &str = "TETHER_HIERARCHY";

/// Block entity hierarchy used when no file is configured.
pub const DEFAULT_HIERARCHY: &str = r#"{
    "types": [
        { "name": "block_entity" },
        { "name": "lockable_container", "extends": "block_entity" },
        { "name": "chest", "extends": "lockable_container" },
        { "name": "abstract_furnace", "extends": "lockable_container" },
        { "name": "furnace", "extends": "abstract_furnace" },
        { "name": "blast_furnace", "extends": "abstract_furnace" }
    ]
}"#;

/// Configuration for one bootstrap run.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Block entity hierarchy file; `None` uses [`DEFAULT_HIERARCHY`].
    pub hierarchy_path: Option<PathBuf>,
    /// Chunks are created for every position within this radius of the origin.
    pub chunk_radius: i32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            hierarchy_path: None,
            chunk_radius: 1,
        }
    }
}

impl AppConfig {
    /// Read the configuration from the environment, falling back to defaults.
    #[must_use]
    pub fn from_env() -> Self {
        let config = Self::default();
        match std::env::var_os(HIERARCHY_ENV) {
            Some(path) => config.with_hierarchy_path(path),
            None => config,
        }
    }

    /// Load the block entity hierarchy from `path`.
    #[must_use]
    pub fn with_hierarchy_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.hierarchy_path = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_chunk_radius(mut self, radius: i32) -> Self {
        self.chunk_radius = radius.max(0);
        self
    }

    /// Parse the configured hierarchy document.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or is not a valid hierarchy document.
    pub fn load_hierarchy(&self) -> Result<HierarchyConfig> {
        match &self.hierarchy_path {
            Some(path) => read_hierarchy(path),
            None => Ok(HierarchyConfig::from_json(DEFAULT_HIERARCHY)?),
        }
    }
}

fn read_hierarchy(path: &Path) -> Result<HierarchyConfig> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read hierarchy file {}", path.display()))?;
    HierarchyConfig::from_json(&json)
        .with_context(|| format!("invalid hierarchy file {}", path.display()))
}
