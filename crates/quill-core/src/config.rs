use crate::error::{ProjectError, Result};
use serde::{Deserialize, Serialize};
use std::fs::read_to_string;
use std::path::Path;

/// Name of the optional config file at the project root.
pub const CONFIG_FILE_NAME: &str = "quill.toml";

/// Default per-directory metadata record name.
pub const DEFAULT_METADATA_FILE: &str = ".quill-meta.yaml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// File name of the metadata record kept in every tracked directory.
    pub metadata_file: String,
    pub links: LinkConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    /// Re-spell relative links inside a file that is itself being moved.
    pub rewrite_outgoing: bool,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            metadata_file: DEFAULT_METADATA_FILE.to_string(),
            links: LinkConfig::default(),
        }
    }
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            rewrite_outgoing: true,
        }
    }
}

impl ProjectConfig {
    /// Load `quill.toml` from the project root, falling back to defaults when absent.
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(CONFIG_FILE_NAME);
        tracing::debug!("Attempting to read project config from: {:?}", &path);
        if !path.exists() {
            tracing::debug!("Config file not found, using defaults.");
            return Ok(Self::default());
        }
        let content = read_to_string(&path).map_err(|e| ProjectError::io(&path, e))?;
        toml::from_str(&content).map_err(|source| ProjectError::Config { path, source })
    }
}
