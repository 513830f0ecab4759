//! Configuration loading from disk.

use std::path::{Path, PathBuf};

use crate::config::schema::ConfigurationSnapshot;

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The source could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The source was read but is not a valid route file.
    #[error("malformed config {}: {source}", path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl ConfigError {
    /// Short machine-friendly label, used for metrics and the admin API.
    pub fn kind(&self) -> &'static str {
        match self {
            ConfigError::Unreadable { .. } => "unreadable",
            ConfigError::Malformed { .. } => "malformed",
        }
    }
}

/// Load a configuration snapshot from a TOML file.
pub async fn load_config(path: &Path) -> Result<ConfigurationSnapshot, ConfigError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ConfigError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;

    parse_config(&content).map_err(|source| ConfigError::Malformed {
        path: path.to_path_buf(),
        source,
    })
}

/// Parse configuration text. Structural checks only.
pub fn parse_config(content: &str) -> Result<ConfigurationSnapshot, toml::de::Error> {
    toml::from_str(content)
}
