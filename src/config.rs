//! Loader configuration
//!
//! Read from a YAML file; every field has a default so a partial file works.
//!
//! ```yaml
//! data_root: /var/lib/cxload
//! server_element_limit: 50000000
//! progress_interval: 10000
//! remove_partial_on_failure: true
//! ```

use crate::loader::DEFAULT_PROGRESS_INTERVAL;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config: {0}")]
    Parse(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Root holding one directory per network
    pub data_root: PathBuf,
    /// Maximum elements per network; negative disables the check
    pub server_element_limit: i64,
    /// Elements between progress log events
    pub progress_interval: u64,
    /// Remove the network's aspect directory when a pass fails
    pub remove_partial_on_failure: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            data_root: default_data_root(),
            server_element_limit: -1,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            remove_partial_on_failure: true,
        }
    }
}

/// `~/.local/share/cxload/data` or the platform equivalent
pub fn default_data_root() -> PathBuf {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join(".local/share"));
    data_dir.join("cxload").join("data")
}

impl LoaderConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    pub fn with_data_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.data_root = root.into();
        self
    }

    pub fn with_element_limit(mut self, limit: i64) -> Self {
        self.server_element_limit = limit;
        self
    }

    /// `<data_root>/<network_id>`
    pub fn network_dir(&self, network_id: &Uuid) -> PathBuf {
        self.data_root.join(network_id.to_string())
    }

    /// The uploaded CX document for a network
    pub fn network_file(&self, network_id: &Uuid) -> PathBuf {
        self.network_dir(network_id).join("network.cx")
    }

    /// Where per-aspect artifacts are written
    pub fn aspect_dir(&self, network_id: &Uuid) -> PathBuf {
        self.network_dir(network_id).join("aspects")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config = LoaderConfig::from_yaml_str("server_element_limit: 100\n").unwrap();
        assert_eq!(config.server_element_limit, 100);
        assert_eq!(config.progress_interval, DEFAULT_PROGRESS_INTERVAL);
        assert!(config.remove_partial_on_failure);
    }

    #[test]
    fn default_is_unlimited() {
        assert_eq!(LoaderConfig::default().server_element_limit, -1);
    }

    #[test]
    fn rejects_unparseable_yaml() {
        assert!(LoaderConfig::from_yaml_str("server_element_limit: [1").is_err());
    }

    #[test]
    fn network_layout_under_data_root() {
        let config = LoaderConfig::default().with_data_root("/srv/cx");
        let id = Uuid::nil();
        assert_eq!(
            config.aspect_dir(&id),
            PathBuf::from("/srv/cx/00000000-0000-0000-0000-000000000000/aspects")
        );
        assert_eq!(
            config.network_file(&id),
            PathBuf::from("/srv/cx/00000000-0000-0000-0000-000000000000/network.cx")
        );
    }
}
