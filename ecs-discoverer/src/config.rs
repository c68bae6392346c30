//! Configuration management
//!
//! Handles:
//! - Local ECS agent endpoint and timeout
//! - Pagination and batching limits
//! - Opt-in deduplication of the output
//!
//! Built-in defaults, then an optional TOML file, then environment overrides.

use crate::agent::DEFAULT_METADATA_URL;
use crate::control_plane::MAX_DESCRIBE_BATCH;
use crate::error::DiscoveryError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

pub const CONFIG_PATH_ENV: &str = "ECS_DISCOVERER_CONFIG";
pub const AGENT_URL_ENV: &str = "ECS_DISCOVERER_AGENT_URL";
pub const AGENT_TIMEOUT_ENV: &str = "ECS_DISCOVERER_AGENT_TIMEOUT_SECS";
pub const MAX_PAGES_ENV: &str = "ECS_DISCOVERER_MAX_PAGES";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DiscovererConfig {
    pub agent: AgentSettings,
    pub limits: LimitsConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    pub metadata_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    pub describe_batch_size: usize,
    /// Ceiling on pages fetched by one paginated listing.
    pub max_pages: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct OutputConfig {
    pub dedup: bool,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            metadata_url: DEFAULT_METADATA_URL.to_string(),
            timeout_secs: 5,
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            describe_batch_size: MAX_DESCRIBE_BATCH,
            max_pages: 1000,
        }
    }
}

impl DiscovererConfig {
    /// Load config: explicit path → $ECS_DISCOVERER_CONFIG → user config dir → defaults,
    /// then environment overrides.
    pub async fn load(explicit: Option<&Path>) -> Result<Self, DiscoveryError> {
        let mut config = match Self::locate(explicit) {
            Some(path) => {
                debug!("Loading configuration from {}", path.display());
                Self::from_file(&path).await?
            }
            None => Self::default(),
        };

        config.apply_env();
        config.normalize();
        Ok(config)
    }

    pub async fn from_file(path: &Path) -> Result<Self, DiscoveryError> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            DiscoveryError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, DiscoveryError> {
        toml::from_str(content).map_err(|e| DiscoveryError::Config(format!("Parse error: {}", e)))
    }

    /// Get OS-specific config file path
    pub fn config_file_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("ecs-discoverer").join("config.toml"))
    }

    fn locate(explicit: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(path.to_path_buf());
        }
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            return Some(PathBuf::from(path));
        }
        Self::config_file_path().filter(|path| path.exists())
    }

    pub fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(AGENT_URL_ENV) {
            self.agent.metadata_url = url;
        }

        if let Ok(secs) = std::env::var(AGENT_TIMEOUT_ENV) {
            if let Ok(secs) = secs.parse() {
                self.agent.timeout_secs = secs;
            }
        }

        if let Ok(pages) = std::env::var(MAX_PAGES_ENV) {
            if let Ok(pages) = pages.parse() {
                self.limits.max_pages = pages;
            }
        }
    }

    /// Clamp limits into what the APIs accept.
    fn normalize(&mut self) {
        self.limits.describe_batch_size = self.limits.describe_batch_size.clamp(1, MAX_DESCRIBE_BATCH);
        self.limits.max_pages = self.limits.max_pages.max(1);
        self.agent.timeout_secs = self.agent.timeout_secs.max(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = DiscovererConfig::default();
        assert_eq!(config.agent.metadata_url, DEFAULT_METADATA_URL);
        assert_eq!(config.limits.describe_batch_size, 100);
        assert!(!config.output.dedup);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = DiscovererConfig::from_toml(
            r#"
            [limits]
            max_pages = 20

            [output]
            dedup = true
            "#,
        )
        .unwrap();
        assert_eq!(config.limits.max_pages, 20);
        assert_eq!(config.limits.describe_batch_size, 100);
        assert!(config.output.dedup);
        assert_eq!(config.agent.timeout_secs, 5);
    }

    #[test]
    fn test_invalid_toml() {
        let err = DiscovererConfig::from_toml("[limits\nmax_pages = ").unwrap_err();
        assert!(matches!(err, DiscoveryError::Config(_)));
    }

    #[test]
    fn test_normalize_clamps_limits() {
        let mut config = DiscovererConfig::from_toml(
            r#"
            [limits]
            describe_batch_size = 500
            max_pages = 0
            "#,
        )
        .unwrap();
        config.normalize();
        assert_eq!(config.limits.describe_batch_size, MAX_DESCRIBE_BATCH);
        assert_eq!(config.limits.max_pages, 1);
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        temp_env::with_vars(
            [
                (AGENT_URL_ENV, Some("http://127.0.0.1:9999/v1/metadata")),
                (AGENT_TIMEOUT_ENV, Some("2")),
                (MAX_PAGES_ENV, Some("not-a-number")),
            ],
            || {
                let mut config = DiscovererConfig::default();
                config.apply_env();
                assert_eq!(config.agent.metadata_url, "http://127.0.0.1:9999/v1/metadata");
                assert_eq!(config.agent.timeout_secs, 2);
                assert_eq!(config.limits.max_pages, 1000);
            },
        );
    }

    #[tokio::test]
    #[serial]
    async fn test_load_from_explicit_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[agent]\ntimeout_secs = 9\n[output]\ndedup = true").unwrap();

        let config = DiscovererConfig::load(Some(file.path())).await.unwrap();
        assert_eq!(config.agent.timeout_secs, 9);
        assert!(config.output.dedup);
    }

    #[tokio::test]
    #[serial]
    async fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        let err = DiscovererConfig::load(Some(&missing)).await.unwrap_err();
        assert!(err.to_string().contains("nope.toml"));
    }
}
