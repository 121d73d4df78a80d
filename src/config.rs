use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::logging::LogFormat;
use crate::store::DEFAULT_ROOT_DIR;

/// Complete versionize configuration (loaded from TOML file)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct VersionizeConfig {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Version store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Root directory holding every task's version directories
    #[serde(default = "default_root_dir")]
    pub root_dir: String,

    /// Skip tasks whose outputs are already recorded at the requested version
    #[serde(default = "default_true")]
    pub skip: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root_dir: default_root_dir(),
            skip: true,
        }
    }
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log format (pretty, compact, json)
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

fn default_root_dir() -> String {
    DEFAULT_ROOT_DIR.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_true() -> bool {
    true
}

impl VersionizeConfig {
    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: VersionizeConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;

        Ok(config)
    }

    /// Generate example configuration as TOML string
    pub fn example() -> Result<String> {
        let config = VersionizeConfig {
            store: StoreConfig {
                root_dir: "results".to_string(),
                skip: true,
            },
            observability: ObservabilityConfig {
                log_level: "info".to_string(),
                log_format: "compact".to_string(),
            },
        };

        toml::to_string_pretty(&config).context("Failed to serialize example config")
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.store.root_dir.trim().is_empty() {
            anyhow::bail!("store.root_dir must be set");
        }

        if !["trace", "debug", "info", "warn", "error"]
            .contains(&self.observability.log_level.to_lowercase().as_str())
        {
            anyhow::bail!(
                "observability.log_level must be one of: trace, debug, info, warn, error"
            );
        }

        if LogFormat::parse(&self.observability.log_format).is_none() {
            anyhow::bail!("observability.log_format must be one of: pretty, compact, json");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = VersionizeConfig::default();
        assert_eq!(config.store.root_dir, "results");
        assert!(config.store.skip);
        assert_eq!(config.observability.log_level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("versionize.toml");
        fs::write(&path, "[store]\nroot_dir = \"out\"\n").unwrap();

        let config = VersionizeConfig::from_file(&path).unwrap();
        assert_eq!(config.store.root_dir, "out");
        assert!(config.store.skip);
        assert_eq!(config.observability.log_format, "pretty");
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("versionize.toml");
        fs::write(&path, "[store\n").unwrap();

        assert!(VersionizeConfig::from_file(&path).is_err());
    }

    #[test]
    fn test_empty_root_dir_is_invalid() {
        let mut config = VersionizeConfig::default();
        config.store.root_dir = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_log_format() {
        let mut config = VersionizeConfig::default();
        config.observability.log_format = "xml".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_example_round_trips() {
        let example = VersionizeConfig::example().unwrap();
        let parsed: VersionizeConfig = toml::from_str(&example).unwrap();
        assert!(parsed.validate().is_ok());
        assert_eq!(parsed.observability.log_format, "compact");
    }
}
