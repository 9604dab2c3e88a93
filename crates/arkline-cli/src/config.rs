//! Configuration loading from TOML files

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Global configuration for arkline
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub s3: S3Config,
    pub github: GithubConfig,
    pub workers: WorkersConfig,
    pub bins: BinsConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct S3Config {
    /// Destination bucket; CLI `--bucket` overrides
    #[serde(deserialize_with = "deserialize_env_var")]
    pub bucket: Option<String>,
    /// Key prefix for streaming-mode objects
    pub prefix: String,
}

impl Default for S3Config {
    fn default() -> Self {
        Self {
            bucket: None,
            prefix: String::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GithubConfig {
    pub api_url: String,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.github.com".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct WorkersConfig {
    pub default: usize,
    pub max: usize,
}

impl Default for WorkersConfig {
    fn default() -> Self {
        Self {
            default: arkline_github::DEFAULT_WORKERS,
            max: 128,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BinsConfig {
    pub git: String,
    pub tar: String,
    pub mongodump: String,
}

impl Default for BinsConfig {
    fn default() -> Self {
        Self {
            git: "git".to_string(),
            tar: "tar".to_string(),
            mongodump: "mongodump".to_string(),
        }
    }
}

/// Deserialize a string that may contain an environment variable reference
/// like ${VAR}
fn deserialize_env_var<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    Ok(opt.and_then(|s| expand_env_var(&s)))
}

/// Expand ${VAR} to its environment value
fn expand_env_var(s: &str) -> Option<String> {
    if let Some(var_name) = s.strip_prefix("${").and_then(|s| s.strip_suffix('}')) {
        std::env::var(var_name).ok()
    } else {
        Some(s.to_string())
    }
}

/// Read a required environment variable. The value itself is never logged.
pub fn require_env(key: &str) -> Result<String> {
    std::env::var(key)
        .ok()
        .filter(|value| !value.is_empty())
        .with_context(|| format!("missing required environment variable {key}"))
}

impl Config {
    /// Load configuration from default locations
    ///
    /// Search order:
    /// 1. ./arkline.toml (current directory)
    /// 2. ~/.config/arkline/config.toml
    ///
    /// If no config file is found, returns the default config.
    pub fn load() -> Result<Self> {
        let local_config = PathBuf::from("arkline.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = directories::ProjectDirs::from("", "", "arkline") {
            let user_config = config_dir.config_dir().join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        log::debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn from_file(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.github.api_url, "https://api.github.com");
        assert_eq!(config.workers.default, 50);
        assert_eq!(config.bins.git, "git");
        assert!(config.s3.bucket.is_none());
    }

    #[test]
    fn parse_config_toml() {
        let toml = r#"
[s3]
bucket = "org-archives"
prefix = "backups"

[workers]
default = 8
max = 16

[bins]
git = "/usr/local/bin/git"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.s3.bucket.as_deref(), Some("org-archives"));
        assert_eq!(config.s3.prefix, "backups");
        assert_eq!(config.workers.default, 8);
        assert_eq!(config.workers.max, 16);
        assert_eq!(config.bins.git, "/usr/local/bin/git");
        // Unset sections keep their defaults
        assert_eq!(config.bins.tar, "tar");
    }

    #[test]
    fn expand_env_var_reference() {
        std::env::set_var("ARKLINE_TEST_BUCKET", "from-env");
        assert_eq!(
            expand_env_var("${ARKLINE_TEST_BUCKET}"),
            Some("from-env".to_string())
        );
        std::env::remove_var("ARKLINE_TEST_BUCKET");
    }

    #[test]
    fn expand_env_var_literal() {
        assert_eq!(expand_env_var("literal"), Some("literal".to_string()));
    }

    #[test]
    fn expand_env_var_missing() {
        assert_eq!(expand_env_var("${ARKLINE_NO_SUCH_VAR_9Z}"), None);
    }

    #[test]
    fn require_env_missing() {
        let err = require_env("ARKLINE_NO_SUCH_VAR_9Z").unwrap_err();
        assert!(err.to_string().contains("ARKLINE_NO_SUCH_VAR_9Z"));
    }

    #[test]
    fn require_env_rejects_empty() {
        std::env::set_var("ARKLINE_TEST_EMPTY", "");
        assert!(require_env("ARKLINE_TEST_EMPTY").is_err());
        std::env::remove_var("ARKLINE_TEST_EMPTY");
    }
}
