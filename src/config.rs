//! User configuration loaded from `config.toml` in the data directory.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::fields::WeeklyFallback;

pub const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where site stores live. Defaults to `$HOME/.sitedash`.
    pub data_dir: Option<PathBuf>,
    /// Site opened by commands when `--db` is not given.
    pub default_site: Option<String>,
    /// What the weekly chart shows with no weekly reports.
    pub weekly_fallback: WeeklyFallback,
    /// env_logger filter used when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: None,
            default_site: None,
            weekly_fallback: WeeklyFallback::Ramp,
            log_level: "warn".to_string(),
        }
    }
}

impl Config {
    /// Load config from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Config::parse(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    /// Resolve the data directory: explicit setting, else `$HOME/.sitedash`.
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(default_data_dir)
    }
}

pub fn default_data_dir() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".sitedash")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_is_default() {
        assert_eq!(Config::parse("").unwrap(), Config::default());
    }

    #[test]
    fn test_partial_config() {
        let cfg = Config::parse(
            r#"
            default_site = "Tower A"
            weekly_fallback = "empty"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.default_site.as_deref(), Some("Tower A"));
        assert_eq!(cfg.weekly_fallback, WeeklyFallback::Empty);
        assert_eq!(cfg.log_level, "warn");
        assert!(cfg.data_dir.is_none());
    }

    #[test]
    fn test_explicit_data_dir() {
        let cfg = Config::parse(r#"data_dir = "/srv/sites""#).unwrap();
        assert_eq!(cfg.data_dir(), PathBuf::from("/srv/sites"));
    }

    #[test]
    fn test_invalid_fallback_rejected() {
        assert!(Config::parse(r#"weekly_fallback = "sometimes""#).is_err());
    }

    #[test]
    fn test_missing_file_is_default() {
        let path = std::env::temp_dir().join("sitedash-no-such-config.toml");
        assert_eq!(Config::load(&path).unwrap(), Config::default());
    }
}
