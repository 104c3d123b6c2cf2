//! Application configuration.
//!
//! Defaults are compile-time constants. An optional override file at
//! `~/.config/coursebook/config.json` may replace any of them; missing fields
//! keep their defaults.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Application name used for config/cache directory paths
const APP_NAME: &str = "coursebook";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Students fetched per page.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Pages the mock student source serves before reporting no more data.
pub const DEFAULT_MAX_PAGES: u32 = 10;

/// Cached lists older than this are refreshed on startup.
pub const DEFAULT_STALE_AFTER_MINUTES: i64 = 60;

/// Simulated latency of a page fetch.
pub const DEFAULT_FETCH_DELAY_MS: u64 = 800;

/// Simulated latency of a single-student fetch.
pub const DEFAULT_STUDENT_DELAY_MS: u64 = 500;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    pub page_size: usize,
    pub max_pages: u32,
    pub stale_after_minutes: i64,
    pub fetch_delay_ms: u64,
    pub student_delay_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            max_pages: DEFAULT_MAX_PAGES,
            stale_after_minutes: DEFAULT_STALE_AFTER_MINUTES,
            fetch_delay_ms: DEFAULT_FETCH_DELAY_MS,
            student_delay_ms: DEFAULT_STUDENT_DELAY_MS,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            let config = serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Write the settings as an override file that `load_from` reads back.
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory for the persisted list store (`FileStore::open`).
    pub fn cache_dir() -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    pub fn fetch_delay(&self) -> Duration {
        Duration::from_millis(self.fetch_delay_ms)
    }

    pub fn student_delay(&self) -> Duration {
        Duration::from_millis(self.student_delay_ms)
    }

    /// Cache age limit. Negative or out-of-range minutes fall back to the default.
    pub fn stale_after(&self) -> chrono::Duration {
        match chrono::Duration::try_minutes(self.stale_after_minutes) {
            Some(max_age) if self.stale_after_minutes >= 0 => max_age,
            _ => {
                warn!(
                    minutes = self.stale_after_minutes,
                    default = DEFAULT_STALE_AFTER_MINUTES,
                    "Invalid staleAfterMinutes, using default"
                );
                chrono::Duration::minutes(DEFAULT_STALE_AFTER_MINUTES)
            }
        }
    }

    /// Same settings with no simulated latency. Used by tests and tooling.
    pub fn without_delay(mut self) -> Self {
        self.fetch_delay_ms = 0;
        self.student_delay_ms = 0;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.page_size, 10);
        assert_eq!(config.max_pages, 10);
        assert_eq!(config.stale_after(), chrono::Duration::hours(1));
        assert_eq!(config.fetch_delay(), Duration::from_millis(800));
    }

    #[test]
    fn test_partial_override_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, r#"{"pageSize": 25}"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.page_size, 25);
        assert_eq!(config.max_pages, DEFAULT_MAX_PAGES);
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);
        let config = Config {
            page_size: 5,
            stale_after_minutes: 15,
            ..Config::default()
        };

        config.save_to(&path).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("\"staleAfterMinutes\": 15"));
        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_cache_dir_is_app_scoped() {
        // Some CI environments have no cache directory
        let Ok(dir) = Config::cache_dir() else {
            return;
        };
        assert!(dir.ends_with(APP_NAME));
    }

    #[test]
    fn test_invalid_stale_after_uses_default() {
        let default = chrono::Duration::minutes(DEFAULT_STALE_AFTER_MINUTES);
        for minutes in [-5, i64::MAX] {
            let config = Config {
                stale_after_minutes: minutes,
                ..Config::default()
            };
            assert_eq!(config.stale_after(), default);
        }

        let zero = Config {
            stale_after_minutes: 0,
            ..Config::default()
        };
        assert_eq!(zero.stale_after(), chrono::Duration::zero());
    }

    #[test]
    fn test_invalid_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "not json").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}
