//! Application configuration.

use moonitor_alerts::SchedulerConfig;
use moonitor_cache::CacheConfig;
use moonitor_feeds::CoinGeckoConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid configuration in {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Market data provider settings.
    pub provider: ProviderSettings,
    /// Cache sizing.
    pub cache: CacheSettings,
    /// Alert check timing.
    pub scheduler: SchedulerConfig,
    /// SQLite URL of the settings database.
    pub database_url: String,
    /// Logging level.
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            provider: ProviderSettings::default(),
            cache: CacheSettings::default(),
            scheduler: SchedulerConfig::default(),
            database_url: "sqlite://moonitor.db".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Load from a JSON file. A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Apply overrides from the environment.
    /// Uses MOONITOR_DATABASE_URL.
    pub fn apply_env(&mut self) {
        if let Ok(url) = std::env::var("MOONITOR_DATABASE_URL") {
            if !url.is_empty() {
                self.database_url = url;
            }
        }
    }
}

/// Provider settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    /// API root URL.
    pub base_url: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        let defaults = CoinGeckoConfig::default();
        Self {
            base_url: defaults.base_url,
            timeout_secs: defaults.timeout.as_secs(),
        }
    }
}

impl From<&ProviderSettings> for CoinGeckoConfig {
    fn from(settings: &ProviderSettings) -> Self {
        CoinGeckoConfig {
            base_url: settings.base_url.clone(),
            timeout: Duration::from_secs(settings.timeout_secs.max(1)),
            ..Default::default()
        }
    }
}

/// Cache settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Assets kept in the cache; `null` keeps everything.
    pub max_assets: Option<usize>,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            max_assets: CacheConfig::default().max_assets,
        }
    }
}

impl From<&CacheSettings> for CacheConfig {
    fn from(settings: &CacheSettings) -> Self {
        match settings.max_assets {
            Some(max_assets) => CacheConfig::bounded(max_assets),
            None => CacheConfig::unbounded(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_app_config_default() {
        let config = AppConfig::default();
        assert_eq!(config.provider.base_url, "https://api.coingecko.com/api/v3");
        assert_eq!(config.cache.max_assets, Some(64));
        assert_eq!(config.scheduler.check_interval_secs, 30);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let config = AppConfig::load("/nonexistent/moonitor/config.json").unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_partial_file() {
        let path = std::env::temp_dir().join(format!("moonitor-config-{}.json", std::process::id()));
        std::fs::write(
            &path,
            r#"{"cache": {"max_assets": null}, "scheduler": {"background_budget_secs": 5}}"#,
        )
        .unwrap();

        let config = AppConfig::load(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(config.cache.max_assets, None);
        assert_eq!(config.scheduler.background_budget_secs, 5);
        assert_eq!(config.scheduler.background_interval_secs, 900);
        assert_eq!(config.database_url, "sqlite://moonitor.db");
    }

    #[test]
    fn test_invalid_file() {
        let path = std::env::temp_dir().join(format!("moonitor-bad-{}.json", std::process::id()));
        std::fs::write(&path, "{ not json").unwrap();

        let result = AppConfig::load(&path);
        let _ = std::fs::remove_file(&path);

        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_settings_conversion() {
        let provider = ProviderSettings {
            base_url: "http://localhost:8080".to_string(),
            timeout_secs: 3,
        };
        let config: CoinGeckoConfig = (&provider).into();
        assert_eq!(config.base_url, "http://localhost:8080");
        assert_eq!(config.timeout, Duration::from_secs(3));
        assert_eq!(config.ticker_limit, 30);

        let cache: CacheConfig = (&CacheSettings { max_assets: None }).into();
        assert_eq!(cache, CacheConfig::unbounded());
    }
}
