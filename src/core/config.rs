use anyhow::{Context, Result};
use directories::ProjectDirs;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};
use tracing::debug;

use crate::core::history::DEFAULT_HISTORY_CAPACITY;

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct PairConfig {
    /// CoinGecko id of the asset, e.g. `cardano`.
    pub asset_id: String,
    pub asset_symbol: String,
    pub fiat: String,
    /// Symbol prefixing fiat prices on the search results page.
    pub fiat_symbol: String,
    /// Symbol prefixing fiat prices on the CoinGecko coin page.
    pub secondary_symbol: String,
}

impl Default for PairConfig {
    fn default() -> Self {
        PairConfig {
            asset_id: "cardano".to_string(),
            asset_symbol: "ADA".to_string(),
            fiat: "CAD".to_string(),
            fiat_symbol: "$".to_string(),
            secondary_symbol: "C$".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct SourceConfig {
    pub base_url: String,
}

impl SourceConfig {
    fn new(base_url: &str) -> Self {
        SourceConfig {
            base_url: base_url.to_string(),
        }
    }
}

/// A source left out of the config file is disabled.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct ProvidersConfig {
    pub google: Option<SourceConfig>,
    pub coingecko_api: Option<SourceConfig>,
    pub coingecko_web: Option<SourceConfig>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            google: Some(SourceConfig::new("https://www.google.ca")),
            coingecko_api: Some(SourceConfig::new("https://api.coingecko.com")),
            coingecko_web: Some(SourceConfig::new("https://www.coingecko.com")),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    pub pair: PairConfig,
    pub providers: ProvidersConfig,
    pub refresh_interval_secs: u64,
    pub request_timeout_secs: u64,
    pub history_capacity: usize,
    pub default_price: Decimal,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            pair: PairConfig::default(),
            providers: ProvidersConfig::default(),
            refresh_interval_secs: 30,
            request_timeout_secs: 5,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            default_price: Decimal::ZERO,
        }
    }
}

impl AppConfig {
    /// Loads the config from the default location, or the built-in defaults
    /// if there is no config file yet.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!(
                "No config at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("org", "adaconv", "adaconv")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs.max(1))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: AppConfig = serde_yaml::from_str("{}").expect("Failed to deserialize");
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.pair.asset_symbol, "ADA");
        assert_eq!(config.pair.fiat, "CAD");
        assert_eq!(config.refresh_interval(), Duration::from_secs(30));
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
        assert_eq!(config.history_capacity, 24);
        assert_eq!(config.default_price, Decimal::ZERO);
        assert_eq!(
            config.providers.google.unwrap().base_url,
            "https://www.google.ca"
        );
    }

    #[test]
    fn test_config_deserialization() {
        let yaml_str = r#"
pair:
  fiat: "USD"
  secondary_symbol: "US$"
providers:
  coingecko_api:
    base_url: "http://example.com/api"
refresh_interval_secs: 60
default_price: "0.75"
"#;

        let config: AppConfig = serde_yaml::from_str(yaml_str).expect("Failed to deserialize");
        assert_eq!(config.pair.fiat, "USD");
        assert_eq!(config.pair.secondary_symbol, "US$");
        assert_eq!(config.pair.asset_id, "cardano");
        assert!(config.providers.google.is_none());
        assert!(config.providers.coingecko_web.is_none());
        assert_eq!(
            config.providers.coingecko_api.unwrap().base_url,
            "http://example.com/api"
        );
        assert_eq!(config.refresh_interval_secs, 60);
        assert_eq!(config.request_timeout_secs, 5);
        assert_eq!(config.default_price, dec!(0.75));
    }

    #[test]
    fn test_load_from_missing_path() {
        let result = AppConfig::load_from_path("/nonexistent/adaconv/config.yaml");
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .starts_with("Failed to read config file")
        );
    }
}
