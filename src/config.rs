use std::path::Path;

use serde::Deserialize;
use tracing_subscriber::{fmt, EnvFilter};

use crate::error::{ConfigError, Result};
use crate::strategy::{CraftingConfig, FlippingConfig, ManipulationConfig, NpcConfig};

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub flipping: FlippingConfig,
    #[serde(default)]
    pub crafting: CraftingConfig,
    #[serde(default)]
    pub manipulation: ManipulationConfig,
    #[serde(default)]
    pub npc: NpcConfig,
    /// Optional path to a JSON recipe file consumed by the crafting engine.
    #[serde(default)]
    pub recipes_path: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NetworkConfig {
    /// Base URL of the market API.
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Seconds a fetched snapshot is reused before re-fetching.
    #[serde(default = "default_snapshot_ttl_secs")]
    pub snapshot_ttl_secs: u64,
}

fn default_api_url() -> String {
    "https://api.hypixel.net".into()
}

fn default_snapshot_ttl_secs() -> u64 {
    60
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            snapshot_ttl_secs: default_snapshot_ttl_secs(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".into()
}

fn default_log_format() -> String {
    "pretty".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        let config: Self = toml::from_str(&content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` when it exists, otherwise fall back to defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    fn validate(&self) -> Result<()> {
        if self.network.api_url.is_empty() {
            return Err(ConfigError::MissingField { field: "api_url" }.into());
        }
        if !(0.0..1.0).contains(&self.flipping.market_share_fraction) {
            return Err(ConfigError::InvalidValue {
                field: "market_share_fraction",
                reason: "must be in [0, 1)".into(),
            }
            .into());
        }
        if !(0.0..1.0).contains(&self.manipulation.tax_rate) {
            return Err(ConfigError::InvalidValue {
                field: "tax_rate",
                reason: "must be in [0, 1)".into(),
            }
            .into());
        }
        Ok(())
    }

    pub fn init_logging(&self) {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&self.logging.level));

        match self.logging.format.as_str() {
            "json" => {
                fmt().json().with_env_filter(filter).init();
            }
            _ => {
                fmt().with_env_filter(filter).init();
            }
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            network: NetworkConfig::default(),
            logging: LoggingConfig::default(),
            flipping: FlippingConfig::default(),
            crafting: CraftingConfig::default(),
            manipulation: ManipulationConfig::default(),
            npc: NpcConfig::default(),
            recipes_path: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_uses_all_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.network.api_url, default_api_url());
        assert_eq!(config.flipping.market_share_fraction, 0.20);
        assert_eq!(config.manipulation.tax_rate, 0.01125);
    }

    #[test]
    fn partial_sections_override_only_their_fields() {
        let config: Config = toml::from_str(
            r#"
            [flipping]
            min_profit_margin = 25.0

            [manipulation]
            hidden_price_multiplier = 1.5
            "#,
        )
        .unwrap();

        assert_eq!(config.flipping.min_profit_margin, 25.0);
        assert_eq!(config.flipping.min_profit_pct, 1.0);
        assert_eq!(config.manipulation.hidden_price_multiplier, 1.5);
        assert_eq!(config.manipulation.display_price_multiplier, 2.5);
    }

    #[test]
    fn out_of_range_tax_rate_is_rejected() {
        let config: Config = toml::from_str("[manipulation]\ntax_rate = 1.5\n").unwrap();
        assert!(config.validate().is_err());
    }
}
