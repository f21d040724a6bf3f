//! Configuration
//!
//! Settings come from a TOML file:
//!
//! ```toml
//! display_currency = "EUR"
//! epsilon = "0.01"
//! rate_cache_ttl_minutes = 60
//! portfolio_file = "/home/me/portfolio.json"
//! ```
//!
//! Lookup order: explicit path, `SNAPFOLIO_CONFIG`, then
//! `<config dir>/snapfolio/config.toml`. A missing default file means
//! defaults; a missing explicit file is an error.

use anyhow::{anyhow, Context, Result};
use chrono::Duration;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::PortfolioError;
use crate::fx::cache::DEFAULT_TTL_MINUTES;
use crate::fx::normalize_currency;

pub const CONFIG_ENV_VAR: &str = "SNAPFOLIO_CONFIG";
pub const DEFAULT_DISPLAY_CURRENCY: &str = "USD";

/// Parameters threaded into every engine call
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub display_currency: String,
    /// Tolerance for rebalancing decisions and the target-sum check
    pub epsilon: Decimal,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            display_currency: DEFAULT_DISPLAY_CURRENCY.to_string(),
            epsilon: default_epsilon(),
        }
    }
}

impl EngineConfig {
    pub fn with_currency(currency: &str) -> Self {
        Self {
            display_currency: normalize_currency(currency),
            ..Self::default()
        }
    }
}

fn default_epsilon() -> Decimal {
    Decimal::new(1, 2)
}

fn default_currency() -> String {
    DEFAULT_DISPLAY_CURRENCY.to_string()
}

fn default_ttl() -> i64 {
    DEFAULT_TTL_MINUTES
}

/// Application settings as stored on disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    #[serde(default = "default_currency")]
    pub display_currency: String,
    #[serde(default = "default_epsilon")]
    pub epsilon: Decimal,
    #[serde(default = "default_ttl")]
    pub rate_cache_ttl_minutes: i64,
    #[serde(default)]
    pub portfolio_file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            display_currency: default_currency(),
            epsilon: default_epsilon(),
            rate_cache_ttl_minutes: default_ttl(),
            portfolio_file: None,
        }
    }
}

impl AppConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(text)
            .map_err(|e| PortfolioError::ConfigError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if normalize_currency(&self.display_currency).is_empty() {
            return Err(PortfolioError::ConfigError("display_currency is empty".into()).into());
        }
        if self.epsilon < Decimal::ZERO {
            return Err(PortfolioError::ConfigError("epsilon must not be negative".into()).into());
        }
        if self.rate_cache_ttl_minutes <= 0 {
            return Err(PortfolioError::ConfigError(
                "rate_cache_ttl_minutes must be positive".into(),
            )
            .into());
        }
        if Duration::try_minutes(self.rate_cache_ttl_minutes).is_none() {
            return Err(PortfolioError::ConfigError(format!(
                "rate_cache_ttl_minutes {} is out of range",
                self.rate_cache_ttl_minutes
            ))
            .into());
        }
        Ok(())
    }

    /// Load from an explicit path; the file must exist
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(PortfolioError::Io)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        Self::from_toml_str(&text).with_context(|| format!("Invalid config file {:?}", path))
    }

    /// Resolve and load the configuration following the lookup order
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            info!("Using config file: {:?}", path);
            return Self::load_from_file(path);
        }

        if let Ok(env_path) = std::env::var(CONFIG_ENV_VAR) {
            if !env_path.trim().is_empty() {
                info!("Using config file from {}: {}", CONFIG_ENV_VAR, env_path);
                return Self::load_from_file(Path::new(&env_path));
            }
        }

        match default_config_path() {
            Ok(path) if path.exists() => {
                info!("Using config file: {:?}", path);
                Self::load_from_file(&path)
            }
            Ok(path) => {
                debug!("No config file at {:?}; using defaults", path);
                Ok(Self::default())
            }
            Err(e) => {
                debug!("{}; using defaults", e);
                Ok(Self::default())
            }
        }
    }

    pub fn engine(&self) -> EngineConfig {
        EngineConfig {
            display_currency: normalize_currency(&self.display_currency),
            epsilon: self.epsilon,
        }
    }
}

/// `<config dir>/snapfolio/config.toml`
pub fn default_config_path() -> Result<PathBuf> {
    let base = dir_spec::config_home()
        .ok_or_else(|| anyhow!("Could not determine config directory"))?;
    Ok(base.join("snapfolio").join("config.toml"))
}
