//! Command dispatcher that routes parsed clap commands to their handlers.
//!
//! Every handler receives an [`AppContext`]: the resolved configuration and
//! the loaded portfolio.

mod performance;
mod portfolio;
mod rates;

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};

use crate::cli::{Cli, Commands};
use snapfolio::config::{AppConfig, EngineConfig};
use snapfolio::engine::Engine;
use snapfolio::error::PortfolioError;
use snapfolio::fx::normalize_currency;
use snapfolio::store::MemoryStore;

/// Loaded configuration plus portfolio records
pub struct AppContext {
    pub config: AppConfig,
    pub engine_config: EngineConfig,
    pub store: MemoryStore,
    pub portfolio_path: PathBuf,
}

impl AppContext {
    pub fn load(
        config_path: Option<&Path>,
        file: Option<&Path>,
        currency: Option<&str>,
    ) -> Result<Self> {
        let config = AppConfig::load(config_path)?;
        let mut engine_config = config.engine();

        if let Some(code) = currency {
            let code = normalize_currency(code);
            if code.is_empty() {
                return Err(PortfolioError::ConfigError("--currency is empty".into()).into());
            }
            engine_config.display_currency = code;
        }

        let portfolio_path = file
            .map(Path::to_path_buf)
            .or_else(|| config.portfolio_file.clone())
            .ok_or_else(|| {
                PortfolioError::ConfigError(
                    "no portfolio file: pass --file or set portfolio_file in the config".into(),
                )
            })?;

        let store = MemoryStore::load_from_file(&portfolio_path)?;

        Ok(Self {
            config,
            engine_config,
            store,
            portfolio_path,
        })
    }

    pub fn engine(&self) -> Engine<'_, MemoryStore> {
        Engine::new(&self.store, self.engine_config.clone())
    }

    pub fn currency(&self) -> &str {
        &self.engine_config.display_currency
    }
}

/// Parse a `--snapshot` date argument
pub fn parse_snapshot_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| anyhow!("Invalid snapshot date: {}. Use YYYY-MM-DD format.", value))
}

/// Route a parsed command line to its handler
pub fn dispatch(cli: &Cli) -> Result<()> {
    let ctx = AppContext::load(
        cli.config.as_deref(),
        cli.file.as_deref(),
        cli.currency.as_deref(),
    )
    .context("Failed to load portfolio")?;
    let json_output = cli.json;

    match &cli.command {
        Commands::Snapshots => portfolio::dispatch_snapshots(&ctx, json_output),
        Commands::Valuate { snapshot } => {
            let date = snapshot.as_deref().map(parse_snapshot_date).transpose()?;
            portfolio::dispatch_valuate(&ctx, date, json_output)
        }
        Commands::Performance { period, points } => {
            performance::dispatch_performance(&ctx, period, *points, json_output)
        }
        Commands::Rebalance => portfolio::dispatch_rebalance(&ctx, json_output),
        Commands::Dashboard => portfolio::dispatch_dashboard(&ctx, json_output),
        Commands::Rates => rates::dispatch_rates(&ctx, json_output),
    }
}
