use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod formatters;

#[derive(Parser)]
#[command(name = "snapfolio")]
#[command(
    version,
    about = "Snapshot-based portfolio tracker with valuation, performance and rebalancing analytics"
)]
#[command(
    long_about = "Value a portfolio recorded as dated snapshots: multi-currency totals, category and platform allocation, growth, Modified Dietz return, time-weighted return, CAGR and target-allocation rebalancing."
)]
pub struct Cli {
    /// Portfolio JSON file (overrides `portfolio_file` from the config)
    #[arg(short, long, global = true)]
    pub file: Option<PathBuf>,

    /// Display currency (overrides `display_currency` from the config)
    #[arg(short, long, global = true)]
    pub currency: Option<String>,

    /// Config file (defaults to $SNAPFOLIO_CONFIG or <config dir>/snapfolio/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Disable colorized/ANSI output
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,

    /// Output results in JSON format
    #[arg(long = "json", global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List snapshots with their totals and cash flows
    Snapshots,

    /// Value a snapshot (latest by default)
    Valuate {
        /// Snapshot date (YYYY-MM-DD)
        #[arg(short, long)]
        snapshot: Option<String>,
    },

    /// Performance metrics for a period
    Performance {
        /// Period: 1M, 3M, 6M, YTD, 1Y, 3Y, 5Y, ALL, YYYY (e.g., 2025), or from:to (YYYY-MM-DD:YYYY-MM-DD)
        #[arg(default_value = "ALL")]
        period: String,

        /// Also list every snapshot in the window
        #[arg(long)]
        points: bool,
    },

    /// Rebalancing suggestions against category targets
    Rebalance,

    /// Overview: latest valuation, period returns and rebalancing summary
    Dashboard,

    /// Exchange-rate tables stored with each snapshot and their age
    Rates,
}
