//! Snapfolio - snapshot-based portfolio valuation and analytics
//!
//! This library values a portfolio recorded as dated snapshots of asset
//! values, converts them into a display currency, and derives growth,
//! Modified Dietz, time-weighted and annualized returns as well as
//! target-allocation rebalancing suggestions.

pub mod config;
pub mod engine;
pub mod error;
pub mod fx;
pub mod reports;
pub mod store;
pub mod utils;

pub use config::{AppConfig, EngineConfig};
pub use engine::{Dashboard, Engine, PeriodMetrics};
pub use error::PortfolioError;
pub use store::{MemoryStore, PortfolioDocument, PortfolioSource};
