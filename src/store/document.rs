//! JSON portfolio document
//!
//! The on-disk layout nests each snapshot's records under the snapshot:
//!
//! ```json
//! {
//!   "categories": [{ "id": 1, "name": "Equities", "target_percentage": "60" }],
//!   "assets": [{ "id": 1, "name": "VTI", "platform": "Broker", "currency": "USD", "category_id": 1 }],
//!   "snapshots": [{
//!     "id": 1,
//!     "date": "2024-01-31",
//!     "values": [{ "asset_id": 1, "value": "1000" }],
//!     "cash_flows": [{ "description": "deposit", "amount": "100" }],
//!     "exchange_rate": { "base_currency": "USD", "rates": { "EUR": "0.92" } }
//!   }]
//! }
//! ```

use anyhow::Context;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use super::models::{Asset, Category};
use crate::error::{PortfolioError, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PortfolioDocument {
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub assets: Vec<Asset>,
    #[serde(default)]
    pub snapshots: Vec<SnapshotEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotEntry {
    pub id: i64,
    pub date: NaiveDate,
    #[serde(default)]
    pub values: Vec<ValueEntry>,
    #[serde(default)]
    pub cash_flows: Vec<CashFlowEntry>,
    #[serde(default)]
    pub exchange_rate: Option<RateEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValueEntry {
    pub asset_id: i64,
    pub value: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashFlowEntry {
    #[serde(default)]
    pub description: String,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateEntry {
    pub base_currency: String,
    #[serde(default)]
    pub rates: BTreeMap<String, Decimal>,
    #[serde(default)]
    pub fetched_at: Option<DateTime<Utc>>,
}

impl PortfolioDocument {
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| PortfolioError::LoadError(e.to_string()))
            .context("Failed to parse portfolio document")
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .map_err(PortfolioError::Io)
            .with_context(|| format!("Failed to read portfolio file {:?}", path))?;
        Self::from_json_str(&json).with_context(|| format!("Invalid portfolio file {:?}", path))
    }
}
