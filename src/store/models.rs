use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::fx::{normalize_currency, RateTable};

/// Label used for the synthetic bucket holding assets without a category
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Label used for assets without a platform
pub const UNSPECIFIED_PLATFORM: &str = "Unspecified";

/// Asset tracked across snapshots (a holding on some platform)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Asset {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub platform: String,
    /// Empty means "same as the display currency"
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub category_id: Option<i64>,
}

impl Asset {
    /// Currency the asset's values are recorded in, falling back to the
    /// display currency when none is set.
    pub fn effective_currency(&self, display_currency: &str) -> String {
        let own = normalize_currency(&self.currency);
        if own.is_empty() {
            normalize_currency(display_currency)
        } else {
            own
        }
    }

    pub fn platform_label(&self) -> &str {
        let trimmed = self.platform.trim();
        if trimmed.is_empty() {
            UNSPECIFIED_PLATFORM
        } else {
            trimmed
        }
    }
}

/// Allocation category (e.g. "Equities", "Bonds")
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Category {
    pub id: i64,
    pub name: String,
    /// Target allocation in percent (0-100), if the user set one
    #[serde(default)]
    pub target_percentage: Option<Decimal>,
    #[serde(default)]
    pub display_order: i32,
}

/// Point-in-time portfolio record
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Snapshot {
    pub id: i64,
    pub date: NaiveDate,
}

/// Market value of one asset at one snapshot, in the asset's own currency
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SnapshotAssetValue {
    pub snapshot_id: i64,
    pub asset_id: i64,
    pub value: Decimal,
}

/// External deposit (positive) or withdrawal (negative) at a snapshot's date
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CashFlowOperation {
    pub snapshot_id: i64,
    pub description: String,
    pub amount: Decimal,
}

/// Exchange rates captured for a snapshot.
///
/// `rates` maps a currency code to the units of that currency per one unit
/// of `base_currency`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExchangeRate {
    pub snapshot_id: i64,
    pub base_currency: String,
    pub rates: BTreeMap<String, Decimal>,
    pub fetched_at: Option<DateTime<Utc>>,
}

impl ExchangeRate {
    pub fn rate_table(&self) -> RateTable {
        RateTable::new(&self.base_currency, self.rates.clone())
    }
}
