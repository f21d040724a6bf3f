use chrono::NaiveDate;
use itertools::Itertools;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use tracing::warn;

use crate::fx::{convert_or_raw, normalize_currency, RateTable};
use crate::store::{Asset, Category, Snapshot, SnapshotAssetValue, UNCATEGORIZED};

/// One asset's contribution to a snapshot
#[derive(Debug, Clone, Serialize)]
pub struct AssetValuation {
    pub asset_id: i64,
    pub name: String,
    pub platform: String,
    pub category_id: Option<i64>,
    pub currency: String,
    /// Value in the asset's own currency
    pub raw_value: Decimal,
    /// Value in the display currency, or the raw value when unconverted
    pub value: Decimal,
    pub converted: bool,
}

/// Value held in one category (or the Uncategorized bucket)
#[derive(Debug, Clone, Serialize)]
pub struct CategoryAllocation {
    /// `None` for the Uncategorized bucket
    pub category_id: Option<i64>,
    pub name: String,
    pub value: Decimal,
    pub percentage: Decimal,
}

impl CategoryAllocation {
    pub fn is_uncategorized(&self) -> bool {
        self.category_id.is_none()
    }
}

/// Value held on one platform
#[derive(Debug, Clone, Serialize)]
pub struct PlatformAllocation {
    pub platform: String,
    pub value: Decimal,
    pub percentage: Decimal,
}

/// Composite valuation of a single snapshot
#[derive(Debug, Clone, Serialize)]
pub struct Valuation {
    pub snapshot_id: i64,
    pub date: NaiveDate,
    pub display_currency: String,
    pub total_value: Decimal,
    pub assets: Vec<AssetValuation>,
    pub categories: Vec<CategoryAllocation>,
    pub platforms: Vec<PlatformAllocation>,
    pub unconverted_asset_ids: Vec<i64>,
}

impl Valuation {
    pub fn category(&self, category_id: i64) -> Option<&CategoryAllocation> {
        self.categories
            .iter()
            .find(|c| c.category_id == Some(category_id))
    }

    pub fn uncategorized(&self) -> Option<&CategoryAllocation> {
        self.categories.iter().find(|c| c.is_uncategorized())
    }

    pub fn platform(&self, platform: &str) -> Option<&PlatformAllocation> {
        self.platforms.iter().find(|p| p.platform == platform)
    }

    pub fn has_unconverted(&self) -> bool {
        !self.unconverted_asset_ids.is_empty()
    }
}

/// `part / total * 100`, or 0 for an empty total
pub fn percentage_of(part: Decimal, total: Decimal) -> Decimal {
    if total.is_zero() {
        return Decimal::ZERO;
    }
    part.checked_div(total)
        .map(|ratio| ratio * Decimal::ONE_HUNDRED)
        .unwrap_or(Decimal::ZERO)
}

/// Value a snapshot from its own direct records.
///
/// Nothing from other snapshots is consulted: categories and platforms
/// without records here are worth zero at this date.
pub fn valuate(
    snapshot: &Snapshot,
    values: &[SnapshotAssetValue],
    assets: &[Asset],
    categories: &[Category],
    rates: Option<&RateTable>,
    display_currency: &str,
) -> Valuation {
    let display_currency = normalize_currency(display_currency);
    let assets_by_id: HashMap<i64, &Asset> = assets.iter().map(|a| (a.id, a)).collect();

    let mut asset_rows = Vec::with_capacity(values.len());
    let mut unconverted = Vec::new();

    for record in values {
        let row = match assets_by_id.get(&record.asset_id) {
            Some(asset) => {
                let currency = asset.effective_currency(&display_currency);
                let outcome = convert_or_raw(record.value, &currency, &display_currency, rates);
                if !outcome.converted {
                    warn!(
                        "No {} rate at snapshot {}; using unconverted value for asset '{}'",
                        currency, snapshot.date, asset.name
                    );
                }
                AssetValuation {
                    asset_id: asset.id,
                    name: asset.name.clone(),
                    platform: asset.platform_label().to_string(),
                    category_id: asset.category_id,
                    currency,
                    raw_value: record.value,
                    value: outcome.value,
                    converted: outcome.converted,
                }
            }
            None => {
                warn!(
                    "Snapshot {} values unknown asset {}; counting it as uncategorized",
                    snapshot.date, record.asset_id
                );
                AssetValuation {
                    asset_id: record.asset_id,
                    name: format!("Asset #{}", record.asset_id),
                    platform: crate::store::UNSPECIFIED_PLATFORM.to_string(),
                    category_id: None,
                    currency: display_currency.clone(),
                    raw_value: record.value,
                    value: record.value,
                    converted: true,
                }
            }
        };
        if !row.converted {
            unconverted.push(row.asset_id);
        }
        asset_rows.push(row);
    }

    let total_value: Decimal = asset_rows.iter().map(|a| a.value).sum();

    let category_rows = build_category_allocations(&asset_rows, categories, total_value);
    let platform_rows = build_platform_allocations(&asset_rows, total_value);

    Valuation {
        snapshot_id: snapshot.id,
        date: snapshot.date,
        display_currency,
        total_value,
        assets: asset_rows,
        categories: category_rows,
        platforms: platform_rows,
        unconverted_asset_ids: unconverted,
    }
}

fn build_category_allocations(
    asset_rows: &[AssetValuation],
    categories: &[Category],
    total_value: Decimal,
) -> Vec<CategoryAllocation> {
    let known: HashMap<i64, &Category> = categories.iter().map(|c| (c.id, c)).collect();

    let mut by_category: HashMap<i64, Decimal> = HashMap::new();
    let mut uncategorized = Decimal::ZERO;
    let mut has_uncategorized = false;

    for row in asset_rows {
        match row.category_id.filter(|id| known.contains_key(id)) {
            Some(id) => *by_category.entry(id).or_insert(Decimal::ZERO) += row.value,
            None => {
                uncategorized += row.value;
                has_uncategorized = true;
            }
        }
    }

    let mut rows: Vec<CategoryAllocation> = categories
        .iter()
        .sorted_by(|a, b| {
            a.display_order
                .cmp(&b.display_order)
                .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        })
        .map(|c| {
            let value = by_category.get(&c.id).copied().unwrap_or(Decimal::ZERO);
            CategoryAllocation {
                category_id: Some(c.id),
                name: c.name.clone(),
                value,
                percentage: percentage_of(value, total_value),
            }
        })
        .collect();

    if has_uncategorized {
        rows.push(CategoryAllocation {
            category_id: None,
            name: UNCATEGORIZED.to_string(),
            value: uncategorized,
            percentage: percentage_of(uncategorized, total_value),
        });
    }

    rows
}

fn build_platform_allocations(
    asset_rows: &[AssetValuation],
    total_value: Decimal,
) -> Vec<PlatformAllocation> {
    let mut by_platform: HashMap<&str, Decimal> = HashMap::new();
    for row in asset_rows {
        *by_platform
            .entry(row.platform.as_str())
            .or_insert(Decimal::ZERO) += row.value;
    }

    by_platform
        .into_iter()
        .sorted_by(|(name_a, value_a), (name_b, value_b)| {
            value_b.cmp(value_a).then_with(|| name_a.cmp(name_b))
        })
        .map(|(platform, value)| PlatformAllocation {
            platform: platform.to_string(),
            value,
            percentage: percentage_of(value, total_value),
        })
        .collect()
}
