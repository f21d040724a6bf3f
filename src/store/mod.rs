// Store module - read-only access to portfolio records

pub mod document;
pub mod models;

use anyhow::Result;
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::{debug, info};

use crate::error::PortfolioError;
pub use document::PortfolioDocument;
pub use models::{
    Asset, CashFlowOperation, Category, ExchangeRate, Snapshot, SnapshotAssetValue, UNCATEGORIZED,
    UNSPECIFIED_PLATFORM,
};

/// Read-only view over persisted portfolio records.
///
/// Implementations own persistence and mutation; the analytics only read.
/// `list_snapshots` must return snapshots sorted ascending by date.
pub trait PortfolioSource {
    fn list_snapshots(&self) -> Result<Vec<Snapshot>>;
    fn asset_values(&self, snapshot_id: i64) -> Result<Vec<SnapshotAssetValue>>;
    fn cash_flows(&self, snapshot_id: i64) -> Result<Vec<CashFlowOperation>>;
    fn exchange_rate(&self, snapshot_id: i64) -> Result<Option<ExchangeRate>>;
    fn list_categories(&self) -> Result<Vec<Category>>;
    fn list_assets(&self) -> Result<Vec<Asset>>;
}

/// In-memory portfolio source, typically loaded from a JSON document
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    snapshots: Vec<Snapshot>,
    values: HashMap<i64, Vec<SnapshotAssetValue>>,
    cash_flows: HashMap<i64, Vec<CashFlowOperation>>,
    rates: HashMap<i64, ExchangeRate>,
    categories: Vec<Category>,
    assets: Vec<Asset>,
}

impl MemoryStore {
    /// Build a store from a document, checking referential integrity
    pub fn from_document(doc: PortfolioDocument) -> Result<Self> {
        validate_document(&doc)?;

        let mut store = MemoryStore {
            categories: doc.categories,
            assets: doc.assets,
            ..Default::default()
        };

        for entry in doc.snapshots {
            let snapshot_id = entry.id;
            store.snapshots.push(Snapshot {
                id: snapshot_id,
                date: entry.date,
            });
            store.values.insert(
                snapshot_id,
                entry
                    .values
                    .into_iter()
                    .map(|v| SnapshotAssetValue {
                        snapshot_id,
                        asset_id: v.asset_id,
                        value: v.value,
                    })
                    .collect(),
            );
            store.cash_flows.insert(
                snapshot_id,
                entry
                    .cash_flows
                    .into_iter()
                    .map(|cf| CashFlowOperation {
                        snapshot_id,
                        description: cf.description,
                        amount: cf.amount,
                    })
                    .collect(),
            );
            if let Some(rate) = entry.exchange_rate {
                store.rates.insert(
                    snapshot_id,
                    ExchangeRate {
                        snapshot_id,
                        base_currency: rate.base_currency,
                        rates: rate.rates,
                        fetched_at: rate.fetched_at,
                    },
                );
            }
        }

        store.snapshots.sort_by_key(|s| s.date);
        debug!(
            "Loaded {} snapshots, {} assets, {} categories",
            store.snapshots.len(),
            store.assets.len(),
            store.categories.len()
        );
        Ok(store)
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        info!("Loading portfolio from: {:?}", path);
        Self::from_document(PortfolioDocument::load_from_file(path)?)
    }

    pub fn snapshot_count(&self) -> usize {
        self.snapshots.len()
    }
}

fn validate_document(doc: &PortfolioDocument) -> Result<()> {
    let mut category_ids = HashSet::new();
    let mut category_names = HashSet::new();
    for c in &doc.categories {
        if !category_ids.insert(c.id) {
            return Err(PortfolioError::ValidationError(format!(
                "duplicate category id {}",
                c.id
            ))
            .into());
        }
        if !category_names.insert(c.name.trim().to_lowercase()) {
            return Err(PortfolioError::ValidationError(format!(
                "duplicate category name '{}'",
                c.name
            ))
            .into());
        }
        if let Some(target) = c.target_percentage {
            if target < Decimal::ZERO || target > Decimal::ONE_HUNDRED {
                return Err(PortfolioError::ValidationError(format!(
                    "category '{}' target {} is outside 0-100",
                    c.name, target
                ))
                .into());
            }
        }
    }

    let mut asset_ids = HashSet::new();
    for a in &doc.assets {
        if !asset_ids.insert(a.id) {
            return Err(
                PortfolioError::ValidationError(format!("duplicate asset id {}", a.id)).into(),
            );
        }
        if let Some(cat) = a.category_id {
            if !category_ids.contains(&cat) {
                return Err(PortfolioError::ValidationError(format!(
                    "asset {} references unknown category {}",
                    a.id, cat
                ))
                .into());
            }
        }
    }

    let mut snapshot_ids = HashSet::new();
    let mut dates = HashSet::new();
    for s in &doc.snapshots {
        if !snapshot_ids.insert(s.id) {
            return Err(
                PortfolioError::ValidationError(format!("duplicate snapshot id {}", s.id)).into(),
            );
        }
        if !dates.insert(s.date) {
            return Err(PortfolioError::ValidationError(format!(
                "more than one snapshot dated {}",
                s.date
            ))
            .into());
        }

        let mut seen = HashSet::new();
        for v in &s.values {
            if !asset_ids.contains(&v.asset_id) {
                return Err(PortfolioError::ValidationError(format!(
                    "snapshot {} values unknown asset {}",
                    s.date, v.asset_id
                ))
                .into());
            }
            if !seen.insert(v.asset_id) {
                return Err(PortfolioError::ValidationError(format!(
                    "snapshot {} has more than one value for asset {}",
                    s.date, v.asset_id
                ))
                .into());
            }
        }
    }

    Ok(())
}

impl PortfolioSource for MemoryStore {
    fn list_snapshots(&self) -> Result<Vec<Snapshot>> {
        Ok(self.snapshots.clone())
    }

    fn asset_values(&self, snapshot_id: i64) -> Result<Vec<SnapshotAssetValue>> {
        Ok(self.values.get(&snapshot_id).cloned().unwrap_or_default())
    }

    fn cash_flows(&self, snapshot_id: i64) -> Result<Vec<CashFlowOperation>> {
        Ok(self.cash_flows.get(&snapshot_id).cloned().unwrap_or_default())
    }

    fn exchange_rate(&self, snapshot_id: i64) -> Result<Option<ExchangeRate>> {
        Ok(self.rates.get(&snapshot_id).cloned())
    }

    fn list_categories(&self) -> Result<Vec<Category>> {
        Ok(self.categories.clone())
    }

    fn list_assets(&self) -> Result<Vec<Asset>> {
        Ok(self.assets.clone())
    }
}
