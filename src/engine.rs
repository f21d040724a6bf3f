//! Analytics entry point
//!
//! `Engine` reads records through a [`PortfolioSource`], runs valuation,
//! performance and rebalancing in dependency order and returns plain
//! result structs. Nothing is cached between calls; callers re-invoke
//! after the underlying data changes.

use anyhow::Result;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use crate::config::EngineConfig;
use crate::error::PortfolioError;
use crate::fx::{RateKey, RateProvider, RateTable};
use crate::reports::performance::{
    performance_series, period_performance, DateRange, HistoryPoint, PerformanceSeries, Period,
};
use crate::reports::rebalancing::{suggest, RebalancingResult};
use crate::reports::valuation::{valuate, Valuation};
use crate::store::{Asset, Category, PortfolioSource, Snapshot};

/// Headline metrics for one look-back period
#[derive(Debug, Clone, Serialize)]
pub struct PeriodMetrics {
    pub period: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub growth_rate: Option<Decimal>,
    pub return_rate: Option<Decimal>,
    pub cumulative_twr: Option<Decimal>,
}

impl PeriodMetrics {
    fn from_series(period: Period, series: &PerformanceSeries) -> Self {
        Self {
            period: period.label(),
            start_date: series.start_date,
            end_date: series.end_date,
            growth_rate: series.growth_rate,
            return_rate: series.return_rate,
            cumulative_twr: series.cumulative_twr,
        }
    }
}

/// Everything the overview screen shows
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub display_currency: String,
    pub snapshot_count: usize,
    pub latest: Option<Valuation>,
    pub periods: Vec<PeriodMetrics>,
    /// Over the whole history
    pub cagr: Option<Decimal>,
    pub rebalancing: RebalancingResult,
}

/// Reference data shared by every snapshot valuation
struct ReferenceData {
    assets: Vec<Asset>,
    categories: Vec<Category>,
}

pub struct Engine<'a, S: PortfolioSource + ?Sized> {
    source: &'a S,
    config: EngineConfig,
    rates: Option<&'a dyn RateProvider>,
}

impl<'a, S: PortfolioSource + ?Sized> Engine<'a, S> {
    pub fn new(source: &'a S, config: EngineConfig) -> Self {
        Self {
            source,
            config,
            rates: None,
        }
    }

    /// Supply rate tables for snapshots that have no stored exchange-rate
    /// record (e.g. a fetch that completed after the snapshot was saved)
    pub fn with_rate_provider(mut self, provider: &'a dyn RateProvider) -> Self {
        self.rates = Some(provider);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn reference_data(&self) -> Result<ReferenceData> {
        Ok(ReferenceData {
            assets: self.source.list_assets()?,
            categories: self.source.list_categories()?,
        })
    }

    fn rate_table_for(&self, snapshot_id: i64) -> Result<Option<RateTable>> {
        if let Some(stored) = self.source.exchange_rate(snapshot_id)? {
            return Ok(Some(stored.rate_table()));
        }
        Ok(self
            .rates
            .and_then(|p| p.rate_table(&RateKey::Snapshot(snapshot_id))))
    }

    fn valuate_with(&self, snapshot: &Snapshot, refs: &ReferenceData) -> Result<Valuation> {
        let values = self.source.asset_values(snapshot.id)?;
        let rates = self.rate_table_for(snapshot.id)?;
        Ok(valuate(
            snapshot,
            &values,
            &refs.assets,
            &refs.categories,
            rates.as_ref(),
            &self.config.display_currency,
        ))
    }

    fn find_snapshot(&self, snapshot_id: i64) -> Result<Snapshot> {
        self.source
            .list_snapshots()?
            .into_iter()
            .find(|s| s.id == snapshot_id)
            .ok_or_else(|| PortfolioError::SnapshotNotFound(format!("id {}", snapshot_id)).into())
    }

    /// Value one snapshot in the configured display currency
    pub fn valuate_snapshot(&self, snapshot_id: i64) -> Result<Valuation> {
        let snapshot = self.find_snapshot(snapshot_id)?;
        self.valuate_with(&snapshot, &self.reference_data()?)
    }

    /// Value the snapshot recorded on `date`
    pub fn valuate_date(&self, date: NaiveDate) -> Result<Valuation> {
        let snapshot = self
            .source
            .list_snapshots()?
            .into_iter()
            .find(|s| s.date == date)
            .ok_or_else(|| PortfolioError::SnapshotNotFound(date.to_string()))?;
        self.valuate_with(&snapshot, &self.reference_data()?)
    }

    /// Valuation of the most recent snapshot, if there is one
    pub fn latest_valuation(&self) -> Result<Option<Valuation>> {
        match self.source.list_snapshots()?.last() {
            Some(snapshot) => Ok(Some(self.valuate_with(snapshot, &self.reference_data()?)?)),
            None => Ok(None),
        }
    }

    /// Every snapshot valued and paired with its net cash flow, oldest first
    pub fn history(&self) -> Result<Vec<HistoryPoint>> {
        let refs = self.reference_data()?;
        let snapshots = self.source.list_snapshots()?;
        let mut points = Vec::with_capacity(snapshots.len());
        for snapshot in &snapshots {
            let valuation = self.valuate_with(snapshot, &refs)?;
            let cash_flow: Decimal = self
                .source
                .cash_flows(snapshot.id)?
                .iter()
                .map(|cf| cf.amount)
                .sum();
            points.push(HistoryPoint {
                snapshot_id: snapshot.id,
                date: snapshot.date,
                value: valuation.total_value,
                cash_flow,
            });
        }
        debug!("Built history of {} snapshots", points.len());
        Ok(points)
    }

    /// Performance over `range`, or over the whole history
    pub fn performance_series(&self, range: Option<DateRange>) -> Result<PerformanceSeries> {
        Ok(performance_series(&self.history()?, range))
    }

    /// Performance over a look-back period ending at the latest snapshot
    pub fn performance_for_period(&self, period: Period) -> Result<PerformanceSeries> {
        Ok(period_performance(&self.history()?, period))
    }

    /// Buy/sell suggestions from the latest snapshot's allocation
    pub fn rebalancing_suggestions(&self) -> Result<RebalancingResult> {
        let categories = self.source.list_categories()?;
        let latest = self.latest_valuation()?;
        Ok(self.rebalance(latest.as_ref(), &categories))
    }

    fn rebalance(&self, latest: Option<&Valuation>, categories: &[Category]) -> RebalancingResult {
        match latest {
            Some(v) => suggest(&v.categories, categories, v.total_value, self.config.epsilon),
            None => suggest(&[], categories, Decimal::ZERO, self.config.epsilon),
        }
    }

    pub fn dashboard(&self) -> Result<Dashboard> {
        let history = self.history()?;
        let latest = self.latest_valuation()?;
        let categories = self.source.list_categories()?;

        let periods = Period::standard()
            .into_iter()
            .map(|p| PeriodMetrics::from_series(p, &period_performance(&history, p)))
            .collect();
        let cagr = performance_series(&history, None).cagr;
        let rebalancing = self.rebalance(latest.as_ref(), &categories);

        Ok(Dashboard {
            display_currency: self.config.display_currency.clone(),
            snapshot_count: history.len(),
            latest,
            periods,
            cagr,
            rebalancing,
        })
    }
}
