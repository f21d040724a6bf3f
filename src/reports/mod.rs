// Reports module - valuation, performance and rebalancing calculators

pub mod performance;
pub mod rebalancing;
pub mod valuation;

pub use performance::{
    performance_series, period_performance, CashFlowSummary, DateRange, HistoryPoint,
    PerformanceSeries, Period, SeriesPoint,
};
pub use rebalancing::{suggest, RebalanceAction, RebalancingResult, RebalancingSuggestion};
pub use valuation::{valuate, CategoryAllocation, PlatformAllocation, Valuation};
