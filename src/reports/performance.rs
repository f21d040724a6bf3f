use anyhow::{anyhow, Result};
use chrono::{Datelike, Months, NaiveDate};
use rust_decimal::{Decimal, MathematicalOps};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

const DAYS_PER_YEAR: i64 = 365;

/// Look-back window, resolved against the latest snapshot's date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Period {
    OneMonth,
    ThreeMonths,
    SixMonths,
    Ytd, // Since January 1st of the latest snapshot's year
    OneYear,
    ThreeYears,
    FiveYears,
    AllTime, // First to last snapshot
    Custom { from: NaiveDate, to: NaiveDate },
}

impl Period {
    /// Windows shown on the dashboard
    pub fn standard() -> [Period; 5] {
        [
            Period::OneMonth,
            Period::ThreeMonths,
            Period::Ytd,
            Period::OneYear,
            Period::AllTime,
        ]
    }

    pub fn label(&self) -> String {
        match self {
            Period::OneMonth => "1M".to_string(),
            Period::ThreeMonths => "3M".to_string(),
            Period::SixMonths => "6M".to_string(),
            Period::Ytd => "YTD".to_string(),
            Period::OneYear => "1Y".to_string(),
            Period::ThreeYears => "3Y".to_string(),
            Period::FiveYears => "5Y".to_string(),
            Period::AllTime => "ALL".to_string(),
            Period::Custom { from, to } => format!("{}:{}", from, to),
        }
    }

    /// Concrete date range given the first and latest snapshot dates
    pub fn resolve(&self, first: NaiveDate, latest: NaiveDate) -> DateRange {
        let months_back = |n: u32| {
            let begin = latest.checked_sub_months(Months::new(n)).unwrap_or(first);
            DateRange::new(begin, latest)
        };

        match *self {
            Period::OneMonth => months_back(1),
            Period::ThreeMonths => months_back(3),
            Period::SixMonths => months_back(6),
            Period::OneYear => months_back(12),
            Period::ThreeYears => months_back(36),
            Period::FiveYears => months_back(60),
            Period::Ytd => {
                let begin = NaiveDate::from_ymd_opt(latest.year(), 1, 1).unwrap_or(first);
                DateRange::new(begin, latest)
            }
            Period::AllTime => DateRange::new(first, latest),
            Period::Custom { from, to } => DateRange::new(from, to),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Parse a period string (1M, 3M, 6M, YTD, 1Y, 3Y, 5Y, ALL, YYYY, or from:to)
impl FromStr for Period {
    type Err = anyhow::Error;

    fn from_str(period: &str) -> Result<Self> {
        let upper = period.trim().to_uppercase();
        match upper.as_str() {
            "1M" => Ok(Period::OneMonth),
            "3M" => Ok(Period::ThreeMonths),
            "6M" => Ok(Period::SixMonths),
            "YTD" => Ok(Period::Ytd),
            "1Y" | "ONEYEAR" => Ok(Period::OneYear),
            "3Y" => Ok(Period::ThreeYears),
            "5Y" => Ok(Period::FiveYears),
            "ALL" | "ALLTIME" => Ok(Period::AllTime),
            _ => {
                // Year shorthand: YYYY -> YYYY-01-01:YYYY-12-31
                if let Ok(year) = upper.parse::<i32>() {
                    if (1900..=2100).contains(&year) {
                        let from = NaiveDate::from_ymd_opt(year, 1, 1)
                            .ok_or_else(|| anyhow!("Invalid year: {}", year))?;
                        let to = NaiveDate::from_ymd_opt(year, 12, 31)
                            .ok_or_else(|| anyhow!("Invalid year: {}", year))?;
                        return Ok(Period::Custom { from, to });
                    }
                }

                // Custom range: YYYY-MM-DD:YYYY-MM-DD
                if let Some((from_str, to_str)) = upper.split_once(':') {
                    let from = NaiveDate::parse_from_str(from_str, "%Y-%m-%d").map_err(|_| {
                        anyhow!("Invalid from date: {}. Use YYYY-MM-DD format.", from_str)
                    })?;
                    let to = NaiveDate::parse_from_str(to_str, "%Y-%m-%d").map_err(|_| {
                        anyhow!("Invalid to date: {}. Use YYYY-MM-DD format.", to_str)
                    })?;
                    if from > to {
                        anyhow::bail!("Custom period 'from' must be <= 'to'");
                    }
                    Ok(Period::Custom { from, to })
                } else {
                    Err(anyhow!(
                        "Invalid period '{}'. Use: 1M, 3M, 6M, YTD, 1Y, 3Y, 5Y, ALL, YYYY, or from:to (YYYY-MM-DD:YYYY-MM-DD)",
                        period
                    ))
                }
            }
        }
    }
}

/// Inclusive calendar window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub begin: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(begin: NaiveDate, end: NaiveDate) -> Self {
        Self { begin, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.begin <= date && date <= self.end
    }
}

/// A valued snapshot: total in display currency plus the net external cash
/// flow recorded at it
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistoryPoint {
    pub snapshot_id: i64,
    pub date: NaiveDate,
    pub value: Decimal,
    pub cash_flow: Decimal,
}

/// Point of a performance series
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub snapshot_id: i64,
    pub date: NaiveDate,
    pub value: Decimal,
    pub cash_flow: Decimal,
    /// Return since the previous point (percent); `None` at the first point
    /// and where the previous value was zero
    pub period_return: Option<Decimal>,
    /// Chained return since the first point of the window (percent);
    /// `None` from the point where the chain leaves `Decimal` range
    pub cumulative_twr: Option<Decimal>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CashFlowSummary {
    pub total_deposits: Decimal,
    pub total_withdrawals: Decimal,
    pub net_flow: Decimal,
    pub flow_count: usize,
}

/// Metrics over one window of the snapshot history.
///
/// All rates are percentages. Every metric is `None` when the window holds
/// fewer than two snapshots.
#[derive(Debug, Clone, Serialize)]
pub struct PerformanceSeries {
    /// Requested window; `None` means the whole history
    pub range: Option<DateRange>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub start_value: Option<Decimal>,
    pub end_value: Option<Decimal>,
    pub growth_rate: Option<Decimal>,
    pub return_rate: Option<Decimal>,
    pub cumulative_twr: Option<Decimal>,
    pub cagr: Option<Decimal>,
    /// `end - start - net flows`, in display currency
    pub absolute_gain: Option<Decimal>,
    pub cash_flows: CashFlowSummary,
    /// Sub-periods skipped by the TWR chain because they started at zero
    pub undefined_periods: usize,
    pub points: Vec<SeriesPoint>,
}

impl PerformanceSeries {
    pub fn is_available(&self) -> bool {
        self.points.len() >= 2
    }
}

fn to_pct(fraction: Decimal) -> Option<Decimal> {
    fraction.checked_mul(Decimal::ONE_HUNDRED)
}

fn to_fraction(pct: Decimal) -> Option<Decimal> {
    pct.checked_div(Decimal::ONE_HUNDRED)
}

/// `factor * (1 + r%)`, `None` on overflow
fn grow_factor(factor: Decimal, pct: Decimal) -> Option<Decimal> {
    factor.checked_mul(Decimal::ONE.checked_add(to_fraction(pct)?)?)
}

/// Points whose date falls inside `range`: the first at/after `begin`
/// through the last at/before `end`. `history` must be sorted by date.
pub fn select_window(history: &[HistoryPoint], range: DateRange) -> &[HistoryPoint] {
    let start = history.partition_point(|p| p.date < range.begin);
    let end = history.partition_point(|p| p.date <= range.end);
    if start >= end {
        return &[];
    }
    &history[start..end]
}

/// Return of one sub-period in percent, the cash flow landing at its end:
/// `(V_i - V_{i-1} - CF_i) / V_{i-1}`. `None` when `V_{i-1}` is zero.
pub fn sub_period_return(
    previous_value: Decimal,
    value: Decimal,
    cash_flow: Decimal,
) -> Option<Decimal> {
    if previous_value.is_zero() {
        return None;
    }
    value
        .checked_sub(previous_value)?
        .checked_sub(cash_flow)?
        .checked_div(previous_value)
        .and_then(to_pct)
}

/// Chain percentage returns multiplicatively: `Π(1 + r) - 1`.
/// `None` when the product overflows.
pub fn chain_returns<I>(returns: I) -> Option<Decimal>
where
    I: IntoIterator<Item = Decimal>,
{
    let factor = returns
        .into_iter()
        .try_fold(Decimal::ONE, |acc, r| grow_factor(acc, r))?;
    to_pct(factor.checked_sub(Decimal::ONE)?)
}

/// Combine the cumulative returns of two adjacent windows
pub fn link_returns(first: Decimal, second: Decimal) -> Option<Decimal> {
    chain_returns([first, second])
}

/// Cumulative time-weighted return (TWR) over consecutive snapshots
///
/// Each pair of neighbouring snapshots forms a sub-period whose return
/// excludes the cash flow recorded at its closing snapshot. Chaining the
/// sub-period returns removes the effect of deposit size and timing:
/// TWR = (1 + r1) * (1 + r2) * ... - 1
///
/// Example:
/// - 100k -> 110k, no flows: r1 = 10%
/// - 110k -> 165k with a 50k deposit at the end: r2 = (165 - 110 - 50) / 110 = 4.54%
/// - TWR: (1.10 * 1.0454) - 1 = 15.00%
///
/// Sub-periods starting from a zero value contribute nothing. `None` with
/// fewer than two points or when the chain overflows.
pub fn time_weighted_return(points: &[HistoryPoint]) -> Option<Decimal> {
    if points.len() < 2 {
        return None;
    }
    let returns = points
        .windows(2)
        .filter_map(|w| sub_period_return(w[0].value, w[1].value, w[1].cash_flow));
    chain_returns(returns)
}

/// Simple change of total value, deposits and withdrawals included
pub fn growth_rate(points: &[HistoryPoint]) -> Option<Decimal> {
    let (first, last) = endpoints(points)?;
    if first.value.is_zero() {
        return None;
    }
    last.value
        .checked_sub(first.value)?
        .checked_div(first.value)
        .and_then(to_pct)
}

/// Modified Dietz return over the window
///
/// `(V_end - V_begin - ΣCF) / (V_begin + Σ(CF * w))` where each flow is
/// weighted by the share of the window remaining after the snapshot it was
/// recorded at: `w = (end - day) / (end - begin)`. Flows recorded at the
/// opening snapshot are part of `V_begin` and are left out.
pub fn modified_dietz_return(points: &[HistoryPoint]) -> Option<Decimal> {
    let (first, last) = endpoints(points)?;
    let span = (last.date - first.date).num_days();
    if span <= 0 {
        return None;
    }
    let span = Decimal::from(span);

    let mut net_flow = Decimal::ZERO;
    let mut weighted_flow = Decimal::ZERO;
    for p in &points[1..] {
        if p.cash_flow.is_zero() {
            continue;
        }
        let remaining = Decimal::from((last.date - p.date).num_days());
        net_flow = net_flow.checked_add(p.cash_flow)?;
        let weighted = p.cash_flow.checked_mul(remaining)?.checked_div(span)?;
        weighted_flow = weighted_flow.checked_add(weighted)?;
    }

    let denominator = first.value.checked_add(weighted_flow)?;
    if denominator.is_zero() {
        return None;
    }
    last.value
        .checked_sub(first.value)?
        .checked_sub(net_flow)?
        .checked_div(denominator)
        .and_then(to_pct)
}

/// Compound annual growth rate of total value, cash flows included
///
/// CAGR = (V_last / V_first) ^ (365 / days) - 1
pub fn cagr(points: &[HistoryPoint]) -> Option<Decimal> {
    let (first, last) = endpoints(points)?;
    let days = (last.date - first.date).num_days();
    if days <= 0 || first.value <= Decimal::ZERO {
        return None;
    }
    if last.value.is_zero() {
        return Some(-Decimal::ONE_HUNDRED);
    }
    if last.value < Decimal::ZERO {
        return None;
    }

    let ratio = last.value.checked_div(first.value)?;
    let exponent = Decimal::from(DAYS_PER_YEAR).checked_div(Decimal::from(days))?;
    let growth = ratio.checked_powd(exponent)?;
    to_pct(growth.checked_sub(Decimal::ONE)?)
}

/// Summarize the flows recorded after the opening snapshot
pub fn summarize_cash_flows(points: &[HistoryPoint]) -> CashFlowSummary {
    let mut summary = CashFlowSummary::default();
    for p in points.iter().skip(1) {
        if p.cash_flow > Decimal::ZERO {
            summary.total_deposits += p.cash_flow;
        } else if p.cash_flow < Decimal::ZERO {
            summary.total_withdrawals += -p.cash_flow;
        } else {
            continue;
        }
        summary.flow_count += 1;
    }
    summary.net_flow = summary.total_deposits - summary.total_withdrawals;
    summary
}

fn endpoints(points: &[HistoryPoint]) -> Option<(&HistoryPoint, &HistoryPoint)> {
    if points.len() < 2 {
        return None;
    }
    Some((points.first()?, points.last()?))
}

fn build_series_points(points: &[HistoryPoint]) -> (Vec<SeriesPoint>, usize) {
    let mut series = Vec::with_capacity(points.len());
    let mut undefined = 0;
    // `None` once the chain has overflowed; it stays undefined afterwards
    let mut factor = Some(Decimal::ONE);

    for (idx, p) in points.iter().enumerate() {
        let period_return = if idx == 0 {
            None
        } else {
            let r = sub_period_return(points[idx - 1].value, p.value, p.cash_flow);
            match r {
                Some(r) => factor = factor.and_then(|f| grow_factor(f, r)),
                None => undefined += 1,
            }
            r
        };
        series.push(SeriesPoint {
            snapshot_id: p.snapshot_id,
            date: p.date,
            value: p.value,
            cash_flow: p.cash_flow,
            period_return,
            cumulative_twr: factor
                .and_then(|f| f.checked_sub(Decimal::ONE))
                .and_then(to_pct),
        });
    }

    (series, undefined)
}

/// Compute every metric over `range` (or the whole history)
pub fn performance_series(history: &[HistoryPoint], range: Option<DateRange>) -> PerformanceSeries {
    let window = match range {
        Some(r) => select_window(history, r),
        None => history,
    };

    let (points, undefined_periods) = build_series_points(window);
    let available = window.len() >= 2;
    debug!(
        "Performance window {:?}: {} snapshots, available = {}",
        range,
        window.len(),
        available
    );

    let cash_flows = summarize_cash_flows(window);
    let (start_value, end_value) = match endpoints(window) {
        Some((first, last)) => (Some(first.value), Some(last.value)),
        None => (None, None),
    };

    PerformanceSeries {
        range,
        start_date: window.first().map(|p| p.date),
        end_date: window.last().map(|p| p.date),
        start_value,
        end_value,
        growth_rate: growth_rate(window),
        return_rate: modified_dietz_return(window),
        cumulative_twr: time_weighted_return(window),
        cagr: cagr(window),
        absolute_gain: match (start_value, end_value) {
            (Some(s), Some(e)) => e
                .checked_sub(s)
                .and_then(|gain| gain.checked_sub(cash_flows.net_flow)),
            _ => None,
        },
        cash_flows,
        undefined_periods,
        points,
    }
}

/// Metrics for a look-back period ending at the latest snapshot
pub fn period_performance(history: &[HistoryPoint], period: Period) -> PerformanceSeries {
    let range = match (history.first(), history.last()) {
        (Some(first), Some(last)) => period.resolve(first.date, last.date),
        _ => {
            return performance_series(history, None);
        }
    };
    performance_series(history, Some(range))
}
