//! Output formatting module for CLI display
//!
//! This module handles all terminal output formatting, separating
//! the concerns of data calculation from presentation.

use chrono::{DateTime, Duration, Utc};
use colored::Colorize;
use rust_decimal::Decimal;
use snapfolio::engine::Dashboard;
use snapfolio::reports::{PerformanceSeries, RebalanceAction, RebalancingResult, Valuation};
use snapfolio::utils::{
    format_amount, format_money, format_optional_money, format_optional_percent, format_percent,
    NOT_AVAILABLE,
};
use tabled::{
    settings::{object::Columns, Alignment, Style},
    Table, Tabled,
};

/// One line of the snapshot listing
#[derive(Debug, Clone)]
pub struct SnapshotLine {
    pub id: i64,
    pub date: String,
    pub total_value: Decimal,
    pub cash_flow: Decimal,
    pub unconverted: usize,
}

/// One line of the exchange-rate listing
#[derive(Debug, Clone)]
pub struct RateLine {
    pub snapshot_id: i64,
    pub date: String,
    pub base_currency: Option<String>,
    pub currencies: Vec<String>,
    pub fetched_at: Option<DateTime<Utc>>,
    pub age: Option<Duration>,
    pub stale: bool,
}

fn signed_percent(value: Option<Decimal>) -> String {
    match value {
        Some(v) if v >= Decimal::ZERO => format_percent(v).green().to_string(),
        Some(v) => format_percent(v).red().to_string(),
        None => NOT_AVAILABLE.dimmed().to_string(),
    }
}

fn signed_money(value: Option<Decimal>, currency: &str) -> String {
    match value {
        Some(v) if v >= Decimal::ZERO => format_money(v, currency).green().to_string(),
        Some(v) => format_money(v, currency).red().to_string(),
        None => NOT_AVAILABLE.dimmed().to_string(),
    }
}

fn format_age(age: Duration) -> String {
    let minutes = age.num_minutes();
    if minutes < 60 {
        format!("{}m", minutes)
    } else if minutes < 60 * 48 {
        format!("{}h", age.num_hours())
    } else {
        format!("{}d", age.num_days())
    }
}

/// Format empty portfolio message
pub fn format_empty_portfolio() -> String {
    format!(
        "{} No snapshots found\nRecord at least one snapshot in the portfolio file, then run: {} valuate\n",
        "ℹ".blue().bold(),
        "snapfolio".bold()
    )
}

pub fn format_snapshots_table(lines: &[SnapshotLine], currency: &str) -> String {
    #[derive(Tabled)]
    struct SnapshotRow {
        #[tabled(rename = "ID")]
        id: i64,
        #[tabled(rename = "Date")]
        date: String,
        #[tabled(rename = "Total")]
        total: String,
        #[tabled(rename = "Cash Flow")]
        cash_flow: String,
        #[tabled(rename = "Unconverted")]
        unconverted: String,
    }

    let rows: Vec<SnapshotRow> = lines
        .iter()
        .map(|l| SnapshotRow {
            id: l.id,
            date: l.date.clone(),
            total: format_amount(l.total_value),
            cash_flow: if l.cash_flow.is_zero() {
                "-".to_string()
            } else {
                format_amount(l.cash_flow)
            },
            unconverted: if l.unconverted == 0 {
                String::new()
            } else {
                l.unconverted.to_string().yellow().to_string()
            },
        })
        .collect();

    let mut table = Table::new(&rows);
    table.with(Style::rounded());
    table.modify(Columns::new(2..4), Alignment::right());

    format!(
        "\n{} Snapshots ({}, {} recorded)\n\n{}\n",
        "🗂".cyan().bold(),
        currency,
        lines.len(),
        table
    )
}

/// Format a snapshot valuation for terminal table output
pub fn format_valuation_table(valuation: &Valuation) -> String {
    let currency = valuation.display_currency.as_str();
    let mut output = format!(
        "\n{} Portfolio on {} ({})\n\n",
        "📊".cyan().bold(),
        valuation.date,
        currency
    );

    #[derive(Tabled)]
    struct AssetRow {
        #[tabled(rename = "Asset")]
        name: String,
        #[tabled(rename = "Platform")]
        platform: String,
        #[tabled(rename = "Currency")]
        currency: String,
        #[tabled(rename = "Raw Value")]
        raw_value: String,
        #[tabled(rename = "Value")]
        value: String,
    }

    let rows: Vec<AssetRow> = valuation
        .assets
        .iter()
        .map(|a| AssetRow {
            name: a.name.clone(),
            platform: a.platform.clone(),
            currency: a.currency.clone(),
            raw_value: format_amount(a.raw_value),
            value: if a.converted {
                format_amount(a.value)
            } else {
                format!("{} *", format_amount(a.value)).yellow().to_string()
            },
        })
        .collect();

    let mut table = Table::new(&rows);
    table.with(Style::modern());
    table.modify(Columns::new(3..), Alignment::right());
    output.push_str(&table.to_string());

    #[derive(Tabled)]
    struct AllocationRow {
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Value")]
        value: String,
        #[tabled(rename = "Share")]
        share: String,
    }

    let categories: Vec<AllocationRow> = valuation
        .categories
        .iter()
        .map(|c| AllocationRow {
            name: c.name.clone(),
            value: format_amount(c.value),
            share: format_percent(c.percentage),
        })
        .collect();
    let mut table = Table::new(&categories);
    table.with(Style::rounded());
    table.modify(Columns::new(1..), Alignment::right());
    output.push_str(&format!("\n\n{}\n{}", "By Category".bold(), table));

    let platforms: Vec<AllocationRow> = valuation
        .platforms
        .iter()
        .map(|p| AllocationRow {
            name: p.platform.clone(),
            value: format_amount(p.value),
            share: format_percent(p.percentage),
        })
        .collect();
    let mut table = Table::new(&platforms);
    table.with(Style::rounded());
    table.modify(Columns::new(1..), Alignment::right());
    output.push_str(&format!("\n\n{}\n{}", "By Platform".bold(), table));

    output.push_str(&format!("\n\n{} Summary", "━".repeat(60).bright_black()));
    output.push_str(&format!(
        "\n{:<20} {}",
        "Total Value:".bold(),
        format_money(valuation.total_value, currency).cyan()
    ));
    if valuation.has_unconverted() {
        output.push_str(&format!(
            "\n{} {} asset(s) had no exchange rate and are counted at their raw value (*)",
            "⚠".yellow().bold(),
            valuation.unconverted_asset_ids.len()
        ));
    }
    output.push('\n');
    output
}

/// Format a performance series for terminal output
pub fn format_performance(
    series: &PerformanceSeries,
    period_label: &str,
    currency: &str,
    show_points: bool,
) -> String {
    let mut output = format!("\n{} Performance Report ({})\n", "📈".cyan().bold(), period_label);

    let (Some(start), Some(end)) = (series.start_date, series.end_date) else {
        output.push_str(&format!(
            "  {} No snapshots in this period\n",
            "ℹ".blue().bold()
        ));
        return output;
    };

    output.push_str(&format!("  Period: {} → {}\n\n", start, end));
    output.push_str(&format!(
        "  Start Value:       {}\n",
        format_optional_money(series.start_value, currency).cyan()
    ));
    output.push_str(&format!(
        "  End Value:         {}\n",
        format_optional_money(series.end_value, currency).cyan()
    ));
    output.push_str(&format!(
        "  Absolute Gain:     {}\n\n",
        signed_money(series.absolute_gain, currency)
    ));
    output.push_str(&format!(
        "  Growth:            {}\n",
        signed_percent(series.growth_rate)
    ));
    output.push_str(&format!(
        "  Return (Dietz):    {}\n",
        signed_percent(series.return_rate)
    ));
    output.push_str(&format!(
        "  Time-Weighted:     {}\n",
        signed_percent(series.cumulative_twr)
    ));
    output.push_str(&format!(
        "  Annualized (CAGR): {}\n",
        signed_percent(series.cagr)
    ));

    let cf = &series.cash_flows;
    if cf.flow_count > 0 {
        output.push_str(&format!(
            "\n  {} Cash Flows ({} snapshots)\n",
            "💰".cyan().bold(),
            cf.flow_count
        ));
        output.push_str(&format!(
            "    Deposits:    {}\n",
            format_money(cf.total_deposits, currency).green()
        ));
        output.push_str(&format!(
            "    Withdrawals: {}\n",
            format_money(cf.total_withdrawals, currency).red()
        ));
        output.push_str(&format!(
            "    Net Flow:    {}\n",
            format_money(cf.net_flow, currency).cyan()
        ));
    }

    if series.undefined_periods > 0 {
        output.push_str(&format!(
            "\n  {} {} sub-period(s) started from a zero value and were skipped\n",
            "⚠".yellow().bold(),
            series.undefined_periods
        ));
    }

    if show_points && !series.points.is_empty() {
        #[derive(Tabled)]
        struct PointRow {
            #[tabled(rename = "Date")]
            date: String,
            #[tabled(rename = "Value")]
            value: String,
            #[tabled(rename = "Cash Flow")]
            cash_flow: String,
            #[tabled(rename = "Period Return")]
            period_return: String,
            #[tabled(rename = "Cumulative TWR")]
            cumulative: String,
        }

        let rows: Vec<PointRow> = series
            .points
            .iter()
            .map(|p| PointRow {
                date: p.date.to_string(),
                value: format_amount(p.value),
                cash_flow: format_amount(p.cash_flow),
                period_return: format_optional_percent(p.period_return),
                cumulative: format_optional_percent(p.cumulative_twr),
            })
            .collect();
        let mut table = Table::new(&rows);
        table.with(Style::rounded());
        table.modify(Columns::new(1..), Alignment::right());
        output.push_str(&format!("\n{}\n", table));
    }

    output
}

/// Format rebalancing suggestions for terminal output
pub fn format_rebalancing_table(result: &RebalancingResult, currency: &str) -> String {
    let mut output = format!(
        "\n{} Rebalancing ({} {})\n\n",
        "⚖".cyan().bold(),
        "total".dimmed(),
        format_money(result.total_value, currency)
    );

    if result.suggestions.is_empty() {
        output.push_str(&format!(
            "{} No category has a target allocation\n",
            "ℹ".blue().bold()
        ));
    } else {
        #[derive(Tabled)]
        struct SuggestionRow {
            #[tabled(rename = "Category")]
            name: String,
            #[tabled(rename = "Current")]
            current: String,
            #[tabled(rename = "Current %")]
            current_pct: String,
            #[tabled(rename = "Target %")]
            target_pct: String,
            #[tabled(rename = "Target")]
            target: String,
            #[tabled(rename = "Action")]
            action: String,
            #[tabled(rename = "Amount")]
            amount: String,
        }

        let rows: Vec<SuggestionRow> = result
            .suggestions
            .iter()
            .map(|s| SuggestionRow {
                name: s.name.clone(),
                current: format_amount(s.current_value),
                current_pct: format_percent(s.current_percentage),
                target_pct: format_percent(s.target_percentage),
                target: format_amount(s.target_value),
                action: match s.action {
                    RebalanceAction::Buy => s.action.as_str().green().to_string(),
                    RebalanceAction::Sell => s.action.as_str().red().to_string(),
                    RebalanceAction::NoAction => s.action.as_str().dimmed().to_string(),
                },
                amount: format_amount(s.amount),
            })
            .collect();

        let mut table = Table::new(&rows);
        table.with(Style::modern());
        table.modify(Columns::new(1..5), Alignment::right());
        table.modify(Columns::new(6..), Alignment::right());
        output.push_str(&table.to_string());
        output.push('\n');
    }

    for row in result
        .no_target
        .iter()
        .chain(std::iter::once(&result.uncategorized))
        .filter(|r| !r.current_value.is_zero())
    {
        output.push_str(&format!(
            "  {} {} {} ({}), no target\n",
            "·".dimmed(),
            row.name,
            format_money(row.current_value, currency),
            format_percent(row.current_percentage)
        ));
    }

    if let Some(warning) = result.sum_warning {
        output.push_str(&format!(
            "\n{} Targets add up to {}, not 100%\n",
            "⚠".yellow().bold(),
            format_percent(warning.target_sum)
        ));
    }

    output
}

pub fn format_dashboard(dashboard: &Dashboard) -> String {
    let currency = dashboard.display_currency.as_str();
    let Some(latest) = dashboard.latest.as_ref() else {
        return format_empty_portfolio();
    };

    let mut output = format!(
        "\n{} Dashboard ({} snapshots, latest {})\n\n",
        "📋".cyan().bold(),
        dashboard.snapshot_count,
        latest.date
    );
    output.push_str(&format!(
        "{:<20} {}\n",
        "Total Value:".bold(),
        format_money(latest.total_value, currency).cyan()
    ));
    output.push_str(&format!(
        "{:<20} {}\n\n",
        "CAGR:".bold(),
        signed_percent(dashboard.cagr)
    ));

    #[derive(Tabled)]
    struct PeriodRow {
        #[tabled(rename = "Period")]
        period: String,
        #[tabled(rename = "From")]
        from: String,
        #[tabled(rename = "Growth")]
        growth: String,
        #[tabled(rename = "Return")]
        return_rate: String,
        #[tabled(rename = "TWR")]
        twr: String,
    }

    let rows: Vec<PeriodRow> = dashboard
        .periods
        .iter()
        .map(|p| PeriodRow {
            period: p.period.clone(),
            from: p
                .start_date
                .map(|d| d.to_string())
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            growth: signed_percent(p.growth_rate),
            return_rate: signed_percent(p.return_rate),
            twr: signed_percent(p.cumulative_twr),
        })
        .collect();
    let mut table = Table::new(&rows);
    table.with(Style::rounded());
    table.modify(Columns::new(2..), Alignment::right());
    output.push_str(&table.to_string());
    output.push('\n');

    let top = latest
        .categories
        .iter()
        .map(|c| format!("{} {}", c.name, format_percent(c.percentage)))
        .collect::<Vec<_>>()
        .join(", ");
    if !top.is_empty() {
        output.push_str(&format!("\n{:<20} {}\n", "Allocation:".bold(), top));
    }

    let actionable = dashboard.rebalancing.actionable().count();
    if actionable > 0 {
        output.push_str(&format!(
            "{:<20} {} categories off target (run: {} rebalance)\n",
            "Rebalancing:".bold(),
            actionable.to_string().yellow(),
            "snapfolio".bold()
        ));
    } else {
        output.push_str(&format!("{:<20} {}\n", "Rebalancing:".bold(), "on target".green()));
    }
    if let Some(warning) = dashboard.rebalancing.sum_warning {
        output.push_str(&format!(
            "{} Targets add up to {}, not 100%\n",
            "⚠".yellow().bold(),
            format_percent(warning.target_sum)
        ));
    }

    output
}

pub fn format_rates_table(lines: &[RateLine]) -> String {
    #[derive(Tabled)]
    struct RateRow {
        #[tabled(rename = "Snapshot")]
        date: String,
        #[tabled(rename = "Base")]
        base: String,
        #[tabled(rename = "Currencies")]
        currencies: String,
        #[tabled(rename = "Fetched")]
        fetched: String,
        #[tabled(rename = "Age")]
        age: String,
    }

    let rows: Vec<RateRow> = lines
        .iter()
        .map(|l| RateRow {
            date: l.date.clone(),
            base: l
                .base_currency
                .clone()
                .unwrap_or_else(|| "-".to_string()),
            currencies: if l.base_currency.is_none() {
                "no rates".yellow().to_string()
            } else {
                l.currencies.join(" ")
            },
            fetched: l
                .fetched_at
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "-".to_string()),
            age: match (l.age, l.stale) {
                (Some(age), true) => format!("{} (stale)", format_age(age)).yellow().to_string(),
                (Some(age), false) => format_age(age),
                (None, _) => "-".to_string(),
            },
        })
        .collect();

    let mut table = Table::new(&rows);
    table.with(Style::rounded());
    format!("\n{} Exchange Rates\n\n{}\n", "💱".cyan().bold(), table)
}
