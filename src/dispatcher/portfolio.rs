use anyhow::Result;
use chrono::NaiveDate;
use colored::Colorize;
use rust_decimal::Decimal;
use serde::Serialize;

use super::AppContext;
use crate::cli::formatters::{self, SnapshotLine};
use snapfolio::store::PortfolioSource;

#[derive(Serialize)]
struct SnapshotJson {
    id: i64,
    date: NaiveDate,
    total_value: Decimal,
    cash_flow: Decimal,
    unconverted_asset_ids: Vec<i64>,
}

pub fn dispatch_snapshots(ctx: &AppContext, json_output: bool) -> Result<()> {
    let engine = ctx.engine();
    let snapshots = ctx.store.list_snapshots()?;

    let mut rows = Vec::with_capacity(snapshots.len());
    for snapshot in &snapshots {
        let valuation = engine.valuate_snapshot(snapshot.id)?;
        let cash_flow: Decimal = ctx
            .store
            .cash_flows(snapshot.id)?
            .iter()
            .map(|cf| cf.amount)
            .sum();
        rows.push(SnapshotJson {
            id: snapshot.id,
            date: snapshot.date,
            total_value: valuation.total_value,
            cash_flow,
            unconverted_asset_ids: valuation.unconverted_asset_ids,
        });
    }

    if json_output {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if rows.is_empty() {
        print!("{}", formatters::format_empty_portfolio());
        return Ok(());
    }

    let lines: Vec<SnapshotLine> = rows
        .iter()
        .map(|r| SnapshotLine {
            id: r.id,
            date: r.date.to_string(),
            total_value: r.total_value,
            cash_flow: r.cash_flow,
            unconverted: r.unconverted_asset_ids.len(),
        })
        .collect();
    print!("{}", formatters::format_snapshots_table(&lines, ctx.currency()));
    println!("  {}\n", ctx.portfolio_path.display().to_string().dimmed());
    Ok(())
}

pub fn dispatch_valuate(ctx: &AppContext, date: Option<NaiveDate>, json_output: bool) -> Result<()> {
    tracing::info!("Generating valuation report");
    let engine = ctx.engine();

    let valuation = match date {
        Some(date) => Some(engine.valuate_date(date)?),
        None => engine.latest_valuation()?,
    };

    if json_output {
        println!("{}", serde_json::to_string_pretty(&valuation)?);
        return Ok(());
    }

    match valuation {
        Some(v) => {
            print!("{}", formatters::format_valuation_table(&v));
            println!();
        }
        None => print!("{}", formatters::format_empty_portfolio()),
    }
    Ok(())
}

pub fn dispatch_rebalance(ctx: &AppContext, json_output: bool) -> Result<()> {
    let result = ctx.engine().rebalancing_suggestions()?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    if ctx.store.snapshot_count() == 0 {
        print!("{}", formatters::format_empty_portfolio());
        return Ok(());
    }

    print!(
        "{}",
        formatters::format_rebalancing_table(&result, ctx.currency())
    );
    if result.actionable().count() == 0 && !result.suggestions.is_empty() {
        println!("{} Allocation is on target", "✓".green().bold());
    }
    println!();
    Ok(())
}

pub fn dispatch_dashboard(ctx: &AppContext, json_output: bool) -> Result<()> {
    let dashboard = ctx.engine().dashboard()?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&dashboard)?);
    } else {
        print!("{}", formatters::format_dashboard(&dashboard));
        println!();
    }
    Ok(())
}
