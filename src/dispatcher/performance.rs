//! Performance command dispatcher implementation

use anyhow::Result;
use tracing::info;

use super::AppContext;
use crate::cli::formatters;
use snapfolio::reports::Period;

pub fn dispatch_performance(
    ctx: &AppContext,
    period_str: &str,
    show_points: bool,
    json_output: bool,
) -> Result<()> {
    let period: Period = period_str.parse()?;
    info!("Calculating performance for {}", period);

    let series = ctx.engine().performance_for_period(period)?;

    if json_output {
        let points = show_points.then_some(&series.points);
        let payload = serde_json::json!({
            "period": period.label(),
            "display_currency": ctx.currency(),
            "start_date": series.start_date,
            "end_date": series.end_date,
            "start_value": series.start_value,
            "end_value": series.end_value,
            "absolute_gain": series.absolute_gain,
            "growth_rate": series.growth_rate,
            "return_rate": series.return_rate,
            "cumulative_twr": series.cumulative_twr,
            "cagr": series.cagr,
            "cash_flows": series.cash_flows,
            "undefined_periods": series.undefined_periods,
            "points": points,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        print!(
            "{}",
            formatters::format_performance(&series, &period.label(), ctx.currency(), show_points)
        );
        println!();
    }

    Ok(())
}
