use anyhow::Result;
use chrono::Utc;
use serde_json::json;

use super::AppContext;
use crate::cli::formatters::{self, RateLine};
use snapfolio::fx::{RateCache, RateKey};
use snapfolio::store::PortfolioSource;

/// List the rate table stored with each snapshot and how old it is.
///
/// Tables are seeded into a [`RateCache`] at their recorded fetch time so
/// staleness follows `rate_cache_ttl_minutes`.
pub fn dispatch_rates(ctx: &AppContext, json_output: bool) -> Result<()> {
    let mut cache = RateCache::new(ctx.config.rate_cache_ttl_minutes);
    let now = Utc::now();
    let mut lines = Vec::new();

    for snapshot in ctx.store.list_snapshots()? {
        let key = RateKey::Snapshot(snapshot.id);
        let stored = ctx.store.exchange_rate(snapshot.id)?;

        if let Some(rate) = &stored {
            if let Some(fetched_at) = rate.fetched_at {
                cache.insert_at(key, rate.rate_table(), fetched_at);
            }
        }

        let age = cache.age(&key, now);
        lines.push(RateLine {
            snapshot_id: snapshot.id,
            date: snapshot.date.to_string(),
            base_currency: stored.as_ref().map(|r| r.rate_table().base().to_string()),
            currencies: stored
                .as_ref()
                .map(|r| r.rate_table().currencies().map(str::to_string).collect())
                .unwrap_or_default(),
            fetched_at: stored.as_ref().and_then(|r| r.fetched_at),
            age,
            stale: age.is_some() && cache.is_stale(&key, now),
        });
    }
    tracing::debug!("{} of {} snapshots have a dated rate table", cache.len(), lines.len());

    if json_output {
        let payload: Vec<_> = lines
            .iter()
            .map(|l| {
                json!({
                    "snapshot_id": l.snapshot_id,
                    "date": l.date,
                    "base_currency": l.base_currency,
                    "currencies": l.currencies,
                    "fetched_at": l.fetched_at,
                    "age_minutes": l.age.map(|a| a.num_minutes()),
                    "stale": l.stale,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    if lines.is_empty() {
        print!("{}", formatters::format_empty_portfolio());
        return Ok(());
    }

    print!("{}", formatters::format_rates_table(&lines));
    println!();
    Ok(())
}
