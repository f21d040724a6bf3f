//! End-to-end engine scenarios over in-memory portfolios

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use snapfolio::config::EngineConfig;
use snapfolio::engine::Engine;
use snapfolio::reports::{Period, RebalanceAction};
use snapfolio::store::{MemoryStore, PortfolioDocument, UNCATEGORIZED};

fn store(json: &str) -> MemoryStore {
    let doc = PortfolioDocument::from_json_str(json).expect("valid document");
    MemoryStore::from_document(doc).expect("consistent document")
}

fn usd() -> EngineConfig {
    EngineConfig::with_currency("USD")
}

#[test]
fn single_asset_is_fully_uncategorized() {
    let s = store(
        r#"{
            "assets": [{ "id": 1, "name": "Savings", "currency": "USD" }],
            "snapshots": [{ "id": 1, "date": "2024-06-30", "values": [{ "asset_id": 1, "value": "1000" }] }]
        }"#,
    );
    let engine = Engine::new(&s, usd());
    let v = engine.valuate_snapshot(1).unwrap();

    assert_eq!(v.total_value, dec!(1000));
    assert_eq!(v.categories.len(), 1);
    let bucket = v.uncategorized().unwrap();
    assert_eq!(bucket.name, UNCATEGORIZED);
    assert_eq!(bucket.percentage, dec!(100));
    assert!(!v.has_unconverted());
}

#[test]
fn growth_without_flows_matches_every_return_measure() {
    let s = store(
        r#"{
            "assets": [{ "id": 1, "name": "Fund", "currency": "USD" }],
            "snapshots": [
                { "id": 1, "date": "2024-01-01", "values": [{ "asset_id": 1, "value": "1000" }] },
                { "id": 2, "date": "2024-07-01", "values": [{ "asset_id": 1, "value": "1100" }] }
            ]
        }"#,
    );
    let series = Engine::new(&s, usd()).performance_series(None).unwrap();

    assert_eq!(series.growth_rate, Some(dec!(10)));
    assert_eq!(series.return_rate, Some(dec!(10)));
    assert_eq!(series.cumulative_twr, Some(dec!(10)));
    assert_eq!(series.absolute_gain, Some(dec!(100)));
}

#[test]
fn deposit_inflates_growth_but_not_return() {
    let s = store(
        r#"{
            "assets": [{ "id": 1, "name": "Fund", "currency": "USD" }],
            "snapshots": [
                { "id": 1, "date": "2024-01-01", "values": [{ "asset_id": 1, "value": "1000" }] },
                { "id": 2, "date": "2024-02-01", "values": [{ "asset_id": 1, "value": "1200" }],
                  "cash_flows": [{ "description": "deposit", "amount": "100" }] }
            ]
        }"#,
    );
    let series = Engine::new(&s, usd()).performance_series(None).unwrap();

    assert_eq!(series.growth_rate, Some(dec!(20)));
    assert_eq!(series.return_rate, Some(dec!(10)));
    assert_eq!(series.cumulative_twr, Some(dec!(10)));
    assert_eq!(series.cash_flows.total_deposits, dec!(100));
}

#[test]
fn target_sum_warning_clears_once_targets_add_up() {
    let portfolio = |bonds_target: &str| {
        format!(
            r#"{{
                "categories": [
                    {{ "id": 1, "name": "Equities", "target_percentage": "60" }},
                    {{ "id": 2, "name": "Bonds", "target_percentage": "{bonds_target}" }}
                ],
                "assets": [
                    {{ "id": 1, "name": "ETF", "category_id": 1 }},
                    {{ "id": 2, "name": "Bond", "category_id": 2 }}
                ],
                "snapshots": [{{ "id": 1, "date": "2024-03-31",
                    "values": [{{ "asset_id": 1, "value": "600" }}, {{ "asset_id": 2, "value": "400" }}] }}]
            }}"#
        )
    };

    let off = store(&portfolio("30"));
    let result = Engine::new(&off, usd()).rebalancing_suggestions().unwrap();
    assert_eq!(result.sum_warning.map(|w| w.target_sum), Some(dec!(90)));
    assert!(!result.suggestions.is_empty());

    let fixed = store(&portfolio("40"));
    let result = Engine::new(&fixed, usd()).rebalancing_suggestions().unwrap();
    assert!(result.sum_warning.is_none());
    assert_eq!(result.actionable().count(), 0);
}

#[test]
fn foreign_asset_without_rate_is_flagged() {
    let s = store(
        r#"{
            "assets": [
                { "id": 1, "name": "Checking", "currency": "USD" },
                { "id": 2, "name": "Tokyo fund", "currency": "JPY" }
            ],
            "snapshots": [{ "id": 1, "date": "2024-05-31",
                "values": [{ "asset_id": 1, "value": "500" }, { "asset_id": 2, "value": "20000" }] }]
        }"#,
    );
    let v = Engine::new(&s, usd()).valuate_snapshot(1).unwrap();

    assert!(v.has_unconverted());
    assert_eq!(v.unconverted_asset_ids, vec![2]);
    assert_eq!(v.total_value, dec!(20500));
    let fund = v.assets.iter().find(|a| a.asset_id == 2).unwrap();
    assert!(!fund.converted);
    assert_eq!(fund.value, fund.raw_value);
}

#[test]
fn overweight_equities_are_sold_into_bonds() {
    let s = store(
        r#"{
            "categories": [
                { "id": 1, "name": "Equities", "target_percentage": "60", "display_order": 1 },
                { "id": 2, "name": "Bonds", "target_percentage": "40", "display_order": 2 }
            ],
            "assets": [
                { "id": 1, "name": "ETF", "category_id": 1 },
                { "id": 2, "name": "Bond", "category_id": 2 }
            ],
            "snapshots": [{ "id": 1, "date": "2024-12-31",
                "values": [{ "asset_id": 1, "value": "7000" }, { "asset_id": 2, "value": "3000" }] }]
        }"#,
    );
    let result = Engine::new(&s, usd()).rebalancing_suggestions().unwrap();

    let equities = result.suggestions.iter().find(|r| r.name == "Equities").unwrap();
    assert_eq!(equities.action, RebalanceAction::Sell);
    assert_eq!(equities.amount, dec!(1000));
    let bonds = result.suggestions.iter().find(|r| r.name == "Bonds").unwrap();
    assert_eq!(bonds.action, RebalanceAction::Buy);
    assert_eq!(bonds.amount, dec!(1000));
}

#[test]
fn categories_follow_display_order_then_name() {
    let s = store(
        r#"{
            "categories": [
                { "id": 1, "name": "zeta", "display_order": 2 },
                { "id": 2, "name": "Alpha", "display_order": 2 },
                { "id": 3, "name": "Cash", "display_order": 1 }
            ],
            "assets": [
                { "id": 1, "name": "A", "category_id": 1 },
                { "id": 2, "name": "B" }
            ],
            "snapshots": [{ "id": 1, "date": "2024-01-31",
                "values": [{ "asset_id": 1, "value": "10" }, { "asset_id": 2, "value": "30" }] }]
        }"#,
    );
    let v = Engine::new(&s, usd()).valuate_snapshot(1).unwrap();
    let names: Vec<&str> = v.categories.iter().map(|c| c.name.as_str()).collect();

    assert_eq!(names, vec!["Cash", "Alpha", "zeta", UNCATEGORIZED]);
    assert_eq!(v.categories[0].value, Decimal::ZERO);
    assert_eq!(v.uncategorized().unwrap().percentage, dec!(75));
}

#[test]
fn dashboard_combines_every_view() {
    let s = store(
        r#"{
            "categories": [{ "id": 1, "name": "Equities", "target_percentage": "100" }],
            "assets": [{ "id": 1, "name": "ETF", "platform": "Broker", "category_id": 1 }],
            "snapshots": [
                { "id": 1, "date": "2023-12-31", "values": [{ "asset_id": 1, "value": "1000" }] },
                { "id": 2, "date": "2024-12-31", "values": [{ "asset_id": 1, "value": "1210" }] }
            ]
        }"#,
    );
    let engine = Engine::new(&s, usd());
    let dash = engine.dashboard().unwrap();

    assert_eq!(dash.snapshot_count, 2);
    assert_eq!(dash.latest.as_ref().unwrap().total_value, dec!(1210));
    let all = dash.periods.iter().find(|p| p.period == "ALL").unwrap();
    assert_eq!(all.growth_rate, Some(dec!(21)));
    // one snapshot in 2024's YTD window: not enough for a return
    let ytd = dash.periods.iter().find(|p| p.period == "YTD").unwrap();
    assert!(ytd.growth_rate.is_none());
    assert!(dash.cagr.is_some());
    assert!(dash.rebalancing.sum_warning.is_none());

    let one_year = engine.performance_for_period(Period::OneYear).unwrap();
    assert_eq!(one_year.growth_rate, Some(dec!(21)));
}
