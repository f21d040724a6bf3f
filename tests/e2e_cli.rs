use assert_cmd::prelude::*;
use predicates::prelude::*;
use rust_decimal_macros::dec;

use cli_helpers::{
    base_cmd, json_decimal, portfolio_cmd, run_cmd_json, setup_temp_home, write_file,
    SAMPLE_PORTFOLIO,
};

#[test]
fn snapshots_listed_without_ansi_when_piped() {
    let home = setup_temp_home();

    let mut cmd = portfolio_cmd(&home, SAMPLE_PORTFOLIO);
    cmd.arg("snapshots");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("2024-01-31"))
        .stdout(predicate::str::contains("2024-02-29"))
        .stdout(predicate::str::contains("10,700.00"))
        .stdout(predicate::str::contains("\u{001b}[").not());
}

#[test]
fn valuate_latest_json_converts_foreign_assets() {
    let home = setup_temp_home();
    let json = run_cmd_json(&home, &["valuate"]).unwrap();

    assert_eq!(json["date"], "2024-02-29");
    assert_eq!(json["display_currency"], "USD");
    assert_eq!(json_decimal(&json["total_value"]), dec!(10700));
    assert_eq!(json["unconverted_asset_ids"].as_array().unwrap().len(), 0);

    let categories = json["categories"].as_array().unwrap();
    assert_eq!(categories[0]["name"], "Equities");
    assert_eq!(json_decimal(&categories[0]["value"]), dec!(7700));
    assert_eq!(categories[1]["name"], "Bonds");
    assert_eq!(json_decimal(&categories[1]["value"]), dec!(3000));
}

#[test]
fn valuate_specific_snapshot_in_other_currency() {
    let home = setup_temp_home();
    let json = run_cmd_json(
        &home,
        &["valuate", "--snapshot", "2024-01-31", "--currency", "eur"],
    )
    .unwrap();

    assert_eq!(json["display_currency"], "EUR");
    // 6000 USD * 0.9 + 3600 EUR
    assert_eq!(json_decimal(&json["total_value"]), dec!(9000));
}

#[test]
fn valuate_unknown_snapshot_date_fails() {
    let home = setup_temp_home();
    let mut cmd = portfolio_cmd(&home, SAMPLE_PORTFOLIO);
    cmd.args(["valuate", "--snapshot", "2023-12-31"]);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("snapshot not found: 2023-12-31"));
}

#[test]
fn performance_all_json_separates_flows_from_returns() {
    let home = setup_temp_home();
    let json = run_cmd_json(&home, &["performance", "ALL"]).unwrap();

    assert_eq!(json["period"], "ALL");
    assert_eq!(json_decimal(&json["growth_rate"]), dec!(7));
    // (10700 - 10000 - 200) / 10000
    assert_eq!(json_decimal(&json["cumulative_twr"]), dec!(5));
    assert_eq!(json_decimal(&json["return_rate"]), dec!(5));
    assert_eq!(json_decimal(&json["absolute_gain"]), dec!(500));
    assert_eq!(json["cash_flows"]["flow_count"], 1);
    assert!(json["points"].is_null());
}

#[test]
fn performance_table_shows_points() {
    let home = setup_temp_home();
    let mut cmd = portfolio_cmd(&home, SAMPLE_PORTFOLIO);
    cmd.args(["performance", "2024", "--points"]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Performance Report"))
        .stdout(predicate::str::contains("7.00%"))
        .stdout(predicate::str::contains("Cumulative TWR"))
        .stdout(predicate::str::contains("\u{001b}[").not());
}

#[test]
fn performance_rejects_unknown_period() {
    let home = setup_temp_home();
    let mut cmd = portfolio_cmd(&home, SAMPLE_PORTFOLIO);
    cmd.args(["performance", "forever"]);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Invalid period"));
}

#[test]
fn rebalance_suggests_sell_and_buy() {
    let home = setup_temp_home();
    let mut cmd = portfolio_cmd(&home, SAMPLE_PORTFOLIO);
    cmd.arg("rebalance");

    // 60% of 10700 = 6420 against 7700 held
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("SELL"))
        .stdout(predicate::str::contains("BUY"))
        .stdout(predicate::str::contains("1,280.00"))
        .stdout(predicate::str::contains("not 100%").not());
}

#[test]
fn rebalance_json_reports_target_sum_warning() {
    let home = setup_temp_home();
    let portfolio = SAMPLE_PORTFOLIO.replace(r#""target_percentage": "40""#, r#""target_percentage": "30""#);
    let mut cmd = portfolio_cmd(&home, &portfolio);
    cmd.args(["--json", "rebalance"]);

    let output = cmd.output().unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json_decimal(&json["sum_warning"]["target_sum"]), dec!(90));
    assert_eq!(json["suggestions"].as_array().unwrap().len(), 2);
}

#[test]
fn dashboard_summarizes_latest_snapshot() {
    let home = setup_temp_home();
    let mut cmd = portfolio_cmd(&home, SAMPLE_PORTFOLIO);
    cmd.arg("dashboard");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Dashboard"))
        .stdout(predicate::str::contains("USD 10,700.00"))
        .stdout(predicate::str::contains("YTD"))
        .stdout(predicate::str::contains("\u{001b}[").not());
}

#[test]
fn empty_portfolio_prints_friendly_message() {
    let home = setup_temp_home();
    let mut cmd = portfolio_cmd(&home, "{}");
    cmd.arg("valuate");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("No snapshots found"));
}

#[test]
fn rates_flag_stale_tables() {
    let home = setup_temp_home();
    let json = run_cmd_json(&home, &["rates"]).unwrap();
    let rows = json.as_array().unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["base_currency"], "USD");
    assert_eq!(rows[0]["stale"], true);
    // second table has no fetch time, so its age is unknown
    assert!(rows[1]["age_minutes"].is_null());
    assert_eq!(rows[1]["stale"], false);
}

#[test]
fn portfolio_load_is_logged_once() {
    let home = setup_temp_home();
    let mut cmd = portfolio_cmd(&home, SAMPLE_PORTFOLIO);
    cmd.env("RUST_LOG", "info").arg("snapshots");

    let output = cmd.output().unwrap();
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(stderr.matches("Loading portfolio").count(), 1, "{stderr}");
}

#[test]
fn missing_portfolio_file_fails() {
    let home = setup_temp_home();
    let mut cmd = base_cmd(&home);
    cmd.arg("--file")
        .arg(home.path().join("missing.json"))
        .arg("valuate");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load portfolio"));
}

#[test]
fn no_portfolio_configured_fails() {
    let home = setup_temp_home();
    let mut cmd = base_cmd(&home);
    cmd.arg("dashboard");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("no portfolio file"));
}

#[test]
fn invalid_document_is_rejected() {
    let home = setup_temp_home();
    let duplicate_dates = r#"{
        "snapshots": [
            { "id": 1, "date": "2024-01-31" },
            { "id": 2, "date": "2024-01-31" }
        ]
    }"#;
    let mut cmd = portfolio_cmd(&home, duplicate_dates);
    cmd.arg("snapshots");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("validation error"));
}

#[test]
fn config_from_env_supplies_file_and_currency() {
    let home = setup_temp_home();
    let portfolio = write_file(home.path(), "portfolio.json", SAMPLE_PORTFOLIO);
    let config = write_file(
        home.path(),
        "snapfolio.toml",
        &format!(
            "display_currency = \"EUR\"\nportfolio_file = {:?}\n",
            portfolio.display().to_string()
        ),
    );

    let mut cmd = base_cmd(&home);
    cmd.env("SNAPFOLIO_CONFIG", &config);
    cmd.args(["--json", "valuate"]);

    let output = cmd.output().unwrap();
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["display_currency"], "EUR");
    // 7700 USD * 0.9 + 2700 EUR
    assert_eq!(json_decimal(&json["total_value"]), dec!(9630));
}

#[test]
fn invalid_config_fails() {
    let home = setup_temp_home();
    let config = write_file(home.path(), "bad.toml", "epsilon = \"-1\"\n");
    let mut cmd = portfolio_cmd(&home, SAMPLE_PORTFOLIO);
    cmd.arg("--config").arg(&config).arg("rebalance");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("config error"));
}
