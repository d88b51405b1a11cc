//! Ratio derivation through the public classify/calculate API

use pretty_assertions::assert_eq;
use serde_json::json;
use test_log::test;

use crate::common::{logging, test_data};
use industry_metrics::analysis::{calculate_metrics, classify};
use industry_metrics::models::Period;

#[test]
fn test_full_statement_set() {
    logging::init_test_logging();
    logging::log_test_step("Testing metrics from mixed FY/quarterly statements");

    let income = classify(Some(test_data::income_statement_rows()));
    let balance = classify(Some(test_data::balance_sheet_rows()));

    assert!(income.quarterly.iter().all(|r| r.period() != Some(Period::FY)));
    assert_eq!(income.yearly.len(), 1);

    let metrics = calculate_metrics("TEST.L", "Banks", 100.0, &income, &balance);
    logging::log_test_data("Metrics", &metrics);

    // 100 / 2.0 from the 2024-03-31 quarter
    assert_eq!(metrics.pe_ratio, Some(50.0));
    // (1200 - 1000) / 1000, index 1 over index 2
    assert!((metrics.revenue_growth.unwrap() - 0.2).abs() < 1e-12);
    // 100 + 120 + 100 + 100, the FY 500 is not included
    assert_eq!(metrics.net_income_ttm, Some(420.0));
    assert_eq!(metrics.ttm_revenue, 4200.0);
    assert_eq!(metrics.debt_ratio, Some(0.5));
}

#[test]
fn test_insufficient_data_yields_nulls() {
    logging::init_test_logging();

    let income = classify(Some(test_data::rows(vec![
        json!({"date": "2024-03-31", "period": "Q1", "eps": 0}),
    ])));
    let balance = classify(Some(Vec::new()));

    let metrics = calculate_metrics("TEST", "Ind", 100.0, &income, &balance);

    assert_eq!(metrics.pe_ratio, None);
    assert_eq!(metrics.revenue_growth, None);
    assert_eq!(metrics.debt_ratio, None);
    assert_eq!(metrics.net_income_ttm, None);
    assert_eq!(metrics.ttm_revenue, 0.0);
}

#[test]
fn test_yearly_fallback_for_ttm() {
    let income = classify(Some(test_data::rows(vec![
        json!({"date": "2024-03-31", "period": "Q1", "eps": 1.0, "revenue": 1000, "netIncome": 100}),
        json!({"date": "2023-12-31", "period": "Q4", "eps": 1.0, "revenue": 1000, "netIncome": 100}),
        json!({"date": "2023-12-31", "period": "FY", "revenue": 4100, "netIncome": 500}),
    ])));

    let metrics = calculate_metrics("TEST", "Ind", 10.0, &income, &classify(None));

    assert_eq!(metrics.net_income_ttm, Some(500.0));
    assert_eq!(metrics.ttm_revenue, 4100.0);
    assert_eq!(metrics.pe_ratio, Some(10.0));
}

#[test]
fn test_stockholders_equity_fallback() {
    let balance = classify(Some(test_data::rows(vec![
        json!({"date": "2023-12-31", "period": "FY", "totalDebt": 500, "totalStockholdersEquity": 1000}),
    ])));

    let metrics = calculate_metrics("TEST", "Ind", 10.0, &classify(None), &balance);

    assert_eq!(metrics.debt_ratio, Some(0.5));
    assert_eq!(metrics.pe_ratio, None);
    assert_eq!(metrics.net_income_ttm, None);
}
