//! Store-level tests: upsert idempotence and aggregation over persisted state

use pretty_assertions::assert_eq;

use crate::common::{logging, test_data, TestDatabase};
use industry_metrics::models::SecurityMetrics;

fn metrics(symbol: &str, industry: &str, pe: Option<f64>, growth: Option<f64>, revenue: f64) -> SecurityMetrics {
    SecurityMetrics {
        symbol: symbol.to_string(),
        industry: industry.to_string(),
        pe_ratio: pe,
        revenue_growth: growth,
        net_income_ttm: None,
        debt_ratio: None,
        ttm_revenue: revenue,
    }
}

#[test_log::test(tokio::test)]
async fn test_security_upsert_is_idempotent() {
    logging::init_test_logging();
    logging::log_test_step("Testing security upsert idempotence");

    let test_db = TestDatabase::new().await.expect("Failed to create test database");
    let db = &test_db.db;

    let first = test_data::create_test_metrics("AAPL", "Consumer Electronics");
    db.commit_security_statistics(&[first.clone()]).await.unwrap();
    let inserted = db.get_security_by_symbol("AAPL").await.unwrap().expect("record should exist");

    let mut second = first.clone();
    second.pe_ratio = None;
    second.revenue_growth = Some(-0.1);
    second.net_income_ttm = Some(1.0);
    second.debt_ratio = Some(2.0);
    second.ttm_revenue = 10.0;
    db.commit_security_statistics(&[second]).await.unwrap();

    let updated = db.get_security_by_symbol("AAPL").await.unwrap().unwrap();
    assert_eq!(updated.id, inserted.id, "Update should keep the same row");
    assert_eq!(updated.created_at, inserted.created_at);
    assert_eq!(updated.pe_ratio, None);
    assert_eq!(updated.revenue_growth, Some(-0.1));
    assert_eq!(updated.net_income_ttm, Some(1.0));
    assert_eq!(updated.debt_ratio, Some(2.0));
    assert_eq!(updated.revenue, Some(10.0));

    let (securities, _) = db.get_stats().await.unwrap();
    assert_eq!(securities, 1);
}

#[test_log::test(tokio::test)]
async fn test_upsert_keeps_original_industry() {
    let test_db = TestDatabase::new().await.unwrap();
    let db = &test_db.db;

    db.upsert_security_statistics(&metrics("MOVE", "Banks - Diversified", Some(5.0), None, 1.0))
        .await
        .unwrap();
    db.upsert_security_statistics(&metrics("MOVE", "Software - Application", Some(6.0), None, 2.0))
        .await
        .unwrap();

    let record = db.get_security_by_symbol("MOVE").await.unwrap().unwrap();
    assert_eq!(record.industry, "Banks - Diversified");
    assert_eq!(record.pe_ratio, Some(6.0));
}

#[test_log::test(tokio::test)]
async fn test_aggregation_excludes_nulls_and_skips_empty_industries() {
    let test_db = TestDatabase::new().await.unwrap();
    let db = &test_db.db;

    db.commit_security_statistics(&[
        metrics("B1", "Banks", Some(10.0), Some(0.1), 100.0),
        metrics("B2", "Banks", None, Some(0.3), 200.0),
        metrics("B3", "Banks", Some(30.0), None, 0.0),
        metrics("S1", "Software", Some(50.0), Some(0.5), 1000.0),
    ])
    .await
    .unwrap();

    let industries = vec!["Banks".to_string(), "Semiconductors".to_string()];
    let refreshed = db.refresh_industry_aggregations(&industries).await.unwrap();
    logging::log_test_data("Refreshed", &refreshed);

    assert_eq!(refreshed.len(), 1);
    let banks = db.get_industry_aggregation("Banks").await.unwrap().unwrap();
    assert_eq!(banks.avg_pe_ratio, Some(20.0));
    assert!((banks.avg_revenue_growth.unwrap() - 0.2).abs() < 1e-12);
    assert_eq!(banks.sum_revenue, Some(300.0));

    assert!(db.get_industry_aggregation("Semiconductors").await.unwrap().is_none());
    // not a target industry
    assert!(db.get_industry_aggregation("Software").await.unwrap().is_none());
}

#[test_log::test(tokio::test)]
async fn test_aggregation_upsert_and_persisted_scope() {
    let test_db = TestDatabase::new().await.unwrap();
    let industries = vec!["Banks".to_string()];

    // earlier run
    test_db
        .db
        .commit_security_statistics(&[metrics("OLD", "Banks", Some(10.0), None, 100.0)])
        .await
        .unwrap();
    test_db.db.refresh_industry_aggregations(&industries).await.unwrap();
    let first = test_db.db.get_industry_aggregation("Banks").await.unwrap().unwrap();

    // later run only touches NEW, OLD must still contribute
    let later = test_db.reopen().await.unwrap();
    later
        .commit_security_statistics(&[metrics("NEW", "Banks", Some(20.0), Some(0.4), 50.0)])
        .await
        .unwrap();
    later.refresh_industry_aggregations(&industries).await.unwrap();

    let second = later.get_industry_aggregation("Banks").await.unwrap().unwrap();
    assert_eq!(second.id, first.id);
    assert_eq!(second.created_at, first.created_at);
    assert_eq!(second.avg_pe_ratio, Some(15.0));
    assert_eq!(second.avg_revenue_growth, Some(0.4));
    assert_eq!(second.sum_revenue, Some(150.0));

    let (_, aggregate_rows) = later.get_stats().await.unwrap();
    assert_eq!(aggregate_rows, 1);
    assert_eq!(later.list_industry_aggregations().await.unwrap().len(), 1);
}

#[test_log::test(tokio::test)]
async fn test_empty_commit_is_a_noop() {
    let test_db = TestDatabase::new().await.unwrap();

    let committed = test_db.db.commit_security_statistics(&[]).await.unwrap();

    assert_eq!(committed, 0);
    assert_eq!(test_db.db.get_stats().await.unwrap(), (0, 0));
    assert!(test_db.db.get_securities_by_industry("Banks").await.unwrap().is_empty());
}
