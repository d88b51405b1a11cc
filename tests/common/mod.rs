//! Common test utilities and helpers


pub use database::TestDatabase;

/// Test data utilities
pub mod test_data {
    use industry_metrics::models::{SecurityMetrics, StatementRow};
    use serde_json::{json, Value};

    pub fn rows(values: Vec<Value>) -> Vec<StatementRow> {
        values
            .into_iter()
            .map(|v| serde_json::from_value(v).expect("valid statement row"))
            .collect()
    }

    /// Mixed quarterly/yearly income statement, deliberately unsorted
    pub fn income_statement_rows() -> Vec<StatementRow> {
        rows(vec![
            json!({"date": "2024-03-31", "period": "Q1", "eps": 2.0, "revenue": 1000, "netIncome": 100}),
            json!({"date": "2023-12-31", "period": "FY", "eps": 10.0, "revenue": 5000, "netIncome": 500}),
            json!({"date": "2023-12-31", "period": "Q4", "eps": 2.5, "revenue": 1200, "netIncome": 120}),
            json!({"date": "2023-09-30", "period": "Q3", "eps": 1.5, "revenue": 1000, "netIncome": 100}),
            json!({"date": "2023-06-30", "period": "Q2", "eps": 1.5, "revenue": 1000, "netIncome": 100}),
        ])
    }

    pub fn balance_sheet_rows() -> Vec<StatementRow> {
        rows(vec![
            json!({"date": "2023-12-31", "period": "FY", "totalDebt": 500, "totalEquity": 1000}),
            json!({"date": "2022-12-31", "period": "FY", "totalDebt": 200, "totalEquity": 800}),
        ])
    }

    /// Metrics as computed from the two fixtures above at a price of 100
    pub fn create_test_metrics(symbol: &str, industry: &str) -> SecurityMetrics {
        SecurityMetrics {
            symbol: symbol.to_string(),
            industry: industry.to_string(),
            pe_ratio: Some(50.0),
            revenue_growth: Some(0.2),
            net_income_ttm: Some(420.0),
            debt_ratio: Some(0.5),
            ttm_revenue: 4200.0,
        }
    }
}

/// Logging utilities for tests
pub mod logging {
    use std::sync::Once;
    use tracing::{debug, info};

    static INIT: Once = Once::new();

    /// Initialize test logging
    pub fn init_test_logging() {
        INIT.call_once(|| {
            // test-log may have installed a subscriber already
            let _ = tracing::subscriber::set_global_default(
                tracing_subscriber::fmt()
                    .with_env_filter("industry_metrics=debug,main=debug")
                    .with_test_writer()
                    .finish(),
            );
        });
    }

    pub fn log_test_step(step: &str) {
        info!("🧪 Test Step: {}", step);
    }

    pub fn log_test_data<T: std::fmt::Debug>(label: &str, data: &T) {
        debug!("📊 {}: {:?}", label, data);
    }
}
