use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

use crate::models::{CompanyProfile, StatementKind, StatementRow};

pub mod fundamentals_client;
pub use fundamentals_client::FundamentalsClient;

/// Read-only access to the fundamentals data provider.
///
/// Implementations never fail: any retrieval or shape problem is logged and
/// reported as "no data".
#[cfg_attr(test, automock)]
#[async_trait]
pub trait FundamentalsProvider: Send + Sync {
    /// True when the provider reports itself healthy
    async fn check_health(&self) -> bool;

    /// All symbols known to the provider; empty on failure
    async fn get_symbols(&self) -> Vec<String>;

    async fn get_company_profile(&self, symbol: &str) -> Option<CompanyProfile>;

    /// Close of the most recent end-of-day entry
    async fn get_eod_price(&self, symbol: &str) -> Option<f64>;

    async fn get_financials(&self, symbol: &str, kind: StatementKind) -> Option<Vec<StatementRow>>;
}
