//! Per-security ratio calculation.
//!
//! Every ratio comes from its own guarded function returning `Option<f64>`,
//! so a missing field or a zero denominator only nulls that one ratio.

use crate::models::{ClassifiedSeries, SecurityMetrics, StatementRow};

/// Quarters summed for trailing-twelve-month figures
const TTM_QUARTERS: usize = 4;

/// Derive the ratio set for one security from its price and classified statements
pub fn calculate_metrics(
    symbol: &str,
    industry: &str,
    price: f64,
    income: &ClassifiedSeries,
    balance: &ClassifiedSeries,
) -> SecurityMetrics {
    let mut metrics = SecurityMetrics::new(symbol, industry);

    metrics.pe_ratio = pe_ratio(price, &income.quarterly);
    metrics.revenue_growth = revenue_growth(&income.quarterly);

    if let Some(ttm) = trailing_twelve_months(income) {
        metrics.net_income_ttm = Some(ttm.net_income);
        metrics.ttm_revenue = ttm.revenue;
    }

    metrics.debt_ratio = debt_ratio(&balance.yearly);
    metrics
}

/// Price over the latest quarterly EPS
pub fn pe_ratio(price: f64, quarterly: &[StatementRow]) -> Option<f64> {
    let eps = quarterly.first()?.field("eps")?;
    safe_div(price, eps)
}

/// Growth of the prior quarter over the one before it.
///
/// The most recent quarter (index 0) is not used; it may still be settling.
pub fn revenue_growth(quarterly: &[StatementRow]) -> Option<f64> {
    if quarterly.len() < 3 {
        return None;
    }

    let previous = quarterly[1].field_or_zero("revenue")?;
    let before_previous = quarterly[2].field("revenue")?;
    safe_div(previous - before_previous, before_previous)
}

/// Trailing-twelve-month net income and revenue
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrailingTwelveMonths {
    pub net_income: f64,
    pub revenue: f64,
}

/// Sum of the four latest quarters, else the latest fiscal year as reported.
///
/// Absent values count as 0; a value of the wrong type voids the whole figure.
pub fn trailing_twelve_months(income: &ClassifiedSeries) -> Option<TrailingTwelveMonths> {
    if income.quarterly.len() >= TTM_QUARTERS {
        let quarters = &income.quarterly[..TTM_QUARTERS];
        let ttm = TrailingTwelveMonths {
            net_income: sum_field(quarters, "netIncome")?,
            revenue: sum_field(quarters, "revenue")?,
        };
        return finite_ttm(ttm);
    }

    let latest_year = income.yearly.first()?;
    finite_ttm(TrailingTwelveMonths {
        net_income: latest_year.field_or_zero("netIncome")?,
        revenue: latest_year.field_or_zero("revenue")?,
    })
}

/// Total debt over equity from the latest fiscal-year balance sheet
pub fn debt_ratio(balance_yearly: &[StatementRow]) -> Option<f64> {
    let latest = balance_yearly.first()?;

    // a present totalEquity wins even when it is null
    let equity = if latest.has_field("totalEquity") {
        latest.field("totalEquity")?
    } else {
        latest.field_or_zero("totalStockholdersEquity")?
    };
    let debt = latest.field_or_zero("totalDebt")?;

    safe_div(debt, equity)
}

fn sum_field(rows: &[StatementRow], name: &str) -> Option<f64> {
    rows.iter().map(|r| r.field_or_zero(name)).sum()
}

fn safe_div(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator == 0.0 {
        return None;
    }
    let value = numerator / denominator;
    value.is_finite().then_some(value)
}

fn finite_ttm(ttm: TrailingTwelveMonths) -> Option<TrailingTwelveMonths> {
    (ttm.net_income.is_finite() && ttm.revenue.is_finite()).then_some(ttm)
}
