use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

pub mod config;
pub use config::{Config, ConfigError};

/// Reporting period of a financial statement row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Period {
    Q1,
    Q2,
    Q3,
    Q4,
    FY,
}

impl Period {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "Q1" => Some(Period::Q1),
            "Q2" => Some(Period::Q2),
            "Q3" => Some(Period::Q3),
            "Q4" => Some(Period::Q4),
            "FY" => Some(Period::FY),
            _ => None,
        }
    }

    pub fn is_quarter(&self) -> bool {
        !matches!(self, Period::FY)
    }
}

/// Financial statement types served by the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Income,
    Balance,
}

impl StatementKind {
    /// Path segment and JSON key the provider uses for this statement
    pub fn as_str(&self) -> &'static str {
        match self {
            StatementKind::Income => "income_statement",
            StatementKind::Balance => "balance_sheet_statement",
        }
    }
}

/// One raw statement row as delivered by the data provider.
///
/// `date` and `period` are kept as raw strings; everything else in the JSON
/// object ends up in `fields`. Values of the wrong type are kept as-is and
/// only rejected when a numeric field is read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatementRow {
    #[serde(default, deserialize_with = "string_or_none")]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "string_or_none")]
    pub period: Option<String>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl StatementRow {
    pub fn period(&self) -> Option<Period> {
        self.period.as_deref().and_then(Period::parse)
    }

    /// Numeric value of a field; `None` if absent, null or not a number
    pub fn field(&self, name: &str) -> Option<f64> {
        self.fields.get(name).and_then(Value::as_f64)
    }

    /// Numeric value of a field where an absent key counts as 0.
    ///
    /// A key that is present but null or not a number gives `None`.
    pub fn field_or_zero(&self, name: &str) -> Option<f64> {
        match self.fields.get(name) {
            None => Some(0.0),
            Some(value) => value.as_f64(),
        }
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Sort key for chronological ordering, a missing date sorts oldest
    pub fn date_key(&self) -> &str {
        self.date.as_deref().unwrap_or("")
    }
}

fn string_or_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| v.as_str().map(str::to_owned)))
}

/// Statement rows of one type split into quarterly and yearly series,
/// each newest-first
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassifiedSeries {
    pub quarterly: Vec<StatementRow>,
    pub yearly: Vec<StatementRow>,
}

/// Company profile fields needed for industry filtering and price fallback
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub industry: Option<String>,
    pub price: Option<f64>,
}

/// Ratios derived for one security in the current run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityMetrics {
    pub symbol: String,
    pub industry: String,
    pub pe_ratio: Option<f64>,
    pub revenue_growth: Option<f64>,
    pub net_income_ttm: Option<f64>,
    pub debt_ratio: Option<f64>,
    /// Never null, 0 when no revenue could be determined
    pub ttm_revenue: f64,
}

impl SecurityMetrics {
    pub fn new(symbol: &str, industry: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            industry: industry.to_string(),
            pe_ratio: None,
            revenue_growth: None,
            net_income_ttm: None,
            debt_ratio: None,
            ttm_revenue: 0.0,
        }
    }
}

/// Persisted row of `security_statistics`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityRecord {
    pub id: i64,
    pub symbol: String,
    pub industry: String,
    pub pe_ratio: Option<f64>,
    pub revenue_growth: Option<f64>,
    pub net_income_ttm: Option<f64>,
    pub debt_ratio: Option<f64>,
    pub revenue: Option<f64>,
    pub created_at: DateTime<Utc>,
}

/// Industry statistics computed from persisted security records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndustryAggregate {
    pub industry: String,
    pub avg_pe_ratio: Option<f64>,
    pub avg_revenue_growth: Option<f64>,
    pub sum_revenue: f64,
    pub security_count: usize,
}

/// Persisted row of `industry_aggregations`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndustryAggregateRecord {
    pub id: i64,
    pub industry: String,
    pub avg_pe_ratio: Option<f64>,
    pub avg_revenue_growth: Option<f64>,
    pub sum_revenue: Option<f64>,
    pub created_at: DateTime<Utc>,
}
