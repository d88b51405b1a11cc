use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client,
};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use super::FundamentalsProvider;
use crate::models::{CompanyProfile, Config, StatementKind, StatementRow};

/// HTTP client for the fundamentals data provider
pub struct FundamentalsClient {
    client: Client,
    base_url: String,
}

impl FundamentalsClient {
    /// Create a new client with the bearer header and timeout from `config`
    pub fn new(config: &Config) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", config.bearer_token()))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(config.request_timeout)
            .user_agent("industry-metrics/0.1")
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn send(&self, endpoint: &str) -> Result<reqwest::Response> {
        let url = format!("{}{}", self.base_url, endpoint);
        debug!("Making request to: {}", url);

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(anyhow!("request to {} failed with status {}", url, response.status()));
        }
        Ok(response)
    }

    async fn fetch_json(&self, endpoint: &str) -> Result<Value> {
        Ok(self.send(endpoint).await?.json().await?)
    }

    async fn fetch_text(&self, endpoint: &str) -> Result<String> {
        Ok(self.send(endpoint).await?.text().await?)
    }

    /// GET a JSON document; failures are logged and yield `None`
    async fn get_json(&self, endpoint: &str) -> Option<Value> {
        match self.fetch_json(endpoint).await {
            Ok(json) => Some(json),
            Err(e) => {
                warn!("Request failed for {}: {}", endpoint, e);
                None
            }
        }
    }

    async fn get_text(&self, endpoint: &str) -> Option<String> {
        match self.fetch_text(endpoint).await {
            Ok(text) => Some(text),
            Err(e) => {
                warn!("Request failed for {}: {}", endpoint, e);
                None
            }
        }
    }
}

#[async_trait]
impl FundamentalsProvider for FundamentalsClient {
    async fn check_health(&self) -> bool {
        match self.get_text("/health").await {
            Some(body) if is_healthy(&body) => {
                info!("System health check passed: {}", body.trim());
                true
            }
            _ => {
                error!("System health check failed");
                false
            }
        }
    }

    async fn get_symbols(&self) -> Vec<String> {
        self.get_json("/api/v1/symbols")
            .await
            .map(|data| parse_symbols(&data))
            .unwrap_or_default()
    }

    async fn get_company_profile(&self, symbol: &str) -> Option<CompanyProfile> {
        let data = self.get_json(&format!("/api/v1/general/{}", symbol)).await?;
        parse_profile(&data)
    }

    async fn get_eod_price(&self, symbol: &str) -> Option<f64> {
        let data = self.get_json(&format!("/api/v1/eod/{}", symbol)).await?;
        latest_close(&data)
    }

    async fn get_financials(&self, symbol: &str, kind: StatementKind) -> Option<Vec<StatementRow>> {
        let endpoint = format!("/api/v1/financials/{}/{}", symbol, kind.as_str());
        let data = self.get_json(&endpoint).await?;
        parse_statement_rows(&data, kind)
    }
}

/// Health responses look like `"Ok 0.1.190"`, quotes included
pub fn is_healthy(body: &str) -> bool {
    body.starts_with("\"Ok")
}

pub fn parse_symbols(data: &Value) -> Vec<String> {
    data.get("symbols")
        .and_then(Value::as_array)
        .map(|symbols| {
            symbols
                .iter()
                .filter_map(|s| s.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

/// First entry of `fundamentals.profile.data`; an empty object counts as missing
pub fn parse_profile(data: &Value) -> Option<CompanyProfile> {
    let profile = data
        .pointer("/fundamentals/profile/data/0")?
        .as_object()
        .filter(|p| !p.is_empty())?;

    Some(CompanyProfile {
        industry: profile.get("industry").and_then(Value::as_str).map(str::to_string),
        price: profile.get("price").and_then(Value::as_f64),
    })
}

/// Close price of the entry with the latest date in `stockprice.data`
pub fn latest_close(data: &Value) -> Option<f64> {
    let entries = data.pointer("/stockprice/data")?.as_array()?;

    // max_by_key keeps the last maximum, so fold to keep the first one
    let latest = entries.iter().fold(None::<&Value>, |best, entry| match best {
        Some(b) if entry_date(entry) <= entry_date(b) => Some(b),
        _ => Some(entry),
    })?;

    latest.get("close").and_then(Value::as_f64)
}

fn entry_date(entry: &Value) -> &str {
    entry.get("date").and_then(Value::as_str).unwrap_or("")
}

/// Rows under `fundamentals.financials.<statement>.data`.
///
/// Entries that are not JSON objects are dropped.
pub fn parse_statement_rows(data: &Value, kind: StatementKind) -> Option<Vec<StatementRow>> {
    let entries = data
        .get("fundamentals")?
        .get("financials")?
        .get(kind.as_str())?
        .get("data")?
        .as_array()?;

    let rows = entries
        .iter()
        .filter(|entry| entry.is_object())
        .filter_map(|entry| match serde_json::from_value::<StatementRow>(entry.clone()) {
            Ok(row) => Some(row),
            Err(e) => {
                debug!("Skipping malformed {} row: {}", kind.as_str(), e);
                None
            }
        })
        .collect();

    Some(rows)
}
