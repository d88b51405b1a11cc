use std::time::Duration;

use thiserror::Error;
use url::Url;

pub const DEFAULT_TARGET_INDUSTRIES: &str =
    "Banks - Diversified,Software - Application,Consumer Electronics";
pub const DEFAULT_BASE_URL: &str = "https://api.test.fiindo.com";
pub const DEFAULT_DATABASE_PATH: &str = "industry_metrics.db";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Startup configuration problems; any of these aborts the process
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("{0} environment variable required")]
    MissingVar(&'static str),
    #[error("invalid data provider base URL {url:?}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    #[error("target industry list is empty")]
    NoTargetIndustries,
    #[error("invalid REQUEST_TIMEOUT_SECS value {0:?}")]
    InvalidTimeout(String),
}

/// Configuration for the application, built once at startup
#[derive(Debug, Clone)]
pub struct Config {
    pub first_name: String,
    pub last_name: String,
    pub target_industries: Vec<String>,
    pub base_url: String,
    pub database_path: String,
    pub request_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if it exists
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::MissingVar(key))
        };

        let first_name = required("FIRST_NAME")?;
        let last_name = required("LAST_NAME")?;

        let target_industries = parse_industry_list(
            &lookup("TARGET_INDUSTRIES").unwrap_or_else(|| DEFAULT_TARGET_INDUSTRIES.to_string()),
        );
        if target_industries.is_empty() {
            return Err(ConfigError::NoTargetIndustries);
        }

        let base_url = lookup("FUNDAMENTALS_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let base_url = validate_base_url(&base_url)?;

        let database_path = database_path_from_lookup(&lookup);

        let request_timeout = match lookup("REQUEST_TIMEOUT_SECS") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => return Err(ConfigError::InvalidTimeout(raw)),
            },
            None => Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        };

        Ok(Config {
            first_name,
            last_name,
            target_industries,
            base_url,
            database_path,
            request_timeout,
        })
    }

    /// Token sent as `Authorization: Bearer <token>`
    pub fn bearer_token(&self) -> String {
        format!("{}.{}", self.first_name, self.last_name)
    }
}

/// SQLite file location alone, for commands that never contact the provider
pub fn database_path_from_env() -> String {
    dotenvy::dotenv().ok();
    database_path_from_lookup(|key| std::env::var(key).ok())
}

pub fn database_path_from_lookup<F>(lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    lookup("DATABASE_PATH")
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_DATABASE_PATH.to_string())
}

/// Split a comma-separated industry list, dropping blank entries
pub fn parse_industry_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn validate_base_url(raw: &str) -> Result<String, ConfigError> {
    let parsed = Url::parse(raw).map_err(|e| ConfigError::InvalidBaseUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidBaseUrl {
            url: raw.to_string(),
            reason: format!("unsupported scheme {}", parsed.scheme()),
        });
    }

    Ok(raw.trim_end_matches('/').to_string())
}
