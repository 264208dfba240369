use std::str::FromStr;
use std::time::Duration;

use scrape_common::http::{HttpConfig, DEFAULT_BASE_URL};

use crate::error::AppError;

/// Application configuration loaded explicitly from environment variables.
///
/// Every variable is optional and falls back to a default, but a variable that
/// is present and does not parse is a configuration error rather than being
/// silently ignored.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the dashboard listens on, e.g. "127.0.0.1:8501".
    pub bind_addr: String,
    /// WebDriver endpoint used for review pages, e.g. "http://localhost:9515".
    pub webdriver_url: String,
    /// How long a cached search result stays fresh.
    pub cache_ttl: Duration,
    /// Wait after each review-page navigation before reading the DOM.
    pub review_settle: Duration,
    /// Store base URL and search request timeout.
    pub http: HttpConfig,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// - `DASHBOARD_BIND` (default `127.0.0.1:8501`)
    /// - `STORE_BASE_URL` (default `https://www.amazon.com.br`)
    /// - `WEBDRIVER_URL` (default `http://localhost:9515`)
    /// - `SEARCH_CACHE_TTL_SECS` (default 900)
    /// - `REVIEW_SETTLE_MS` (default 2000)
    /// - `HTTP_TIMEOUT_SECS` (default 30)
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let bind_addr = lookup("DASHBOARD_BIND").unwrap_or_else(|| "127.0.0.1:8501".to_string());
        let base_url = lookup("STORE_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let webdriver_url =
            lookup("WEBDRIVER_URL").unwrap_or_else(|| "http://localhost:9515".to_string());

        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(AppError::Config(format!(
                "STORE_BASE_URL must be an http(s) URL, got '{base_url}'"
            )));
        }

        let cache_ttl = Duration::from_secs(parse_var(&lookup, "SEARCH_CACHE_TTL_SECS", 900)?);
        let review_settle = Duration::from_millis(parse_var(&lookup, "REVIEW_SETTLE_MS", 2_000)?);
        let http_timeout = Duration::from_secs(parse_var(&lookup, "HTTP_TIMEOUT_SECS", 30)?);

        Ok(Self {
            bind_addr,
            webdriver_url,
            cache_ttl,
            review_settle,
            http: HttpConfig::new(&base_url, http_timeout),
        })
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, AppError> {
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| AppError::Config(format!("{key} has an invalid value: '{raw}'"))),
    }
}
