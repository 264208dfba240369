//! Plain HTTP fetching of search-result pages.
//!
//! Requests carry a fixed header set that mimics a desktop browser; the store
//! serves a stripped page (or a captcha) to clients that look like bots.

use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};
use reqwest::header::{self, HeaderMap, HeaderValue};
use tracing::info;
use url::Url;

use crate::error::CommonError;

pub const DEFAULT_BASE_URL: &str = "https://www.amazon.com.br";

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/78.0.3904.108 Safari/537.36";
const ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

#[derive(Clone, Debug)]
pub struct HttpConfig {
    /// Store origin, without a trailing slash (e.g. "https://www.amazon.com.br").
    pub base_url: String,
    pub timeout: Duration,
}

impl HttpConfig {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        }
    }
}

/// Source of raw search-result markup, one page at a time.
pub trait SearchPageSource: Send + Sync {
    fn fetch_search_page<'a>(
        &'a self,
        phrase: &'a str,
        page: u32,
    ) -> BoxFuture<'a, Result<String, CommonError>>;
}

/// Build the search URL for `phrase` and `page`.
///
/// The phrase is trimmed and form-encoded, so spaces become `+`.
pub fn search_url(base_url: &str, phrase: &str, page: u32) -> Result<Url, CommonError> {
    let mut url = Url::parse(&format!("{}/s", base_url.trim_end_matches('/')))?;
    url.query_pairs_mut()
        .append_pair("k", phrase.trim())
        .append_pair("page", &page.to_string());
    Ok(url)
}

#[derive(Clone)]
pub struct SearchClient {
    config: HttpConfig,
    http: reqwest::Client,
}

impl SearchClient {
    pub fn new(config: HttpConfig) -> Result<Self, CommonError> {
        let http = reqwest::Client::builder()
            .default_headers(browser_headers())
            .timeout(config.timeout)
            .build()?;
        Ok(Self { config, http })
    }

    /// GET one page of search results. Non-2xx statuses are errors; there is
    /// no retry.
    pub async fn fetch_page(&self, phrase: &str, page: u32) -> Result<String, CommonError> {
        let url = search_url(&self.config.base_url, phrase, page)?;
        info!(url = %url, page, "scraping search page");

        let resp = self.http.get(url.clone()).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(CommonError::Upstream {
                status,
                url: url.to_string(),
            });
        }
        Ok(resp.text().await?)
    }
}

impl SearchPageSource for SearchClient {
    fn fetch_search_page<'a>(
        &'a self,
        phrase: &'a str,
        page: u32,
    ) -> BoxFuture<'a, Result<String, CommonError>> {
        self.fetch_page(phrase, page).boxed()
    }
}

fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::USER_AGENT, HeaderValue::from_static(USER_AGENT));
    headers.insert(header::ACCEPT, HeaderValue::from_static(ACCEPT));
    headers.insert(
        header::ACCEPT_ENCODING,
        HeaderValue::from_static("gzip, deflate"),
    );
    headers.insert(header::DNT, HeaderValue::from_static("1"));
    headers.insert(header::CONNECTION, HeaderValue::from_static("close"));
    headers.insert(
        header::UPGRADE_INSECURE_REQUESTS,
        HeaderValue::from_static("1"),
    );
    headers
}
