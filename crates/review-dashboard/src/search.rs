//! Product search: fetches a fixed number of result pages and merges the
//! parsed products into one map.
use std::sync::Arc;

use scrape_common::http::SearchPageSource;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::error::AppError;
use crate::model::ProductMap;
use crate::parser;

/// Result pages fetched per search.
pub const SEARCH_PAGES: u32 = 2;

/// Products of one search plus what it took to get them.
#[derive(Debug, Clone, Default)]
pub struct SearchOutcome {
    pub products: ProductMap,
    pub pages_fetched: u32,
    pub pages_failed: u32,
    pub skipped: usize,
}

/// Searches run one at a time against the store.
pub struct ProductSearch {
    source: Arc<dyn SearchPageSource>,
    fetch_lock: Mutex<()>,
}

impl ProductSearch {
    pub fn new(source: Arc<dyn SearchPageSource>) -> Self {
        Self {
            source,
            fetch_lock: Mutex::new(()),
        }
    }

    /// Fetch and parse pages `1..=SEARCH_PAGES` for `phrase`.
    ///
    /// A page that fails to load counts as a page without results. The search
    /// fails only when no page could be loaded at all.
    pub async fn search(&self, phrase: &str) -> Result<SearchOutcome, AppError> {
        let phrase = phrase.trim();
        if phrase.is_empty() {
            return Err(AppError::EmptyQuery);
        }

        let _fetching = self.fetch_lock.lock().await;
        let mut outcome = SearchOutcome::default();
        for page in 1..=SEARCH_PAGES {
            let html = match self.source.fetch_search_page(phrase, page).await {
                Ok(html) => html,
                Err(e) => {
                    warn!(error = %e, phrase, page, "search page failed, treating as empty");
                    outcome.pages_failed += 1;
                    continue;
                }
            };
            outcome.pages_fetched += 1;

            let parsed = parser::parse_search_page(&html);
            outcome.skipped += parsed.skipped.len();
            for product in parsed.products {
                outcome.products.insert(product.id.clone(), product);
            }
        }

        if outcome.pages_fetched == 0 {
            return Err(AppError::SearchUnavailable {
                pages: outcome.pages_failed,
            });
        }

        info!(
            phrase,
            products = outcome.products.len(),
            skipped = outcome.skipped,
            pages_failed = outcome.pages_failed,
            "search complete"
        );
        Ok(outcome)
    }
}
