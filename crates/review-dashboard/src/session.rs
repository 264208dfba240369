//! Per-user dashboard state.
//!
//! Reset points: a new search replaces everything; "go back" clears only the
//! selected product, keeping the product list and fetched reviews.
use std::collections::HashMap;
use std::time::Instant;

use crate::analysis::SentimentReport;
use crate::cache::CachedSearch;
use crate::error::AppError;
use crate::harvest::ReviewHarvest;
use crate::model::{Product, ProductMap};

/// Harvested reviews of one product together with their sentiment.
#[derive(Debug, Clone)]
pub struct ReviewAnalysis {
    pub harvest: ReviewHarvest,
    pub report: SentimentReport,
}

/// Which screen the session is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Start,
    Products,
    Reviews,
}

#[derive(Debug, Default)]
pub struct Session {
    phrase: Option<String>,
    products: ProductMap,
    fetched_at: Option<Instant>,
    selected: Option<String>,
    reviews_fetched: bool,
    analyses: HashMap<String, ReviewAnalysis>,
    notice: Option<String>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start over with the results of a new search.
    pub fn begin_search(&mut self, search: &CachedSearch) {
        *self = Session {
            phrase: Some(search.phrase.clone()),
            products: search.outcome.products.clone(),
            fetched_at: Some(search.fetched_at),
            ..Session::default()
        };
        if self.products.is_empty() {
            self.notice = Some("No products found".to_string());
        }
    }

    /// Start over after a search that could not be completed.
    pub fn fail_search(&mut self, phrase: &str, error: &AppError) {
        *self = Session {
            phrase: Some(phrase.trim().to_string()).filter(|p| !p.is_empty()),
            notice: Some(error.to_string()),
            ..Session::default()
        };
    }

    /// Select one of the current products.
    pub fn select(&mut self, product_id: &str) -> Result<&Product, AppError> {
        let product = self
            .products
            .get(product_id)
            .ok_or_else(|| AppError::ProductNotFound(product_id.to_string()))?;
        self.selected = Some(product_id.to_string());
        self.reviews_fetched = false;
        self.notice = None;
        Ok(product)
    }

    /// Store the analysis of the selected product.
    pub fn record_analysis(&mut self, analysis: ReviewAnalysis) {
        self.reviews_fetched = true;
        self.analyses
            .insert(analysis.harvest.product_id.clone(), analysis);
    }

    /// The review fetch for the selected product failed; go back to the list.
    pub fn fail_reviews(&mut self, error: &AppError) {
        self.selected = None;
        self.reviews_fetched = false;
        self.notice = Some(format!("Could not fetch reviews: {error}"));
    }

    pub fn go_back(&mut self) {
        self.selected = None;
    }

    pub fn view(&self) -> View {
        if self.selected_product().is_some() {
            View::Reviews
        } else if !self.products.is_empty() {
            View::Products
        } else {
            View::Start
        }
    }

    pub fn phrase(&self) -> Option<&str> {
        self.phrase.as_deref()
    }

    pub fn products(&self) -> &ProductMap {
        &self.products
    }

    pub fn fetched_at(&self) -> Option<Instant> {
        self.fetched_at
    }

    pub fn selected_product(&self) -> Option<&Product> {
        self.selected.as_ref().and_then(|id| self.products.get(id))
    }

    pub fn reviews_fetched(&self) -> bool {
        self.reviews_fetched
    }

    /// Analysis of the selected product, if it has been fetched.
    pub fn current_analysis(&self) -> Option<&ReviewAnalysis> {
        self.selected.as_ref().and_then(|id| self.analyses.get(id))
    }

    pub fn analysis_for(&self, product_id: &str) -> Option<&ReviewAnalysis> {
        self.analyses.get(product_id)
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }
}
