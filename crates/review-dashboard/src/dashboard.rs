//! The dashboard's operations, independent of HTTP.
//!
//! Session-level operations take the session by `&mut` and leave it in the
//! state the next page render should show. Callers serialize access to the
//! session, so one operation runs at a time.
use scrape_common::sentiment::PolarityScorer;
use tracing::info;

use crate::analysis;
use crate::cache::{CachedSearch, SearchCache};
use crate::error::AppError;
use crate::harvest::ReviewHarvester;
use crate::search::ProductSearch;
use crate::session::{ReviewAnalysis, Session};

pub struct Dashboard {
    search: ProductSearch,
    harvester: ReviewHarvester,
    cache: SearchCache,
    scorer: PolarityScorer,
}

impl Dashboard {
    pub fn new(search: ProductSearch, harvester: ReviewHarvester, cache: SearchCache) -> Self {
        Self {
            search,
            harvester,
            cache,
            scorer: PolarityScorer::new(),
        }
    }

    /// Products for `phrase`, from the cache while fresh.
    pub async fn search(&self, phrase: &str) -> Result<CachedSearch, AppError> {
        if let Some(cached) = self.cache.get(phrase).await {
            info!(phrase, age_secs = cached.age().as_secs(), "search cache hit");
            return Ok(cached);
        }
        let outcome = self.search.search(phrase).await?;
        Ok(self.cache.insert(phrase, outcome).await)
    }

    /// Drop any cached result for `phrase` and search again.
    pub async fn refresh(&self, phrase: &str) -> Result<CachedSearch, AppError> {
        if self.cache.invalidate(phrase).await {
            info!(phrase, "search cache entry invalidated");
        }
        self.search(phrase).await
    }

    /// Harvest reviews of `product_id` and score every bucket.
    pub async fn analyze(&self, product_id: &str) -> Result<ReviewAnalysis, AppError> {
        let harvest = self.harvester.harvest(product_id).await?;
        let report = analysis::aggregate(&harvest.review_map(), &self.scorer);
        Ok(ReviewAnalysis { harvest, report })
    }

    pub async fn submit_search(&self, session: &mut Session, phrase: &str) {
        match self.search(phrase).await {
            Ok(found) => session.begin_search(&found),
            Err(e) => session.fail_search(phrase, &e),
        }
    }

    pub async fn submit_refresh(&self, session: &mut Session, phrase: &str) {
        match self.refresh(phrase).await {
            Ok(found) => session.begin_search(&found),
            Err(e) => session.fail_search(phrase, &e),
        }
    }

    /// Select `product_id` and fetch its reviews. Blocks until the harvest is
    /// done. Unknown products are an error; a failed harvest is reported
    /// through the session.
    pub async fn fetch_reviews(
        &self,
        session: &mut Session,
        product_id: &str,
    ) -> Result<(), AppError> {
        session.select(product_id)?;
        match self.analyze(product_id).await {
            Ok(analysis) => session.record_analysis(analysis),
            Err(e) => session.fail_reviews(&e),
        }
        Ok(())
    }
}
