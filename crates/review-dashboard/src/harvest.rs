//! Review harvesting through a headless browser.
//!
//! For one product, every star bucket is paged through in order. Pagination
//! of a bucket stops at the page limit, at the first page without reviews, or
//! at the first page that fails to load; the reason is kept per bucket.
use std::sync::Arc;

use scrape_common::webdriver::{BrowserLauncher, BrowserSession};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::error::AppError;
use crate::model::{ReviewMap, StarBucket};

/// Review pages requested per star bucket.
pub const REVIEW_PAGES: u32 = 3;

const REVIEW_BODY: &str = r#"span[data-hook="review-body"]"#;

/// What one review page yielded.
#[derive(Debug, Clone, PartialEq)]
pub enum PageOutcome {
    Reviews(Vec<String>),
    /// The page loaded but held no review nodes.
    Exhausted,
    /// Navigation or DOM lookup failed.
    Failed(String),
}

/// Why pagination of a bucket ended.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BucketStop {
    PageLimit,
    Exhausted { page: u32 },
    Failed { page: u32, reason: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct BucketHarvest {
    pub bucket: StarBucket,
    pub reviews: Vec<String>,
    pub pages_requested: u32,
    pub stop: BucketStop,
}

/// All buckets of one product, in bucket order.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewHarvest {
    pub product_id: String,
    pub buckets: Vec<BucketHarvest>,
}

impl ReviewHarvest {
    pub fn review_map(&self) -> ReviewMap {
        self.buckets
            .iter()
            .map(|b| (b.bucket, b.reviews.clone()))
            .collect()
    }

    pub fn total_reviews(&self) -> usize {
        self.buckets.iter().map(|b| b.reviews.len()).sum()
    }
}

/// Starts one browser per harvest. Harvests run one at a time: the browser
/// lock is held by the spawned harvest task, so a caller that goes away
/// neither leaks the session nor lets a second browser start beside it.
pub struct ReviewHarvester {
    launcher: Arc<dyn BrowserLauncher>,
    base_url: String,
    browser_lock: Arc<Mutex<()>>,
}

impl ReviewHarvester {
    pub fn new(launcher: Arc<dyn BrowserLauncher>, base_url: &str) -> Self {
        Self {
            launcher,
            base_url: base_url.trim_end_matches('/').to_string(),
            browser_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Collect reviews for every star bucket of `product_id`.
    ///
    /// One browser session is started for the call and closed before the
    /// harvest task ends, even if the returned future is dropped first. Only
    /// a failure to start the browser is an error; page failures end the
    /// affected bucket and are reported in its `stop`.
    pub async fn harvest(&self, product_id: &str) -> Result<ReviewHarvest, AppError> {
        let launcher = Arc::clone(&self.launcher);
        let base_url = self.base_url.clone();
        let product_id = product_id.to_string();
        let browser_lock = Arc::clone(&self.browser_lock);

        let task = tokio::spawn(async move {
            let _browser = browser_lock.lock_owned().await;
            run_harvest(launcher.as_ref(), &base_url, product_id).await
        });
        task.await.map_err(|e| AppError::Harvest(e.to_string()))?
    }
}

async fn run_harvest(
    launcher: &dyn BrowserLauncher,
    base_url: &str,
    product_id: String,
) -> Result<ReviewHarvest, AppError> {
    let mut session = launcher.launch().await?;

    let mut buckets = Vec::with_capacity(StarBucket::ALL.len());
    for bucket in StarBucket::ALL {
        let harvested = harvest_bucket(session.as_mut(), base_url, &product_id, bucket).await;
        buckets.push(harvested);
    }

    if let Err(e) = session.close().await {
        warn!(error = %e, "failed to close browser session");
    }

    let harvest = ReviewHarvest { product_id, buckets };
    info!(
        product_id = %harvest.product_id,
        reviews = harvest.total_reviews(),
        "review harvest complete"
    );
    Ok(harvest)
}

async fn harvest_bucket(
    session: &mut dyn BrowserSession,
    base_url: &str,
    product_id: &str,
    bucket: StarBucket,
) -> BucketHarvest {
    let mut reviews = Vec::new();
    let mut pages_requested = 0;
    let mut stop = BucketStop::PageLimit;

    for page in 1..=REVIEW_PAGES {
        let url = review_url(base_url, product_id, bucket, page);
        info!(url = %url, "scraping review page");
        pages_requested += 1;

        match fetch_review_page(session, &url).await {
            PageOutcome::Reviews(mut texts) => reviews.append(&mut texts),
            PageOutcome::Exhausted => {
                info!(%bucket, page, "no reviews found");
                stop = BucketStop::Exhausted { page };
                break;
            }
            PageOutcome::Failed(reason) => {
                warn!(%bucket, page, reason = %reason, "review page failed");
                stop = BucketStop::Failed { page, reason };
                break;
            }
        }
    }

    BucketHarvest {
        bucket,
        reviews,
        pages_requested,
        stop,
    }
}

async fn fetch_review_page(session: &mut dyn BrowserSession, url: &str) -> PageOutcome {
    match session.collect_texts(url, REVIEW_BODY).await {
        Ok(texts) if texts.is_empty() => PageOutcome::Exhausted,
        Ok(texts) => PageOutcome::Reviews(texts),
        Err(e) => PageOutcome::Failed(e.to_string()),
    }
}

/// Review listing URL for one bucket page.
pub fn review_url(base_url: &str, product_id: &str, bucket: StarBucket, page: u32) -> String {
    format!(
        "{base_url}/product-reviews/{product_id}/ref=cm_cr_arp_d_viewopt_sr?filterByStar={}&pageNumber={page}",
        bucket.label()
    )
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    use futures::future::{BoxFuture, FutureExt};
    use scrape_common::error::CommonError;

    use super::*;

    /// Scripted page outcome keyed by (bucket label, page). Unscripted pages
    /// are empty.
    #[derive(Clone)]
    pub(crate) enum Scripted {
        Reviews(Vec<&'static str>),
        Error(&'static str),
    }

    /// Browser stand-in that serves scripted review pages and records every
    /// navigation. `live` counts sessions launched but not yet closed.
    #[derive(Default)]
    pub(crate) struct FakeBrowser {
        pub(crate) script: HashMap<(String, u32), Scripted>,
        pub(crate) visited: Arc<Mutex<Vec<String>>>,
        pub(crate) launches: AtomicUsize,
        pub(crate) closes: Arc<AtomicUsize>,
        pub(crate) live: Arc<AtomicUsize>,
        pub(crate) max_live: AtomicUsize,
        pub(crate) page_delay: Duration,
        pub(crate) refuse_launch: bool,
    }

    impl FakeBrowser {
        pub(crate) fn scripted(pages: &[(StarBucket, u32, Scripted)]) -> Self {
            Self {
                script: pages
                    .iter()
                    .map(|(bucket, page, s)| ((bucket.label().to_string(), *page), s.clone()))
                    .collect(),
                ..Self::default()
            }
        }

        pub(crate) fn visited(&self) -> Vec<String> {
            self.visited.lock().unwrap().clone()
        }
    }

    struct FakeSession {
        script: HashMap<(String, u32), Scripted>,
        visited: Arc<Mutex<Vec<String>>>,
        closes: Arc<AtomicUsize>,
        live: Arc<AtomicUsize>,
        page_delay: Duration,
    }

    impl BrowserLauncher for FakeBrowser {
        fn launch(&self) -> BoxFuture<'_, Result<Box<dyn BrowserSession>, CommonError>> {
            self.launches.fetch_add(1, Ordering::SeqCst);
            let result: Result<Box<dyn BrowserSession>, CommonError> = if self.refuse_launch {
                Err(CommonError::WebDriver("connection refused".to_string()))
            } else {
                let live = self.live.fetch_add(1, Ordering::SeqCst) + 1;
                self.max_live.fetch_max(live, Ordering::SeqCst);
                Ok(Box::new(FakeSession {
                    script: self.script.clone(),
                    visited: Arc::clone(&self.visited),
                    closes: Arc::clone(&self.closes),
                    live: Arc::clone(&self.live),
                    page_delay: self.page_delay,
                }))
            };
            async move { result }.boxed()
        }
    }

    impl BrowserSession for FakeSession {
        fn collect_texts<'a>(
            &'a mut self,
            url: &'a str,
            _selector: &'a str,
        ) -> BoxFuture<'a, Result<Vec<String>, CommonError>> {
            self.visited.lock().unwrap().push(url.to_string());
            let key = script_key(url);
            let result = match self.script.get(&key) {
                Some(Scripted::Reviews(texts)) => {
                    Ok(texts.iter().map(|t| t.to_string()).collect())
                }
                Some(Scripted::Error(reason)) => Err(CommonError::WebDriver(reason.to_string())),
                None => Ok(Vec::new()),
            };
            let delay = self.page_delay;
            async move {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                result
            }
            .boxed()
        }

        fn close(self: Box<Self>) -> BoxFuture<'static, Result<(), CommonError>> {
            self.live.fetch_sub(1, Ordering::SeqCst);
            self.closes.fetch_add(1, Ordering::SeqCst);
            async { Ok(()) }.boxed()
        }
    }

    fn script_key(url: &str) -> (String, u32) {
        let query = url.split_once('?').map(|(_, q)| q).unwrap_or_default();
        let mut bucket = String::new();
        let mut page = 0;
        for pair in query.split('&') {
            match pair.split_once('=') {
                Some(("filterByStar", v)) => bucket = v.to_string(),
                Some(("pageNumber", v)) => page = v.parse().unwrap_or(0),
                _ => {}
            }
        }
        (bucket, page)
    }

    fn harvester(browser: Arc<FakeBrowser>) -> ReviewHarvester {
        ReviewHarvester::new(browser, "https://store.test/")
    }

    #[test]
    fn review_url_follows_store_template() {
        assert_eq!(
            review_url("https://www.amazon.com.br", "B0ABC12345", StarBucket::FourStar, 2),
            "https://www.amazon.com.br/product-reviews/B0ABC12345/ref=cm_cr_arp_d_viewopt_sr?filterByStar=four_star&pageNumber=2"
        );
    }

    #[tokio::test]
    async fn empty_page_stops_bucket_pagination() {
        let browser = Arc::new(FakeBrowser::scripted(&[(
            StarBucket::FiveStar,
            1,
            Scripted::Reviews(vec!["Great", "Excellent"]),
        )]));
        let harvest = harvester(browser.clone()).harvest("B0ABC12345").await.unwrap();

        let visited = browser.visited();
        let five_star: Vec<&String> = visited
            .iter()
            .filter(|u| u.contains("filterByStar=five_star"))
            .collect();
        assert_eq!(five_star.len(), 2, "page 3 must not be requested");
        assert!(!visited.iter().any(|u| u.contains("pageNumber=3")));

        let five = &harvest.buckets[4];
        assert_eq!(five.bucket, StarBucket::FiveStar);
        assert_eq!(five.reviews, vec!["Great", "Excellent"]);
        assert_eq!(five.stop, BucketStop::Exhausted { page: 2 });
        assert_eq!(five.pages_requested, 2);

        let one = &harvest.buckets[0];
        assert!(one.reviews.is_empty());
        assert_eq!(one.stop, BucketStop::Exhausted { page: 1 });
        assert_eq!(one.pages_requested, 1);
    }

    #[tokio::test]
    async fn full_buckets_stop_at_page_limit() {
        let pages: Vec<(StarBucket, u32, Scripted)> = (1..=REVIEW_PAGES)
            .map(|page| (StarBucket::ThreeStar, page, Scripted::Reviews(vec!["ok"])))
            .collect();
        let browser = Arc::new(FakeBrowser::scripted(&pages));
        let harvest = harvester(browser.clone()).harvest("B0ABC12345").await.unwrap();

        let three = &harvest.buckets[2];
        assert_eq!(three.reviews.len(), REVIEW_PAGES as usize);
        assert_eq!(three.stop, BucketStop::PageLimit);
        assert_eq!(browser.visited().len(), 4 + REVIEW_PAGES as usize);
    }

    #[tokio::test]
    async fn failed_page_is_distinguished_from_exhaustion() {
        let browser = Arc::new(FakeBrowser::scripted(&[
            (StarBucket::TwoStar, 1, Scripted::Reviews(vec!["meh"])),
            (StarBucket::TwoStar, 2, Scripted::Error("timeout")),
            (StarBucket::TwoStar, 3, Scripted::Reviews(vec!["never read"])),
        ]));
        let harvest = harvester(browser.clone()).harvest("B0ABC12345").await.unwrap();

        let two = &harvest.buckets[1];
        assert_eq!(two.reviews, vec!["meh"]);
        assert!(matches!(
            two.stop,
            BucketStop::Failed { page: 2, ref reason } if reason.contains("timeout")
        ));
        assert!(!browser
            .visited()
            .iter()
            .any(|u| u.contains("filterByStar=two_star") && u.contains("pageNumber=3")));
    }

    #[tokio::test]
    async fn every_bucket_is_present_and_session_is_closed() {
        let browser = Arc::new(FakeBrowser::default());
        let harvest = harvester(browser.clone()).harvest("B0ABC12345").await.unwrap();

        let buckets: Vec<StarBucket> = harvest.buckets.iter().map(|b| b.bucket).collect();
        assert_eq!(buckets, StarBucket::ALL.to_vec());
        assert_eq!(harvest.review_map().len(), 5);
        assert_eq!(harvest.total_reviews(), 0);
        assert_eq!(browser.launches.load(Ordering::SeqCst), 1);
        assert_eq!(browser.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn launch_failure_is_an_error() {
        let browser = Arc::new(FakeBrowser {
            refuse_launch: true,
            ..FakeBrowser::default()
        });
        let err = harvester(browser).harvest("B0ABC12345").await.unwrap_err();
        assert!(matches!(err, AppError::Common(CommonError::WebDriver(_))));
    }

    #[tokio::test]
    async fn abandoned_harvest_still_closes_its_browser() {
        let browser = Arc::new(FakeBrowser {
            page_delay: Duration::from_millis(50),
            ..FakeBrowser::default()
        });
        let harvester = harvester(browser.clone());

        let cut_short =
            tokio::time::timeout(Duration::from_millis(120), harvester.harvest("B0ABC12345")).await;
        assert!(cut_short.is_err());
        assert_eq!(browser.closes.load(Ordering::SeqCst), 0);

        for _ in 0..100 {
            if browser.closes.load(Ordering::SeqCst) == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(browser.closes.load(Ordering::SeqCst), 1);
        assert_eq!(browser.live.load(Ordering::SeqCst), 0);
        assert_eq!(browser.visited().len(), StarBucket::ALL.len());
    }

    #[tokio::test]
    async fn concurrent_harvests_share_one_browser_at_a_time() {
        let browser = Arc::new(FakeBrowser {
            page_delay: Duration::from_millis(10),
            ..FakeBrowser::scripted(&[(StarBucket::FiveStar, 1, Scripted::Reviews(vec!["Great"]))])
        });
        let harvester = harvester(browser.clone());

        let (first, second) = tokio::join!(
            harvester.harvest("B0AAAAAAA1"),
            harvester.harvest("B0AAAAAAA2")
        );
        assert_eq!(first.unwrap().product_id, "B0AAAAAAA1");
        assert_eq!(second.unwrap().total_reviews(), 1);
        assert_eq!(browser.launches.load(Ordering::SeqCst), 2);
        assert_eq!(browser.closes.load(Ordering::SeqCst), 2);
        assert_eq!(browser.max_live.load(Ordering::SeqCst), 1);
    }
}
