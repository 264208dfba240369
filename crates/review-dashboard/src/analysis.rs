//! Per-bucket sentiment aggregation.
use scrape_common::sentiment::PolarityScorer;
use serde::Serialize;

use crate::model::{ReviewMap, StarBucket};

/// Mean polarity of one star bucket.
///
/// `score` is 0.0 when the bucket has no reviews; `review_count` tells that
/// case apart from a genuinely neutral bucket.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BucketSentiment {
    pub bucket: StarBucket,
    pub score: f64,
    pub review_count: usize,
}

impl BucketSentiment {
    pub fn has_data(&self) -> bool {
        self.review_count > 0
    }
}

/// One entry per star bucket, in bucket order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentimentReport {
    pub buckets: Vec<BucketSentiment>,
}

/// One bar of the sentiment chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartRow {
    pub star: String,
    pub stars: u8,
    pub score: f64,
    pub has_data: bool,
}

/// Average review polarity per bucket. Buckets missing from `reviews` are
/// treated as empty, so the report always covers all five buckets.
pub fn aggregate(reviews: &ReviewMap, scorer: &PolarityScorer) -> SentimentReport {
    let buckets = StarBucket::ALL
        .iter()
        .map(|&bucket| {
            let texts = reviews.get(&bucket).map(Vec::as_slice).unwrap_or_default();
            let total: f64 = texts.iter().map(|t| scorer.polarity(t)).sum();
            let score = if texts.is_empty() {
                0.0
            } else {
                total / texts.len() as f64
            };
            BucketSentiment {
                bucket,
                score,
                review_count: texts.len(),
            }
        })
        .collect();

    SentimentReport { buckets }
}

impl SentimentReport {
    pub fn chart_rows(&self) -> Vec<ChartRow> {
        self.buckets
            .iter()
            .map(|b| ChartRow {
                star: b.bucket.label().to_string(),
                stars: b.bucket.stars(),
                score: b.score,
                has_data: b.has_data(),
            })
            .collect()
    }
}
