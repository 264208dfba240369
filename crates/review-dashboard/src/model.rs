use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A product card scraped from a search-results page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Store identifier taken from the detail-page URL, e.g. "B0ABC12345"
    pub id: String,
    pub name: String,
    pub image_url: String,
    /// Display price exactly as shown, e.g. "R$ 1.299,00"
    pub price: String,
    /// Average star rating, e.g. 4.5
    pub rating: f32,
    /// Number of ratings behind `rating`
    pub votes: u64,
}

/// Products of one search keyed by identifier. A later page overwrites an
/// earlier one on identifier collision.
pub type ProductMap = BTreeMap<String, Product>;

/// One of the five review-rating filters offered by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StarBucket {
    OneStar,
    TwoStar,
    ThreeStar,
    FourStar,
    FiveStar,
}

impl StarBucket {
    pub const ALL: [StarBucket; 5] = [
        StarBucket::OneStar,
        StarBucket::TwoStar,
        StarBucket::ThreeStar,
        StarBucket::FourStar,
        StarBucket::FiveStar,
    ];

    /// Value of the store's `filterByStar` query parameter.
    pub fn label(self) -> &'static str {
        match self {
            StarBucket::OneStar => "one_star",
            StarBucket::TwoStar => "two_star",
            StarBucket::ThreeStar => "three_star",
            StarBucket::FourStar => "four_star",
            StarBucket::FiveStar => "five_star",
        }
    }

    /// Label with the first letter capitalised, e.g. "One_star".
    pub fn title(self) -> String {
        let label = self.label();
        let mut chars = label.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }

    pub fn stars(self) -> u8 {
        match self {
            StarBucket::OneStar => 1,
            StarBucket::TwoStar => 2,
            StarBucket::ThreeStar => 3,
            StarBucket::FourStar => 4,
            StarBucket::FiveStar => 5,
        }
    }
}

impl fmt::Display for StarBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Raw review texts per bucket, in page order. No deduplication.
pub type ReviewMap = BTreeMap<StarBucket, Vec<String>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buckets_are_ordered_one_to_five() {
        let stars: Vec<u8> = StarBucket::ALL.iter().map(|b| b.stars()).collect();
        assert_eq!(stars, vec![1, 2, 3, 4, 5]);
        assert!(StarBucket::OneStar < StarBucket::FiveStar);
    }

    #[test]
    fn bucket_labels_match_store_filter_values() {
        assert_eq!(StarBucket::ThreeStar.label(), "three_star");
        assert_eq!(StarBucket::FiveStar.title(), "Five_star");
        assert_eq!(
            serde_json::to_string(&StarBucket::TwoStar).unwrap(),
            "\"two_star\""
        );
    }
}
