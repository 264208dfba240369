//! In-memory cache of search results, keyed by search phrase.
//!
//! Entries carry the time they were fetched and expire after a fixed TTL.
//! A single phrase can also be invalidated explicitly (manual refresh).
//! Nothing is persisted; the cache lives as long as the process.
//!
//! Key schema: `search:v1:{sha256(normalized phrase)}`, where the phrase is
//! trimmed, whitespace-collapsed and lowercased.
use std::collections::HashMap;
use std::time::{Duration, Instant};

use sha2::{Digest, Sha256};
use tokio::sync::RwLock;
use tracing::debug;

use crate::search::SearchOutcome;

const KEY_PREFIX: &str = "search:v1:";

#[derive(Debug, Clone)]
pub struct CachedSearch {
    pub phrase: String,
    pub outcome: SearchOutcome,
    pub fetched_at: Instant,
}

impl CachedSearch {
    pub fn age(&self) -> Duration {
        self.fetched_at.elapsed()
    }
}

pub struct SearchCache {
    ttl: Duration,
    entries: RwLock<HashMap<String, CachedSearch>>,
}

impl SearchCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Fresh entry for `phrase`, if any. Expired entries are never returned.
    pub async fn get(&self, phrase: &str) -> Option<CachedSearch> {
        let key = search_key(phrase);
        let entries = self.entries.read().await;
        let entry = entries.get(&key)?;
        if entry.age() >= self.ttl {
            debug!(phrase, "search cache entry expired");
            return None;
        }
        Some(entry.clone())
    }

    /// Store `outcome` for `phrase`, replacing any previous entry, and drop
    /// every expired entry.
    pub async fn insert(&self, phrase: &str, outcome: SearchOutcome) -> CachedSearch {
        let entry = CachedSearch {
            phrase: phrase.trim().to_string(),
            outcome,
            fetched_at: Instant::now(),
        };
        let mut entries = self.entries.write().await;
        let ttl = self.ttl;
        entries.retain(|_, e| e.age() < ttl);
        entries.insert(search_key(phrase), entry.clone());
        entry
    }

    /// Remove the entry for `phrase`. Returns whether one existed.
    pub async fn invalidate(&self, phrase: &str) -> bool {
        let key = search_key(phrase);
        self.entries.write().await.remove(&key).is_some()
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

fn normalize(phrase: &str) -> String {
    phrase
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Compute a deterministic cache key for a search phrase using SHA-256.
fn search_key(phrase: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalize(phrase).as_bytes());
    let hash = hasher.finalize();
    format!("{KEY_PREFIX}{:x}", hash)
}
