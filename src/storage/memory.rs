use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::domain::Article;
use crate::storage::clock::{Clock, SystemClock};
use crate::storage::traits::ResolutionCache;

/// Age in milliseconds at which a resolved list must be fetched again
pub const RESOLUTION_TTL_MS: i64 = 900_000;

pub fn resolution_ttl() -> Duration {
    Duration::milliseconds(RESOLUTION_TTL_MS)
}

struct CacheEntry {
    articles: Vec<Article>,
    created_at: DateTime<Utc>,
}

/// Process-lifetime cache; entries are never evicted, only ignored once stale
pub struct InMemoryResolutionCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl InMemoryResolutionCache {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
            ttl: resolution_ttl(),
        }
    }

    /// Number of stored entries, stale ones included
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        // The map holds no invariants a panicking writer could break
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for InMemoryResolutionCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ResolutionCache for InMemoryResolutionCache {
    fn get(&self, key: &str) -> Option<Vec<Article>> {
        let now = self.clock.now();
        let entries = self.entries();
        let entry = entries.get(key)?;

        if now - entry.created_at < self.ttl {
            Some(entry.articles.clone())
        } else {
            debug!(key, "Cache entry is stale");
            None
        }
    }

    fn put(&self, key: &str, articles: Vec<Article>) {
        let entry = CacheEntry {
            articles,
            created_at: self.clock.now(),
        };
        self.entries().insert(key.to_string(), entry);
    }
}
