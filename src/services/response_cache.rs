//! Process-lifetime cache of responses already served
//!
//! Keys are built per resource kind (`logo_<fp>`, `desc_<issuer>_<currency>`,
//! `richlist_<fp>`, `offers_<account>`). There is no expiry; entries live
//! until restart unless a capacity is configured, in which case the least
//! recently used entry is evicted first.

use std::fmt;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use lru::LruCache;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::debug;

use crate::models::{OrderBook, RichList, TokenDetail};

/// Identifies one cached response
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Logo { fingerprint: String },
    Description { issuer: String, currency: String },
    RichList { fingerprint: String },
    Offers { account: String },
}

impl CacheKey {
    pub fn logo(fingerprint: &str) -> Self {
        Self::Logo {
            fingerprint: fingerprint.to_string(),
        }
    }

    pub fn description(issuer: &str, currency: &str) -> Self {
        Self::Description {
            issuer: issuer.to_string(),
            currency: currency.to_string(),
        }
    }

    pub fn rich_list(fingerprint: &str) -> Self {
        Self::RichList {
            fingerprint: fingerprint.to_string(),
        }
    }

    pub fn offers(account: &str) -> Self {
        Self::Offers {
            account: account.to_string(),
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Logo { fingerprint } => write!(f, "logo_{fingerprint}"),
            Self::Description { issuer, currency } => write!(f, "desc_{issuer}_{currency}"),
            Self::RichList { fingerprint } => write!(f, "richlist_{fingerprint}"),
            Self::Offers { account } => write!(f, "offers_{account}"),
        }
    }
}

/// A response exactly as it was returned to a client
#[derive(Debug, Clone, PartialEq)]
pub enum CachedPayload {
    /// Logo data URI
    Logo(String),
    Description(TokenDetail),
    RichList(RichList),
    Offers(OrderBook),
}

/// Cache counters exposed by the health endpoint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

#[derive(Clone)]
pub struct ResponseCache {
    entries: Arc<Mutex<LruCache<String, CachedPayload>>>,
    hits: Arc<AtomicU64>,
    misses: Arc<AtomicU64>,
}

impl ResponseCache {
    /// Cache without a size bound
    pub fn unbounded() -> Self {
        Self::from_lru(LruCache::unbounded())
    }

    /// Cache holding at most `capacity` entries
    pub fn with_capacity(capacity: NonZeroUsize) -> Self {
        Self::from_lru(LruCache::new(capacity))
    }

    /// Bounded when `max_entries` is a positive number, unbounded otherwise
    pub fn from_max_entries(max_entries: Option<usize>) -> Self {
        match max_entries.and_then(NonZeroUsize::new) {
            Some(capacity) => Self::with_capacity(capacity),
            None => Self::unbounded(),
        }
    }

    fn from_lru(lru: LruCache<String, CachedPayload>) -> Self {
        Self {
            entries: Arc::new(Mutex::new(lru)),
            hits: Arc::new(AtomicU64::new(0)),
            misses: Arc::new(AtomicU64::new(0)),
        }
    }

    pub async fn get(&self, key: &CacheKey) -> Option<CachedPayload> {
        let key = key.to_string();
        let found = self.entries.lock().await.get(&key).cloned();
        match found {
            Some(payload) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!("Cache hit: {}", key);
                Some(payload)
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    pub async fn set(&self, key: &CacheKey, payload: CachedPayload) {
        let key = key.to_string();
        debug!("Cache store: {}", key);
        self.entries.lock().await.put(key, payload);
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len().await,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::unbounded()
    }
}
