//! Fingerprint → logo data URI
//!
//! Lookup order: response cache, then the durable logo store, then the logo
//! host. Only successful downloads are stored; a failed download returns an
//! empty logo and the next request for the same fingerprint tries again.

use std::sync::Arc;

use tracing::{debug, warn};

use super::logo_store::LogoStore;
use super::response_cache::{CacheKey, CachedPayload, ResponseCache};
use super::single_flight::SingleFlight;
use super::upstream::TokenDataSource;

#[derive(Clone)]
pub struct LogoResolver {
    source: Arc<dyn TokenDataSource>,
    cache: ResponseCache,
    store: LogoStore,
    flights: SingleFlight<String>,
}

impl LogoResolver {
    pub fn new(source: Arc<dyn TokenDataSource>, cache: ResponseCache, store: LogoStore) -> Self {
        Self {
            source,
            cache,
            store,
            flights: SingleFlight::new(),
        }
    }

    /// Data URI for `fingerprint`, or an empty string when none is available.
    ///
    /// Concurrent calls for one fingerprint share a single lookup and its
    /// outcome, including an empty one.
    pub async fn resolve(&self, fingerprint: &str) -> String {
        let key = CacheKey::logo(fingerprint);
        if let Some(logo) = self.cached(&key).await {
            return logo;
        }

        let resolver = self.clone();
        let owned_fingerprint = fingerprint.to_string();
        self.flights
            .run(&key.to_string(), async move {
                let key = CacheKey::logo(&owned_fingerprint);
                // A run that finished since our cache check has filled it
                match resolver.cached(&key).await {
                    Some(logo) => logo,
                    None => resolver.resolve_uncached(&owned_fingerprint, &key).await,
                }
            })
            .await
            .unwrap_or_default()
    }

    async fn cached(&self, key: &CacheKey) -> Option<String> {
        match self.cache.get(key).await {
            Some(CachedPayload::Logo(logo)) => Some(logo),
            _ => None,
        }
    }

    async fn resolve_uncached(&self, fingerprint: &str, key: &CacheKey) -> String {
        if let Some(stored) = self.store.get(fingerprint).await {
            debug!(
                "Stored logo for {}: {}...",
                fingerprint,
                stored.chars().take(30).collect::<String>()
            );
            self.cache.set(key, CachedPayload::Logo(stored.clone())).await;
            return stored;
        }

        let image = match self.source.fetch_logo(fingerprint).await {
            Ok(image) => image,
            Err(e) => {
                warn!("Error fetching logo {}: {}", fingerprint, e.summary());
                return String::new();
            }
        };

        let Some(data_uri) = image.to_data_uri() else {
            warn!(
                "Logo host returned no usable image for {} (content-type {:?}, {} bytes)",
                fingerprint,
                image.content_type,
                image.data.len()
            );
            return String::new();
        };

        if let Err(e) = self.store.insert(fingerprint, &data_uri).await {
            warn!(
                "Failed to persist logo {}, keeping it pending: {}",
                fingerprint, e
            );
        }
        self.cache.set(key, CachedPayload::Logo(data_uri.clone())).await;
        data_uri
    }
}
