//! Token aggregation with caching and fallbacks
//!
//! Every public operation here is infallible: upstream and storage errors
//! are logged and replaced by the documented fallback payload, so the web
//! layer always has something to return.

use std::future::Future;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::{info, warn};

use super::logo_resolver::LogoResolver;
use super::response_cache::{CacheKey, CachedPayload, ResponseCache};
use super::single_flight::SingleFlight;
use super::upstream::TokenDataSource;
use crate::config::AggregatorConfig;
use crate::errors::UpstreamResult;
use crate::models::{fallback_tokens, OrderBook, RichList, TokenDetail, TokenSummary};

#[derive(Clone)]
pub struct TokenAggregator {
    source: Arc<dyn TokenDataSource>,
    cache: ResponseCache,
    logos: LogoResolver,
    flights: SingleFlight<Option<CachedPayload>>,
    logo_concurrency: usize,
}

impl TokenAggregator {
    pub fn new(
        source: Arc<dyn TokenDataSource>,
        cache: ResponseCache,
        logos: LogoResolver,
        config: &AggregatorConfig,
    ) -> Self {
        Self {
            source,
            cache,
            logos,
            flights: SingleFlight::new(),
            logo_concurrency: config.logo_concurrency.max(1),
        }
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    /// One page of token summaries in catalog order.
    ///
    /// Falls back to the two synthetic tokens when the catalog fails.
    pub async fn fetch_token_page(&self, start: u32, limit: u32) -> Vec<TokenSummary> {
        info!("Fetching tokens: start={}, limit={}", start, limit);

        let raw_tokens = match self.source.fetch_tokens(start, limit).await {
            Ok(tokens) => tokens,
            Err(e) => {
                warn!("Token catalog unavailable, falling back to sample data: {}", e);
                return fallback_tokens();
            }
        };

        let mut resolved: Vec<(usize, TokenSummary)> =
            stream::iter(raw_tokens.into_iter().enumerate().map(|(index, raw)| {
                let logos = self.logos.clone();
                async move {
                    let fingerprint = raw.fingerprint();
                    let logo = logos.resolve(&fingerprint).await;
                    (index, raw.into_summary(fingerprint, logo))
                }
            }))
            .buffer_unordered(self.logo_concurrency)
            .collect()
            .await;
        resolved.sort_by_key(|(index, _)| *index);

        let tokens: Vec<TokenSummary> = resolved.into_iter().map(|(_, token)| token).collect();
        info!(
            "Processed tokens count: {} ({} with logo)",
            tokens.len(),
            tokens.iter().filter(|t| !t.logo.is_empty()).count()
        );
        tokens
    }

    pub async fn fetch_description(&self, issuer: &str, currency: &str) -> TokenDetail {
        let (issuer, currency) = (issuer.to_string(), currency.to_string());
        let cached = self
            .cached_or_fetch(CacheKey::description(&issuer, &currency), move |source| async move {
                source
                    .fetch_token_detail(&issuer, &currency)
                    .await
                    .map(CachedPayload::Description)
            })
            .await;

        match cached {
            Some(CachedPayload::Description(detail)) => detail,
            _ => TokenDetail::unavailable(),
        }
    }

    pub async fn fetch_rich_list(&self, fingerprint: &str) -> RichList {
        let fingerprint = fingerprint.to_string();
        let cached = self
            .cached_or_fetch(CacheKey::rich_list(&fingerprint), move |source| async move {
                source
                    .fetch_rich_list(&fingerprint)
                    .await
                    .map(|top_holders| CachedPayload::RichList(RichList { top_holders }))
            })
            .await;

        match cached {
            Some(CachedPayload::RichList(list)) => list,
            _ => RichList::empty(),
        }
    }

    pub async fn fetch_offers(&self, account: &str) -> OrderBook {
        let account = account.to_string();
        let cached = self
            .cached_or_fetch(CacheKey::offers(&account), move |source| async move {
                source
                    .fetch_offers(&account)
                    .await
                    .map(|order_book| CachedPayload::Offers(OrderBook { order_book }))
            })
            .await;

        match cached {
            Some(CachedPayload::Offers(book)) => book,
            _ => OrderBook::empty(),
        }
    }

    /// Check the cache, fetch on a miss and cache the result if it succeeded.
    ///
    /// Concurrent calls for one key share a single fetch and its outcome.
    /// `None` means the fetch failed and the caller should use its fallback.
    async fn cached_or_fetch<F, Fut>(&self, key: CacheKey, fetch: F) -> Option<CachedPayload>
    where
        F: FnOnce(Arc<dyn TokenDataSource>) -> Fut,
        Fut: Future<Output = UpstreamResult<CachedPayload>> + Send + 'static,
    {
        if let Some(payload) = self.cache.get(&key).await {
            return Some(payload);
        }

        let cache = self.cache.clone();
        let fetch = fetch(self.source.clone());
        let flight_key = key.to_string();
        self.flights
            .run(&flight_key, async move {
                // A run that finished since our cache check has filled it
                if let Some(payload) = cache.get(&key).await {
                    return Some(payload);
                }
                match fetch.await {
                    Ok(payload) => {
                        cache.set(&key, payload.clone()).await;
                        Some(payload)
                    }
                    Err(e) => {
                        warn!("Error fetching {}: {}", key, e.summary());
                        None
                    }
                }
            })
            .await
            .flatten()
    }
}
