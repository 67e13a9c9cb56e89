//! Incremental token feed over the gateway API
//!
//! Mirrors how the browser page consumes the gateway: pages are requested
//! in consecutive `start`/`limit` windows and accumulated locally, with a
//! single boolean guard so a scroll burst never issues overlapping loads.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::config::defaults::DEFAULT_PAGE_LIMIT;
use crate::errors::{AppError, AppResult, UpstreamError, UpstreamResult};
use crate::models::{OrderBook, RichList, TokenDetail, TokenSummary};

/// Distance from the bottom of the document that triggers the next page
pub const SCROLL_THRESHOLD_PX: f64 = 100.0;

const CLIENT_TIMEOUT: Duration = Duration::from_secs(30);

/// True when the viewport's bottom edge is within the scroll threshold
pub fn near_bottom(viewport_bottom_px: f64, document_height_px: f64) -> bool {
    viewport_bottom_px >= document_height_px - SCROLL_THRESHOLD_PX
}

#[derive(Default)]
struct FeedState {
    next_start: u32,
    tokens: Vec<TokenSummary>,
}

#[derive(Clone)]
pub struct TokenFeed {
    http: Client,
    base_url: String,
    limit: u32,
    state: Arc<Mutex<FeedState>>,
    loading: Arc<AtomicBool>,
}

/// Clears the in-flight flag when a load ends, including on cancellation
struct LoadingGuard(Arc<AtomicBool>);

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl TokenFeed {
    pub fn new(base_url: &str) -> AppResult<Self> {
        Self::with_limit(base_url, DEFAULT_PAGE_LIMIT)
    }

    pub fn with_limit(base_url: &str, limit: u32) -> AppResult<Self> {
        if limit == 0 {
            return Err(AppError::configuration("Page limit must be at least 1"));
        }
        let http = Client::builder()
            .timeout(CLIENT_TIMEOUT)
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            limit,
            state: Arc::new(Mutex::new(FeedState::default())),
            loading: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    /// Window start of the next page request
    pub async fn next_start(&self) -> u32 {
        self.state.lock().await.next_start
    }

    /// Every token loaded so far, in page order
    pub async fn tokens(&self) -> Vec<TokenSummary> {
        self.state.lock().await.tokens.clone()
    }

    /// Whether a scroll position should trigger [`TokenFeed::load_next`]
    pub fn should_load_more(&self, viewport_bottom_px: f64, document_height_px: f64) -> bool {
        !self.is_loading() && near_bottom(viewport_bottom_px, document_height_px)
    }

    /// Fetch the next window and append it.
    ///
    /// Returns `Ok(None)` without a request when a load is already running,
    /// otherwise the number of tokens appended. The window only advances
    /// after a successful response.
    pub async fn load_next(&self) -> UpstreamResult<Option<usize>> {
        if self.loading.swap(true, Ordering::SeqCst) {
            debug!("Token page already loading, skipping");
            return Ok(None);
        }
        let _loading = LoadingGuard(self.loading.clone());

        let start = self.next_start().await;
        let url = format!("{}/api/tokens", self.base_url);
        let page: Vec<TokenSummary> = self
            .get_json(
                &url,
                &[("start", start.to_string()), ("limit", self.limit.to_string())],
            )
            .await?;

        let count = page.len();
        let mut state = self.state.lock().await;
        state.tokens.extend(page);
        state.next_start = start.saturating_add(self.limit);
        debug!(
            "Loaded {} tokens at start={} ({} total)",
            count,
            start,
            state.tokens.len()
        );
        Ok(Some(count))
    }

    /// Detail for an expanded card; zero values when the gateway is unreachable
    pub async fn description(&self, issuer: &str, currency: &str) -> TokenDetail {
        let url = format!(
            "{}/api/description/{}/{}",
            self.base_url,
            urlencoding::encode(issuer),
            urlencoding::encode(currency)
        );
        self.get_or(&url, TokenDetail::unavailable).await
    }

    pub async fn rich_list(&self, fingerprint: &str) -> RichList {
        let url = format!(
            "{}/api/richlist/{}",
            self.base_url,
            urlencoding::encode(fingerprint)
        );
        self.get_or(&url, RichList::empty).await
    }

    pub async fn offers(&self, account: &str) -> OrderBook {
        let url = format!("{}/api/offers/{}", self.base_url, urlencoding::encode(account));
        self.get_or(&url, OrderBook::empty).await
    }

    async fn get_or<T, F>(&self, url: &str, fallback: F) -> T
    where
        T: DeserializeOwned,
        F: FnOnce() -> T,
    {
        match self.get_json(url, &[]).await {
            Ok(value) => value,
            Err(e) => {
                warn!("Gateway request failed, using fallback: {}", e);
                fallback()
            }
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> UpstreamResult<T> {
        let response = self
            .http
            .get(url)
            .query(query)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| UpstreamError::from_reqwest(url, e))?;

        response
            .json::<T>()
            .await
            .map_err(|e| UpstreamError::malformed(url, e.to_string()))
    }
}
