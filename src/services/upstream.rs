//! Clients for the token-data API and the logo image host

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, Client, RequestBuilder};
use serde_json::Value;
use tracing::{debug, info};

use crate::config::UpstreamConfig;
use crate::errors::{AppError, AppResult, UpstreamError, UpstreamResult};
use crate::models::upstream::{catalog_total, parse_entry_list, parse_token_detail, parse_token_list};
use crate::models::{LogoImage, RawToken, TokenDetail};

/// Everything the aggregator needs from the outside world
#[async_trait]
pub trait TokenDataSource: Send + Sync {
    /// One window of the catalog, sorted by 24h volume descending
    async fn fetch_tokens(&self, start: u32, limit: u32) -> UpstreamResult<Vec<RawToken>>;

    async fn fetch_token_detail(&self, issuer: &str, currency: &str) -> UpstreamResult<TokenDetail>;

    async fn fetch_rich_list(&self, fingerprint: &str) -> UpstreamResult<Vec<Value>>;

    async fn fetch_offers(&self, account: &str) -> UpstreamResult<Vec<Value>>;

    /// Raw logo image for a fingerprint
    async fn fetch_logo(&self, fingerprint: &str) -> UpstreamResult<LogoImage>;
}

/// reqwest-backed source talking to the real API and logo host
pub struct HttpTokenDataSource {
    client: Client,
    api_base_url: String,
    logo_base_url: String,
    logo_timeout: Duration,
    rich_list_limit: u32,
}

impl HttpTokenDataSource {
    pub fn new(config: &UpstreamConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            logo_base_url: config.logo_base_url.trim_end_matches('/').to_string(),
            logo_timeout: config.logo_timeout,
            rich_list_limit: config.rich_list_limit,
        })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.api_base_url, path)
    }

    /// Send a GET and decode the JSON body
    async fn get_json(&self, url: &str, request: RequestBuilder) -> UpstreamResult<Value> {
        let started = Instant::now();
        let response = request
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| UpstreamError::from_reqwest(url, e))?;

        let status = response.status();
        let body = response
            .json::<Value>()
            .await
            .map_err(|e| UpstreamError::malformed(url, e.to_string()))?;

        debug!(
            "GET {} -> {} in {}ms",
            url,
            status,
            started.elapsed().as_millis()
        );
        Ok(body)
    }
}

fn encode(segment: &str) -> String {
    urlencoding::encode(segment).into_owned()
}

#[async_trait]
impl TokenDataSource for HttpTokenDataSource {
    async fn fetch_tokens(&self, start: u32, limit: u32) -> UpstreamResult<Vec<RawToken>> {
        let url = self.api_url("/api/tokens");
        let request = self.client.get(&url).query(&[
            ("start", start.to_string()),
            ("limit", limit.to_string()),
            ("sortBy", "vol24hxrp".to_string()),
            ("sortType", "desc".to_string()),
            ("filter", String::new()),
        ]);

        let body = self.get_json(&url, request).await?;
        let tokens = parse_token_list(&body)?;
        info!(
            "Catalog returned {} tokens (start={}, limit={}, total={})",
            tokens.len(),
            start,
            limit,
            catalog_total(&body).map_or_else(|| "unknown".to_string(), |t| t.to_string())
        );
        Ok(tokens)
    }

    async fn fetch_token_detail(&self, issuer: &str, currency: &str) -> UpstreamResult<TokenDetail> {
        let url = self.api_url(&format!("/api/token/{}_{}", encode(issuer), encode(currency)));
        let request = self.client.get(&url).query(&[("desc", "yes")]);
        let body = self.get_json(&url, request).await?;
        Ok(parse_token_detail(&body))
    }

    async fn fetch_rich_list(&self, fingerprint: &str) -> UpstreamResult<Vec<Value>> {
        let url = self.api_url(&format!("/api/richlist/{}", encode(fingerprint)));
        let request = self.client.get(&url).query(&[
            ("start", "0".to_string()),
            ("limit", self.rich_list_limit.to_string()),
        ]);
        let body = self.get_json(&url, request).await?;
        Ok(parse_entry_list(&body, "richList"))
    }

    async fn fetch_offers(&self, account: &str) -> UpstreamResult<Vec<Value>> {
        let url = self.api_url(&format!("/api/account/offers/{}", encode(account)));
        let request = self.client.get(&url);
        let body = self.get_json(&url, request).await?;
        Ok(parse_entry_list(&body, "offers"))
    }

    async fn fetch_logo(&self, fingerprint: &str) -> UpstreamResult<LogoImage> {
        let url = format!("{}/token/{}", self.logo_base_url, encode(fingerprint));
        let started = Instant::now();

        let response = self
            .client
            .get(&url)
            .timeout(self.logo_timeout)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| UpstreamError::from_reqwest(&url, e))?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let data = response
            .bytes()
            .await
            .map_err(|e| UpstreamError::from_reqwest(&url, e))?;

        debug!(
            "Logo response for {}: Content-Length={}, Time={}ms",
            fingerprint,
            data.len(),
            started.elapsed().as_millis()
        );
        Ok(LogoImage::new(data, content_type))
    }
}
