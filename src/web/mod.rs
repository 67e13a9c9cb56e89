//! Web layer module
//!
//! HTTP gateway in front of the token aggregator. Every API route answers
//! 200 with a JSON body; failures upstream surface as fallback payloads from
//! the service layer, never as error statuses. Anything that is not an API
//! route is served from the static asset directory.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::{routing::get, Router};
use chrono::{DateTime, Utc};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing::info;

use crate::config::Config;
use crate::services::{LogoStore, TokenAggregator};

pub mod extractors;
pub mod handlers;

pub use extractors::WindowParams;

/// Web server configuration and setup
pub struct WebServer {
    app: Router,
    addr: SocketAddr,
}

impl WebServer {
    pub fn new(config: &Config, state: AppState) -> Result<Self> {
        let app = create_router(state);
        let addr: SocketAddr = format!("{}:{}", config.web.host, config.web.port).parse()?;

        Ok(Self { app, addr })
    }

    /// Serve until `shutdown` resolves, letting in-flight requests finish
    pub async fn serve_with_shutdown<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = tokio::net::TcpListener::bind(&self.addr)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", self.addr, e))?;
        info!("Listening on http://{}", listener.local_addr()?);

        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown)
            .await?;
        Ok(())
    }

    /// Get the host address
    pub fn host(&self) -> String {
        self.addr.ip().to_string()
    }

    /// Get the port number
    pub fn port(&self) -> u16 {
        self.addr.port()
    }
}

/// Routes, static fallback and middleware
pub fn create_router(state: AppState) -> Router {
    let static_files = ServeDir::new(&state.config.web.static_dir);

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/api/tokens", get(handlers::tokens::list_tokens))
        .route(
            "/api/description/{issuer}/{currency}",
            get(handlers::tokens::get_description),
        )
        .route(
            "/api/richlist/{fingerprint}",
            get(handlers::tokens::get_rich_list),
        )
        .route("/api/offers/{account}", get(handlers::tokens::get_offers))
        .fallback_service(static_files)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub aggregator: TokenAggregator,
    pub logo_store: LogoStore,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(config: Config, aggregator: TokenAggregator, logo_store: LogoStore) -> Self {
        Self {
            config: Arc::new(config),
            aggregator,
            logo_store,
            started_at: Utc::now(),
        }
    }
}
