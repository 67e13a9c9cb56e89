//! Health check HTTP handler

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::services::CacheStats;
use crate::web::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub timestamp: DateTime<Utc>,
    pub uptime_seconds: i64,
    pub cache: CacheStats,
    /// Logos persisted in the durable store
    pub logos: usize,
    /// Logos whose write failed and will be retried
    pub pending_logos: usize,
}

/// Health check endpoint
///
/// Reports process liveness plus cache and logo store counters. Upstream
/// reachability is not checked.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let now = Utc::now();

    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: now,
        uptime_seconds: (now - state.started_at).num_seconds(),
        cache: state.aggregator.cache().stats().await,
        logos: state.logo_store.len().await,
        pending_logos: state.logo_store.pending_count(),
    })
}
