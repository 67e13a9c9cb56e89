//! Token API handlers
//!
//! Thin wrappers over [`TokenAggregator`](crate::services::TokenAggregator).
//! A path that cannot be decoded gets the same fallback body as an upstream
//! failure so the gateway never answers with an error status.

use axum::{
    extract::{rejection::PathRejection, Path, State},
    Json,
};
use tracing::debug;

use crate::models::{OrderBook, RichList, TokenDetail, TokenSummary};
use crate::web::{extractors::WindowParams, AppState};

/// `GET /api/tokens?start=&limit=`
pub async fn list_tokens(
    State(state): State<AppState>,
    window: WindowParams,
) -> Json<Vec<TokenSummary>> {
    Json(
        state
            .aggregator
            .fetch_token_page(window.start, window.limit)
            .await,
    )
}

/// `GET /api/description/{issuer}/{currency}`
pub async fn get_description(
    State(state): State<AppState>,
    path: Result<Path<(String, String)>, PathRejection>,
) -> Json<TokenDetail> {
    match path {
        Ok(Path((issuer, currency))) => {
            Json(state.aggregator.fetch_description(&issuer, &currency).await)
        }
        Err(e) => {
            debug!("Undecodable description path: {}", e);
            Json(TokenDetail::unavailable())
        }
    }
}

/// `GET /api/richlist/{fingerprint}`
pub async fn get_rich_list(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> Json<RichList> {
    match path {
        Ok(Path(fingerprint)) => Json(state.aggregator.fetch_rich_list(&fingerprint).await),
        Err(e) => {
            debug!("Undecodable rich list path: {}", e);
            Json(RichList::empty())
        }
    }
}

/// `GET /api/offers/{account}`
pub async fn get_offers(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> Json<OrderBook> {
    match path {
        Ok(Path(account)) => Json(state.aggregator.fetch_offers(&account).await),
        Err(e) => {
            debug!("Undecodable offers path: {}", e);
            Json(OrderBook::empty())
        }
    }
}
