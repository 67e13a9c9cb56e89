use axum::{
    body::Body,
    extract::{Path, Query},
    http::{header, Method, Request, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::Path as FsPath;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio_test::assert_ok;
use tower::ServiceExt;

use ledgerglow::{
    config::Config,
    services::{HttpTokenDataSource, LogoResolver, LogoStore, ResponseCache, TokenAggregator},
    web::{create_router, AppState},
};

// Helper function to send requests to the app
async fn send_request(app: &Router, method: Method, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();

    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    let json: Value = if body_bytes.is_empty() {
        json!({})
    } else {
        serde_json::from_slice(&body_bytes).unwrap_or(json!({}))
    };

    (status, json)
}

/// Upstream stub covering the catalog, detail, list and logo endpoints
struct StubUpstream {
    base: String,
    catalog_queries: Arc<Mutex<Vec<HashMap<String, String>>>>,
    detail_calls: Arc<AtomicUsize>,
    logo_fetches: Arc<AtomicUsize>,
}

async fn spawn(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

async fn spawn_upstream() -> StubUpstream {
    let catalog_queries = Arc::new(Mutex::new(Vec::new()));
    let detail_calls = Arc::new(AtomicUsize::new(0));
    let logo_fetches = Arc::new(AtomicUsize::new(0));

    let queries = catalog_queries.clone();
    let details = detail_calls.clone();
    let logos = logo_fetches.clone();

    let app = Router::new()
        .route(
            "/api/tokens",
            get(move |Query(q): Query<HashMap<String, String>>| {
                let queries = queries.clone();
                async move {
                    queries.lock().unwrap().push(q);
                    Json(json!({
                        "tokens": [
                            {"md5": "fp-usd", "currency": "USD", "issuer": "rUSD",
                             "vol24hxrp": "2500.5", "marketcap": 90000, "trustlines": 812},
                            {"md5": "fp-nologo", "currency": "XYZ", "issuer": "rXYZ",
                             "vol24hxrp": 10, "marketcap": "-4", "trustlines": "3"},
                            {"currency": "EUR", "issuer": "rEUR"}
                        ],
                        "total": 3
                    }))
                }
            }),
        )
        .route(
            "/api/token/{pair}",
            get(move |Path(pair): Path<String>| {
                let details = details.clone();
                async move {
                    details.fetch_add(1, Ordering::SeqCst);
                    assert_eq!(pair, "rUSD_USD");
                    Json(json!({
                        "token": {
                            "description": "A dollar",
                            "amount": "1000000",
                            "supply": 750000,
                            "usd": "0.000123"
                        }
                    }))
                }
            }),
        )
        .route(
            "/api/richlist/{fingerprint}",
            get(|| async {
                Json(json!({"richList": [{"account": "r1"}, {"account": "r2"}, {"account": "r3"}]}))
            }),
        )
        .route(
            "/api/account/offers/{account}",
            get(|| async { Json(json!({"offers": [{"seq": 7, "quality": "1.5"}]})) }),
        )
        .route(
            "/token/{fingerprint}",
            get(move |Path(fingerprint): Path<String>| {
                let logos = logos.clone();
                async move {
                    logos.fetch_add(1, Ordering::SeqCst);
                    if fingerprint == "fp-nologo" {
                        StatusCode::NOT_FOUND.into_response()
                    } else {
                        ([(header::CONTENT_TYPE, "image/webp")], vec![1u8, 2, 3]).into_response()
                    }
                }
            }),
        );

    StubUpstream {
        base: spawn(app).await,
        catalog_queries,
        detail_calls,
        logo_fetches,
    }
}

/// Base URL of a port nothing listens on
fn unreachable_base() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);
    base
}

fn build_app(upstream_base: &str, dir: &FsPath) -> (Router, LogoStore) {
    let mut config = Config::default();
    config.upstream.api_base_url = upstream_base.to_string();
    config.upstream.logo_base_url = upstream_base.to_string();
    config.web.static_dir = dir.join("public");
    config.storage.logo_store_path = dir.join("public").join("logos.json");
    assert_ok!(config.validate());

    let cache = ResponseCache::from_max_entries(config.cache.max_entries);
    let store = LogoStore::new(&config.storage.logo_store_path);
    let source = Arc::new(HttpTokenDataSource::new(&config.upstream).unwrap());
    let logos = LogoResolver::new(source.clone(), cache.clone(), store.clone());
    let aggregator = TokenAggregator::new(source, cache, logos, &config.aggregator);

    let app = create_router(AppState::new(config, aggregator, store.clone()));
    (app, store)
}

#[tokio::test]
async fn test_tokens_fall_back_when_catalog_is_unreachable() {
    let dir = tempfile::tempdir().unwrap();
    let (app, store) = build_app(&unreachable_base(), dir.path());

    let (status, body) = send_request(&app, Method::GET, "/api/tokens").await;

    assert_eq!(status, StatusCode::OK);
    let tokens = body.as_array().unwrap();
    assert_eq!(tokens.len(), 2);
    assert_eq!(tokens[0]["name"], "RLUSD");
    assert_eq!(tokens[0]["md5"], "0413ca7cfc258dfaf698c02fe304e607");
    assert_eq!(tokens[0]["volume"], 1_000_000.0);
    assert_eq!(tokens[1]["name"], "SGB");
    assert_eq!(tokens[1]["md5"], "mock2");
    assert_eq!(tokens[1]["holders"], 3000);
    assert!(store.load().await.is_empty());
}

#[tokio::test]
async fn test_tokens_are_summarised_in_catalog_order() {
    let dir = tempfile::tempdir().unwrap();
    let upstream = spawn_upstream().await;
    let (app, store) = build_app(&upstream.base, dir.path());

    let (status, body) = send_request(&app, Method::GET, "/api/tokens?start=100&limit=50").await;

    assert_eq!(status, StatusCode::OK);
    let tokens = body.as_array().unwrap();
    let names: Vec<_> = tokens.iter().map(|t| t["name"].as_str().unwrap()).collect();
    assert_eq!(names, ["USD", "XYZ", "EUR"]);

    assert_eq!(tokens[0]["volume"], 2500.5);
    assert_eq!(tokens[0]["marketCap"], 90000.0);
    assert_eq!(tokens[0]["holders"], 812);
    assert_eq!(tokens[0]["issuer"], "rUSD");
    assert_eq!(tokens[0]["md5"], "fp-usd");
    assert_eq!(tokens[0]["logo"], "data:image/webp;base64,AQID");

    assert_eq!(tokens[1]["marketCap"], 0.0);
    assert_eq!(tokens[1]["holders"], 3);
    assert_eq!(tokens[1]["logo"], "");

    let eur_fingerprint = format!("{:x}", md5::compute("rEUR_EUR"));
    assert_eq!(tokens[2]["md5"], eur_fingerprint.as_str());

    let query = &upstream.catalog_queries.lock().unwrap()[0];
    assert_eq!(query["start"], "100");
    assert_eq!(query["limit"], "50");
    assert_eq!(query["sortBy"], "vol24hxrp");
    assert_eq!(query["sortType"], "desc");

    let stored = store.load().await;
    assert!(stored.contains_key("fp-usd"));
    assert!(stored.contains_key(&eur_fingerprint));
    assert!(!stored.contains_key("fp-nologo"));
}

#[tokio::test]
async fn test_resolved_logos_are_not_downloaded_again() {
    let dir = tempfile::tempdir().unwrap();
    let upstream = spawn_upstream().await;
    let (app, _store) = build_app(&upstream.base, dir.path());

    send_request(&app, Method::GET, "/api/tokens").await;
    assert_eq!(upstream.logo_fetches.load(Ordering::SeqCst), 3);

    send_request(&app, Method::GET, "/api/tokens").await;
    // Only the missing logo is retried
    assert_eq!(upstream.logo_fetches.load(Ordering::SeqCst), 4);

    // A fresh process starts from the persisted document
    let (restarted, _) = build_app(&upstream.base, dir.path());
    let (_, body) = send_request(&restarted, Method::GET, "/api/tokens").await;
    assert_eq!(upstream.logo_fetches.load(Ordering::SeqCst), 5);
    assert_eq!(body[0]["logo"], "data:image/webp;base64,AQID");
}

#[tokio::test]
async fn test_window_parameters_are_lenient() {
    let dir = tempfile::tempdir().unwrap();
    let upstream = spawn_upstream().await;
    let (app, _) = build_app(&upstream.base, dir.path());

    for uri in [
        "/api/tokens?start=abc&limit=-1",
        "/api/tokens?start=-20&limit=0",
        "/api/tokens?limit=",
    ] {
        let (status, body) = send_request(&app, Method::GET, uri).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
        assert!(body.is_array(), "{uri}");
    }

    let queries = upstream.catalog_queries.lock().unwrap();
    assert_eq!(queries.len(), 3);
    for query in queries.iter() {
        assert_eq!(query["start"], "0");
        assert_eq!(query["limit"], "100");
    }
}

#[tokio::test]
async fn test_description_is_numeric_and_cached() {
    let dir = tempfile::tempdir().unwrap();
    let upstream = spawn_upstream().await;
    let (app, _) = build_app(&upstream.base, dir.path());

    let (status, body) = send_request(&app, Method::GET, "/api/description/rUSD/USD").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["description"], "A dollar");
    assert_eq!(body["totalSupply"], 1_000_000.0);
    assert_eq!(body["circulatingSupply"], 750_000.0);
    assert_eq!(body["price"], 0.000123);

    let (_, again) = send_request(&app, Method::GET, "/api/description/rUSD/USD").await;
    assert_eq!(again, body);
    assert_eq!(upstream.detail_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_lists_pass_through() {
    let dir = tempfile::tempdir().unwrap();
    let upstream = spawn_upstream().await;
    let (app, _) = build_app(&upstream.base, dir.path());

    let (status, holders) = send_request(&app, Method::GET, "/api/richlist/fp-usd").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(holders["topHolders"].as_array().unwrap().len(), 3);
    assert_eq!(holders["topHolders"][0]["account"], "r1");

    let (status, offers) = send_request(&app, Method::GET, "/api/offers/rUSD").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(offers["orderBook"], json!([{"seq": 7, "quality": "1.5"}]));
}

#[tokio::test]
async fn test_detail_routes_fall_back_when_upstream_is_unreachable() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _) = build_app(&unreachable_base(), dir.path());

    let (status, detail) = send_request(&app, Method::GET, "/api/description/rUSD/USD").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        detail,
        json!({"description": "N/A", "totalSupply": 0.0, "circulatingSupply": 0.0, "price": 0.0})
    );

    let (status, holders) = send_request(&app, Method::GET, "/api/richlist/abc").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(holders, json!({"topHolders": []}));

    let (status, offers) = send_request(&app, Method::GET, "/api/offers/rAccount").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(offers, json!({"orderBook": []}));
}

#[tokio::test]
async fn test_health_endpoint() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _) = build_app(&unreachable_base(), dir.path());

    send_request(&app, Method::GET, "/api/richlist/abc").await;
    let (status, response) = send_request(&app, Method::GET, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["status"], "ok");
    assert_eq!(response["version"], env!("CARGO_PKG_VERSION"));
    assert!(response.get("timestamp").is_some());
    assert_eq!(response["cache"]["entries"], 0);
    assert_eq!(response["cache"]["misses"], 2);
    assert_eq!(response["logos"], 0);
}

#[tokio::test]
async fn test_static_assets_are_served() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("public")).unwrap();
    std::fs::write(dir.path().join("public").join("index.html"), "<h1>tokens</h1>").unwrap();
    let (app, _) = build_app(&unreachable_base(), dir.path());

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&body[..], b"<h1>tokens</h1>");
}
