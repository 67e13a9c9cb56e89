use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ledgerglow::{
    config::Config,
    services::{HttpTokenDataSource, LogoResolver, LogoStore, ResponseCache, TokenAggregator},
    web::{AppState, WebServer},
};

#[derive(Parser)]
#[command(name = "ledgerglow")]
#[command(version)]
#[command(about = "Token catalog gateway with logo caching for XRP Ledger assets")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Listening IP address
    #[arg(short = 'H', long, value_name = "IP")]
    host: Option<String>,

    /// Listening port
    #[arg(short, long, value_name = "PORT")]
    port: Option<u16>,

    /// Logo store document (overrides config file)
    #[arg(short = 'l', long, value_name = "PATH")]
    logo_store: Option<String>,

    /// Log level
    #[arg(short = 'v', long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_filter = if cli.log_level == "trace" {
        format!("ledgerglow={},tower_http=trace", cli.log_level)
    } else {
        format!("ledgerglow={}", cli.log_level)
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting LedgerGlow v{}", env!("CARGO_PKG_VERSION"));

    let mut config = Config::load_from_file(&cli.config)?;
    info!("Configuration loaded from: {}", cli.config);

    if let Some(host) = cli.host {
        config.web.host = host;
    }
    if let Some(port) = cli.port {
        config.web.port = port;
    }
    if let Some(path) = cli.logo_store {
        config.storage.logo_store_path = path.into();
    }

    let cache = ResponseCache::from_max_entries(config.cache.max_entries);
    match config.cache.max_entries {
        Some(max) => info!("Response cache bounded to {} entries", max),
        None => info!("Response cache unbounded"),
    }

    let logo_store = LogoStore::new(&config.storage.logo_store_path);
    info!(
        "Logo store at {} ({} logos)",
        logo_store.path().display(),
        logo_store.len().await
    );

    let source = Arc::new(HttpTokenDataSource::new(&config.upstream)?);
    info!(
        "Upstream API {}, logo host {}",
        config.upstream.api_base_url, config.upstream.logo_base_url
    );

    let logos = LogoResolver::new(source.clone(), cache.clone(), logo_store.clone());
    let aggregator = TokenAggregator::new(source, cache, logos, &config.aggregator);

    let web_server = WebServer::new(
        &config,
        AppState::new(config.clone(), aggregator, logo_store.clone()),
    )?;
    info!(
        "Starting web server on {}:{}",
        web_server.host(),
        web_server.port()
    );
    let served = web_server.serve_with_shutdown(shutdown_signal()).await;

    match logo_store.flush().await {
        Ok(0) => {}
        Ok(count) => info!("Flushed {} pending logos before exit", count),
        Err(e) => error!("Failed to flush pending logos: {}", e),
    }

    served
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down gracefully"),
                    _ = ctrl_c() => info!("Received SIGINT (Ctrl+C), shutting down gracefully"),
                }
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                ctrl_c().await;
                info!("Received SIGINT (Ctrl+C), shutting down gracefully");
            }
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c().await;
        info!("Received Ctrl+C, shutting down gracefully");
    }
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
}
