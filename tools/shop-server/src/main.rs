//! shopd - HTTP server for the shop backend.
//!
//! Serves the catalog, cart, review and analytics API over a SQLite
//! database. Configuration comes from an optional TOML/JSON file, with CLI
//! flags taking precedence.

mod config;
mod logging;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use shop_api::AppState;
use shop_db::Db;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{info, warn};

use config::ServerConfig;
use logging::LogFormat;

/// shopd - catalog and cart API server
#[derive(Debug, Parser)]
#[command(name = "shopd")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file path (.toml or .json)
    #[arg(short, long)]
    config: Option<String>,

    /// Listen address, e.g. 0.0.0.0:8000
    #[arg(long)]
    bind: Option<String>,

    /// Database URL, e.g. sqlite://shop.db
    #[arg(long)]
    database_url: Option<String>,

    /// Log as JSON lines
    #[arg(long)]
    json_logs: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn into_config(self) -> Result<ServerConfig> {
        let mut config = match self.config.as_deref() {
            Some(path) => ServerConfig::load(path)?,
            None => ServerConfig::default(),
        };
        if let Some(bind) = self.bind {
            config.bind = bind;
        }
        if let Some(url) = self.database_url {
            config.database_url = url;
        }
        if self.json_logs {
            config.log_format = LogFormat::Json;
        }
        if self.verbose {
            config.log_level = "debug".to_string();
        }
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Cli::parse().into_config()?;
    logging::init(&config.log_level, config.log_format)?;

    let db = Db::connect(&config.database_url)
        .await
        .with_context(|| format!("Failed to open database {}", config.database_url))?;
    info!(database_url = %config.database_url, "database ready");

    let state = AppState::from_store(Arc::new(db.clone()), config.catalog.clone());
    let app = shop_api::app(state).layer(
        ServiceBuilder::new()
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(TraceLayer::new_for_http())
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TimeoutLayer::new(config.request_timeout()))
            .layer(CorsLayer::permissive()),
    );

    let listener = TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind))?;
    info!(
        bind = %config.bind,
        timeout_secs = config.request_timeout_secs,
        "shopd listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    db.close().await;
    info!("shopd stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown signal received"),
        Err(e) => warn!(error = %e, "failed to listen for shutdown signal"),
    }
}
