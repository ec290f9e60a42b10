//! Transaction status service
//!
//! Resolves a transaction hash on a network against the local account store
//! and the network's node, and builds speed-up or cancel queries for pending
//! transactions sent from eligible local accounts.

use anyhow::Result;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};

mod api;
mod chain;
mod config;
mod controller;
mod error;
mod metrics;
mod model;
mod resolver;
mod store;
mod tx;

use chain::GatewayRegistry;
use config::Settings;
use metrics::MetricsServer;
use store::StoreSnapshot;

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    info!("Starting tx-status v{}", env!("CARGO_PKG_VERSION"));

    let settings = Settings::load()?;
    info!(
        "Loaded configuration for {} networks",
        settings.enabled_networks().len()
    );

    let snapshot = Arc::new(StoreSnapshot::load(
        &settings.service.store_path,
        settings.networks(),
    )?);
    info!(
        "Loaded {} accounts and {} assets from {:?}",
        snapshot.accounts.len(),
        snapshot.assets.len(),
        settings.service.store_path
    );

    let gateways = Arc::new(GatewayRegistry::connect(&settings).await?);
    info!(
        "Gateways initialized for {:?}",
        gateways.connected_networks()
    );

    let metrics_server = if settings.metrics.enabled {
        Some(MetricsServer::new(settings.metrics.port))
    } else {
        None
    };

    let api_handle = tokio::spawn({
        let config = settings.api.clone();
        let state = api::AppState::new(gateways.clone(), snapshot.clone());
        async move {
            if let Err(e) = api::run_server(config, state).await {
                error!("API server error: {}", e);
            }
        }
    });

    let metrics_handle = metrics_server.map(|server| {
        tokio::spawn(async move {
            if let Err(e) = server.run().await {
                error!("Metrics server error: {}", e);
            }
        })
    });

    let health_handle = tokio::spawn({
        let gateways = gateways.clone();
        let interval = settings.service.health_check_interval_secs;
        async move {
            loop {
                tokio::time::sleep(tokio::time::Duration::from_secs(interval)).await;

                for (network, healthy) in gateways.health_check().await {
                    if !healthy {
                        warn!("Network {} health check failed", network);
                    }
                }

                metrics::record_health_check();
            }
        }
    });

    info!("tx-status is running");
    info!("API server: http://{}:{}", settings.api.host, settings.api.port);
    if settings.metrics.enabled {
        info!("Metrics: http://0.0.0.0:{}/metrics", settings.metrics.port);
    }

    shutdown_signal().await;

    info!("Shutdown signal received, stopping...");

    api_handle.abort();
    health_handle.abort();
    if let Some(h) = metrics_handle {
        h.abort();
    }

    info!("tx-status stopped");
    Ok(())
}

fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tx_status=debug,hyper=warn"));

    let registry = tracing_subscriber::registry().with(filter);
    if json_logs(std::env::var("TX_STATUS_LOG_FORMAT").ok().as_deref()) {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(true))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_thread_ids(true))
            .init();
    }
}

/// `TX_STATUS_LOG_FORMAT=json` switches to one JSON object per line
fn json_logs(format: Option<&str>) -> bool {
    format.map_or(false, |f| f.eq_ignore_ascii_case("json"))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_selection() {
        assert!(json_logs(Some("json")));
        assert!(json_logs(Some("JSON")));
        assert!(!json_logs(Some("pretty")));
        assert!(!json_logs(None));
    }
}
