//! Prometheus metrics for monitoring
//!
//! Exposes metrics for:
//! - Gateway connection status
//! - Resolution outcomes
//! - Replacement queries
//! - Controller transitions

use crate::error::TxStatusResult;
use crate::model::NetworkId;

use axum::{routing::get, Router};
use lazy_static::lazy_static;
use prometheus::{register_counter_vec, register_gauge_vec, CounterVec, Encoder, GaugeVec, TextEncoder};
use std::net::SocketAddr;
use tracing::{error, info};

lazy_static! {
    pub static ref GATEWAY_CONNECTED: GaugeVec = register_gauge_vec!(
        "tx_status_gateway_connected",
        "Gateway connection status (1=connected, 0=disconnected)",
        &["network"]
    ).unwrap();

    pub static ref RESOLUTIONS: CounterVec = register_counter_vec!(
        "tx_status_resolutions_total",
        "Resolutions by source (cache, chain, absent)",
        &["network", "source"]
    ).unwrap();

    pub static ref GATEWAY_ERRORS: CounterVec = register_counter_vec!(
        "tx_status_gateway_errors_total",
        "Gateway failures by operation",
        &["network", "operation"]
    ).unwrap();

    pub static ref REPLACEMENTS_BUILT: CounterVec = register_counter_vec!(
        "tx_status_replacements_built_total",
        "Replacement queries handed to the send flow",
        &["network", "intent"]
    ).unwrap();

    pub static ref TRANSITIONS_REJECTED: CounterVec = register_counter_vec!(
        "tx_status_transitions_rejected_total",
        "Controller events rejected in the current state",
        &["event"]
    ).unwrap();

    pub static ref HEALTH_CHECKS: CounterVec = register_counter_vec!(
        "tx_status_health_checks_total",
        "Total health check rounds",
        &[]
    ).unwrap();
}

/// Where a resolution was answered from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionSource {
    Cache,
    Chain,
    Absent,
}

impl ResolutionSource {
    fn label(&self) -> &'static str {
        match self {
            ResolutionSource::Cache => "cache",
            ResolutionSource::Chain => "chain",
            ResolutionSource::Absent => "absent",
        }
    }
}

/// Prometheus metrics server
pub struct MetricsServer {
    port: u16,
}

impl MetricsServer {
    pub fn new(port: u16) -> Self {
        Self { port }
    }

    pub async fn run(&self) -> TxStatusResult<()> {
        let app = Router::new().route("/metrics", get(metrics_handler));

        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        info!("Starting metrics server on {}", addr);

        let listener = tokio::net::TcpListener::bind(&addr).await.map_err(|e| {
            crate::error::TxStatusError::Internal(format!("Failed to bind {}: {}", addr, e))
        })?;
        axum::serve(listener, app)
            .await
            .map_err(|e| crate::error::TxStatusError::Internal(e.to_string()))?;

        Ok(())
    }
}

async fn metrics_handler() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!("Failed to encode metrics: {}", e);
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

// Helper functions to record metrics

pub fn record_gateway_health(network: &NetworkId, healthy: bool) {
    GATEWAY_CONNECTED
        .with_label_values(&[network.as_str()])
        .set(if healthy { 1.0 } else { 0.0 });
}

pub fn record_resolution(network: &NetworkId, source: ResolutionSource) {
    RESOLUTIONS
        .with_label_values(&[network.as_str(), source.label()])
        .inc();
}

pub fn record_gateway_error(network: &NetworkId, operation: &str) {
    GATEWAY_ERRORS
        .with_label_values(&[network.as_str(), operation])
        .inc();
}

pub fn record_replacement(network: &NetworkId, intent: &str) {
    REPLACEMENTS_BUILT
        .with_label_values(&[network.as_str(), intent])
        .inc();
}

pub fn record_rejected_transition(event: &str) {
    TRANSITIONS_REJECTED.with_label_values(&[event]).inc();
}

pub fn record_health_check() {
    HEALTH_CHECKS.with_label_values(&[]).inc();
}
