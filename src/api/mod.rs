//! HTTP API for status lookups, replacement queries and health checks

use crate::chain::GatewayRegistry;
use crate::config::ApiConfig;
use crate::controller::{DeepLink, Phase, StatusController};
use crate::error::{TxStatusError, TxStatusResult};
use crate::model::{NetworkId, TransactionView, SUPPORTED_NETWORKS};
use crate::resolver::TransactionResolver;
use crate::store::StoreSnapshot;
use crate::tx::{ReplacementIntent, ReplacementParameters};

use axum::{
    extract::{RawQuery, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<TransactionResolver>,
    pub gateways: Arc<GatewayRegistry>,
    pub snapshot: Arc<StoreSnapshot>,
}

impl AppState {
    pub fn new(gateways: Arc<GatewayRegistry>, snapshot: Arc<StoreSnapshot>) -> Self {
        Self {
            resolver: Arc::new(TransactionResolver::new(gateways.clone())),
            gateways,
            snapshot,
        }
    }

    /// A fresh controller per request; views never share state
    fn open(&self, query: Option<String>) -> StatusController {
        let link = DeepLink::parse(query.as_deref().unwrap_or_default());
        StatusController::open(
            link,
            self.resolver.clone(),
            self.gateways.clone(),
            self.snapshot.clone(),
        )
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/networks", get(get_networks))
        .route("/tx-status", get(get_status))
        .route("/tx-status/", get(get_status))
        .route("/tx-status/resubmit", get(resubmit))
        .route("/tx-status/cancel", get(cancel))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Run the HTTP API server
pub async fn run_server(config: ApiConfig, state: AppState) -> TxStatusResult<()> {
    let app = router(state);

    let addr = format!("{}:{}", config.host, config.port);
    info!("Starting API server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| TxStatusError::Internal(format!("Failed to bind {}: {}", addr, e)))?;
    axum::serve(listener, app)
        .await
        .map_err(|e| TxStatusError::Internal(e.to_string()))?;

    Ok(())
}

/// Health check endpoint - basic liveness
async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Readiness check - every gateway must report a current block
async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    let health = state.gateways.health_check().await;
    let ready = health.iter().all(|(_, healthy)| *healthy);

    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(ReadinessResponse {
            ready,
            details: health
                .into_iter()
                .map(|(network, healthy)| NetworkHealth { network, healthy })
                .collect(),
        }),
    )
}

async fn get_networks() -> impl IntoResponse {
    Json(NetworksResponse {
        supported: SUPPORTED_NETWORKS.iter().map(|n| NetworkId::new(*n)).collect(),
        default: NetworkId::default(),
    })
}

/// Open a status view from link parameters and resolve it
async fn get_status(State(state): State<AppState>, RawQuery(query): RawQuery) -> impl IntoResponse {
    let mut controller = state.open(query);
    controller.start().await;
    Json(StatusResponse::from(&controller))
}

async fn resubmit(State(state): State<AppState>, RawQuery(query): RawQuery) -> Response {
    replace(state, query, ReplacementIntent::Resubmit).await
}

async fn cancel(State(state): State<AppState>, RawQuery(query): RawQuery) -> Response {
    replace(state, query, ReplacementIntent::Cancel).await
}

async fn replace(state: AppState, query: Option<String>, intent: ReplacementIntent) -> Response {
    let mut controller = state.open(query);
    controller.start().await;

    if controller.state().phase() != Phase::Resolved {
        let message = controller
            .state()
            .error()
            .map(|e| e.to_string())
            .unwrap_or_else(|| "Transaction hash required".to_string());
        return error_response(StatusCode::NOT_FOUND, message);
    }

    if !controller.replacement_offered() {
        return error_response(
            StatusCode::CONFLICT,
            format!("{} is only offered for pending transactions from eligible local accounts", intent),
        );
    }

    let params = match intent {
        ReplacementIntent::Resubmit => controller.resubmit().await,
        ReplacementIntent::Cancel => controller.cancel().await,
    };

    match params {
        Some(params) => Json(ReplacementResponse {
            location: params.send_location(),
            replacement: params,
        })
        .into_response(),
        None => error_response(
            StatusCode::SERVICE_UNAVAILABLE,
            format!("Could not build {} query", intent),
        ),
    }
}

fn error_response(status: StatusCode, error: String) -> Response {
    (status, Json(ErrorResponse { error })).into_response()
}

// Response types

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

#[derive(Serialize)]
struct ReadinessResponse {
    ready: bool,
    details: Vec<NetworkHealth>,
}

#[derive(Serialize)]
struct NetworkHealth {
    network: NetworkId,
    healthy: bool,
}

#[derive(Serialize)]
struct NetworksResponse {
    supported: Vec<NetworkId>,
    default: NetworkId,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusResponse {
    hash: String,
    network: NetworkId,
    phase: Phase,
    fetching: bool,
    resubmitting: bool,
    cancelling: bool,
    full_page_loading: bool,
    error: Option<String>,
    location: String,
    replacement_offered: bool,
    tx: Option<TransactionView>,
}

impl From<&StatusController> for StatusResponse {
    fn from(controller: &StatusController) -> Self {
        let state = controller.state();
        Self {
            hash: state.tx_hash().to_string(),
            network: state.network_id().clone(),
            phase: state.phase(),
            fetching: state.fetching(),
            resubmitting: state.resubmitting(),
            cancelling: state.cancelling(),
            full_page_loading: state.full_page_loading(),
            error: state.error().map(|e| e.to_string()),
            location: controller.location().to_string(),
            replacement_offered: controller.replacement_offered(),
            tx: state.tx().cloned(),
        }
    }
}

#[derive(Serialize)]
struct ReplacementResponse {
    location: String,
    replacement: ReplacementParameters,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}
