//! HTTP gateway (Axum) over the categorization pipeline.
//!
//! This module is primarily used by the `catwise` server binary.

pub mod error;
pub mod handler;
pub mod state;


use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header::HeaderValue},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

pub use error::GatewayError;
pub use handler::{CategorizeRequest, CategorizeResponse, categorize_handler};
pub use state::HandlerState;

use crate::constants::{
    CATWISE_STATUS_ERROR, CATWISE_STATUS_HEADER, CATWISE_STATUS_HEALTHY, CATWISE_STATUS_READY,
};

pub fn create_router_with_state(state: HandlerState) -> Router {
    Router::new()
        .route("/healthz", get(health_handler))
        .route("/ready", get(ready_handler))
        .route("/v1/categorize", post(categorize_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(serde::Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(serde::Serialize)]
pub struct ReadyResponse {
    pub status: &'static str,
    pub components: ComponentStatus,
}

#[derive(serde::Serialize)]
pub struct ComponentStatus {
    pub http: &'static str,
    pub storage: &'static str,
    pub embedder_mode: &'static str,
    pub confidence: &'static str,
}

#[tracing::instrument]
pub async fn health_handler() -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(
        CATWISE_STATUS_HEADER,
        HeaderValue::from_static(CATWISE_STATUS_HEALTHY),
    );

    (
        StatusCode::OK,
        headers,
        Json(HealthResponse { status: "ok" }),
    )
        .into_response()
}

#[tracing::instrument(skip(state))]
pub async fn ready_handler(State(state): State<HandlerState>) -> Response {
    let storage = if state.storage_path.is_dir() {
        CATWISE_STATUS_READY
    } else {
        CATWISE_STATUS_ERROR
    };
    let confidence = if state.pipeline.scores_confidence() {
        "enabled"
    } else {
        "disabled"
    };

    let components = ComponentStatus {
        http: CATWISE_STATUS_READY,
        storage,
        embedder_mode: state.embedder_mode,
        confidence,
    };

    let is_ready = components.storage == CATWISE_STATUS_READY;
    let (status_code, status_msg) = if is_ready {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "pending")
    };

    let mut headers = HeaderMap::new();
    headers.insert(
        CATWISE_STATUS_HEADER,
        HeaderValue::from_static(if is_ready {
            CATWISE_STATUS_READY
        } else {
            CATWISE_STATUS_ERROR
        }),
    );

    (
        status_code,
        headers,
        Json(ReadyResponse {
            status: status_msg,
            components,
        }),
    )
        .into_response()
}
