//! HTTP gateway (Axum) over the detection engine and the verification cache.
//!
//! This module is primarily used by the `verifily` server binary.

#![allow(missing_docs)]

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
pub use handler::{
    check_handler, detect_handler, human_verify_handler, stats_handler, verify_handler,
};
pub use state::HandlerState;

use verifily::verification::{
    VERIFILY_STATUS_ERROR, VERIFILY_STATUS_HEADER, VERIFILY_STATUS_HEALTHY,
    VERIFILY_STATUS_NOT_READY, VERIFILY_STATUS_READY, VerificationStore,
};

/// All-zero hash used to probe the store without touching real records.
const PROBE_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

pub fn create_router_with_state<S>(state: HandlerState<S>) -> Router
where
    S: VerificationStore + 'static,
{
    Router::new()
        .route("/healthz", get(health_handler))
        .route("/ready", get(ready_handler::<S>))
        .route("/api/v1/detect", post(detect_handler::<S>))
        .route("/api/v1/verify", post(verify_handler::<S>))
        .route("/api/v1/verify/human", post(human_verify_handler::<S>))
        .route("/api/v1/check/{hash}", get(check_handler::<S>))
        .route("/api/v1/stats/verifications", get(stats_handler::<S>))
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
    pub store: &'static str,
    pub store_backend: &'static str,
    pub classifier_mode: &'static str,
    pub classifier_sources: Vec<String>,
}

#[tracing::instrument]
pub async fn health_handler() -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(
        VERIFILY_STATUS_HEADER,
        HeaderValue::from_static(VERIFILY_STATUS_HEALTHY),
    );

    (
        StatusCode::OK,
        headers,
        Json(HealthResponse { status: "ok" }),
    )
        .into_response()
}

#[tracing::instrument(skip(state))]
pub async fn ready_handler<S>(State(state): State<HandlerState<S>>) -> Response
where
    S: VerificationStore + 'static,
{
    let store_status = match state.cache.store().get(PROBE_HASH).await {
        Ok(_) => VERIFILY_STATUS_READY,
        Err(e) => {
            tracing::warn!(error = %e, "Verification store probe failed");
            VERIFILY_STATUS_ERROR
        }
    };

    let components = ComponentStatus {
        http: VERIFILY_STATUS_READY,
        store: store_status,
        store_backend: state.cache.store().backend(),
        classifier_mode: state.classifier_mode(),
        classifier_sources: state.classifier_sources.to_vec(),
    };

    let is_ready = components.store == VERIFILY_STATUS_READY;

    let status_code = if is_ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    let status_msg = if is_ready {
        VERIFILY_STATUS_READY
    } else {
        VERIFILY_STATUS_NOT_READY
    };

    let mut headers = HeaderMap::new();
    headers.insert(VERIFILY_STATUS_HEADER, HeaderValue::from_static(status_msg));

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
