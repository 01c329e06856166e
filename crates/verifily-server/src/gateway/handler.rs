use std::collections::BTreeMap;

use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::gateway::error::GatewayError;
use crate::gateway::state::HandlerState;
use verifily::ensemble::{Classification, EnsembleResult};
use verifily::hashing::content_hash;
use verifily::signal::SignalKind;
use verifily::verification::{
    DEFAULT_STATS_TOP_N, PostRef, VERIFILY_STATUS_HEADER, VerificationRecord, VerificationStore,
    VerifilyStatus,
};

#[derive(Debug, Deserialize)]
pub struct DetectRequest {
    pub text: String,
    #[serde(default)]
    pub platform: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub content: String,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub post_id: Option<String>,
    #[serde(default)]
    pub post_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct HumanVerifyRequest {
    pub content: String,
    pub username: String,
    #[serde(default)]
    pub platform: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub content_hash: String,
    pub verified: bool,
    pub classification: Classification,
    pub confidence: f64,
    pub ai_probability: f64,
    pub view_count: u64,
    pub first_seen: DateTime<Utc>,
    pub cached: bool,
    pub persisted: bool,
    pub verified_by_author: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_username: Option<String>,
    /// Signal breakdown stored with the shared verdict.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scores: Option<BTreeMap<SignalKind, Option<f64>>>,
    pub message: String,
    /// Full ensemble output, present only when this request ran the scorers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<EnsembleResult>,
}

impl VerifyResponse {
    fn from_record(
        record: VerificationRecord,
        cached: bool,
        result: Option<EnsembleResult>,
    ) -> Self {
        let message = verification_message(&record, cached);
        Self {
            content_hash: record.content_hash,
            verified: true,
            classification: record.classification,
            confidence: record.confidence,
            ai_probability: record.ai_probability,
            view_count: record.view_count,
            first_seen: record.first_seen,
            cached,
            persisted: true,
            verified_by_author: record.verified_by_author,
            author_username: record.author_username,
            scores: record.scores,
            message,
            result,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CheckResponse {
    pub content_hash: String,
    pub verified: bool,
    pub classification: Classification,
    pub confidence: f64,
    pub ai_probability: f64,
    pub view_count: u64,
    pub first_seen: DateTime<Utc>,
    pub verified_by_author: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scores: Option<BTreeMap<SignalKind, Option<f64>>>,
}

impl From<VerificationRecord> for CheckResponse {
    fn from(record: VerificationRecord) -> Self {
        Self {
            content_hash: record.content_hash,
            verified: true,
            classification: record.classification,
            confidence: record.confidence,
            ai_probability: record.ai_probability,
            view_count: record.view_count,
            first_seen: record.first_seen,
            verified_by_author: record.verified_by_author,
            scores: record.scores,
        }
    }
}

pub(crate) fn verification_message(record: &VerificationRecord, cached: bool) -> String {
    if record.verified_by_author
        && let Some(username) = &record.author_username
    {
        return format!("PoC Certified - Verified human by @{username}");
    }
    if cached {
        format!(
            "PoC Certified - Verified by {} users",
            record.view_count
        )
    } else {
        "PoC Certified - First verification".to_string()
    }
}

pub(crate) fn require_text<'a>(value: &'a str, field: &str) -> Result<&'a str, GatewayError> {
    if value.trim().is_empty() {
        return Err(GatewayError::InvalidRequest(format!(
            "`{field}` must not be empty"
        )));
    }
    Ok(value)
}

pub(crate) fn make_response<T: Serialize>(body: T, status: VerifilyStatus) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(
        VERIFILY_STATUS_HEADER,
        HeaderValue::from_static(status.as_header_value()),
    );
    (StatusCode::OK, headers, Json(body)).into_response()
}

/// Scores a text without touching the verification store.
#[instrument(skip(state, request), fields(text_len = request.text.len()))]
pub async fn detect_handler<S>(
    State(state): State<HandlerState<S>>,
    Json(request): Json<DetectRequest>,
) -> Result<Response, GatewayError>
where
    S: VerificationStore + 'static,
{
    let text = require_text(&request.text, "text")?;
    let result = state
        .combiner
        .detect(text, request.platform.as_deref())
        .await;

    debug!(
        classification = %result.classification,
        ai_probability = result.ai_probability,
        "Detection complete"
    );
    Ok(make_response(result, VerifilyStatus::Miss))
}

/// Returns the shared verdict for the content, scoring it on first sight.
#[instrument(skip(state, request), fields(text_len = request.content.len()))]
pub async fn verify_handler<S>(
    State(state): State<HandlerState<S>>,
    Json(request): Json<VerifyRequest>,
) -> Result<Response, GatewayError>
where
    S: VerificationStore + 'static,
{
    require_text(&request.content, "content")?;

    let combiner = state.combiner.clone();
    let text = request.content.clone();
    let platform = request.platform.clone();
    let factory = move || async move { combiner.detect(&text, platform.as_deref()).await };
    let post = PostRef::new(request.post_id.as_deref(), request.post_url.as_deref());

    match state
        .cache
        .verify_post(&request.content, &post, factory)
        .await
    {
        Ok(outcome) => {
            let status = VerifilyStatus::from_cached(outcome.cached);
            info!(
                hash = %outcome.record.content_hash,
                status = %status,
                views = outcome.record.view_count,
                "Verification served"
            );
            let body = VerifyResponse::from_record(outcome.record, outcome.cached, outcome.result);
            Ok(make_response(body, status))
        }
        Err(e) => Err(GatewayError::from_verification(
            &content_hash(&request.content),
            e,
        )),
    }
}

/// Quick lookup by hash; a hit counts as a view.
#[instrument(skip(state))]
pub async fn check_handler<S>(
    State(state): State<HandlerState<S>>,
    Path(hash): Path<String>,
) -> Result<Response, GatewayError>
where
    S: VerificationStore + 'static,
{
    let record = state
        .cache
        .check(&hash)
        .await
        .map_err(|e| GatewayError::from_verification(&hash, e))?
        .ok_or_else(|| GatewayError::NotFound("Content not verified yet".to_string()))?;

    Ok(make_response(CheckResponse::from(record), VerifilyStatus::Hit))
}

/// Records the author's claim that the content is human-written.
#[instrument(skip(state, request), fields(text_len = request.content.len()))]
pub async fn human_verify_handler<S>(
    State(state): State<HandlerState<S>>,
    Json(request): Json<HumanVerifyRequest>,
) -> Result<Response, GatewayError>
where
    S: VerificationStore + 'static,
{
    let content = require_text(&request.content, "content")?;
    let username = require_text(&request.username, "username")?.trim();

    let record = state
        .cache
        .author_override(content, username, request.platform.as_deref())
        .await
        .map_err(|e| GatewayError::from_verification(&content_hash(content), e))?;

    let cached = record.view_count > 1;
    let body = VerifyResponse::from_record(record, cached, None);
    Ok(make_response(body, VerifilyStatus::Override))
}

#[instrument(skip(state))]
pub async fn stats_handler<S>(
    State(state): State<HandlerState<S>>,
) -> Result<Response, GatewayError>
where
    S: VerificationStore + 'static,
{
    let stats = state
        .cache
        .stats(DEFAULT_STATS_TOP_N)
        .await
        .map_err(|e| GatewayError::StoreUnavailable(e.to_string()))?;

    let mut headers = HeaderMap::new();
    headers.insert(
        VERIFILY_STATUS_HEADER,
        HeaderValue::from_static(verifily::verification::VERIFILY_STATUS_READY),
    );
    Ok((StatusCode::OK, headers, Json(stats)).into_response())
}
