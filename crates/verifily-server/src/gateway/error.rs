use axum::{
    Json,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

use verifily::ensemble::{Classification, EnsembleResult};
use verifily::verification::{VERIFILY_STATUS_HEADER, VerificationError};

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// Scored, but the verdict could not be recorded.
    #[error("verdict for {content_hash} was not persisted: {reason}")]
    Unpersisted {
        content_hash: String,
        result: Box<EnsembleResult>,
        reason: String,
    },

    #[error("verification store unavailable: {0}")]
    StoreUnavailable(String),
}

impl GatewayError {
    /// Maps a cache failure for `content_hash`, keeping any computed verdict.
    pub fn from_verification(content_hash: &str, err: VerificationError) -> Self {
        match err {
            VerificationError::Unpersisted { result, source } => GatewayError::Unpersisted {
                content_hash: content_hash.to_string(),
                result,
                reason: source.to_string(),
            },
            VerificationError::InvalidHash { hash } => {
                GatewayError::InvalidRequest(format!("invalid content hash: {hash}"))
            }
            VerificationError::Store(e) => GatewayError::StoreUnavailable(e.to_string()),
        }
    }

    fn status_code(&self) -> (StatusCode, &'static str) {
        match self {
            GatewayError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
            GatewayError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            GatewayError::Unpersisted { .. } => (StatusCode::SERVICE_UNAVAILABLE, "unpersisted"),
            GatewayError::StoreUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "store_unavailable")
            }
        }
    }
}

#[derive(serde::Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

/// Body for a verdict that was computed but not stored.
#[derive(serde::Serialize)]
pub struct UnpersistedResponse {
    pub error: String,
    pub code: u16,
    pub content_hash: String,
    pub classification: Classification,
    pub confidence: f64,
    pub ai_probability: f64,
    pub cached: bool,
    pub persisted: bool,
    pub result: EnsembleResult,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let (status, verifily_status) = self.status_code();
        let error_message = self.to_string();

        let mut headers = HeaderMap::new();
        headers.insert(
            VERIFILY_STATUS_HEADER,
            HeaderValue::from_str(verifily_status).unwrap_or(HeaderValue::from_static("error")),
        );

        match self {
            GatewayError::Unpersisted {
                content_hash,
                result,
                ..
            } => {
                let body = Json(UnpersistedResponse {
                    error: error_message,
                    code: status.as_u16(),
                    content_hash,
                    classification: result.classification,
                    confidence: result.confidence,
                    ai_probability: result.ai_probability,
                    cached: false,
                    persisted: false,
                    result: *result,
                });
                (status, headers, body).into_response()
            }
            _ => {
                let body = Json(ErrorResponse {
                    error: error_message,
                    code: status.as_u16(),
                });
                (status, headers, body).into_response()
            }
        }
    }
}
