//! HTTP client helpers for tests.

use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

pub struct TestClient {
    client: reqwest::Client,
    base_url: String,
}

/// Status code, `X-Verifily-Status` header and JSON body of one call.
#[derive(Debug)]
pub struct ApiResponse {
    pub status: u16,
    pub verifily_status: String,
    pub body: Value,
}

impl TestClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        let path = path.trim_start_matches('/');
        format!("{}/{}", self.base_url, path)
    }

    async fn into_api_response(resp: reqwest::Response) -> Result<ApiResponse, TestClientError> {
        let status = resp.status().as_u16();
        let verifily_status = resp
            .headers()
            .get("x-verifily-status")
            .and_then(|h| h.to_str().ok())
            .unwrap_or("unknown")
            .to_string();
        let body = resp.json().await?;
        Ok(ApiResponse {
            status,
            verifily_status,
            body,
        })
    }

    async fn post(&self, path: &str, body: Value) -> Result<ApiResponse, TestClientError> {
        let resp = self.client.post(self.url(path)).json(&body).send().await?;
        Self::into_api_response(resp).await
    }

    async fn get(&self, path: &str) -> Result<ApiResponse, TestClientError> {
        let resp = self.client.get(self.url(path)).send().await?;
        Self::into_api_response(resp).await
    }

    pub async fn detect(&self, text: &str) -> Result<ApiResponse, TestClientError> {
        self.post("/api/v1/detect", json!({ "text": text })).await
    }

    pub async fn verify(&self, content: &str) -> Result<ApiResponse, TestClientError> {
        self.post("/api/v1/verify", json!({ "content": content })).await
    }

    pub async fn verify_human(
        &self,
        content: &str,
        username: &str,
    ) -> Result<ApiResponse, TestClientError> {
        self.post(
            "/api/v1/verify/human",
            json!({ "content": content, "username": username }),
        )
        .await
    }

    pub async fn check(&self, hash: &str) -> Result<ApiResponse, TestClientError> {
        self.get(&format!("/api/v1/check/{hash}")).await
    }

    pub async fn stats(&self) -> Result<ApiResponse, TestClientError> {
        self.get("/api/v1/stats/verifications").await
    }

    pub async fn health(&self) -> Result<HealthResponse, TestClientError> {
        let resp = self.client.get(self.url("/healthz")).send().await?;

        if resp.status().is_success() {
            Ok(resp.json().await?)
        } else {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            Err(TestClientError::UnexpectedStatus(status, body))
        }
    }

    pub async fn ready(&self) -> Result<ApiResponse, TestClientError> {
        self.get("/ready").await
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, thiserror::Error)]
pub enum TestClientError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Unexpected HTTP status: {0} - Body: {1}")]
    UnexpectedStatus(u16, String),
}
