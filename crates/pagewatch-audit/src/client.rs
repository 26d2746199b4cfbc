//! HTTP client for the remote audit engine.

use crate::engine::{AuditEngine, AuditRequest, AuditResult};
use crate::error::{AuditError, Result};
use async_trait::async_trait;
use pagewatch_core::AuditConfig;
use reqwest::{Client, StatusCode};
use std::time::{Duration, Instant};

/// Audit engine reached over HTTP.
///
/// POSTs the request as JSON to `{endpoint}/scan`. The whole exchange,
/// connect through body, is bounded by the configured render ceiling.
pub struct HttpAuditClient {
    client: Client,
    endpoint: String,
    timeout: Duration,
}

impl HttpAuditClient {
    /// Create a client from configuration.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created.
    pub fn new(config: &AuditConfig) -> Result<Self> {
        let timeout = config.timeout();
        let client = Client::builder()
            .connect_timeout(timeout)
            .build()
            .map_err(|e| AuditError::Client(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    /// Base URL of the engine.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn ceiling_ms(&self) -> u64 {
        u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX)
    }

    async fn send(&self, request: &AuditRequest) -> Result<AuditResult> {
        let response = self
            .client
            .post(format!("{}/scan", self.endpoint))
            .json(request)
            .send()
            .await
            .map_err(|e| classify_transport(&e, self.ceiling_ms()))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS || status == StatusCode::SERVICE_UNAVAILABLE {
            return Err(AuditError::RateLimited {
                status: status.as_u16(),
            });
        }
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AuditError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| classify_transport(&e, self.ceiling_ms()))?;
        Ok(serde_json::from_slice(&body)?)
    }
}

fn classify_transport(error: &reqwest::Error, ceiling_ms: u64) -> AuditError {
    if error.is_timeout() {
        AuditError::Timeout { ms: ceiling_ms }
    } else {
        AuditError::Unreachable(error.to_string())
    }
}

#[async_trait]
impl AuditEngine for HttpAuditClient {
    async fn audit(&self, request: AuditRequest) -> Result<AuditResult> {
        let started = Instant::now();
        let outcome = match tokio::time::timeout(self.timeout, self.send(&request)).await {
            Ok(result) => result,
            Err(_) => Err(AuditError::Timeout {
                ms: self.ceiling_ms(),
            }),
        };

        match &outcome {
            Ok(result) => tracing::debug!(
                url = %request.url,
                elapsed_ms = started.elapsed().as_millis(),
                rendered = result.page.is_some(),
                "audit completed"
            ),
            Err(e) => tracing::debug!(
                url = %request.url,
                elapsed_ms = started.elapsed().as_millis(),
                "audit failed: {e}"
            ),
        }

        outcome
    }
}
