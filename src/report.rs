//! Error reporting side channel.
//!
//! Handled failures are forwarded to an external monitoring backend in
//! addition to the error log line. The two paths are independent: a reporting
//! failure is logged at warn and otherwise ignored, and never changes the
//! handler's return code.

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde_json::json;
use tracing::warn;

use crate::errors::NotifyError;

#[async_trait]
pub trait ErrorReporter: Send + Sync {
    async fn report(&self, error: &NotifyError);
}

/// Posts one JSON document per handled failure to the monitoring endpoint.
pub struct HttpErrorReporter {
    client: HttpClient,
    endpoint: String,
    service: String,
}

impl HttpErrorReporter {
    #[must_use]
    pub fn new(endpoint: String, service: &str) -> Self {
        Self {
            client: HttpClient::new(),
            endpoint,
            service: service.to_string(),
        }
    }
}

#[async_trait]
impl ErrorReporter for HttpErrorReporter {
    async fn report(&self, error: &NotifyError) {
        let body = json!({
            "service": self.service,
            "kind": error.kind(),
            "message": error.to_string(),
        });

        let result = self.client.post(&self.endpoint).json(&body).send().await;
        match result {
            Ok(resp) if !resp.status().is_success() => {
                warn!(
                    "Error report rejected by {} with status {}",
                    self.endpoint,
                    resp.status()
                );
            }
            Err(e) => {
                warn!("Failed to deliver error report to {}: {}", self.endpoint, e);
            }
            Ok(_) => {}
        }
    }
}

/// Used when no reporting endpoint is configured.
pub struct NoopReporter;

#[async_trait]
impl ErrorReporter for NoopReporter {
    async fn report(&self, _error: &NotifyError) {}
}
