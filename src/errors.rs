use thiserror::Error;

/// Failure taxonomy for a notification invocation.
///
/// Every variant is terminal for the invocation: the top-level handler logs
/// it, forwards it to the error reporter, and returns failure code 1. Nothing
/// is retried.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Failed to fetch configuration: {0}")]
    ConfigUnavailable(String),

    #[error("Configuration key not found: {0}")]
    ConfigKeyMissing(String),

    #[error("Failed to decode event payload: {0}")]
    Payload(String),

    #[error("Failed to deliver notification: {0}")]
    Delivery(String),
}

impl NotifyError {
    /// Short tag for the error reporter payload.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            NotifyError::ConfigUnavailable(_) => "config_unavailable",
            NotifyError::ConfigKeyMissing(_) => "config_key_missing",
            NotifyError::Payload(_) => "payload",
            NotifyError::Delivery(_) => "delivery",
        }
    }
}

impl From<reqwest::Error> for NotifyError {
    fn from(error: reqwest::Error) -> Self {
        NotifyError::Delivery(error.to_string())
    }
}

impl From<base64::DecodeError> for NotifyError {
    fn from(error: base64::DecodeError) -> Self {
        NotifyError::Payload(format!("invalid base64: {error}"))
    }
}

impl From<serde_json::Error> for NotifyError {
    fn from(error: serde_json::Error) -> Self {
        NotifyError::Payload(format!("invalid JSON: {error}"))
    }
}
