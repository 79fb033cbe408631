//! Inbound event envelope and channel payloads.
//!
//! The transport delivers `{ "data": <base64 of UTF-8 JSON> }`; the decoded
//! JSON carries a single top-level key naming the channel (`sms` or `email`).

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Deserialize;
use serde_json::Value;

use crate::errors::NotifyError;

/// The raw envelope as delivered by the pub/sub transport.
#[derive(Debug, Clone, Deserialize)]
pub struct PubSubEvent {
    pub data: String,
}

/// Invocation metadata, used only in log lines.
#[derive(Debug, Clone, Default)]
pub struct InvocationContext {
    pub event_id: String,
    pub resource: String,
}

impl InvocationContext {
    /// Pulls `event_id`/`resource` out of a Lambda request payload, tolerating
    /// absence since the fields have no semantic role.
    #[must_use]
    pub fn from_payload(payload: &Value) -> Self {
        let field = |name: &str| {
            payload
                .get("context")
                .and_then(|c| c.get(name))
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        Self {
            event_id: field("event_id"),
            resource: field("resource"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SmsPayload {
    pub message: String,
    pub to_numbers: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmailPayload {
    /// HTML body.
    pub message: String,
    pub to_emails: Vec<String>,
    pub subject: String,
}

/// Decodes `event.data` and returns the decoded top-level JSON object.
///
/// # Errors
///
/// Returns `Payload` if the field is not valid base64, the bytes are not
/// UTF-8 JSON, or the result is not an object.
fn decode_data(event: &PubSubEvent) -> Result<Value, NotifyError> {
    let raw = BASE64.decode(event.data.as_bytes())?;
    let value: Value = serde_json::from_slice(&raw)?;
    if !value.is_object() {
        return Err(NotifyError::Payload(
            "decoded payload is not a JSON object".to_string(),
        ));
    }
    Ok(value)
}

/// Extracts the `sms` sub-object from the envelope.
///
/// # Errors
///
/// Returns `Payload` on any base64/JSON failure or if the `sms` key is
/// missing or malformed.
pub fn decode_sms(event: &PubSubEvent) -> Result<SmsPayload, NotifyError> {
    let value = decode_data(event)?;
    let sms = value
        .get("sms")
        .ok_or_else(|| NotifyError::Payload("'sms' not found in event data".to_string()))?;
    serde_json::from_value(sms.clone())
        .map_err(|e| NotifyError::Payload(format!("malformed 'sms' payload: {e}")))
}

/// Extracts the `email` sub-object from the envelope.
///
/// # Errors
///
/// Returns `Payload` on any base64/JSON failure or if the `email` key is
/// missing or malformed.
pub fn decode_email(event: &PubSubEvent) -> Result<EmailPayload, NotifyError> {
    let value = decode_data(event)?;
    let email = value
        .get("email")
        .ok_or_else(|| NotifyError::Payload("'email' not found in event data".to_string()))?;
    serde_json::from_value(email.clone())
        .map_err(|e| NotifyError::Payload(format!("malformed 'email' payload: {e}")))
}
