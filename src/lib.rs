/// Courier - event-triggered notification dispatchers for SMS and email.
///
/// This crate implements two independent Lambda-style handlers:
/// 1. `notify-sms` relays a pub/sub payload to SMS recipients via Twilio,
///    one send per recipient.
/// 2. `notify-email` relays a payload to email recipients via SendGrid,
///    one batched send for all recipients.
///
/// # Architecture
///
/// The system uses:
/// - `lambda_runtime`/Tokio for run-to-completion invocations
/// - S3 for the remote config blob, fetched once and memoized per store
/// - reqwest for the Twilio and SendGrid REST APIs
/// - tracing for structured JSON logs, plus an error-reporting side channel
///
/// Each handler decodes a base64 JSON envelope, resolves secrets from the
/// config store, calls the delivery API, and returns 0 or 1 to the runtime.
/// There are no retries, no queues, and no delivery-status tracking; the
/// invoking transport owns any redelivery policy.
// Module declarations
pub mod core;
pub mod email;
pub mod errors;
pub mod report;
pub mod sms;

pub use errors::NotifyError;

/// Configure structured logging with JSON format for serverless environments.
///
/// Reads the minimum severity from the `LOG_LEVEL` environment variable
/// (default `info`). Call once at the start of each binary.
pub fn setup_logging() {
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_env("LOG_LEVEL").unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer().json().with_target(true);

    tracing_subscriber::registry().with(filter).with(fmt_layer).init();
}
