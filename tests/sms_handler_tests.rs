use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use courier::core::config::{BlobFetcher, ConfigStore};
use courier::core::envelope::{InvocationContext, PubSubEvent};
use courier::errors::NotifyError;
use courier::report::ErrorReporter;
use courier::sms::{SentSms, SmsCredentials, SmsDeps, SmsSender, notify_sms};
use serde_json::{Value, json};

struct StaticFetcher {
    body: Vec<u8>,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl BlobFetcher for StaticFetcher {
    async fn fetch(&self, _bucket: &str, _object: &str) -> Result<Vec<u8>, NotifyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.body.clone())
    }
}

struct UnavailableFetcher;

#[async_trait]
impl BlobFetcher for UnavailableFetcher {
    async fn fetch(&self, bucket: &str, object: &str) -> Result<Vec<u8>, NotifyError> {
        Err(NotifyError::ConfigUnavailable(format!(
            "object {bucket}/{object} not found"
        )))
    }
}

/// Records every send; optionally fails once the Nth call is reached.
struct RecordingSender {
    sent: Arc<Mutex<Vec<(String, String)>>>,
    fail_on_call: Option<usize>,
    calls: AtomicUsize,
}

impl RecordingSender {
    fn healthy(sent: Arc<Mutex<Vec<(String, String)>>>) -> Self {
        Self {
            sent,
            fail_on_call: None,
            calls: AtomicUsize::new(0),
        }
    }

    fn failing_on(sent: Arc<Mutex<Vec<(String, String)>>>, nth: usize) -> Self {
        Self {
            sent,
            fail_on_call: Some(nth),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl SmsSender for RecordingSender {
    async fn send(
        &self,
        _creds: &SmsCredentials,
        to: &str,
        body: &str,
    ) -> Result<SentSms, NotifyError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_on_call == Some(call) {
            return Err(NotifyError::Delivery(format!("backend rejected {to}")));
        }
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), body.to_string()));
        Ok(SentSms {
            sid: format!("SM{call:08}"),
        })
    }
}

struct RecordingReporter {
    kinds: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl ErrorReporter for RecordingReporter {
    async fn report(&self, error: &NotifyError) {
        self.kinds.lock().unwrap().push(error.kind().to_string());
    }
}

fn envelope(payload: &Value) -> PubSubEvent {
    PubSubEvent {
        data: BASE64.encode(payload.to_string()),
    }
}

fn config_blob() -> Vec<u8> {
    json!({
        "MESSAGING_SERVICE_SID": "MG123",
        "TWILIO_ACCOUNT_SID": "AC123",
        "TWILIO_AUTH_TOKEN": "secret",
    })
    .to_string()
    .into_bytes()
}

struct Harness {
    deps: SmsDeps,
    sent: Arc<Mutex<Vec<(String, String)>>>,
    reported: Arc<Mutex<Vec<String>>>,
}

fn harness(fetcher: Box<dyn BlobFetcher>, fail_on_call: Option<usize>) -> Harness {
    let sent = Arc::new(Mutex::new(Vec::new()));
    let reported = Arc::new(Mutex::new(Vec::new()));
    let sender = match fail_on_call {
        Some(nth) => RecordingSender::failing_on(sent.clone(), nth),
        None => RecordingSender::healthy(sent.clone()),
    };
    Harness {
        deps: SmsDeps {
            config: ConfigStore::new(fetcher, "vars", "vars.json"),
            sender: Box::new(sender),
            reporter: Box::new(RecordingReporter {
                kinds: reported.clone(),
            }),
        },
        sent,
        reported,
    }
}

fn healthy_harness() -> Harness {
    harness(
        Box::new(StaticFetcher {
            body: config_blob(),
            calls: Arc::new(AtomicUsize::new(0)),
        }),
        None,
    )
}

#[tokio::test]
async fn test_fan_out_sends_once_per_recipient() {
    let h = healthy_harness();
    let event = envelope(&json!({
        "sms": {
            "to_numbers": ["+15550001", "+15550002", "+15550003"],
            "message": "storm warning"
        }
    }));

    let code = notify_sms(&event, &InvocationContext::default(), &h.deps).await;

    assert_eq!(code, 0);
    let sent = h.sent.lock().unwrap();
    assert_eq!(sent.len(), 3);
    let recipients: Vec<&str> = sent.iter().map(|(to, _)| to.as_str()).collect();
    assert_eq!(recipients, vec!["+15550001", "+15550002", "+15550003"]);
    assert!(sent.iter().all(|(_, body)| body == "storm warning"));
    assert!(h.reported.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_single_recipient_example() {
    let h = healthy_harness();
    let event = envelope(&json!({"sms": {"to_numbers": ["+15550001"], "message": "hi"}}));

    let code = notify_sms(&event, &InvocationContext::default(), &h.deps).await;

    assert_eq!(code, 0);
    let sent = h.sent.lock().unwrap();
    assert_eq!(sent.as_slice(), &[("+15550001".to_string(), "hi".to_string())]);
}

#[tokio::test]
async fn test_missing_to_numbers_sends_nothing() {
    let h = healthy_harness();
    let event = envelope(&json!({"sms": {"message": "hi"}}));

    let code = notify_sms(&event, &InvocationContext::default(), &h.deps).await;

    assert_eq!(code, 1);
    assert!(h.sent.lock().unwrap().is_empty());
    assert_eq!(h.reported.lock().unwrap().as_slice(), &["payload"]);
}

#[tokio::test]
async fn test_config_unavailable_reported_once_before_decode() {
    // Payload is also malformed; config resolution comes first for this
    // channel, so the reported failure must be the config one.
    let h = harness(Box::new(UnavailableFetcher), None);
    let event = PubSubEvent {
        data: "%%% not base64 %%%".to_string(),
    };

    let code = notify_sms(&event, &InvocationContext::default(), &h.deps).await;

    assert_eq!(code, 1);
    assert!(h.sent.lock().unwrap().is_empty());
    assert_eq!(
        h.reported.lock().unwrap().as_slice(),
        &["config_unavailable"]
    );
}

#[tokio::test]
async fn test_missing_credential_key_fails_without_sending() {
    let h = harness(
        Box::new(StaticFetcher {
            body: json!({"MESSAGING_SERVICE_SID": "MG123"}).to_string().into_bytes(),
            calls: Arc::new(AtomicUsize::new(0)),
        }),
        None,
    );
    let event = envelope(&json!({"sms": {"to_numbers": ["+15550001"], "message": "hi"}}));

    let code = notify_sms(&event, &InvocationContext::default(), &h.deps).await;

    assert_eq!(code, 1);
    assert!(h.sent.lock().unwrap().is_empty());
    assert_eq!(
        h.reported.lock().unwrap().as_slice(),
        &["config_key_missing"]
    );
}

#[tokio::test]
async fn test_mid_fan_out_failure_keeps_prior_sends() {
    let h = harness(
        Box::new(StaticFetcher {
            body: config_blob(),
            calls: Arc::new(AtomicUsize::new(0)),
        }),
        Some(2),
    );
    let event = envelope(&json!({
        "sms": {
            "to_numbers": ["+15550001", "+15550002", "+15550003"],
            "message": "hi"
        }
    }));

    let code = notify_sms(&event, &InvocationContext::default(), &h.deps).await;

    assert_eq!(code, 1);
    // First send stands; second failed; third was never attempted.
    let sent = h.sent.lock().unwrap();
    assert_eq!(sent.as_slice(), &[("+15550001".to_string(), "hi".to_string())]);
    assert_eq!(h.reported.lock().unwrap().as_slice(), &["delivery"]);
}

#[tokio::test]
async fn test_repeated_invocations_send_independently() {
    // No idempotency guarantee: the same input dispatched twice goes out twice.
    let h = healthy_harness();
    let event = envelope(&json!({"sms": {"to_numbers": ["+15550001"], "message": "hi"}}));
    let ctx = InvocationContext::default();

    assert_eq!(notify_sms(&event, &ctx, &h.deps).await, 0);
    assert_eq!(notify_sms(&event, &ctx, &h.deps).await, 0);
    assert_eq!(h.sent.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_config_fetched_at_most_once_across_invocations() {
    let calls = Arc::new(AtomicUsize::new(0));
    let h = harness(
        Box::new(StaticFetcher {
            body: config_blob(),
            calls: calls.clone(),
        }),
        None,
    );
    let event = envelope(&json!({"sms": {"to_numbers": ["+15550001"], "message": "hi"}}));
    let ctx = InvocationContext::default();

    notify_sms(&event, &ctx, &h.deps).await;
    notify_sms(&event, &ctx, &h.deps).await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
}
