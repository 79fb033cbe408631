//! SMS notification handler.

use chrono::Utc;
use chrono_tz::US::Pacific;
use tracing::{error, info};

use crate::core::config::ConfigStore;
use crate::core::envelope::{self, InvocationContext, PubSubEvent};
use crate::errors::NotifyError;
use crate::report::ErrorReporter;
use crate::sms::client::{SmsCredentials, SmsSender};

/// Collaborators for one SMS invocation.
pub struct SmsDeps {
    pub config: ConfigStore,
    pub sender: Box<dyn SmsSender>,
    pub reporter: Box<dyn ErrorReporter>,
}

/// Relays the event's `sms` payload to every listed recipient.
///
/// Returns 0 on full success, 1 on the first failure. The fan-out is not
/// transactional: messages dispatched before a failure stand, and remaining
/// recipients are abandoned.
pub async fn notify_sms(event: &PubSubEvent, ctx: &InvocationContext, deps: &SmsDeps) -> i32 {
    info!(
        "Received request to notify via sms. Event id: {}. Emitting resource: {}.",
        ctx.event_id, ctx.resource
    );

    match run(event, deps).await {
        Ok(()) => 0,
        Err(e) => {
            error!("{e}");
            deps.reporter.report(&e).await;
            1
        }
    }
}

// Config is resolved before the payload is decoded; the email handler does
// the opposite. The per-channel order is intentional and pinned by tests.
async fn run(event: &PubSubEvent, deps: &SmsDeps) -> Result<(), NotifyError> {
    let creds = SmsCredentials {
        messaging_service_sid: deps.config.get("MESSAGING_SERVICE_SID").await?,
        account_sid: deps.config.get("TWILIO_ACCOUNT_SID").await?,
        auth_token: deps.config.get("TWILIO_AUTH_TOKEN").await?,
    };

    let payload = envelope::decode_sms(event)?;

    for to_number in &payload.to_numbers {
        let sent = deps
            .sender
            .send(&creds, to_number, &payload.message)
            .await
            .map_err(|e| {
                NotifyError::Delivery(format!(
                    "sms with body '{}' to numbers {:?}: {e}",
                    payload.message, payload.to_numbers
                ))
            })?;
        info!(
            "Message sent at {} with notification sid {} to number {} and with body '{}'.",
            Utc::now().with_timezone(&Pacific).timestamp(),
            sent.sid,
            to_number,
            payload.message
        );
    }

    Ok(())
}
