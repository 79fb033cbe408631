//! Email notification handler.

use tracing::{debug, error, info};

use crate::core::config::ConfigStore;
use crate::core::envelope::{self, InvocationContext, PubSubEvent};
use crate::email::client::{EmailSender, OutboundMail};
use crate::errors::NotifyError;
use crate::report::ErrorReporter;

/// Collaborators for one email invocation.
pub struct EmailDeps {
    pub config: ConfigStore,
    pub sender: Box<dyn EmailSender>,
    pub reporter: Box<dyn ErrorReporter>,
}

/// Relays the event's `email` payload as one message addressed to every
/// recipient at once. Returns 0 on success, 1 on any failure.
pub async fn notify_email(event: &PubSubEvent, ctx: &InvocationContext, deps: &EmailDeps) -> i32 {
    info!(
        "Received request to notify via email. Event id: {}. Emitting resource: {}.",
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

// The payload is decoded before config is resolved; the SMS handler does the
// opposite. The per-channel order is intentional and pinned by tests.
async fn run(event: &PubSubEvent, deps: &EmailDeps) -> Result<(), NotifyError> {
    let payload = envelope::decode_email(event)?;

    let from_email = deps.config.get("FROM_EMAIL").await?;

    let mail = OutboundMail {
        from_email: from_email.clone(),
        to_emails: payload.to_emails.clone(),
        subject: payload.subject.clone(),
        html_content: payload.message.clone(),
    };

    let api_key = deps.config.get("SENDGRID_API_KEY").await?;
    let response = deps.sender.send(&api_key, &mail).await?;

    info!(
        "Sent email to {:?} from '{}' with subject '{}'.",
        payload.to_emails, from_email, payload.subject
    );
    debug!("Sent email content:\n{}", payload.message);
    debug!("Response status code: {}.", response.status_code);
    debug!("Response body: {}.", response.body);
    debug!("Response headers:\n{:?}", response.headers);

    Ok(())
}
