//! SendGrid v3 Mail Send client.

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::Serialize;
use serde_json::json;

use crate::errors::NotifyError;

const SENDGRID_SEND_URL: &str = "https://api.sendgrid.com/v3/mail/send";

/// One outbound email, addressed to all recipients at once.
#[derive(Debug, Clone, Serialize)]
pub struct OutboundMail {
    pub from_email: String,
    pub to_emails: Vec<String>,
    pub subject: String,
    /// HTML body.
    pub html_content: String,
}

/// What the provider said about the send.
#[derive(Debug, Clone)]
pub struct SendResponse {
    pub status_code: u16,
    pub body: String,
    pub headers: HashMap<String, String>,
}

/// Seam over the email backend's send operation.
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, api_key: &str, mail: &OutboundMail) -> Result<SendResponse, NotifyError>;
}

pub struct SendGridClient {
    http: HttpClient,
    send_url: String,
}

impl SendGridClient {
    #[must_use]
    pub fn new() -> Self {
        Self {
            http: HttpClient::new(),
            send_url: SENDGRID_SEND_URL.to_string(),
        }
    }

    #[cfg(test)]
    fn with_send_url(mut self, url: &str) -> Self {
        self.send_url = url.to_string();
        self
    }
}

impl Default for SendGridClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds the v3 request body: a single personalization carrying every
/// recipient, one `text/html` content part.
fn mail_send_body(mail: &OutboundMail) -> serde_json::Value {
    json!({
        "personalizations": [{
            "to": mail.to_emails.iter().map(|e| json!({"email": e})).collect::<Vec<_>>(),
        }],
        "from": {"email": mail.from_email},
        "subject": mail.subject,
        "content": [{
            "type": "text/html",
            "value": mail.html_content,
        }],
    })
}

#[async_trait]
impl EmailSender for SendGridClient {
    async fn send(&self, api_key: &str, mail: &OutboundMail) -> Result<SendResponse, NotifyError> {
        let resp = self
            .http
            .post(&self.send_url)
            .bearer_auth(api_key)
            .json(&mail_send_body(mail))
            .send()
            .await
            .map_err(|e| NotifyError::Delivery(format!("sendgrid request: {e}")))?;

        let status = resp.status();
        let headers = resp
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.to_string(), v.to_string()))
            })
            .collect();
        let body = resp
            .text()
            .await
            .map_err(|e| NotifyError::Delivery(format!("sendgrid response read: {e}")))?;

        if !status.is_success() {
            return Err(NotifyError::Delivery(format!(
                "sendgrid returned {status}: {body}"
            )));
        }

        Ok(SendResponse {
            status_code: status.as_u16(),
            body,
            headers,
        })
    }
}
