//! Twilio Messages API client.

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::Deserialize;

use crate::errors::NotifyError;

const TWILIO_API_BASE: &str = "https://api.twilio.com/2010-04-01";

/// Messaging credentials resolved from the config blob per invocation.
#[derive(Debug, Clone)]
pub struct SmsCredentials {
    pub account_sid: String,
    pub auth_token: String,
    pub messaging_service_sid: String,
}

/// Provider acknowledgement for one dispatched message.
#[derive(Debug, Clone, Deserialize)]
pub struct SentSms {
    pub sid: String,
}

/// Seam over the telephony backend's send operation.
#[async_trait]
pub trait SmsSender: Send + Sync {
    /// Dispatches one message. Failure is terminal for the invocation; the
    /// caller does not retry.
    async fn send(
        &self,
        creds: &SmsCredentials,
        to: &str,
        body: &str,
    ) -> Result<SentSms, NotifyError>;
}

/// Twilio REST client. Credentials arrive per call, so one client serves the
/// whole fan-out.
pub struct TwilioClient {
    http: HttpClient,
    api_base: String,
}

impl TwilioClient {
    #[must_use]
    pub fn new() -> Self {
        Self {
            http: HttpClient::new(),
            api_base: TWILIO_API_BASE.to_string(),
        }
    }

    #[cfg(test)]
    fn with_api_base(mut self, api_base: &str) -> Self {
        self.api_base = api_base.to_string();
        self
    }

    fn messages_url(&self, account_sid: &str) -> String {
        format!("{}/Accounts/{account_sid}/Messages.json", self.api_base)
    }
}

impl Default for TwilioClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SmsSender for TwilioClient {
    async fn send(
        &self,
        creds: &SmsCredentials,
        to: &str,
        body: &str,
    ) -> Result<SentSms, NotifyError> {
        let params = [
            ("MessagingServiceSid", creds.messaging_service_sid.as_str()),
            ("To", to),
            ("Body", body),
        ];

        let resp = self
            .http
            .post(self.messages_url(&creds.account_sid))
            .basic_auth(&creds.account_sid, Some(&creds.auth_token))
            .form(&params)
            .send()
            .await
            .map_err(|e| NotifyError::Delivery(format!("twilio request: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            return Err(NotifyError::Delivery(format!(
                "twilio returned {status} for {to}: {detail}"
            )));
        }

        resp.json::<SentSms>()
            .await
            .map_err(|e| NotifyError::Delivery(format!("twilio response parse: {e}")))
    }
}
