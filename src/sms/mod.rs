pub mod client;
pub mod handler;

pub use client::{SentSms, SmsCredentials, SmsSender, TwilioClient};
pub use handler::{SmsDeps, notify_sms};
