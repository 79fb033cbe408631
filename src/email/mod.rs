pub mod client;
pub mod handler;

pub use client::{EmailSender, OutboundMail, SendGridClient, SendResponse};
pub use handler::{EmailDeps, notify_email};
