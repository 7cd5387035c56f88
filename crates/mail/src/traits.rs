//! Transport seam and shared error types for outbound mail.

use courier_core::config::TlsMode;
use courier_core::countdown::Remaining;
use lettre::message::Mailbox;

/// Errors that can occur while building or delivering mail.
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("SMTP transport failed: {0}")]
    Transport(String),

    #[error("SMTP rejected the session: {0}")]
    Rejected(String),

    #[error("message build failed: {0}")]
    Message(String),

    #[error("template rendering failed: {0}")]
    Template(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("delivery failed in both modes: preferred: {preferred}; fallback: {fallback}")]
    BothModesFailed { preferred: String, fallback: String },
}

/// A fully composed message, ready to hand to a transport.
#[derive(Debug, Clone)]
pub struct OutboundMail {
    pub from: Mailbox,
    pub to: Mailbox,
    pub subject: String,
    /// Plain-text body, always present.
    pub text: String,
    /// HTML alternative; alerts go out text-only.
    pub html: Option<String>,
}

/// One SMTP submission in a given TLS mode. A fresh session is opened
/// per call and closed once the server has accepted the message.
#[async_trait::async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, mail: &OutboundMail, mode: TlsMode) -> Result<(), MailError>;
}

/// Delivers one countdown mail, falling back to the other TLS mode on
/// failure. Returns the mode that succeeded.
#[async_trait::async_trait]
pub trait Deliverer: Send + Sync {
    async fn deliver(&self, remaining: &Remaining, message: &str) -> Result<TlsMode, MailError>;
}

/// Last-resort operator notification. Must never fail the caller:
/// returns whether the alert actually went out.
#[async_trait::async_trait]
pub trait FailureAlert: Send + Sync {
    async fn alert(&self, summary: &str, detail: &str) -> bool;
}

pub(crate) fn parse_mailbox(addr: &str) -> Result<Mailbox, MailError> {
    addr.parse()
        .map_err(|e: lettre::address::AddressError| {
            MailError::Config(format!("invalid mailbox {:?}: {}", addr, e))
        })
}
