//! SMTP submission via `lettre`, one session per send.
//!
//! Port 465 style implicit TLS and port 587 STARTTLS are both
//! supported; the caller picks per call. No connection pooling: each
//! call dials, authenticates, submits and closes.

use std::time::Duration;

use courier_core::config::{MailConfig, TlsMode};
use lettre::message::MultiPart;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::debug;

use crate::traits::{MailError, MailTransport, OutboundMail};

#[derive(Debug)]
pub struct SmtpMailer {
    host: String,
    implicit_tls_port: u16,
    starttls_port: u16,
    username: String,
    password: String,
    timeout: Duration,
}

impl SmtpMailer {
    pub fn from_config(cfg: &MailConfig) -> Result<Self, MailError> {
        let host = cfg
            .host
            .clone()
            .ok_or_else(|| MailError::Config("EMAIL_HOST not set".into()))?;
        let username = cfg
            .username
            .clone()
            .ok_or_else(|| MailError::Config("EMAIL_USER not set".into()))?;
        let password = cfg
            .password
            .clone()
            .ok_or_else(|| MailError::Config("EMAIL_PASSWORD not set".into()))?;
        Ok(Self {
            host,
            implicit_tls_port: cfg.implicit_tls_port,
            starttls_port: cfg.starttls_port,
            username,
            password,
            timeout: cfg.timeout,
        })
    }

    fn transport_for(&self, mode: TlsMode) -> Result<AsyncSmtpTransport<Tokio1Executor>, MailError> {
        let builder = match mode {
            TlsMode::Implicit => AsyncSmtpTransport::<Tokio1Executor>::relay(&self.host)
                .map_err(|e| MailError::Config(e.to_string()))?
                .port(self.implicit_tls_port),
            TlsMode::StartTls => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.host)
                .map_err(|e| MailError::Config(e.to_string()))?
                .port(self.starttls_port),
        };
        Ok(builder
            .credentials(Credentials::new(self.username.clone(), self.password.clone()))
            .timeout(Some(self.timeout))
            .build())
    }

    fn port_for(&self, mode: TlsMode) -> u16 {
        match mode {
            TlsMode::Implicit => self.implicit_tls_port,
            TlsMode::StartTls => self.starttls_port,
        }
    }
}

#[async_trait::async_trait]
impl MailTransport for SmtpMailer {
    async fn send(&self, mail: &OutboundMail, mode: TlsMode) -> Result<(), MailError> {
        let email = build_message(mail)?;
        let transport = self.transport_for(mode)?;

        transport.send(email).await.map_err(classify)?;

        debug!(
            host = %self.host,
            port = self.port_for(mode),
            mode = %mode,
            "message accepted"
        );
        Ok(())
    }
}

fn build_message(mail: &OutboundMail) -> Result<Message, MailError> {
    let builder = Message::builder()
        .from(mail.from.clone())
        .to(mail.to.clone())
        .subject(mail.subject.clone());

    match &mail.html {
        Some(html) => builder.multipart(MultiPart::alternative_plain_html(
            mail.text.clone(),
            html.clone(),
        )),
        None => builder.body(mail.text.clone()),
    }
    .map_err(|e| MailError::Message(e.to_string()))
}

/// Permanent rejections (5xx, typically 535 bad credentials) are kept
/// apart from transient transport trouble. Both end the attempt.
fn classify(e: lettre::transport::smtp::Error) -> MailError {
    if e.is_permanent() {
        MailError::Rejected(e.to_string())
    } else {
        MailError::Transport(e.to_string())
    }
}
