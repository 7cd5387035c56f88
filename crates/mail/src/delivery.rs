//! Delivery coordination across the two TLS modes.
//!
//! One delivery is at most two submissions: the preferred mode first,
//! then the other mode exactly once if the first failed. Anything
//! beyond that is the retry scheduler's business, not ours.

use std::sync::Arc;

use chrono::NaiveDateTime;
use courier_core::config::{MailConfig, TlsMode};
use courier_core::countdown::Remaining;
use lettre::message::Mailbox;
use tracing::{info, warn};

use crate::compose::Composer;
use crate::traits::{parse_mailbox, Deliverer, MailError, MailTransport, OutboundMail};

pub struct Delivery {
    transport: Arc<dyn MailTransport>,
    composer: Composer,
    from: Mailbox,
    to: Mailbox,
    preferred: TlsMode,
}

impl Delivery {
    pub fn from_config(
        cfg: &MailConfig,
        target: NaiveDateTime,
        transport: Arc<dyn MailTransport>,
    ) -> Result<Self, MailError> {
        let from = cfg
            .from
            .as_deref()
            .ok_or_else(|| MailError::Config("EMAIL_FROM not set".into()))?;
        let to = cfg
            .recipient
            .as_deref()
            .ok_or_else(|| MailError::Config("EMAIL_RECIPIENT not set".into()))?;
        Ok(Self {
            transport,
            composer: Composer::from_config(cfg, target),
            from: parse_mailbox(from)?,
            to: parse_mailbox(to)?,
            preferred: cfg.preferred,
        })
    }
}

#[async_trait::async_trait]
impl Deliverer for Delivery {
    async fn deliver(&self, remaining: &Remaining, message: &str) -> Result<TlsMode, MailError> {
        let body = self.composer.compose(remaining, message)?;
        let mail = OutboundMail {
            from: self.from.clone(),
            to: self.to.clone(),
            subject: body.subject,
            text: body.text,
            html: Some(body.html),
        };

        let first = self.preferred;
        let first_err = match self.transport.send(&mail, first).await {
            Ok(()) => {
                info!(mode = %first, days = remaining.days, "countdown mail delivered");
                return Ok(first);
            }
            Err(e) => e,
        };

        let second = first.other();
        warn!(mode = %first, error = %first_err, "send failed, retrying via {}", second);

        match self.transport.send(&mail, second).await {
            Ok(()) => {
                info!(mode = %second, days = remaining.days, "countdown mail delivered on fallback");
                Ok(second)
            }
            Err(second_err) => Err(MailError::BothModesFailed {
                preferred: first_err.to_string(),
                fallback: second_err.to_string(),
            }),
        }
    }
}
