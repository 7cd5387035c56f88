//! Operator notification for exhausted cycles.
//!
//! Goes out over the same SMTP machinery as the countdown mail, to the
//! operator's own mailbox. A failed alert is logged and swallowed so it
//! can never mask the delivery failure it reports.

use std::sync::Arc;

use chrono::Local;
use courier_core::config::{MailConfig, TlsMode};
use lettre::message::Mailbox;
use tracing::{info, warn};

use crate::traits::{parse_mailbox, FailureAlert, MailError, MailTransport, OutboundMail};

pub struct OperatorAlert {
    transport: Arc<dyn MailTransport>,
    from: Mailbox,
    operator: Mailbox,
    preferred: TlsMode,
    subject_prefix: String,
}

impl OperatorAlert {
    pub fn from_config(
        cfg: &MailConfig,
        transport: Arc<dyn MailTransport>,
    ) -> Result<Self, MailError> {
        let from = cfg
            .from
            .as_deref()
            .ok_or_else(|| MailError::Config("EMAIL_FROM not set".into()))?;
        let operator = cfg
            .operator
            .as_deref()
            .ok_or_else(|| MailError::Config("EMAIL_OPERATOR not set".into()))?;
        Ok(Self {
            transport,
            from: parse_mailbox(from)?,
            operator: parse_mailbox(operator)?,
            preferred: cfg.preferred,
            subject_prefix: cfg.subject_prefix.clone(),
        })
    }

    fn build_mail(&self, summary: &str, detail: &str) -> OutboundMail {
        OutboundMail {
            from: self.from.clone(),
            to: self.operator.clone(),
            subject: format!("{}: delivery FAILED", self.subject_prefix),
            text: format!(
                "The daily countdown mail was not delivered.\n\nTime: {}\n\n{}\n\n{}\n",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                summary,
                detail
            ),
            html: None,
        }
    }
}

#[async_trait::async_trait]
impl FailureAlert for OperatorAlert {
    async fn alert(&self, summary: &str, detail: &str) -> bool {
        let mail = self.build_mail(summary, detail);

        let first = self.preferred;
        let result = match self.transport.send(&mail, first).await {
            Ok(()) => Ok(first),
            Err(e) => {
                let second = first.other();
                warn!(mode = %first, error = %e, "alert send failed, retrying via {}", second);
                self.transport.send(&mail, second).await.map(|_| second)
            }
        };

        match result {
            Ok(mode) => {
                info!(mode = %mode, to = %self.operator, "operator alerted");
                true
            }
            Err(e) => {
                warn!(error = %e, "operator alert failed, giving up");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use super::*;

    struct ScriptedTransport {
        fail: Vec<TlsMode>,
        sent: Mutex<Vec<(TlsMode, OutboundMail)>>,
    }

    impl ScriptedTransport {
        fn failing(fail: &[TlsMode]) -> Arc<Self> {
            Arc::new(Self {
                fail: fail.to_vec(),
                sent: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait::async_trait]
    impl MailTransport for ScriptedTransport {
        async fn send(&self, mail: &OutboundMail, mode: TlsMode) -> Result<(), MailError> {
            self.sent.lock().unwrap().push((mode, mail.clone()));
            if self.fail.contains(&mode) {
                Err(MailError::Transport(format!("{} refused", mode)))
            } else {
                Ok(())
            }
        }
    }

    fn config() -> MailConfig {
        MailConfig {
            host: Some("smtp.example.com".to_string()),
            implicit_tls_port: 465,
            starttls_port: 587,
            username: Some("courier@example.com".to_string()),
            password: Some("hunter22".to_string()),
            from: Some("courier@example.com".to_string()),
            recipient: Some("friend@example.com".to_string()),
            operator: Some("ops@example.com".to_string()),
            preferred: TlsMode::Implicit,
            subject_prefix: "Daily countdown".to_string(),
            signature: "Your countdown courier".to_string(),
            timeout: Duration::from_secs(10),
        }
    }

    #[tokio::test]
    async fn alert_goes_to_the_operator_mailbox() {
        let transport = ScriptedTransport::failing(&[]);
        let alert = OperatorAlert::from_config(&config(), transport.clone()).unwrap();

        assert!(alert.alert("3 attempts failed", "attempt 1: refused").await);

        let sent = transport.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        let (_, mail) = &sent[0];
        assert_eq!(mail.to.email.to_string(), "ops@example.com");
        assert!(mail.subject.contains("delivery FAILED"));
        assert!(mail.text.contains("3 attempts failed"));
        assert!(mail.text.contains("attempt 1: refused"));
        assert!(mail.html.is_none());
    }

    #[tokio::test]
    async fn alert_falls_back_to_the_other_mode() {
        let transport = ScriptedTransport::failing(&[TlsMode::Implicit]);
        let alert = OperatorAlert::from_config(&config(), transport.clone()).unwrap();

        assert!(alert.alert("summary", "detail").await);

        let sent = transport.sent.lock().unwrap();
        let modes: Vec<TlsMode> = sent.iter().map(|(m, _)| *m).collect();
        assert_eq!(modes, vec![TlsMode::Implicit, TlsMode::StartTls]);
    }

    #[tokio::test]
    async fn failed_alert_is_swallowed() {
        let transport = ScriptedTransport::failing(&[TlsMode::Implicit, TlsMode::StartTls]);
        let alert = OperatorAlert::from_config(&config(), transport.clone()).unwrap();

        assert!(!alert.alert("summary", "detail").await);
        assert_eq!(transport.sent.lock().unwrap().len(), 2);
    }
}
