//! Minijinja rendering of the daily countdown message.
//!
//! Both bodies come from embedded template strings, so a fresh
//! [`minijinja::Environment`] per render is cheap enough.

use chrono::NaiveDateTime;
use courier_core::config::MailConfig;
use courier_core::countdown::Remaining;

use crate::traits::MailError;

const HTML_TEMPLATE: &str = r#"<html>
<body style="font-family: 'Helvetica Neue', Arial, sans-serif; background: linear-gradient(135deg, #667eea 0%, #764ba2 100%); padding: 20px;">
    <div style="max-width: 600px; margin: 0 auto; background: white; border-radius: 10px; padding: 30px; box-shadow: 0 10px 30px rgba(0,0,0,0.2);">
        <h2 style="color: #333; text-align: center; margin-bottom: 30px;">{{ title }}</h2>
        <div style="text-align: center; margin-bottom: 30px;">
            <div style="font-size: 48px; font-weight: bold; color: #667eea; margin-bottom: 10px;">{{ days }}</div>
            <div style="font-size: 18px; color: #666;">{{ day_label }}</div>
        </div>
        <div style="background: #f8f9fa; padding: 20px; border-radius: 8px; margin-bottom: 30px;">
            <div style="font-size: 16px; color: #333; line-height: 1.6; white-space: pre-line;">{{ message }}</div>
            <div style="text-align: right; color: #555; margin-top: 16px;">{{ signature }}</div>
        </div>
        <div style="text-align: center; color: #999; font-size: 14px;">
            <p>Counting down to {{ target_date }}.</p>
        </div>
    </div>
</body>
</html>
"#;

const TEXT_TEMPLATE: &str = r#"{{ title }}: {{ days }} {{ day_label }}.

{{ message }}

{{ signature }}

Counting down to {{ target_date }}.
"#;

#[derive(Debug, serde::Serialize)]
struct BodyContext<'a> {
    title: &'a str,
    days: u64,
    day_label: &'a str,
    message: &'a str,
    signature: &'a str,
    target_date: &'a str,
}

/// Subject, plain text and HTML for one countdown mail.
#[derive(Debug, Clone)]
pub struct MailBody {
    pub subject: String,
    pub text: String,
    pub html: String,
}

/// Renders countdown mails from config-supplied fixed strings.
#[derive(Debug, Clone)]
pub struct Composer {
    subject_prefix: String,
    signature: String,
    target_date: String,
}

impl Composer {
    pub fn from_config(cfg: &MailConfig, target: NaiveDateTime) -> Self {
        Self {
            subject_prefix: cfg.subject_prefix.clone(),
            signature: cfg.signature.clone(),
            target_date: target.format("%Y-%m-%d").to_string(),
        }
    }

    /// Render subject and both bodies for the given day count and message.
    pub fn compose(&self, remaining: &Remaining, message: &str) -> Result<MailBody, MailError> {
        let ctx = BodyContext {
            title: &self.subject_prefix,
            days: remaining.days,
            day_label: if remaining.days == 1 { "day to go" } else { "days to go" },
            message,
            signature: &self.signature,
            target_date: &self.target_date,
        };

        let env = minijinja::Environment::new();
        let html = env
            .render_str(HTML_TEMPLATE, &ctx)
            .map_err(|e| MailError::Template(e.to_string()))?;
        let text = env
            .render_str(TEXT_TEMPLATE, &ctx)
            .map_err(|e| MailError::Template(e.to_string()))?;

        Ok(MailBody {
            subject: build_subject(&self.subject_prefix, remaining.days),
            text,
            html,
        })
    }
}

fn build_subject(prefix: &str, days: u64) -> String {
    match days {
        0 => format!("{}: less than a day to go", prefix),
        1 => format!("{}: 1 day to go", prefix),
        n => format!("{}: {} days to go", prefix, n),
    }
}
