use async_trait::async_trait;
use courier_core::config::LlmConfig;
use tracing::{debug, info};

use crate::provider::{ChatProvider, LlmError, Message, Role};

/// Produces the body text for one countdown mail.
#[async_trait]
pub trait MessageGenerator: Send + Sync {
    async fn generate(&self, days: u64) -> Result<String, LlmError>;
}

/// Turns a day count into a short note of encouragement via an LLM.
pub struct Encourager {
    provider: Box<dyn ChatProvider>,
    temperature: f32,
    max_tokens: u32,
}

impl Encourager {
    pub fn new(provider: Box<dyn ChatProvider>, temperature: f32, max_tokens: u32) -> Self {
        Self {
            provider,
            temperature,
            max_tokens,
        }
    }

    /// Build from config, creating the appropriate provider.
    pub fn from_config(cfg: &LlmConfig) -> Result<Self, LlmError> {
        let provider = crate::providers::create_provider(cfg)?;
        Ok(Self::new(provider, cfg.temperature, cfg.max_tokens))
    }
}

#[async_trait]
impl MessageGenerator for Encourager {
    async fn generate(&self, days: u64) -> Result<String, LlmError> {
        let (system, user) = build_prompts(days);
        let messages = vec![
            Message {
                role: Role::System,
                content: system,
            },
            Message {
                role: Role::User,
                content: user,
            },
        ];

        info!("Generating encouragement ({} days out)", days);

        let response = self
            .provider
            .complete(messages, self.temperature, self.max_tokens)
            .await?;

        debug!("LLM reply: {}", response);

        let text = clean_reply(&response);
        if text.is_empty() {
            return Err(LlmError::ParseError("empty completion".into()));
        }
        Ok(text)
    }
}

/// System and user prompts for a given day count.
fn build_prompts(days: u64) -> (String, String) {
    let system = "You are a warm, supportive companion writing a short note of \
        encouragement for someone preparing for a big day. Keep it to two or three \
        sentences of plain text. No lists, no emoji, no preamble."
        .to_string();
    let user = match days {
        0 => "The big day arrives today. Write a final note of encouragement.".to_string(),
        1 => "The big day is tomorrow. Write today's note of encouragement.".to_string(),
        n => format!(
            "The big day is {} days away. Write today's note of encouragement.",
            n
        ),
    };
    (system, user)
}

/// Trim the reply and drop one pair of wrapping quotes if present.
fn clean_reply(raw: &str) -> String {
    let trimmed = raw.trim();
    let unquoted = trimmed
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .or_else(|| {
            trimmed
                .strip_prefix('\u{201c}')
                .and_then(|s| s.strip_suffix('\u{201d}'))
        })
        .unwrap_or(trimmed);
    unquoted.trim().to_string()
}
