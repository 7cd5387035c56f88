use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use crate::provider::{ChatProvider, LlmError, Message};

/// OpenAI-compatible chat completion client for the DeepSeek API.
pub struct DeepSeekProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl DeepSeekProvider {
    pub fn new(
        api_key: String,
        model: String,
        base_url: String,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_key,
            model,
            base_url,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl ChatProvider for DeepSeekProvider {
    async fn complete(
        &self,
        messages: Vec<Message>,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String, LlmError> {
        let url = self.endpoint();

        let body = json!({
            "model": self.model,
            "messages": messages,
            "temperature": temperature,
            "max_tokens": max_tokens,
        });

        debug!("DeepSeek request to {}", url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status().as_u16();
        if status != 200 {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::ApiError { status, body });
        }

        let resp: serde_json::Value = response.json().await?;
        parse_reply(&resp)
    }
}

/// Pull the assistant text out of a chat completion response.
fn parse_reply(resp: &serde_json::Value) -> Result<String, LlmError> {
    resp["choices"][0]["message"]["content"]
        .as_str()
        .map(|s| s.to_string())
        .ok_or_else(|| LlmError::ParseError("missing choices[0].message.content".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_reply_reads_first_choice() {
        let resp = json!({
            "choices": [
                {"message": {"role": "assistant", "content": "Keep going!"}}
            ]
        });
        assert_eq!(parse_reply(&resp).unwrap(), "Keep going!");
    }

    #[test]
    fn parse_reply_rejects_empty_choices() {
        let resp = json!({"choices": []});
        assert!(matches!(parse_reply(&resp), Err(LlmError::ParseError(_))));
    }

    #[test]
    fn parse_reply_rejects_missing_content() {
        let resp = json!({"choices": [{"message": {"role": "assistant"}}]});
        assert!(matches!(parse_reply(&resp), Err(LlmError::ParseError(_))));
    }

    #[test]
    fn endpoint_tolerates_trailing_slash() {
        let p = DeepSeekProvider::new(
            "key".into(),
            "deepseek-chat".into(),
            "https://api.deepseek.com/".into(),
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(p.endpoint(), "https://api.deepseek.com/chat/completions");
    }
}
