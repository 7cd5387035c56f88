pub mod deepseek;

use courier_core::config::LlmConfig;

use crate::provider::{ChatProvider, LlmError};

/// Create the chat provider described by config.
pub fn create_provider(cfg: &LlmConfig) -> Result<Box<dyn ChatProvider>, LlmError> {
    let api_key = cfg
        .api_key
        .as_ref()
        .ok_or_else(|| LlmError::NotConfigured("DEEPSEEK_API_KEY not set".into()))?;
    let provider = deepseek::DeepSeekProvider::new(
        api_key.clone(),
        cfg.model.clone(),
        cfg.base_url.clone(),
        cfg.timeout,
    )?;
    Ok(Box::new(provider))
}
