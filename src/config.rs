use std::env;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

/// Resolves a credential from a literal value, a file path, or an environment
/// variable, in that priority order. Values that name an existing file are
/// read from disk; missing everywhere is a startup error.
pub fn resolve_credential(value: Option<&str>, env_key: &str) -> Result<String> {
    if let Some(value) = value {
        if Path::new(value).is_file() {
            let contents = fs::read_to_string(value)
                .with_context(|| format!("failed to read credential file {}", value))?;
            return Ok(contents.trim().to_string());
        }
        return Ok(value.to_string());
    }

    env::var(env_key).with_context(|| format!("{} is not set", env_key))
}

/// Runtime configuration, read once at startup.
pub struct BotConfig {
    pub telegram_token: String,
    pub openai_api_key: String,
    pub openai_model: String,
    pub openai_api_base: String,
}

impl BotConfig {
    pub fn from_env() -> Result<Self> {
        // Env values may themselves name a key file.
        let telegram_env = env::var("TELEGRAM_BOT_TOKEN").ok();
        let openai_env = env::var("OPENAI_API_KEY").ok();

        Ok(Self {
            telegram_token: resolve_credential(telegram_env.as_deref(), "TELEGRAM_BOT_TOKEN")?,
            openai_api_key: resolve_credential(openai_env.as_deref(), "OPENAI_API_KEY")?,
            openai_model: env::var("OPENAI_MODEL")
                .unwrap_or_else(|_| crate::llm::DEFAULT_MODEL.to_string()),
            openai_api_base: env::var("OPENAI_API_BASE")
                .unwrap_or_else(|_| crate::llm::DEFAULT_API_BASE.to_string()),
        })
    }
}
