pub mod config;
pub mod extract;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;

use crate::llm::config::{ChatMessage, ServiceChatRequest, ServiceChatResponse};

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

/// Seam between the teaching logic and the text-generation service.
/// Callers never surface the raw error to the chat; every failure maps to a
/// user-visible retry message at the handler level.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        history: &[ChatMessage],
    ) -> Result<String>;
}

pub struct OpenAiClient {
    client: Client,
    api_base: String,
    api_key: String,
    model: String,
}

impl OpenAiClient {
    pub fn new(api_key: String, model: String, api_base: String) -> Self {
        Self { client: Client::new(), api_base, api_key, model }
    }
}

#[async_trait]
impl Generator for OpenAiClient {
    async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        history: &[ChatMessage],
    ) -> Result<String> {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatMessage::system(system_prompt));
        messages.extend_from_slice(history);
        messages.push(ChatMessage::user(user_prompt));

        let request = ServiceChatRequest { model: self.model.clone(), messages };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.api_base))
            .bearer_auth(&self.api_key)
            .header("Accept", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(anyhow!("generation service returned {}: {}", status, text));
        }

        let response = serde_json::from_str::<ServiceChatResponse>(&text)?;
        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| anyhow!("generation service returned no content"))
    }
}
