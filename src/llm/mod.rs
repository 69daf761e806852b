// file: src/llm/mod.rs
// description: LLM client trait, provider selection, and shared HTTP helpers
// reference: https://docs.rs/async-trait

pub mod anthropic;
pub mod openai;
pub mod prompts;

pub use anthropic::AnthropicClient;
pub use openai::OpenAiClient;

use crate::config::LlmConfig;
use crate::error::{Result, WorklogError};
use crate::models::{LlmResponse, Message, Role, ToolDefinition};
use async_trait::async_trait;
use futures::stream::BoxStream;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Text fragments of one streamed reply. Finite and single pass.
pub type TextStream = BoxStream<'static, Result<String>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    #[serde(alias = "claude")]
    Anthropic,
    OpenAi,
}

impl LlmProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            LlmProvider::Anthropic => "anthropic",
            LlmProvider::OpenAi => "openai",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            LlmProvider::Anthropic => "Anthropic",
            LlmProvider::OpenAi => "OpenAI",
        }
    }
}

impl fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelInfo {
    pub provider: LlmProvider,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub supports_tools: bool,
    pub supports_streaming: bool,
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// One completion. `tools: None` forbids tool calls for this request.
    async fn chat(
        &self,
        messages: &[Message],
        tools: Option<&[ToolDefinition]>,
    ) -> Result<LlmResponse>;

    async fn chat_stream(
        &self,
        messages: &[Message],
        tools: Option<&[ToolDefinition]>,
    ) -> Result<TextStream>;

    fn system_prompt(&self) -> &str;

    fn model_info(&self) -> ModelInfo;
}

/// Settings shared by both provider clients.
#[derive(Debug, Clone)]
pub(crate) struct ClientSettings {
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub base_url: String,
    pub system_prompt: String,
}

impl ClientSettings {
    fn from_config(config: &LlmConfig, default_base_url: &str, system_prompt: String) -> Result<Self> {
        let api_key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                WorklogError::Config(format!(
                    "{} API key is not configured (llm.api_key)",
                    config.provider.display_name()
                ))
            })?;

        let base_url = config
            .base_url
            .as_deref()
            .unwrap_or(default_base_url)
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            api_key: api_key.to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            base_url,
            system_prompt,
        })
    }
}

pub(crate) fn http_client(timeout_secs: u64) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| WorklogError::Config(format!("Failed to build HTTP client: {}", e)))
}

/// History without system entries; the system prompt travels separately.
pub(crate) fn conversation(messages: &[Message]) -> impl Iterator<Item = &Message> {
    messages.iter().filter(|m| m.role != Role::System)
}

/// Turns a non-success response into a `RemoteApi` error.
pub(crate) async fn check_status(service: &str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    Err(WorklogError::remote(
        service,
        format!("request failed with status {}: {}", status, body),
    ))
}

pub fn create_llm_client(
    config: &LlmConfig,
    system_prompt: impl Into<String>,
) -> Result<Arc<dyn LlmClient>> {
    let system_prompt = system_prompt.into();
    info!(
        "Creating {} client for model {}",
        config.provider.display_name(),
        config.model
    );

    match config.provider {
        LlmProvider::Anthropic => Ok(Arc::new(AnthropicClient::new(config, system_prompt)?)),
        LlmProvider::OpenAi => Ok(Arc::new(OpenAiClient::new(config, system_prompt)?)),
    }
}
