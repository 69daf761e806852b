// file: src/llm/anthropic.rs
// description: Anthropic Messages API client with tool use and SSE streaming
// reference: https://docs.anthropic.com/en/api/messages

use super::{
    ClientSettings, LlmClient, LlmProvider, ModelInfo, TextStream, check_status, conversation,
    http_client,
};
use crate::config::LlmConfig;
use crate::error::{Result, WorklogError};
use crate::models::{LlmResponse, Message, Role, TokenUsage, ToolCall, ToolDefinition};
use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures::StreamExt;
use futures::channel::mpsc;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, error, trace};

pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";
const SERVICE: &str = "Anthropic";

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "tool_use")]
    ToolUse { id: String, name: String, input: Value },
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Deserialize)]
struct Usage {
    input_tokens: u64,
    output_tokens: u64,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    model: String,
    content: Vec<ContentBlock>,
    stop_reason: Option<String>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ContentBlockDelta {
    delta: Delta,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum Delta {
    #[serde(rename = "text_delta")]
    Text { text: String },
    #[serde(other)]
    Other,
}

pub struct AnthropicClient {
    client: Client,
    settings: ClientSettings,
}

impl AnthropicClient {
    pub fn new(config: &LlmConfig, system_prompt: String) -> Result<Self> {
        Ok(Self {
            client: http_client(config.timeout_secs)?,
            settings: ClientSettings::from_config(config, DEFAULT_BASE_URL, system_prompt)?,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/messages", self.settings.base_url)
    }

    fn build_request(
        &self,
        messages: &[Message],
        tools: Option<&[ToolDefinition]>,
        stream: bool,
    ) -> Value {
        let messages: Vec<Value> = conversation(messages)
            .map(|m| json!({ "role": m.role.as_str(), "content": m.content }))
            .collect();

        let mut body = json!({
            "model": self.settings.model,
            "max_tokens": self.settings.max_tokens,
            "temperature": self.settings.temperature,
            "system": self.settings.system_prompt,
            "messages": messages,
        });

        if let Some(tools) = tools.filter(|t| !t.is_empty()) {
            body["tools"] = Value::Array(
                tools
                    .iter()
                    .map(|t| {
                        json!({
                            "name": t.name,
                            "description": t.description,
                            "input_schema": t.input_schema,
                        })
                    })
                    .collect(),
            );
        }

        if stream {
            body["stream"] = json!(true);
        }

        body
    }

    async fn send(&self, body: &Value) -> Result<reqwest::Response> {
        let response = self
            .client
            .post(self.endpoint())
            .header("x-api-key", &self.settings.api_key)
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| WorklogError::remote(SERVICE, format!("request failed: {}", e)))?;

        check_status(SERVICE, response).await
    }
}

fn parse_response(raw: MessagesResponse) -> LlmResponse {
    let mut text = Vec::new();
    let mut tool_calls = Vec::new();

    for block in raw.content {
        match block {
            ContentBlock::Text { text: t } => text.push(t),
            ContentBlock::ToolUse { id, name, input } => match input {
                Value::Object(arguments) => tool_calls.push(ToolCall::new(id, name, arguments)),
                other => tool_calls.push(ToolCall::rejected(
                    id,
                    name,
                    format!("Parse error: tool input is not an object: {}", other),
                )),
            },
            ContentBlock::Unsupported => {}
        }
    }

    LlmResponse {
        content: text.join(""),
        role: Role::Assistant,
        model: raw.model,
        usage: raw.usage.map(|u| TokenUsage::new(u.input_tokens, u.output_tokens)),
        tool_calls,
        stop_reason: raw.stop_reason,
    }
}

/// Text carried by one SSE event, if any.
fn stream_event_text(event: &str, data: &str) -> Result<Option<String>> {
    match event {
        "content_block_delta" => {
            let delta: ContentBlockDelta = serde_json::from_str(data)?;
            Ok(match delta.delta {
                Delta::Text { text } => Some(text),
                Delta::Other => None,
            })
        }
        "error" => Err(WorklogError::remote(SERVICE, format!("stream error: {}", data))),
        _ => Ok(None),
    }
}

#[async_trait]
impl LlmClient for AnthropicClient {
    async fn chat(
        &self,
        messages: &[Message],
        tools: Option<&[ToolDefinition]>,
    ) -> Result<LlmResponse> {
        let body = self.build_request(messages, tools, false);
        debug!(
            "Anthropic request: {} messages, {} tools",
            body["messages"].as_array().map_or(0, Vec::len),
            tools.map_or(0, <[ToolDefinition]>::len)
        );

        let response = self.send(&body).await?;
        let raw: MessagesResponse = response.json().await.map_err(|e| {
            WorklogError::remote(SERVICE, format!("malformed response payload: {}", e))
        })?;

        Ok(parse_response(raw))
    }

    async fn chat_stream(
        &self,
        messages: &[Message],
        tools: Option<&[ToolDefinition]>,
    ) -> Result<TextStream> {
        let body = self.build_request(messages, tools, true);
        let response = self.send(&body).await?;
        let (tx, rx) = mpsc::unbounded();

        tokio::spawn(async move {
            let mut stream = response.bytes_stream().eventsource();
            while let Some(event) = stream.next().await {
                let item = match event {
                    Ok(sse) => {
                        trace!("Anthropic SSE: {:?}", sse);
                        if sse.event == "message_stop" {
                            break;
                        }
                        stream_event_text(&sse.event, &sse.data).transpose()
                    }
                    Err(e) => Some(Err(WorklogError::remote(SERVICE, format!("SSE error: {}", e)))),
                };

                if let Some(item) = item {
                    let failed = item.is_err();
                    if let Err(e) = &item {
                        error!("{}", e);
                    }
                    if tx.unbounded_send(item).is_err() || failed {
                        break;
                    }
                }
            }
        });

        Ok(rx.boxed())
    }

    fn system_prompt(&self) -> &str {
        &self.settings.system_prompt
    }

    fn model_info(&self) -> ModelInfo {
        ModelInfo {
            provider: LlmProvider::Anthropic,
            model: self.settings.model.clone(),
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
            supports_tools: true,
            supports_streaming: true,
        }
    }
}
