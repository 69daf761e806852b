// file: src/llm/openai.rs
// description: OpenAI-compatible Chat Completions client with function tools and SSE streaming
// reference: https://platform.openai.com/docs/api-reference/chat

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
use serde_json::{Map, Value, json};
use tracing::{debug, error, trace, warn};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const SERVICE: &str = "OpenAI";
const DONE_MARKER: &str = "[DONE]";

#[derive(Debug, Deserialize)]
struct FunctionCall {
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct RawToolCall {
    id: String,
    function: FunctionCall,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<RawToolCall>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u64,
    completion_tokens: u64,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    model: String,
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ChunkDelta {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    delta: ChunkDelta,
}

#[derive(Debug, Deserialize)]
struct CompletionChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

pub struct OpenAiClient {
    client: Client,
    settings: ClientSettings,
}

impl OpenAiClient {
    pub fn new(config: &LlmConfig, system_prompt: String) -> Result<Self> {
        Ok(Self {
            client: http_client(config.timeout_secs)?,
            settings: ClientSettings::from_config(config, DEFAULT_BASE_URL, system_prompt)?,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.settings.base_url)
    }

    fn build_request(
        &self,
        messages: &[Message],
        tools: Option<&[ToolDefinition]>,
        stream: bool,
    ) -> Value {
        let mut payload = vec![json!({ "role": "system", "content": self.settings.system_prompt })];
        payload.extend(
            conversation(messages).map(|m| json!({ "role": m.role.as_str(), "content": m.content })),
        );

        let mut body = json!({
            "model": self.settings.model,
            "messages": payload,
            "temperature": self.settings.temperature,
        });

        // Reasoning models reject max_tokens.
        if self.settings.model.starts_with("gpt-") {
            body["max_tokens"] = json!(self.settings.max_tokens);
        }

        if let Some(tools) = tools.filter(|t| !t.is_empty()) {
            body["tools"] = Value::Array(
                tools
                    .iter()
                    .map(|t| {
                        json!({
                            "type": "function",
                            "function": {
                                "name": t.name,
                                "description": t.description,
                                "parameters": t.input_schema,
                            }
                        })
                    })
                    .collect(),
            );
            body["tool_choice"] = json!("auto");
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
            .bearer_auth(&self.settings.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| WorklogError::remote(SERVICE, format!("request failed: {}", e)))?;

        check_status(SERVICE, response).await
    }
}

/// Function arguments arrive as a JSON string; unparseable ones reject the call.
fn to_tool_call(raw: RawToolCall) -> ToolCall {
    let arguments = raw.function.arguments.trim();
    if arguments.is_empty() {
        return ToolCall::new(raw.id, raw.function.name, Map::new());
    }

    match serde_json::from_str::<Map<String, Value>>(arguments) {
        Ok(parsed) => ToolCall::new(raw.id, raw.function.name, parsed),
        Err(e) => {
            warn!("Invalid arguments for tool {}: {}", raw.function.name, e);
            ToolCall::rejected(
                raw.id,
                raw.function.name,
                format!("Parse error: invalid tool arguments: {}", e),
            )
        }
    }
}

fn parse_response(raw: CompletionResponse) -> Result<LlmResponse> {
    let choice = raw
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| WorklogError::remote(SERVICE, "response contained no choices"))?;

    Ok(LlmResponse {
        content: choice.message.content.unwrap_or_default(),
        role: Role::Assistant,
        model: raw.model,
        usage: raw
            .usage
            .map(|u| TokenUsage::new(u.prompt_tokens, u.completion_tokens)),
        tool_calls: choice.message.tool_calls.into_iter().map(to_tool_call).collect(),
        stop_reason: choice.finish_reason,
    })
}

/// Content delta of one stream chunk; malformed chunks are skipped.
fn chunk_text(data: &str) -> Option<String> {
    match serde_json::from_str::<CompletionChunk>(data) {
        Ok(chunk) => chunk
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.delta.content)
            .filter(|text| !text.is_empty()),
        Err(e) => {
            warn!("Skipping malformed stream chunk: {}", e);
            None
        }
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn chat(
        &self,
        messages: &[Message],
        tools: Option<&[ToolDefinition]>,
    ) -> Result<LlmResponse> {
        let body = self.build_request(messages, tools, false);
        debug!(
            "OpenAI request: {} messages, {} tools",
            body["messages"].as_array().map_or(0, Vec::len),
            tools.map_or(0, <[ToolDefinition]>::len)
        );

        let response = self.send(&body).await?;
        let raw: CompletionResponse = response.json().await.map_err(|e| {
            WorklogError::remote(SERVICE, format!("malformed response payload: {}", e))
        })?;

        parse_response(raw)
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
                match event {
                    Ok(sse) => {
                        trace!("OpenAI SSE: {:?}", sse.data);
                        if sse.data.trim() == DONE_MARKER {
                            break;
                        }
                        if let Some(text) = chunk_text(&sse.data) {
                            if tx.unbounded_send(Ok(text)).is_err() {
                                break;
                            }
                        }
                    }
                    Err(e) => {
                        let err = WorklogError::remote(SERVICE, format!("SSE error: {}", e));
                        error!("{}", err);
                        let _ = tx.unbounded_send(Err(err));
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
            provider: LlmProvider::OpenAi,
            model: self.settings.model.clone(),
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
            supports_tools: true,
            supports_streaming: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use pretty_assertions::assert_eq;

    fn client(model: &str) -> OpenAiClient {
        let mut config = Config::default_config().llm;
        config.provider = LlmProvider::OpenAi;
        config.model = model.to_string();
        config.api_key = Some("sk-test".to_string());
        config.base_url = Some("https://llm.internal.example/v1/".to_string());
        OpenAiClient::new(&config, "system prompt".to_string()).unwrap()
    }

    #[test]
    fn test_request_folds_system_prompt() {
        let c = client("gpt-4o");
        assert_eq!(c.endpoint(), "https://llm.internal.example/v1/chat/completions");

        let tools = vec![ToolDefinition {
            name: "get_github_commits".to_string(),
            description: "Commits".to_string(),
            input_schema: json!({"type": "object", "properties": {}, "required": []}),
        }];
        let body = c.build_request(&[Message::user("hi")], Some(&tools), false);

        assert_eq!(body["messages"][0], json!({"role": "system", "content": "system prompt"}));
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["max_tokens"], 4096);
        assert_eq!(body["tools"][0]["type"], "function");
        assert_eq!(body["tools"][0]["function"]["name"], "get_github_commits");
        assert_eq!(body["tool_choice"], "auto");
    }

    #[test]
    fn test_request_omits_max_tokens_for_other_models() {
        let body = client("o3-mini").build_request(&[Message::user("hi")], None, false);
        assert!(body.get("max_tokens").is_none());
        assert!(body.get("tool_choice").is_none());
    }

    #[test]
    fn test_parse_tool_calls_and_usage() {
        let raw: CompletionResponse = serde_json::from_value(json!({
            "model": "gpt-4o",
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [
                        {"id": "call_1", "type": "function",
                         "function": {"name": "get_github_commits", "arguments": "{\"repo\":\"octo/app\"}"}},
                        {"id": "call_2", "type": "function",
                         "function": {"name": "search_github_commits", "arguments": "{not json"}}
                    ]
                },
                "finish_reason": "tool_calls"
            }],
            "usage": {"prompt_tokens": 50, "completion_tokens": 10, "total_tokens": 60}
        }))
        .unwrap();

        let response = parse_response(raw).unwrap();
        assert_eq!(response.content, "");
        assert_eq!(response.usage, Some(TokenUsage::new(50, 10)));
        assert_eq!(response.tool_calls[0].arguments["repo"], "octo/app");
        assert!(!response.tool_calls[0].is_resolved());
        assert!(response.tool_calls[1].error().unwrap().starts_with("Parse error"));
    }

    #[test]
    fn test_parse_without_usage() {
        let raw: CompletionResponse = serde_json::from_value(json!({
            "model": "local-model",
            "choices": [{"message": {"content": "done"}, "finish_reason": "stop"}]
        }))
        .unwrap();
        let response = parse_response(raw).unwrap();
        assert_eq!(response.content, "done");
        assert!(response.usage.is_none());
        assert!(!response.has_tool_calls());
    }

    #[test]
    fn test_chunk_text() {
        assert_eq!(
            chunk_text(r#"{"choices":[{"delta":{"content":"Hi"},"index":0}]}"#).as_deref(),
            Some("Hi")
        );
        assert_eq!(chunk_text(r#"{"choices":[{"delta":{"role":"assistant"}}]}"#), None);
        assert_eq!(chunk_text("garbage"), None);
    }
}
