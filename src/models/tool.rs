// file: src/models/tool.rs
// description: tool definitions, tool call records, and LLM response types
// reference: internal data structures

use super::message::{Message, Role};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

impl ToolDefinition {
    pub fn required_arguments(&self) -> Vec<&str> {
        self.input_schema
            .get("required")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    pub fn properties(&self) -> Option<&Map<String, Value>> {
        self.input_schema.get("properties").and_then(Value::as_object)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ToolOutcome {
    #[serde(rename = "result")]
    Success(Value),
    #[serde(rename = "error")]
    Failure(String),
}

/// A tool invocation requested by the model. Unresolved until executed;
/// afterwards carries exactly one of result or error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: Map<String, Value>,
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    outcome: Option<ToolOutcome>,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
            outcome: None,
        }
    }

    /// A call whose arguments could not be interpreted; it is never executed.
    pub fn rejected(id: impl Into<String>, name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments: Map::new(),
            outcome: Some(ToolOutcome::Failure(error.into())),
        }
    }

    pub fn resolve(&mut self, outcome: std::result::Result<Value, String>) {
        self.outcome = Some(match outcome {
            Ok(value) => ToolOutcome::Success(value),
            Err(error) => ToolOutcome::Failure(error),
        });
    }

    pub fn is_resolved(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn outcome(&self) -> Option<&ToolOutcome> {
        self.outcome.as_ref()
    }

    pub fn result(&self) -> Option<&Value> {
        match &self.outcome {
            Some(ToolOutcome::Success(value)) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            Some(ToolOutcome::Failure(error)) => Some(error),
            _ => None,
        }
    }

    /// Folds the outcome into a history message for the next LLM round.
    pub fn to_message(&self) -> Message {
        let payload = match &self.outcome {
            Some(ToolOutcome::Success(value)) => json!({ "tool_name": self.name, "result": value }),
            Some(ToolOutcome::Failure(error)) => json!({ "tool_name": self.name, "error": error }),
            None => json!({ "tool_name": self.name, "error": "tool was not executed" }),
        };
        Message::new(Role::User, payload.to_string())
            .with_metadata("tool_call_id", json!(self.id))
            .with_metadata("tool_name", json!(self.name))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_tokens: u64,
}

impl TokenUsage {
    pub fn new(input_tokens: u64, output_tokens: u64) -> Self {
        Self {
            input_tokens,
            output_tokens,
            total_tokens: input_tokens + output_tokens,
        }
    }

    pub fn add(&self, other: &TokenUsage) -> TokenUsage {
        TokenUsage::new(
            self.input_tokens + other.input_tokens,
            self.output_tokens + other.output_tokens,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LlmResponse {
    pub content: String,
    pub role: Role,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<TokenUsage>,
    pub tool_calls: Vec<ToolCall>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_reason: Option<String>,
}

impl LlmResponse {
    pub fn text(model: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            role: Role::Assistant,
            model: model.into(),
            usage: None,
            tool_calls: Vec::new(),
            stop_reason: None,
        }
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_resolve_sets_exactly_one_side() {
        let mut ok = ToolCall::new("1", "get_gitlab_projects", Map::new());
        assert!(!ok.is_resolved());
        ok.resolve(Ok(json!({"count": 0})));
        assert!(ok.result().is_some());
        assert!(ok.error().is_none());

        let mut failed = ToolCall::new("2", "get_gitlab_projects", Map::new());
        failed.resolve(Err("boom".to_string()));
        assert!(failed.result().is_none());
        assert_eq!(failed.error(), Some("boom"));
    }

    #[test]
    fn test_rejected_call_is_already_resolved() {
        let call = ToolCall::rejected("x", "search_github_commits", "invalid arguments");
        assert!(call.is_resolved());
        assert_eq!(call.error(), Some("invalid arguments"));
    }

    #[test]
    fn test_tool_call_serialization_flattens_outcome() {
        let mut call = ToolCall::new("1", "get_gitlab_projects", Map::new());
        call.resolve(Ok(json!({"count": 2})));
        let value = serde_json::to_value(&call).unwrap();
        assert_eq!(value["result"], json!({"count": 2}));
        assert!(value.get("error").is_none());
    }

    #[test]
    fn test_to_message_payload() {
        let mut call = ToolCall::new("abc", "get_gitlab_projects", Map::new());
        call.resolve(Err("GitLab API error: 401".to_string()));
        let msg = call.to_message();
        let payload: Value = serde_json::from_str(&msg.content).unwrap();
        assert_eq!(payload["tool_name"], "get_gitlab_projects");
        assert_eq!(payload["error"], "GitLab API error: 401");
        assert_eq!(msg.metadata_value("tool_call_id"), Some(&json!("abc")));
    }

    #[test]
    fn test_token_usage_totals() {
        let usage = TokenUsage::new(120, 30);
        assert_eq!(usage.total_tokens, 150);
        assert_eq!(usage.add(&TokenUsage::new(10, 5)), TokenUsage::new(130, 35));
    }

    #[test]
    fn test_required_arguments() {
        let def = ToolDefinition {
            name: "search".to_string(),
            description: "Search".to_string(),
            input_schema: json!({"type": "object", "properties": {"query": {"type": "string"}}, "required": ["query"]}),
        };
        assert_eq!(def.required_arguments(), vec!["query"]);
        assert!(def.properties().unwrap().contains_key("query"));
    }
}
