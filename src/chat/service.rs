// file: src/chat/service.rs
// description: request-scoped chat entry point and work-log document generation
// reference: internal service layer

use super::tool_loop::ToolLoop;
use crate::config::ChatConfig;
use crate::error::{Result, WorklogError};
use crate::git_host::{CommitQuery, GitHost};
use crate::llm::{LlmClient, TextStream};
use crate::models::{Message, Role, TokenUsage, ToolCall, WorkLogReport, recent_history};
use crate::report::{
    attachment_filename, format_markdown, generate_report, looks_like_worklog, parse_date_range,
    simple_summary,
};
use crate::settings::UserSettings;
use crate::timerange::DateRange;
use crate::tools::{ToolExecution, ToolExecutor};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

/// A downloadable Markdown document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attachment {
    pub filename: String,
    pub content: String,
    pub size: usize,
    pub created_at: DateTime<Utc>,
}

impl Attachment {
    pub fn markdown(filename: impl Into<String>, content: impl Into<String>) -> Self {
        let content = content.into();
        Self {
            filename: filename.into(),
            size: content.len(),
            content,
            created_at: Utc::now(),
        }
    }

    pub fn encoded(&self) -> String {
        STANDARD.encode(self.content.as_bytes())
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ReplyMetadata {
    pub model: Option<String>,
    pub usage: Option<TokenUsage>,
    pub processing_time_ms: u128,
    pub tool_calls: Vec<ToolCall>,
    pub rounds: usize,
    pub exhausted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatReply {
    pub content: String,
    pub role: Role,
    pub metadata: ReplyMetadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment: Option<Attachment>,
}

impl ChatReply {
    pub fn is_error(&self) -> bool {
        self.metadata.error.is_some()
    }
}

pub fn apology(error: &WorklogError) -> String {
    format!(
        "Sorry, something went wrong while processing your request: {}",
        error
    )
}

/// Markdown attachment for replies that contain a rendered work log.
pub fn detect_attachment(content: &str, now: DateTime<Utc>) -> Option<Attachment> {
    if !looks_like_worklog(content) {
        return None;
    }

    let filename = match parse_date_range(content) {
        Some(range) => format!(
            "worklog_{}_to_{}.md",
            range.start.format("%Y%m%d"),
            range.end.format("%Y%m%d")
        ),
        None => format!("worklog_{}.md", now.format("%Y%m%d_%H%M%S")),
    };
    Some(Attachment::markdown(filename, content))
}

pub struct ChatService {
    llm: Arc<dyn LlmClient>,
    config: ChatConfig,
}

impl ChatService {
    pub fn new(llm: Arc<dyn LlmClient>, config: ChatConfig) -> Self {
        Self { llm, config }
    }

    /// Answers one user message for the given user. Never fails: errors come
    /// back as an apology reply with `metadata.error` set.
    pub async fn chat(
        &self,
        user_message: &str,
        settings: &UserSettings,
        history: &[Message],
    ) -> ChatReply {
        let started = Instant::now();
        match ToolExecutor::from_settings(settings) {
            Ok(executor) => self.chat_with(&executor, user_message, history).await,
            Err(e) => error_reply(&e, started),
        }
    }

    pub async fn chat_with(
        &self,
        executor: &dyn ToolExecution,
        user_message: &str,
        history: &[Message],
    ) -> ChatReply {
        let started = Instant::now();
        let tool_loop = ToolLoop::new(self.llm.clone())
            .with_max_iterations(self.config.max_iterations)
            .with_tool_concurrency(self.config.tool_concurrency);

        let history = recent_history(history, self.config.history_limit);
        match tool_loop.run(executor, history, user_message).await {
            Ok(outcome) => {
                let content = outcome.response.content;
                info!(
                    "Chat reply ready: {} rounds, {} tool calls, {} ms",
                    outcome.rounds,
                    outcome.tool_calls.len(),
                    started.elapsed().as_millis()
                );

                ChatReply {
                    attachment: detect_attachment(&content, Utc::now()),
                    content,
                    role: Role::Assistant,
                    metadata: ReplyMetadata {
                        model: Some(outcome.response.model),
                        usage: outcome.usage,
                        processing_time_ms: started.elapsed().as_millis(),
                        tool_calls: outcome.tool_calls,
                        rounds: outcome.rounds,
                        exhausted: outcome.exhausted,
                        error: None,
                    },
                }
            }
            Err(e) => error_reply(&e, started),
        }
    }

    /// Streams a plain answer; tools are not offered on this path.
    pub async fn chat_stream(&self, user_message: &str, history: &[Message]) -> Result<TextStream> {
        let mut messages = recent_history(history, self.config.history_limit);
        messages.push(Message::user(user_message));
        self.llm.chat_stream(&messages, None).await
    }
}

fn error_reply(error: &WorklogError, started: Instant) -> ChatReply {
    error!("Chat request failed: {}", error);
    ChatReply {
        content: apology(error),
        role: Role::Assistant,
        metadata: ReplyMetadata {
            processing_time_ms: started.elapsed().as_millis(),
            error: Some(error.to_string()),
            ..Default::default()
        },
        attachment: None,
    }
}

#[derive(Debug, Clone)]
pub struct WorklogDocument {
    pub report: WorkLogReport,
    pub attachment: Attachment,
    /// Per-project commit totals as plain text.
    pub summary: String,
}

/// Builds a work log straight from the host, without the LLM.
pub async fn generate_worklog(
    host: &dyn GitHost,
    range: DateRange,
    project_id: Option<String>,
) -> Result<WorklogDocument> {
    range.validate()?;
    let query = CommitQuery {
        since: Some(range.start),
        until: Some(range.end),
        project_id,
        ..Default::default()
    };

    let commits = host.get_commits(&query).await?;
    let report = generate_report(&commits, &range);
    let summary = simple_summary(&commits);
    let attachment = Attachment::markdown(attachment_filename(&report), format_markdown(&report));

    info!(
        "Generated work log {} with {} commits",
        attachment.filename, report.total_commits
    );
    Ok(WorklogDocument {
        report,
        attachment,
        summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{LlmProvider, ModelInfo};
    use crate::models::{GitCommit, GitProject, LlmResponse, Platform, ToolDefinition};
    use async_trait::async_trait;
    use chrono::TimeZone;
    use futures::StreamExt;
    use pretty_assertions::assert_eq;
    use serde_json::{Map, Value};
    use std::sync::Mutex;

    struct EchoLlm {
        reply: Result<String>,
        seen: Mutex<Vec<Vec<Message>>>,
    }

    impl EchoLlm {
        fn replying(text: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(text.to_string()),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                reply: Err(WorklogError::remote("Anthropic", "status 401: invalid x-api-key")),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl LlmClient for EchoLlm {
        async fn chat(
            &self,
            messages: &[Message],
            _tools: Option<&[ToolDefinition]>,
        ) -> Result<LlmResponse> {
            self.seen.lock().unwrap().push(messages.to_vec());
            match &self.reply {
                Ok(text) => Ok(LlmResponse::text("mock-model", text.as_str())),
                Err(e) => Err(WorklogError::remote("Anthropic", e.to_string())),
            }
        }

        async fn chat_stream(
            &self,
            _messages: &[Message],
            _tools: Option<&[ToolDefinition]>,
        ) -> Result<TextStream> {
            let parts = vec![Ok("Hel".to_string()), Ok("lo".to_string())];
            Ok(futures::stream::iter(parts).boxed())
        }

        fn system_prompt(&self) -> &str {
            "test"
        }

        fn model_info(&self) -> ModelInfo {
            ModelInfo {
                provider: LlmProvider::Anthropic,
                model: "mock-model".to_string(),
                temperature: 0.0,
                max_tokens: 10,
                supports_tools: true,
                supports_streaming: true,
            }
        }
    }

    struct NoTools;

    #[async_trait]
    impl ToolExecution for NoTools {
        async fn execute(&self, name: &str, _arguments: &Map<String, Value>) -> Result<Value> {
            Err(WorklogError::UnknownTool(name.to_string()))
        }

        fn available_tools(&self) -> Vec<ToolDefinition> {
            Vec::new()
        }
    }

    fn config(history_limit: usize) -> ChatConfig {
        ChatConfig {
            max_iterations: 5,
            history_limit,
            tool_concurrency: 4,
        }
    }

    #[tokio::test]
    async fn test_plain_reply_has_no_attachment() {
        let service = ChatService::new(EchoLlm::replying("Hi! Ask me for a work log."), config(10));
        let reply = service.chat_with(&NoTools, "hello", &[]).await;

        assert_eq!(reply.content, "Hi! Ask me for a work log.");
        assert_eq!(reply.role, Role::Assistant);
        assert_eq!(reply.metadata.model.as_deref(), Some("mock-model"));
        assert!(reply.attachment.is_none());
        assert!(!reply.is_error());
    }

    #[tokio::test]
    async fn test_worklog_reply_gets_attachment() {
        let text = "# Work Log (2026-01-12 ~ 2026-01-18)\n\n## 📅 2026-01-14 Wednesday\n";
        let service = ChatService::new(EchoLlm::replying(text), config(10));
        let reply = service.chat_with(&NoTools, "this week", &[]).await;

        let attachment = reply.attachment.unwrap();
        assert_eq!(attachment.filename, "worklog_20260112_to_20260118.md");
        assert_eq!(attachment.size, text.len());
        assert_eq!(
            STANDARD.decode(attachment.encoded()).unwrap(),
            text.as_bytes()
        );
    }

    #[tokio::test]
    async fn test_llm_failure_becomes_apology() {
        let service = ChatService::new(EchoLlm::failing(), config(10));
        let reply = service.chat_with(&NoTools, "hello", &[]).await;

        assert!(reply.is_error());
        assert!(reply
            .content
            .starts_with("Sorry, something went wrong while processing your request:"));
        assert!(reply.content.contains("invalid x-api-key"));
    }

    #[tokio::test]
    async fn test_unconfigured_user_gets_apology() {
        let service = ChatService::new(EchoLlm::replying("unused"), config(10));
        let reply = service
            .chat("hello", &UserSettings::new(Platform::GitLab), &[])
            .await;
        assert!(reply.is_error());
        assert!(reply.content.contains("No valid platform configuration"));
    }

    #[tokio::test]
    async fn test_history_is_truncated() {
        let llm = EchoLlm::replying("ok");
        let service = ChatService::new(llm.clone(), config(2));
        let history = vec![
            Message::user("one"),
            Message::assistant("two"),
            Message::user("three"),
            Message::assistant("four"),
        ];

        service.chat_with(&NoTools, "five", &history).await;

        let seen = llm.seen.lock().unwrap();
        let contents: Vec<_> = seen[0].iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["three", "four", "five"]);
    }

    #[tokio::test]
    async fn test_chat_stream_collects_fragments() {
        let service = ChatService::new(EchoLlm::replying("unused"), config(10));
        let stream = service.chat_stream("hi", &[]).await.unwrap();
        let parts: Vec<String> = stream.map(|p| p.unwrap()).collect().await;
        assert_eq!(parts.concat(), "Hello");
    }

    #[test]
    fn test_detect_attachment_without_title_uses_timestamp() {
        let now = Utc.with_ymd_and_hms(2026, 1, 14, 8, 5, 9).unwrap();
        let attachment = detect_attachment("## 📅 2026-01-14 Wednesday\n- [api] x", now).unwrap();
        assert_eq!(attachment.filename, "worklog_20260114_080509.md");
    }

    struct OneCommitHost;

    #[async_trait]
    impl GitHost for OneCommitHost {
        fn platform(&self) -> Platform {
            Platform::GitHub
        }

        async fn get_projects(&self) -> Result<Vec<GitProject>> {
            Ok(Vec::new())
        }

        async fn get_project(&self, _project_id: &str) -> Result<Option<GitProject>> {
            Ok(None)
        }

        async fn get_branches(&self, _project: &GitProject) -> Result<Vec<String>> {
            Ok(Vec::new())
        }

        async fn get_branch_commits(
            &self,
            _project: &GitProject,
            _branch: Option<&str>,
            _query: &CommitQuery,
        ) -> Result<Vec<GitCommit>> {
            Ok(Vec::new())
        }

        async fn get_commits(&self, query: &CommitQuery) -> Result<Vec<GitCommit>> {
            query.validate()?;
            Ok(vec![crate::report::tests::commit("abc1234567", "app", "feat: search", 13, 9)])
        }
    }

    #[tokio::test]
    async fn test_generate_worklog_document() {
        let document = generate_worklog(&OneCommitHost, crate::report::tests::week(), None)
            .await
            .unwrap();

        assert_eq!(document.report.total_commits, 1);
        assert_eq!(document.attachment.filename, "worklog_20260112_to_20260118.md");
        assert!(document.attachment.content.contains("- [app] search (Dev) [abc1234]"));
        assert_eq!(
            document.summary,
            "1 commits in total\n\nBy project:\n  - app: 1"
        );
    }
}
