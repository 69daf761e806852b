// file: src/chat/tool_loop.rs
// description: bounded LLM <-> tool execution loop
// reference: https://docs.anthropic.com/en/docs/build-with-claude/tool-use

use crate::error::Result;
use crate::llm::LlmClient;
use crate::models::{LlmResponse, Message, TokenUsage, ToolCall};
use crate::tools::ToolExecution;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const DEFAULT_MAX_ITERATIONS: usize = 5;
pub const DEFAULT_TOOL_CONCURRENCY: usize = 4;

#[derive(Debug)]
pub enum LoopState {
    AwaitingLlm,
    ExecutingTools(LlmResponse),
    Done(LlmResponse),
}

#[derive(Debug)]
pub struct LoopOutcome {
    pub response: LlmResponse,
    /// Every executed call in request order, each carrying its outcome.
    pub tool_calls: Vec<ToolCall>,
    /// Round trips that offered tools to the model.
    pub rounds: usize,
    /// The round cap was hit and the answer came from a tools-disabled call.
    pub exhausted: bool,
    pub usage: Option<TokenUsage>,
    pub history: Vec<Message>,
}

pub struct ToolLoop {
    llm: Arc<dyn LlmClient>,
    max_iterations: usize,
    tool_concurrency: usize,
}

impl ToolLoop {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self {
            llm,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            tool_concurrency: DEFAULT_TOOL_CONCURRENCY,
        }
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    pub fn with_tool_concurrency(mut self, tool_concurrency: usize) -> Self {
        self.tool_concurrency = tool_concurrency.max(1);
        self
    }

    pub async fn run(
        &self,
        executor: &dyn ToolExecution,
        history: Vec<Message>,
        user_message: &str,
    ) -> Result<LoopOutcome> {
        let tools = executor.available_tools();
        let mut messages = history;
        messages.push(Message::user(user_message));

        let mut executed = Vec::new();
        let mut usage: Option<TokenUsage> = None;
        let mut rounds = 0;
        let mut state = LoopState::AwaitingLlm;

        loop {
            state = match state {
                LoopState::AwaitingLlm if rounds >= self.max_iterations => {
                    warn!(
                        "Tool loop reached {} rounds, requesting final answer without tools",
                        self.max_iterations
                    );
                    let response = self.llm.chat(&messages, None).await?;
                    add_usage(&mut usage, &response);
                    messages.push(Message::assistant(response.content.clone()));

                    return Ok(LoopOutcome {
                        response,
                        tool_calls: executed,
                        rounds,
                        exhausted: true,
                        usage,
                        history: messages,
                    });
                }
                LoopState::AwaitingLlm => {
                    rounds += 1;
                    debug!("Tool loop round {} with {} messages", rounds, messages.len());

                    let response = self.llm.chat(&messages, Some(&tools)).await?;
                    add_usage(&mut usage, &response);

                    if response.has_tool_calls() {
                        LoopState::ExecutingTools(response)
                    } else {
                        LoopState::Done(response)
                    }
                }
                LoopState::ExecutingTools(response) => {
                    let names = response
                        .tool_calls
                        .iter()
                        .map(|c| c.name.as_str())
                        .collect::<Vec<_>>()
                        .join(", ");
                    info!("Round {}: executing tools {}", rounds, names);

                    let assistant_text = if response.content.trim().is_empty() {
                        format!("Calling tools: {}", names)
                    } else {
                        response.content.clone()
                    };
                    messages.push(Message::assistant(assistant_text));

                    let calls = execute_calls(executor, response.tool_calls, self.tool_concurrency).await;
                    messages.extend(calls.iter().map(ToolCall::to_message));
                    executed.extend(calls);

                    LoopState::AwaitingLlm
                }
                LoopState::Done(response) => {
                    messages.push(Message::assistant(response.content.clone()));
                    info!(
                        "Tool loop finished after {} rounds with {} tool calls",
                        rounds,
                        executed.len()
                    );

                    return Ok(LoopOutcome {
                        response,
                        tool_calls: executed,
                        rounds,
                        exhausted: false,
                        usage,
                        history: messages,
                    });
                }
            };
        }
    }
}

fn add_usage(total: &mut Option<TokenUsage>, response: &LlmResponse) {
    if let Some(usage) = &response.usage {
        let merged = match total.as_ref() {
            Some(current) => current.add(usage),
            None => *usage,
        };
        *total = Some(merged);
    }
}

/// Runs one round's calls concurrently and returns them in request order.
/// Calls rejected at parse time are passed through unexecuted.
pub async fn execute_calls(
    executor: &dyn ToolExecution,
    calls: Vec<ToolCall>,
    concurrency: usize,
) -> Vec<ToolCall> {
    let mut results = stream::iter(calls.into_iter().enumerate().map(|(index, mut call)| async move {
        if !call.is_resolved() {
            let outcome = executor
                .execute(&call.name, &call.arguments)
                .await
                .map_err(|e| e.to_string());
            call.resolve(outcome);
        }
        (index, call)
    }))
    .buffer_unordered(concurrency.max(1))
    .collect::<Vec<_>>()
    .await;

    results.sort_by_key(|(index, _)| *index);
    results.into_iter().map(|(_, call)| call).collect()
}
