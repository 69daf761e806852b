// file: src/models/mod.rs
// description: data models module exports
// reference: internal module structure

pub mod commit;
pub mod message;
pub mod platform;
pub mod report;
pub mod tool;

pub use commit::{DEFAULT_BRANCH, GitCommit, GitProject, sort_by_commit_time};
pub use message::{Message, Role, recent_history};
pub use platform::Platform;
pub use report::{TaskType, WorkLogEntry, WorkLogReport};
pub use tool::{LlmResponse, TokenUsage, ToolCall, ToolDefinition, ToolOutcome};
