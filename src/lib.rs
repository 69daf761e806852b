// file: src/lib.rs
// description: library entry point and public api exports
// reference: rust library patterns

//! Work-log assistant: lets an LLM call GitLab and GitHub commit tools in a
//! bounded loop and renders the answer as a Markdown work log.

pub mod chat;
pub mod config;
pub mod error;
pub mod git_host;
pub mod llm;
pub mod mcp;
pub mod models;
pub mod report;
pub mod settings;
pub mod timerange;
pub mod tools;
pub mod utils;

pub use chat::{Attachment, ChatReply, ChatService, ToolLoop, generate_worklog};
pub use config::{ChatConfig, Config, CredentialsConfig, LlmConfig, SecurityConfig};
pub use error::{Result, WorklogError};
pub use git_host::{CommitQuery, GitHost, GitHubClient, GitLabClient, create_all_hosts, create_host};
pub use llm::{LlmClient, LlmProvider, create_llm_client};
pub use models::{
    GitCommit, GitProject, LlmResponse, Message, Platform, Role, ToolCall, ToolDefinition,
    WorkLogReport,
};
pub use report::{format_markdown, generate_report};
pub use settings::{GitHubCredentials, GitLabCredentials, UserSettings};
pub use timerange::{DateRange, RangeKeyword};
pub use tools::{ToolExecution, ToolExecutor, tool_catalog};
pub use utils::CredentialCipher;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        let config = Config::default_config();
        assert_eq!(config.llm.provider, LlmProvider::Anthropic);
        assert_eq!(tool_catalog(Platform::GitHub).len(), 4);
    }
}
