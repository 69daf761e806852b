// file: src/mcp/server.rs
// description: MCP server exposing the commit tools to external agents
// reference: https://docs.rs/rmcp

use crate::error::WorklogError;
use crate::models::Platform;
use crate::tools::{ToolExecution, ToolKind};
use rmcp::handler::server::tool::{Parameters, ToolRouter};
use rmcp::model::*;
use rmcp::{ErrorData as McpError, ServerHandler, tool, tool_handler, tool_router};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{error, info};

#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct CommitsArgs {
    /// "gitlab" or "github"; the configured default when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    /// Project id, path, or repository name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    /// ISO 8601 start of the window
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub since_date: Option<String>,
    /// ISO 8601 end of the window
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub until_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    /// Walk every branch instead of the default one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub all_branches: Option<bool>,
}

#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct ProjectsArgs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct ProjectArgs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    pub project_id: String,
}

#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct SearchArgs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    /// Case-insensitive text matched against commit titles and messages
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub since_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub until_date: Option<String>,
}

fn to_mcp_error(e: WorklogError) -> McpError {
    match e {
        WorklogError::Validation(_) | WorklogError::Parse(_) | WorklogError::UnknownTool(_) => {
            McpError::invalid_params(e.to_string(), None)
        }
        other => McpError::internal_error(other.to_string(), None),
    }
}

/// Tool name for `kind`, prefixed when a platform is requested explicitly.
fn routed_name(kind: ToolKind, platform: Option<&str>) -> Result<&'static str, McpError> {
    match platform {
        Some(p) => {
            let platform: Platform = p.parse().map_err(to_mcp_error)?;
            Ok(kind.tool_name(platform))
        }
        None => Ok(kind.generic_name()),
    }
}

fn to_arguments<T: Serialize>(args: &T) -> Result<Map<String, Value>, McpError> {
    match serde_json::to_value(args) {
        Ok(Value::Object(mut map)) => {
            map.remove("platform");
            Ok(map)
        }
        Ok(_) => Ok(Map::new()),
        Err(e) => Err(McpError::internal_error(e.to_string(), None)),
    }
}

#[derive(Clone)]
pub struct WorklogMcp {
    executor: Arc<dyn ToolExecution>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl WorklogMcp {
    pub fn new(executor: Arc<dyn ToolExecution>) -> Self {
        Self {
            executor,
            tool_router: Self::tool_router(),
        }
    }

    pub fn get_tool_router(&self) -> &ToolRouter<Self> {
        &self.tool_router
    }

    async fn dispatch(
        &self,
        kind: ToolKind,
        platform: Option<&str>,
        arguments: Map<String, Value>,
    ) -> Result<CallToolResult, McpError> {
        let name = routed_name(kind, platform)?;
        info!("MCP: {} {:?}", name, arguments);

        let value = self.executor.execute(name, &arguments).await.map_err(|e| {
            error!("MCP: {} failed: {}", name, e);
            to_mcp_error(e)
        })?;

        let text = serde_json::to_string_pretty(&value)
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(text)]))
    }

    #[tool(description = "List commits in a time window, across all projects or for one project")]
    async fn get_commits(
        &self,
        Parameters(args): Parameters<CommitsArgs>,
    ) -> Result<CallToolResult, McpError> {
        let arguments = to_arguments(&args)?;
        self.dispatch(ToolKind::Commits, args.platform.as_deref(), arguments)
            .await
    }

    #[tool(description = "List projects or repositories the user can access")]
    async fn get_projects(
        &self,
        Parameters(args): Parameters<ProjectsArgs>,
    ) -> Result<CallToolResult, McpError> {
        self.dispatch(ToolKind::Projects, args.platform.as_deref(), Map::new())
            .await
    }

    #[tool(description = "Get details of a single project or repository")]
    async fn get_project(
        &self,
        Parameters(args): Parameters<ProjectArgs>,
    ) -> Result<CallToolResult, McpError> {
        let arguments = to_arguments(&args)?;
        self.dispatch(ToolKind::Project, args.platform.as_deref(), arguments)
            .await
    }

    #[tool(description = "Search commit titles and messages for a keyword")]
    async fn search_commits(
        &self,
        Parameters(args): Parameters<SearchArgs>,
    ) -> Result<CallToolResult, McpError> {
        let arguments = to_arguments(&args)?;
        self.dispatch(ToolKind::SearchCommits, args.platform.as_deref(), arguments)
            .await
    }
}

#[tool_handler]
impl ServerHandler for WorklogMcp {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                "Query GitLab and GitHub commit history to assemble work logs.".to_string(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::models::ToolDefinition;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<(String, Map<String, Value>)>>,
    }

    #[async_trait]
    impl ToolExecution for Recorder {
        async fn execute(&self, name: &str, arguments: &Map<String, Value>) -> Result<Value> {
            self.calls
                .lock()
                .unwrap()
                .push((name.to_string(), arguments.clone()));
            if name.contains("project") && arguments.get("project_id") == Some(&json!("missing")) {
                return Err(WorklogError::NotFound("project missing".to_string()));
            }
            Ok(json!({ "count": 0 }))
        }

        fn available_tools(&self) -> Vec<ToolDefinition> {
            Vec::new()
        }
    }

    fn server() -> (Arc<Recorder>, WorklogMcp) {
        let recorder = Arc::new(Recorder::default());
        let mcp = WorklogMcp::new(recorder.clone());
        (recorder, mcp)
    }

    #[test]
    fn test_mcp_server_lists_tools() {
        let (_, mcp) = server();
        let mut names: Vec<String> = mcp
            .get_tool_router()
            .list_all()
            .into_iter()
            .map(|t| t.name.to_string())
            .collect();
        names.sort();
        assert_eq!(
            names,
            vec!["get_commits", "get_project", "get_projects", "search_commits"]
        );
    }

    #[tokio::test]
    async fn test_default_platform_uses_generic_name() {
        let (recorder, mcp) = server();
        let args = CommitsArgs {
            since_date: Some("2026-01-12T00:00:00Z".to_string()),
            ..Default::default()
        };
        mcp.get_commits(Parameters(args)).await.unwrap();

        let calls = recorder.calls.lock().unwrap();
        assert_eq!(calls[0].0, "get_commits");
        assert_eq!(calls[0].1.get("since_date"), Some(&json!("2026-01-12T00:00:00Z")));
        assert!(!calls[0].1.contains_key("platform"));
    }

    #[tokio::test]
    async fn test_explicit_platform_routes_to_prefixed_tool() {
        let (recorder, mcp) = server();
        let args = ProjectsArgs {
            platform: Some("github".to_string()),
        };
        mcp.get_projects(Parameters(args)).await.unwrap();
        assert_eq!(recorder.calls.lock().unwrap()[0].0, "get_github_repositories");
    }

    #[tokio::test]
    async fn test_errors_become_mcp_errors() {
        let (_, mcp) = server();
        let bad_platform = SearchArgs {
            platform: Some("bitbucket".to_string()),
            query: "fix".to_string(),
            ..Default::default()
        };
        assert!(mcp.search_commits(Parameters(bad_platform)).await.is_err());

        let missing = ProjectArgs {
            platform: None,
            project_id: "missing".to_string(),
        };
        let err = mcp.get_project(Parameters(missing)).await.unwrap_err();
        assert!(err.message.contains("project missing"));
    }
}
