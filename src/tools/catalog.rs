// file: src/tools/catalog.rs
// description: per-platform tool definitions and tool name routing
// reference: https://json-schema.org/understanding-json-schema

use crate::error::{Result, WorklogError};
use crate::models::{Platform, ToolDefinition};
use serde_json::{Value, json};

/// The operation behind a tool name, independent of platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    Commits,
    Projects,
    Project,
    SearchCommits,
}

impl ToolKind {
    pub const ALL: [ToolKind; 4] = [
        ToolKind::Commits,
        ToolKind::Projects,
        ToolKind::Project,
        ToolKind::SearchCommits,
    ];

    /// Platform-neutral name, also used by the MCP server.
    pub fn generic_name(&self) -> &'static str {
        match self {
            ToolKind::Commits => "get_commits",
            ToolKind::Projects => "get_projects",
            ToolKind::Project => "get_project",
            ToolKind::SearchCommits => "search_commits",
        }
    }

    pub fn tool_name(&self, platform: Platform) -> &'static str {
        match (platform, self) {
            (Platform::GitLab, ToolKind::Commits) => "get_gitlab_commits",
            (Platform::GitLab, ToolKind::Projects) => "get_gitlab_projects",
            (Platform::GitLab, ToolKind::Project) => "get_gitlab_project",
            (Platform::GitLab, ToolKind::SearchCommits) => "search_gitlab_commits",
            (Platform::GitHub, ToolKind::Commits) => "get_github_commits",
            (Platform::GitHub, ToolKind::Projects) => "get_github_repositories",
            (Platform::GitHub, ToolKind::Project) => "get_github_repository",
            (Platform::GitHub, ToolKind::SearchCommits) => "search_github_commits",
        }
    }

    fn from_generic(name: &str) -> Option<Self> {
        match name {
            "get_commits" => Some(ToolKind::Commits),
            "get_projects" | "get_repositories" => Some(ToolKind::Projects),
            "get_project" | "get_repository" => Some(ToolKind::Project),
            "search_commits" => Some(ToolKind::SearchCommits),
            _ => None,
        }
    }

    fn from_catalog_name(name: &str) -> Option<(Platform, Self)> {
        Platform::ALL.into_iter().find_map(|platform| {
            ToolKind::ALL
                .into_iter()
                .find(|kind| kind.tool_name(platform) == name)
                .map(|kind| (platform, kind))
        })
    }
}

/// Maps a tool name to its platform and operation.
///
/// `gitlab_`/`github_` prefixes force a platform, catalog names carry their
/// own platform, and generic names fall back to `default_platform`.
pub fn resolve_tool(name: &str, default_platform: Platform) -> Result<(Platform, ToolKind)> {
    for platform in Platform::ALL {
        if let Some(rest) = name.strip_prefix(platform.tool_prefix()) {
            let kind = ToolKind::from_generic(rest)
                .or_else(|| {
                    ToolKind::from_catalog_name(rest)
                        .filter(|(p, _)| *p == platform)
                        .map(|(_, kind)| kind)
                })
                .ok_or_else(|| WorklogError::UnknownTool(name.to_string()))?;
            return Ok((platform, kind));
        }
    }

    if let Some(resolved) = ToolKind::from_catalog_name(name) {
        return Ok(resolved);
    }

    ToolKind::from_generic(name)
        .map(|kind| (default_platform, kind))
        .ok_or_else(|| WorklogError::UnknownTool(name.to_string()))
}

fn date_property(description: &str) -> Value {
    json!({ "type": "string", "description": description })
}

fn definition(name: &str, description: &str, properties: Value, required: &[&str]) -> ToolDefinition {
    ToolDefinition {
        name: name.to_string(),
        description: description.to_string(),
        input_schema: json!({
            "type": "object",
            "properties": properties,
            "required": required,
        }),
    }
}

pub fn tool_catalog(platform: Platform) -> Vec<ToolDefinition> {
    let since = date_property("Start date in ISO format (e.g., 2026-01-01T00:00:00)");
    let until = date_property("End date in ISO format (e.g., 2026-01-31T23:59:59)");
    let branch = json!({ "type": "string", "description": "Branch name (e.g., main, master)" });

    match platform {
        Platform::GitLab => vec![
            definition(
                ToolKind::Commits.tool_name(platform),
                "Get Git commit history from GitLab projects",
                json!({
                    "since_date": since,
                    "until_date": until,
                    "branch": branch,
                    "project_id": { "type": "string", "description": "Specific project ID or path (e.g., group/project)" },
                    "all_branches": { "type": "boolean", "description": "Include commits from every branch" }
                }),
                &[],
            ),
            definition(
                ToolKind::Projects.tool_name(platform),
                "Get list of GitLab projects the user is a member of",
                json!({}),
                &[],
            ),
            definition(
                ToolKind::Project.tool_name(platform),
                "Get details of a specific GitLab project",
                json!({
                    "project_id": { "type": "string", "description": "Project ID or path (e.g., group/project)" }
                }),
                &["project_id"],
            ),
            definition(
                ToolKind::SearchCommits.tool_name(platform),
                "Search GitLab commits by message content",
                json!({
                    "query": { "type": "string", "description": "Search query for commit messages" },
                    "since_date": date_property("Start date in ISO format"),
                    "until_date": date_property("End date in ISO format")
                }),
                &["query"],
            ),
        ],
        Platform::GitHub => vec![
            definition(
                ToolKind::Commits.tool_name(platform),
                "Get Git commit history from GitHub repositories",
                json!({
                    "since_date": since,
                    "until_date": until,
                    "branch": branch,
                    "repo": { "type": "string", "description": "Specific repository name (e.g., username/repo-name)" },
                    "all_branches": { "type": "boolean", "description": "Include commits from every branch" }
                }),
                &[],
            ),
            definition(
                ToolKind::Projects.tool_name(platform),
                "Get list of GitHub repositories for the user",
                json!({}),
                &[],
            ),
            definition(
                ToolKind::Project.tool_name(platform),
                "Get details of a specific GitHub repository",
                json!({
                    "repo": { "type": "string", "description": "Repository name (e.g., username/repo-name)" }
                }),
                &["repo"],
            ),
            definition(
                ToolKind::SearchCommits.tool_name(platform),
                "Search GitHub commits by message content",
                json!({
                    "query": { "type": "string", "description": "Search query for commit messages" },
                    "since_date": date_property("Start date in ISO format"),
                    "until_date": date_property("End date in ISO format")
                }),
                &["query"],
            ),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_gitlab_catalog() {
        let tools = tool_catalog(Platform::GitLab);
        let names: Vec<_> = tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "get_gitlab_commits",
                "get_gitlab_projects",
                "get_gitlab_project",
                "search_gitlab_commits"
            ]
        );

        let search = tools.iter().find(|t| t.name == "search_gitlab_commits").unwrap();
        assert_eq!(search.required_arguments(), vec!["query"]);
        assert_eq!(search.input_schema["type"], "object");
    }

    #[test]
    fn test_catalog_serializes_input_schema_key() {
        let tools = tool_catalog(Platform::GitHub);
        let value = serde_json::to_value(&tools[2]).unwrap();
        assert_eq!(value["name"], "get_github_repository");
        assert_eq!(value["inputSchema"]["required"], json!(["repo"]));
    }

    #[test]
    fn test_resolve_catalog_names() {
        assert_eq!(
            resolve_tool("get_github_repositories", Platform::GitLab).unwrap(),
            (Platform::GitHub, ToolKind::Projects)
        );
        assert_eq!(
            resolve_tool("search_gitlab_commits", Platform::GitHub).unwrap(),
            (Platform::GitLab, ToolKind::SearchCommits)
        );
    }

    #[test]
    fn test_resolve_prefixed_and_generic_names() {
        assert_eq!(
            resolve_tool("github_get_commits", Platform::GitLab).unwrap(),
            (Platform::GitHub, ToolKind::Commits)
        );
        assert_eq!(
            resolve_tool("gitlab_search_commits", Platform::GitHub).unwrap(),
            (Platform::GitLab, ToolKind::SearchCommits)
        );
        assert_eq!(
            resolve_tool("get_projects", Platform::GitHub).unwrap(),
            (Platform::GitHub, ToolKind::Projects)
        );
    }

    #[test]
    fn test_resolve_unknown_tool() {
        let err = resolve_tool("delete_everything", Platform::GitLab).unwrap_err();
        assert!(matches!(err, WorklogError::UnknownTool(_)));
        assert!(resolve_tool("gitlab_get_github_commits", Platform::GitLab).is_err());
    }
}
