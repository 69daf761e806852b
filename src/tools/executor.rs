// file: src/tools/executor.rs
// description: routes tool calls to Git hosting clients and shapes JSON results
// reference: https://docs.rs/async-trait

use super::catalog::{ToolKind, resolve_tool, tool_catalog};
use crate::error::{Result, WorklogError};
use crate::git_host::{CommitQuery, GitHost, create_all_hosts};
use crate::models::{GitCommit, GitProject, Platform, ToolDefinition};
use crate::settings::UserSettings;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde_json::{Map, Value, json};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info};

/// A tool argument after date preprocessing.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    Timestamp(DateTime<Utc>),
    Raw(Value),
}

/// Parses RFC 3339, naive `YYYY-MM-DDTHH:MM:SS[.f]` (as UTC), or a bare
/// `YYYY-MM-DD` (midnight UTC).
pub fn parse_iso_datetime(input: &str) -> Option<DateTime<Utc>> {
    let input = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(input, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(input, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolArguments {
    values: HashMap<String, ArgValue>,
}

impl ToolArguments {
    /// Keys ending in `_date` holding strings become timestamps when they
    /// parse; anything else is kept verbatim. Never fails.
    pub fn preprocess(arguments: &Map<String, Value>) -> Self {
        let values = arguments
            .iter()
            .map(|(key, value)| {
                let arg = match value {
                    Value::String(s) if key.ends_with("_date") => match parse_iso_datetime(s) {
                        Some(ts) => ArgValue::Timestamp(ts),
                        None => {
                            debug!("Argument {} is not an ISO date, keeping raw value", key);
                            ArgValue::Raw(value.clone())
                        }
                    },
                    _ => ArgValue::Raw(value.clone()),
                };
                (key.clone(), arg)
            })
            .collect();

        Self { values }
    }

    pub fn get(&self, key: &str) -> Option<&ArgValue> {
        self.values.get(key)
    }

    /// String or numeric argument as text; empty strings count as absent.
    pub fn text(&self, key: &str) -> Option<String> {
        match self.values.get(key)? {
            ArgValue::Raw(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
            ArgValue::Raw(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn flag(&self, key: &str) -> bool {
        matches!(self.values.get(key), Some(ArgValue::Raw(Value::Bool(true))))
    }

    /// A date argument that failed preprocessing is a parse error here;
    /// blank strings count as absent.
    pub fn timestamp(&self, key: &str) -> Result<Option<DateTime<Utc>>> {
        match self.values.get(key) {
            Some(ArgValue::Timestamp(ts)) => Ok(Some(*ts)),
            Some(ArgValue::Raw(Value::Null)) | None => Ok(None),
            Some(ArgValue::Raw(Value::String(s))) if s.trim().is_empty() => Ok(None),
            Some(ArgValue::Raw(other)) => Err(WorklogError::Parse(format!(
                "{} is not a valid ISO 8601 date: {}",
                key, other
            ))),
        }
    }

    fn project(&self) -> Option<String> {
        self.text("project_id").or_else(|| self.text("repo"))
    }

    fn commit_query(&self) -> Result<CommitQuery> {
        Ok(CommitQuery {
            since: self.timestamp("since_date")?,
            until: self.timestamp("until_date")?,
            branch: self.text("branch"),
            project_id: self.project(),
            all_branches: self.flag("all_branches"),
        })
    }
}

fn timestamp_json(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn commit_json(commit: &GitCommit) -> Value {
    json!({
        "id": commit.id,
        "short_id": commit.short_id,
        "title": commit.title,
        "message": commit.message,
        "author_name": commit.author_name,
        "authored_date": timestamp_json(&commit.authored_date),
        "web_url": commit.web_url,
        "project_name": commit.project_name,
        "branch": commit.branch,
    })
}

fn project_summary_json(project: &GitProject) -> Value {
    json!({
        "id": project.id,
        "name": project.name,
        "path": project.path,
        "description": project.description,
        "web_url": project.web_url,
        "default_branch": project.default_branch,
        "last_activity_at": timestamp_json(&project.last_activity_at),
    })
}

fn project_detail_json(project: &GitProject) -> Value {
    let mut value = project_summary_json(project);
    value["created_at"] = json!(timestamp_json(&project.created_at));
    value
}

/// Executes named tools against Git hosting platforms.
#[async_trait]
pub trait ToolExecution: Send + Sync {
    async fn execute(&self, name: &str, arguments: &Map<String, Value>) -> Result<Value>;

    fn available_tools(&self) -> Vec<ToolDefinition>;
}

pub struct ToolExecutor {
    hosts: HashMap<Platform, Arc<dyn GitHost>>,
    default_platform: Platform,
}

impl ToolExecutor {
    pub fn new(hosts: HashMap<Platform, Arc<dyn GitHost>>, default_platform: Platform) -> Self {
        Self {
            hosts,
            default_platform,
        }
    }

    pub fn from_settings(settings: &UserSettings) -> Result<Self> {
        let hosts = create_all_hosts(settings)?;
        Ok(Self::new(hosts, settings.default_platform))
    }

    pub fn default_platform(&self) -> Platform {
        self.default_platform
    }

    pub fn platforms(&self) -> Vec<Platform> {
        Platform::ALL
            .into_iter()
            .filter(|p| self.hosts.contains_key(p))
            .collect()
    }

    fn host(&self, platform: Platform) -> Result<&Arc<dyn GitHost>> {
        self.hosts.get(&platform).ok_or_else(|| {
            WorklogError::Config(format!(
                "{} is not configured for this user",
                platform.display_name()
            ))
        })
    }

    async fn get_commits(&self, host: &dyn GitHost, args: &ToolArguments) -> Result<Value> {
        let query = args.commit_query()?;
        let commits = host.get_commits(&query).await?;

        Ok(json!({
            "count": commits.len(),
            "commits": commits.iter().map(commit_json).collect::<Vec<_>>(),
        }))
    }

    async fn get_projects(&self, host: &dyn GitHost) -> Result<Value> {
        let projects = host.get_projects().await?;
        let key = match host.platform() {
            Platform::GitLab => "projects",
            Platform::GitHub => "repositories",
        };

        let mut result = Map::new();
        result.insert("count".to_string(), json!(projects.len()));
        result.insert(
            key.to_string(),
            Value::Array(projects.iter().map(project_summary_json).collect()),
        );
        Ok(Value::Object(result))
    }

    async fn get_project(&self, host: &dyn GitHost, args: &ToolArguments) -> Result<Value> {
        let project_id = args.project().ok_or_else(|| {
            WorklogError::Validation(match host.platform() {
                Platform::GitLab => "project_id is required".to_string(),
                Platform::GitHub => "repo is required".to_string(),
            })
        })?;

        match host.get_project(&project_id).await? {
            Some(project) => Ok(project_detail_json(&project)),
            None => Err(WorklogError::NotFound(format!(
                "{} project {}",
                host.platform().display_name(),
                project_id
            ))),
        }
    }

    async fn search_commits(&self, host: &dyn GitHost, args: &ToolArguments) -> Result<Value> {
        let query = args
            .text("query")
            .map(|q| q.to_lowercase())
            .ok_or_else(|| WorklogError::Validation("query is required".to_string()))?;

        let commits = host.get_commits(&args.commit_query()?).await?;

        let matching: Vec<Value> = commits
            .iter()
            .filter(|c| c.matches(&query))
            .map(commit_json)
            .collect();
        info!("Found {} commits matching '{}'", matching.len(), query);

        Ok(json!({
            "query": query,
            "count": matching.len(),
            "commits": matching,
        }))
    }
}

#[async_trait]
impl ToolExecution for ToolExecutor {
    async fn execute(&self, name: &str, arguments: &Map<String, Value>) -> Result<Value> {
        let (platform, kind) = resolve_tool(name, self.default_platform)?;
        let host = self.host(platform)?;
        let args = ToolArguments::preprocess(arguments);

        info!("Executing tool {} on {}", name, platform.display_name());

        let result = match kind {
            ToolKind::Commits => self.get_commits(host.as_ref(), &args).await,
            ToolKind::Projects => self.get_projects(host.as_ref()).await,
            ToolKind::Project => self.get_project(host.as_ref(), &args).await,
            ToolKind::SearchCommits => self.search_commits(host.as_ref(), &args).await,
        };

        if let Err(e) = &result {
            error!("Tool {} failed: {}", name, e);
        }
        result
    }

    fn available_tools(&self) -> Vec<ToolDefinition> {
        self.platforms()
            .into_iter()
            .flat_map(tool_catalog)
            .collect()
    }
}
