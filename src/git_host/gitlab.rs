// file: src/git_host/gitlab.rs
// description: GitLab REST v4 client for projects and commits
// reference: https://docs.gitlab.com/ee/api/commits.html

use super::http::{ApiClient, Query};
use super::{CommitQuery, DEFAULT_TIMEOUT, GitHost, format_timestamp};
use crate::error::{Result, WorklogError};
use crate::models::{DEFAULT_BRANCH, GitCommit, GitProject, Platform};
use crate::settings::GitLabCredentials;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue};
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct RawProject {
    id: i64,
    name: String,
    path_with_namespace: String,
    description: Option<String>,
    web_url: String,
    default_branch: Option<String>,
    created_at: DateTime<Utc>,
    last_activity_at: DateTime<Utc>,
}

impl From<RawProject> for GitProject {
    fn from(raw: RawProject) -> Self {
        Self {
            id: raw.id,
            name: raw.name,
            path: raw.path_with_namespace,
            description: raw.description.filter(|d| !d.is_empty()),
            web_url: raw.web_url,
            default_branch: raw
                .default_branch
                .unwrap_or_else(|| DEFAULT_BRANCH.to_string()),
            created_at: raw.created_at,
            last_activity_at: raw.last_activity_at,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawCommit {
    id: String,
    short_id: Option<String>,
    title: Option<String>,
    message: String,
    author_name: String,
    author_email: String,
    authored_date: DateTime<Utc>,
    committed_date: DateTime<Utc>,
    web_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawBranch {
    name: String,
}

pub struct GitLabClient {
    api: ApiClient,
}

impl GitLabClient {
    pub fn new(credentials: &GitLabCredentials) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let token = HeaderValue::from_str(&credentials.token)
            .map_err(|_| WorklogError::Config("gitlab_token contains invalid characters".to_string()))?;
        headers.insert("PRIVATE-TOKEN", token);

        let base_url = format!("{}/api/v4", credentials.url);
        let api = ApiClient::new("GitLab", &base_url, headers, DEFAULT_TIMEOUT)?;
        Ok(Self { api })
    }

    fn to_commit(raw: RawCommit, project: &GitProject, branch: &str) -> GitCommit {
        let title = raw
            .title
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| GitCommit::title_from_message(&raw.message));
        let web_url = raw
            .web_url
            .unwrap_or_else(|| format!("{}/-/commit/{}", project.web_url, raw.id));

        GitCommit {
            short_id: raw.short_id.unwrap_or_else(|| GitCommit::short_sha(&raw.id)),
            id: raw.id,
            title,
            message: raw.message,
            author_name: raw.author_name,
            author_email: raw.author_email,
            authored_date: raw.authored_date,
            committed_date: raw.committed_date,
            web_url,
            project_id: Some(project.id),
            project_name: Some(project.name.clone()),
            branch: Some(branch.to_string()),
        }
    }
}

#[async_trait]
impl GitHost for GitLabClient {
    fn platform(&self) -> Platform {
        Platform::GitLab
    }

    async fn get_projects(&self) -> Result<Vec<GitProject>> {
        let query: Query = vec![
            ("membership", "true".to_string()),
            ("order_by", "last_activity_at".to_string()),
            ("sort", "desc".to_string()),
        ];
        let raw: Vec<RawProject> = self.api.get_paginated("projects", &query).await?;
        debug!("GitLab returned {} projects", raw.len());
        Ok(raw.into_iter().map(GitProject::from).collect())
    }

    async fn get_project(&self, project_id: &str) -> Result<Option<GitProject>> {
        let path = format!("projects/{}", urlencoding::encode(project_id));
        let raw: Option<RawProject> = self.api.get_optional(&path, &[]).await?;
        Ok(raw.map(GitProject::from))
    }

    async fn get_branches(&self, project: &GitProject) -> Result<Vec<String>> {
        let path = format!("projects/{}/repository/branches", project.id);
        let raw: Vec<RawBranch> = self.api.get_paginated(&path, &[]).await?;
        Ok(raw.into_iter().map(|b| b.name).collect())
    }

    async fn get_branch_commits(
        &self,
        project: &GitProject,
        branch: Option<&str>,
        query: &CommitQuery,
    ) -> Result<Vec<GitCommit>> {
        let branch = branch.unwrap_or(project.default_branch.as_str());
        let mut params: Query = vec![("ref_name", branch.to_string())];
        if let Some(since) = &query.since {
            params.push(("since", format_timestamp(since)));
        }
        if let Some(until) = &query.until {
            params.push(("until", format_timestamp(until)));
        }

        let path = format!("projects/{}/repository/commits", project.id);
        let raw: Vec<RawCommit> = self.api.get_paginated(&path, &params).await?;

        Ok(raw
            .into_iter()
            .map(|c| Self::to_commit(c, project, branch))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn project() -> GitProject {
        let raw: RawProject = serde_json::from_value(serde_json::json!({
            "id": 42,
            "name": "api",
            "path_with_namespace": "team/api",
            "description": "",
            "web_url": "https://gitlab.example.com/team/api",
            "default_branch": null,
            "created_at": "2025-12-01T08:00:00.000Z",
            "last_activity_at": "2026-01-05T10:00:00.000+08:00"
        }))
        .unwrap();
        raw.into()
    }

    #[test]
    fn test_project_defaults() {
        let p = project();
        assert_eq!(p.path, "team/api");
        assert_eq!(p.default_branch, "main");
        assert_eq!(p.description, None);
        assert_eq!(p.last_activity_at.to_rfc3339(), "2026-01-05T02:00:00+00:00");
    }

    #[test]
    fn test_commit_fallbacks() {
        let raw: RawCommit = serde_json::from_value(serde_json::json!({
            "id": "0123456789abcdef",
            "message": "fix: null check\n\ndetails",
            "author_name": "Dev",
            "author_email": "dev@example.com",
            "authored_date": "2026-01-05T09:00:00Z",
            "committed_date": "2026-01-05T09:30:00Z"
        }))
        .unwrap();

        let commit = GitLabClient::to_commit(raw, &project(), "main");
        assert_eq!(commit.short_id, "0123456");
        assert_eq!(commit.title, "fix: null check");
        assert_eq!(
            commit.web_url,
            "https://gitlab.example.com/team/api/-/commit/0123456789abcdef"
        );
        assert_eq!(commit.project_name.as_deref(), Some("api"));
        assert_eq!(commit.branch.as_deref(), Some("main"));
    }
}
