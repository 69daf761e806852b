// file: src/git_host/github.rs
// description: GitHub REST v3 client for repositories and commits
// reference: https://docs.github.com/en/rest/commits/commits

use super::http::{ApiClient, Query};
use super::{CommitQuery, DEFAULT_TIMEOUT, GitHost, format_timestamp};
use crate::error::{Result, WorklogError};
use crate::models::{DEFAULT_BRANCH, GitCommit, GitProject, Platform};
use crate::settings::GitHubCredentials;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};
use serde::Deserialize;

const GITHUB_ACCEPT: &str = "application/vnd.github.v3+json";

#[derive(Debug, Deserialize)]
struct RawRepository {
    id: i64,
    name: String,
    full_name: String,
    description: Option<String>,
    html_url: String,
    default_branch: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<RawRepository> for GitProject {
    fn from(raw: RawRepository) -> Self {
        Self {
            id: raw.id,
            name: raw.name,
            path: raw.full_name,
            description: raw.description.filter(|d| !d.is_empty()),
            web_url: raw.html_url,
            default_branch: raw
                .default_branch
                .unwrap_or_else(|| DEFAULT_BRANCH.to_string()),
            created_at: raw.created_at,
            last_activity_at: raw.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawSignature {
    name: String,
    email: String,
    date: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct RawCommitDetail {
    message: String,
    author: RawSignature,
    committer: RawSignature,
}

#[derive(Debug, Deserialize)]
struct RawCommit {
    sha: String,
    html_url: String,
    commit: RawCommitDetail,
}

#[derive(Debug, Deserialize)]
struct RawBranch {
    name: String,
}

pub struct GitHubClient {
    api: ApiClient,
    username: String,
}

impl GitHubClient {
    pub fn new(credentials: &GitHubCredentials) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("Bearer {}", credentials.token))
            .map_err(|_| WorklogError::Config("github_token contains invalid characters".to_string()))?;
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_ACCEPT));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("worklog-assistant/", env!("CARGO_PKG_VERSION"))),
        );

        let api = ApiClient::new("GitHub", &credentials.api_url, headers, DEFAULT_TIMEOUT)?;
        Ok(Self {
            api,
            username: credentials.username.clone(),
        })
    }

    /// Bare repository names are resolved against the configured user.
    fn full_name(&self, project_id: &str) -> String {
        if project_id.contains('/') {
            project_id.to_string()
        } else {
            format!("{}/{}", self.username, project_id)
        }
    }

    fn to_commit(raw: RawCommit, project: &GitProject, branch: &str) -> GitCommit {
        GitCommit {
            short_id: GitCommit::short_sha(&raw.sha),
            title: GitCommit::title_from_message(&raw.commit.message),
            id: raw.sha,
            message: raw.commit.message,
            author_name: raw.commit.author.name,
            author_email: raw.commit.author.email,
            authored_date: raw.commit.author.date,
            committed_date: raw.commit.committer.date,
            web_url: raw.html_url,
            project_id: Some(project.id),
            project_name: Some(project.name.clone()),
            branch: Some(branch.to_string()),
        }
    }
}

#[async_trait]
impl GitHost for GitHubClient {
    fn platform(&self) -> Platform {
        Platform::GitHub
    }

    async fn get_projects(&self) -> Result<Vec<GitProject>> {
        let query: Query = vec![
            ("type", "all".to_string()),
            ("sort", "updated".to_string()),
        ];
        let path = format!("users/{}/repos", self.username);
        let raw: Vec<RawRepository> = self.api.get_paginated(&path, &query).await?;
        Ok(raw.into_iter().map(GitProject::from).collect())
    }

    async fn get_project(&self, project_id: &str) -> Result<Option<GitProject>> {
        let path = format!("repos/{}", self.full_name(project_id));
        let raw: Option<RawRepository> = self.api.get_optional(&path, &[]).await?;
        Ok(raw.map(GitProject::from))
    }

    async fn get_branches(&self, project: &GitProject) -> Result<Vec<String>> {
        let path = format!("repos/{}/branches", project.path);
        let raw: Vec<RawBranch> = self.api.get_paginated(&path, &[]).await?;
        Ok(raw.into_iter().map(|b| b.name).collect())
    }

    async fn get_branch_commits(
        &self,
        project: &GitProject,
        branch: Option<&str>,
        query: &CommitQuery,
    ) -> Result<Vec<GitCommit>> {
        let mut params: Query = Vec::new();
        if let Some(branch) = branch {
            params.push(("sha", branch.to_string()));
        }
        if let Some(since) = &query.since {
            params.push(("since", format_timestamp(since)));
        }
        if let Some(until) = &query.until {
            params.push(("until", format_timestamp(until)));
        }

        let path = format!("repos/{}/commits", project.path);
        let raw: Vec<RawCommit> = self.api.get_paginated(&path, &params).await?;

        let branch = branch.unwrap_or(project.default_branch.as_str());
        Ok(raw
            .into_iter()
            .map(|c| Self::to_commit(c, project, branch))
            .collect())
    }
}
