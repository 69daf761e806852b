// file: src/git_host/mod.rs
// description: Git hosting client trait, commit queries, and platform factory
// reference: https://docs.rs/async-trait

pub mod github;
pub mod gitlab;
pub mod http;

pub use github::GitHubClient;
pub use gitlab::GitLabClient;

use crate::error::{Result, WorklogError};
use crate::models::{GitCommit, GitProject, Platform, sort_by_commit_time};
use crate::settings::UserSettings;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use futures::stream::{self, StreamExt};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Projects fetched at the same time during a multi-project commit scan.
pub const PROJECT_CONCURRENCY: usize = 4;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommitQuery {
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub branch: Option<String>,
    pub project_id: Option<String>,
    /// Walk every branch and deduplicate by commit id.
    pub all_branches: bool,
}

impl CommitQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    pub fn until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }

    pub fn branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }

    pub fn project(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        if let (Some(since), Some(until)) = (self.since, self.until) {
            if since > until {
                return Err(WorklogError::Validation(
                    "since_date must be before or equal to until_date".to_string(),
                ));
            }
        }
        Ok(())
    }
}

pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Read-only access to one hosting platform.
#[async_trait]
pub trait GitHost: Send + Sync {
    fn platform(&self) -> Platform;

    async fn get_projects(&self) -> Result<Vec<GitProject>>;

    /// `None` when the project does not exist.
    async fn get_project(&self, project_id: &str) -> Result<Option<GitProject>>;

    async fn get_branches(&self, project: &GitProject) -> Result<Vec<String>>;

    /// Commits of one project on one branch (or the default branch).
    async fn get_branch_commits(
        &self,
        project: &GitProject,
        branch: Option<&str>,
        query: &CommitQuery,
    ) -> Result<Vec<GitCommit>>;

    /// Commits of every branch when `query.all_branches` is set, deduplicated
    /// by id; otherwise the requested or default branch only.
    async fn get_project_commits(
        &self,
        project: &GitProject,
        query: &CommitQuery,
    ) -> Result<Vec<GitCommit>> {
        if !query.all_branches || query.branch.is_some() {
            return self
                .get_branch_commits(project, query.branch.as_deref(), query)
                .await;
        }

        let mut seen = HashSet::new();
        let mut commits = Vec::new();
        for branch in self.get_branches(project).await? {
            let branch_commits = self.get_branch_commits(project, Some(&branch), query).await?;
            commits.extend(
                branch_commits
                    .into_iter()
                    .filter(|c| seen.insert(c.id.clone())),
            );
        }
        Ok(commits)
    }

    async fn get_commits(&self, query: &CommitQuery) -> Result<Vec<GitCommit>> {
        query.validate()?;

        let platform = self.platform();
        let projects = match &query.project_id {
            Some(project_id) => match self.get_project(project_id).await {
                Ok(Some(project)) => vec![project],
                Ok(None) => {
                    warn!("{} project {} not found", platform.display_name(), project_id);
                    return Ok(Vec::new());
                }
                Err(e) => {
                    return Err(WorklogError::remote(
                        platform.display_name(),
                        format!("Failed to fetch commits: {}", e),
                    ));
                }
            },
            None => self.get_projects().await.map_err(|e| {
                WorklogError::remote(
                    platform.display_name(),
                    format!("Failed to fetch commits: {}", e),
                )
            })?,
        };

        let commits = collect_commits(self, &projects, query).await;
        info!(
            "Retrieved {} commits from {} across {} projects",
            commits.len(),
            platform.display_name(),
            projects.len()
        );
        Ok(commits)
    }
}

impl std::fmt::Debug for dyn GitHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHost")
            .field("platform", &self.platform())
            .finish()
    }
}

/// Fetches commits of every project; a failing project is logged and skipped.
/// The result is sorted newest first.
pub async fn collect_commits<H>(
    host: &H,
    projects: &[GitProject],
    query: &CommitQuery,
) -> Vec<GitCommit>
where
    H: GitHost + ?Sized,
{
    let fetches: Vec<_> = projects
        .iter()
        .map(|project| fetch_project_commits(host, project, query))
        .collect();
    let results = stream::iter(fetches)
    .buffer_unordered(PROJECT_CONCURRENCY)
    .collect::<Vec<_>>()
    .await;

    let mut all_commits = Vec::new();
    for (project, result) in results {
        match result {
            Ok(commits) => all_commits.extend(commits),
            Err(e) => {
                warn!(
                    "Failed to fetch commits from project {}: {}",
                    project.name, e
                );
            }
        }
    }

    sort_by_commit_time(&mut all_commits);
    all_commits
}

async fn fetch_project_commits<'a, H>(
    host: &'a H,
    project: &'a GitProject,
    query: &'a CommitQuery,
) -> (&'a GitProject, Result<Vec<GitCommit>>)
where
    H: GitHost + ?Sized,
{
    (project, host.get_project_commits(project, query).await)
}

pub fn create_host(platform: Platform, settings: &UserSettings) -> Result<Arc<dyn GitHost>> {
    match platform {
        Platform::GitLab => {
            let credentials = settings.gitlab.as_ref().ok_or_else(|| {
                WorklogError::Config(
                    "GitLab configuration is incomplete. Please provide gitlab_url and gitlab_token."
                        .to_string(),
                )
            })?;
            info!("Creating GitLab client for {}", credentials.url);
            Ok(Arc::new(GitLabClient::new(credentials)?))
        }
        Platform::GitHub => {
            let credentials = settings.github.as_ref().ok_or_else(|| {
                WorklogError::Config(
                    "GitHub configuration is incomplete. Please provide github_username and github_token."
                        .to_string(),
                )
            })?;
            info!("Creating GitHub client for {}", credentials.username);
            Ok(Arc::new(GitHubClient::new(credentials)?))
        }
    }
}

/// One client per configured platform; fails when none is configured.
pub fn create_all_hosts(settings: &UserSettings) -> Result<HashMap<Platform, Arc<dyn GitHost>>> {
    let mut hosts = HashMap::new();

    for platform in Platform::ALL {
        match create_host(platform, settings) {
            Ok(host) => {
                hosts.insert(platform, host);
            }
            Err(e) => warn!("Cannot create {} client: {}", platform.display_name(), e),
        }
    }

    if hosts.is_empty() {
        return Err(WorklogError::Config(
            "No valid platform configuration found. Please configure at least one platform."
                .to_string(),
        ));
    }

    Ok(hosts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::GitLabCredentials;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn ts(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, day, hour, 0, 0).unwrap()
    }

    fn project(id: i64) -> GitProject {
        GitProject {
            id,
            name: format!("project-{}", id),
            path: format!("team/project-{}", id),
            description: None,
            web_url: format!("https://gitlab.example.com/team/project-{}", id),
            default_branch: "main".to_string(),
            created_at: ts(1, 0),
            last_activity_at: ts(1, 0),
        }
    }

    fn commit(id: &str, project: &GitProject, when: DateTime<Utc>) -> GitCommit {
        GitCommit {
            id: id.to_string(),
            short_id: GitCommit::short_sha(id),
            title: format!("commit {}", id),
            message: format!("commit {}", id),
            author_name: "dev".to_string(),
            author_email: "dev@example.com".to_string(),
            authored_date: when,
            committed_date: when,
            web_url: format!("{}/-/commit/{}", project.web_url, id),
            project_id: Some(project.id),
            project_name: Some(project.name.clone()),
            branch: Some("main".to_string()),
        }
    }

    /// Project 2 always fails; branches "main" and "dev" share commit "shared".
    struct FakeHost {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl GitHost for FakeHost {
        fn platform(&self) -> Platform {
            Platform::GitLab
        }

        async fn get_projects(&self) -> Result<Vec<GitProject>> {
            Ok(vec![project(1), project(2), project(3)])
        }

        async fn get_project(&self, project_id: &str) -> Result<Option<GitProject>> {
            match project_id {
                "1" => Ok(Some(project(1))),
                "missing" => Ok(None),
                _ => Err(WorklogError::remote("GitLab", "status 500")),
            }
        }

        async fn get_branches(&self, _project: &GitProject) -> Result<Vec<String>> {
            Ok(vec!["main".to_string(), "dev".to_string()])
        }

        async fn get_branch_commits(
            &self,
            project: &GitProject,
            branch: Option<&str>,
            _query: &CommitQuery,
        ) -> Result<Vec<GitCommit>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match (project.id, branch) {
                (2, _) => Err(WorklogError::remote("GitLab", "status 502")),
                (1, Some("dev")) => Ok(vec![
                    commit("shared", project, ts(3, 9)),
                    commit("dev-only", project, ts(4, 9)),
                ]),
                (1, _) => Ok(vec![
                    commit("p1-a", project, ts(2, 10)),
                    commit("shared", project, ts(3, 9)),
                ]),
                (3, _) => Ok(vec![commit("p3-a", project, ts(5, 8))]),
                _ => Ok(Vec::new()),
            }
        }
    }

    fn fake() -> FakeHost {
        FakeHost {
            calls: AtomicUsize::new(0),
        }
    }

    #[test]
    fn test_query_validation() {
        assert!(CommitQuery::new().since(ts(1, 0)).until(ts(2, 0)).validate().is_ok());
        assert!(CommitQuery::new().since(ts(2, 0)).until(ts(2, 0)).validate().is_ok());
        let err = CommitQuery::new().since(ts(3, 0)).until(ts(2, 0)).validate().unwrap_err();
        assert!(matches!(err, WorklogError::Validation(_)));
    }

    #[tokio::test]
    async fn test_failing_project_is_skipped() {
        let host = fake();
        let commits = host.get_commits(&CommitQuery::new()).await.unwrap();
        let ids: Vec<_> = commits.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["p3-a", "shared", "p1-a"]);
        assert!(commits.iter().all(|c| c.project_id != Some(2)));
    }

    #[tokio::test]
    async fn test_inverted_window_makes_no_calls() {
        let host = fake();
        let query = CommitQuery::new().since(ts(5, 0)).until(ts(1, 0));
        assert!(host.get_commits(&query).await.is_err());
        assert_eq!(host.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_all_branches_deduplicates() {
        let host = fake();
        let mut query = CommitQuery::new().project("1");
        query.all_branches = true;
        let commits = host.get_commits(&query).await.unwrap();
        let ids: Vec<_> = commits.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["dev-only", "shared", "p1-a"]);
    }

    #[tokio::test]
    async fn test_single_project_failure_is_fatal() {
        let host = fake();
        let err = host
            .get_commits(&CommitQuery::new().project("broken"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Failed to fetch commits"));
    }

    #[tokio::test]
    async fn test_missing_project_yields_empty() {
        let host = fake();
        let commits = host
            .get_commits(&CommitQuery::new().project("missing"))
            .await
            .unwrap();
        assert!(commits.is_empty());
    }

    #[test]
    fn test_create_all_hosts_requires_one_platform() {
        let settings = UserSettings::new(Platform::GitLab);
        assert!(create_all_hosts(&settings).unwrap_err().is_config());

        let settings = settings.with_gitlab(
            GitLabCredentials::new("https://gitlab.example.com", "glpat-x").unwrap(),
        );
        let hosts = create_all_hosts(&settings).unwrap();
        assert_eq!(hosts.len(), 1);
        assert!(hosts.contains_key(&Platform::GitLab));
        assert!(create_host(Platform::GitHub, &settings).is_err());
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(&ts(1, 0)), "2026-01-01T00:00:00Z");
    }
}
