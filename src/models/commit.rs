// file: src/models/commit.rs
// description: normalized commit and project records shared by both hosts
// reference: internal data structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GitCommit {
    pub id: String,
    pub short_id: String,
    pub title: String,
    pub message: String,
    pub author_name: String,
    pub author_email: String,
    pub authored_date: DateTime<Utc>,
    pub committed_date: DateTime<Utc>,
    pub web_url: String,
    pub project_id: Option<i64>,
    pub project_name: Option<String>,
    pub branch: Option<String>,
}

impl GitCommit {
    /// First line of a commit message.
    pub fn title_from_message(message: &str) -> String {
        message.lines().next().unwrap_or_default().trim().to_string()
    }

    pub fn short_sha(sha: &str) -> String {
        sha.chars().take(7).collect()
    }

    pub fn matches(&self, needle_lowercase: &str) -> bool {
        self.title.to_lowercase().contains(needle_lowercase)
            || self.message.to_lowercase().contains(needle_lowercase)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GitProject {
    pub id: i64,
    pub name: String,
    /// `namespace/name` on GitLab, `owner/repo` on GitHub.
    pub path: String,
    pub description: Option<String>,
    pub web_url: String,
    pub default_branch: String,
    pub created_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
}

pub const DEFAULT_BRANCH: &str = "main";

/// Newest first.
pub fn sort_by_commit_time(commits: &mut [GitCommit]) {
    commits.sort_by(|a, b| b.committed_date.cmp(&a.committed_date));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn commit(id: &str, hour: u32) -> GitCommit {
        let ts = Utc.with_ymd_and_hms(2026, 1, 5, hour, 0, 0).unwrap();
        GitCommit {
            id: id.to_string(),
            short_id: GitCommit::short_sha(id),
            title: "feat: add login".to_string(),
            message: "feat: add login\n\nWith OAuth support".to_string(),
            author_name: "dev".to_string(),
            author_email: "dev@example.com".to_string(),
            authored_date: ts,
            committed_date: ts,
            web_url: format!("https://example.com/commit/{}", id),
            project_id: Some(1),
            project_name: Some("api".to_string()),
            branch: Some("main".to_string()),
        }
    }

    #[test]
    fn test_title_from_message() {
        assert_eq!(GitCommit::title_from_message("fix: bug\n\nbody"), "fix: bug");
        assert_eq!(GitCommit::title_from_message(""), "");
    }

    #[test]
    fn test_short_sha() {
        assert_eq!(GitCommit::short_sha("0123456789abcdef"), "0123456");
        assert_eq!(GitCommit::short_sha("abc"), "abc");
    }

    #[test]
    fn test_matches_is_case_insensitive() {
        let c = commit("aaaaaaaaaa", 9);
        assert!(c.matches("oauth"));
        assert!(c.matches("login"));
        assert!(!c.matches("logout"));
    }

    #[test]
    fn test_sort_newest_first() {
        let mut commits = vec![commit("a", 8), commit("b", 12), commit("c", 10)];
        sort_by_commit_time(&mut commits);
        let ids: Vec<_> = commits.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
    }
}
