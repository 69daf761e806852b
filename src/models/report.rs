// file: src/models/report.rs
// description: work-log report model grouped by day
// reference: internal data structures

use super::commit::GitCommit;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskType {
    Development,
    Testing,
    Documentation,
    Meeting,
    Review,
    Refactoring,
    Bugfix,
    Other,
}

impl TaskType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::Development => "development",
            TaskType::Testing => "testing",
            TaskType::Documentation => "documentation",
            TaskType::Meeting => "meeting",
            TaskType::Review => "review",
            TaskType::Refactoring => "refactoring",
            TaskType::Bugfix => "bugfix",
            TaskType::Other => "other",
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkLogEntry {
    pub date: NaiveDate,
    pub commits: Vec<GitCommit>,
    pub projects: Vec<String>,
    pub summary: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkLogReport {
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    /// Newest day first.
    pub entries: Vec<WorkLogEntry>,
    pub total_commits: usize,
    pub projects: Vec<String>,
    pub summary: Option<String>,
}

impl WorkLogReport {
    pub fn working_days(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total_commits == 0
    }
}
