// file: src/report/mod.rs
// description: groups commits into daily work-log entries and classifies tasks
// reference: internal module structure

pub mod markdown;

pub use markdown::{
    attachment_filename, format_markdown, looks_like_worklog, parse_date_range, strip_commit_prefix,
};

use crate::models::{GitCommit, TaskType, WorkLogEntry, WorkLogReport};
use crate::timerange::DateRange;
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet, HashMap};

const KEYWORDS: &[(TaskType, &[&str])] = &[
    (TaskType::Bugfix, &["fix", "bug", "修复", "错误"]),
    (TaskType::Documentation, &["doc", "readme", "文档", "说明"]),
    (TaskType::Testing, &["test", "spec", "测试"]),
    (TaskType::Refactoring, &["refactor", "重构", "优化"]),
    (TaskType::Review, &["review", "merge", "合并"]),
    (TaskType::Other, &["config", "setting", "配置", "设置"]),
];

/// First matching keyword group wins; anything else is development.
pub fn classify_task(commit: &GitCommit) -> TaskType {
    let title = commit.title.to_lowercase();
    let message = commit.message.to_lowercase();

    KEYWORDS
        .iter()
        .find(|(_, words)| words.iter().any(|w| title.contains(w) || message.contains(w)))
        .map(|(task, _)| *task)
        .unwrap_or(TaskType::Development)
}

/// Task counts, most frequent first, e.g. "bugfix 2, development 1".
pub fn task_summary(commits: &[GitCommit]) -> String {
    if commits.is_empty() {
        return "No commits".to_string();
    }

    let mut counts: HashMap<TaskType, usize> = HashMap::new();
    for commit in commits {
        *counts.entry(classify_task(commit)).or_default() += 1;
    }

    let mut counts: Vec<_> = counts.into_iter().collect();
    counts.sort_by(|(a_task, a), (b_task, b)| b.cmp(a).then(a_task.cmp(b_task)));

    counts
        .iter()
        .map(|(task, count)| format!("{} {}", task, count))
        .collect::<Vec<_>>()
        .join(", ")
}

fn unique_projects<'a>(commits: impl IntoIterator<Item = &'a GitCommit>) -> Vec<String> {
    commits
        .into_iter()
        .filter_map(|c| c.project_name.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Groups commits by UTC commit day, newest day first.
pub fn generate_report(commits: &[GitCommit], range: &DateRange) -> WorkLogReport {
    let mut by_day: BTreeMap<NaiveDate, Vec<GitCommit>> = BTreeMap::new();
    for commit in commits {
        by_day
            .entry(commit.committed_date.date_naive())
            .or_default()
            .push(commit.clone());
    }

    let entries = by_day
        .into_iter()
        .rev()
        .map(|(date, day_commits)| WorkLogEntry {
            date,
            projects: unique_projects(&day_commits),
            summary: Some(task_summary(&day_commits)),
            commits: day_commits,
        })
        .collect();

    WorkLogReport {
        start_date: range.start,
        end_date: range.end,
        entries,
        total_commits: commits.len(),
        projects: unique_projects(commits),
        summary: (!commits.is_empty()).then(|| task_summary(commits)),
    }
}

/// Plain-text totals per project.
pub fn simple_summary(commits: &[GitCommit]) -> String {
    if commits.is_empty() {
        return "No commits found".to_string();
    }

    let mut per_project: HashMap<&str, usize> = HashMap::new();
    for commit in commits {
        if let Some(name) = commit.project_name.as_deref() {
            *per_project.entry(name).or_default() += 1;
        }
    }

    let mut lines = vec![format!("{} commits in total", commits.len())];
    if !per_project.is_empty() {
        let mut per_project: Vec<_> = per_project.into_iter().collect();
        per_project.sort_by(|(a_name, a), (b_name, b)| b.cmp(a).then(a_name.cmp(b_name)));

        lines.push(String::new());
        lines.push("By project:".to_string());
        lines.extend(
            per_project
                .into_iter()
                .map(|(name, count)| format!("  - {}: {}", name, count)),
        );
    }

    lines.join("\n")
}
