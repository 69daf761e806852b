// file: src/report/markdown.rs
// description: Markdown rendering of work-log reports and date range parse-back
// reference: https://commonmark.org

use crate::models::{GitCommit, WorkLogReport};
use crate::timerange::DateRange;
use chrono::{Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use lazy_static::lazy_static;
use regex::Regex;

pub const TITLE_PREFIX: &str = "# Work Log";
pub const DAY_HEADING: &str = "## 📅";

const MAX_LISTED_PROJECTS: usize = 5;

lazy_static! {
    static ref COMMIT_PREFIX: Regex =
        Regex::new(r"(?i)^(feat|fix|docs|style|refactor|test|chore)(\([^)]*\))?!?:\s*")
            .expect("COMMIT_PREFIX regex is valid");
    static ref TITLE_RANGE: Regex =
        Regex::new(r"(?m)^# Work Log \((\d{4}-\d{2}-\d{2}) ~ (\d{4}-\d{2}-\d{2})\)\s*$")
            .expect("TITLE_RANGE regex is valid");
}

/// Drops a conventional-commit type prefix such as `feat:` or `fix(api):`.
pub fn strip_commit_prefix(title: &str) -> &str {
    let title = title.trim();
    match COMMIT_PREFIX.find(title) {
        Some(m) if m.end() < title.len() => &title[m.end()..],
        _ => title,
    }
}

fn format_commit(commit: &GitCommit) -> String {
    format!(
        "- [{}] {} ({}) [{}]",
        commit.project_name.as_deref().unwrap_or("Unknown"),
        strip_commit_prefix(&commit.title),
        commit.author_name,
        commit.short_id
    )
}

pub fn format_markdown(report: &WorkLogReport) -> String {
    let mut lines = vec![
        format!(
            "{} ({} ~ {})",
            TITLE_PREFIX,
            report.start_date.format("%Y-%m-%d"),
            report.end_date.format("%Y-%m-%d")
        ),
        String::new(),
        "## 📊 Summary".to_string(),
        String::new(),
        format!("- **Total commits**: {}", report.total_commits),
        format!("- **Working days**: {}", report.working_days()),
        format!("- **Projects**: {}", report.projects.len()),
    ];

    if !report.projects.is_empty() {
        let listed = report
            .projects
            .iter()
            .take(MAX_LISTED_PROJECTS)
            .cloned()
            .collect::<Vec<_>>()
            .join(", ");
        let more = if report.projects.len() > MAX_LISTED_PROJECTS { "..." } else { "" };
        lines.push(format!("- **Project list**: {}{}", listed, more));
    }
    if let Some(summary) = &report.summary {
        lines.push(format!("- **Main work**: {}", summary));
    }
    lines.push(String::new());

    if report.entries.is_empty() {
        lines.push("No commits in this period.".to_string());
        lines.push(String::new());
    }

    for entry in &report.entries {
        lines.push(format!("{} {}", DAY_HEADING, entry.date.format("%Y-%m-%d %A")));
        lines.push(String::new());
        lines.push("### 📝 Commits".to_string());
        lines.push(String::new());
        lines.extend(entry.commits.iter().map(format_commit));
        lines.push(String::new());
        lines.push("### 📊 Daily statistics".to_string());
        lines.push(String::new());
        lines.push(format!("- Commits: {}", entry.commits.len()));
        if !entry.projects.is_empty() {
            lines.push(format!("- Projects: {}", entry.projects.join(", ")));
        }
        if let Some(summary) = &entry.summary {
            lines.push(format!("- Main work: {}", summary));
        }
        lines.push(String::new());
    }

    lines.join("\n")
}

/// Recovers the report window from a rendered title line, at day granularity.
pub fn parse_date_range(markdown: &str) -> Option<DateRange> {
    let caps = TITLE_RANGE.captures(markdown)?;
    let start = NaiveDate::parse_from_str(caps.get(1)?.as_str(), "%Y-%m-%d").ok()?;
    let end = NaiveDate::parse_from_str(caps.get(2)?.as_str(), "%Y-%m-%d").ok()?;

    let start = Utc.from_utc_datetime(&start.and_time(NaiveTime::MIN));
    let end = Utc.from_utc_datetime(&end.and_time(NaiveTime::MIN)) + Duration::days(1)
        - Duration::microseconds(1);
    DateRange::new(start, end).ok()
}

/// Whether free-form text looks like a rendered work log.
pub fn looks_like_worklog(content: &str) -> bool {
    content.contains(TITLE_PREFIX) || content.contains(DAY_HEADING)
}

pub fn attachment_filename(report: &WorkLogReport) -> String {
    format!(
        "worklog_{}_to_{}.md",
        report.start_date.format("%Y%m%d"),
        report.end_date.format("%Y%m%d")
    )
}
