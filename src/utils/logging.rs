// file: src/utils/logging.rs
// description: tracing subscriber setup and terminal formatting helpers
// reference: https://docs.rs/tracing-subscriber

use crate::models::{ToolCall, ToolOutcome};
use colored::*;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Installs the global subscriber. Output goes to stderr so stdout stays
/// free for replies and the MCP stdio transport. `RUST_LOG` wins over
/// `verbose` when set.
pub fn init_logger(colored_output: bool, verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_file(verbose)
        .with_line_number(verbose)
        .compact()
        .with_ansi(colored_output);

    // a second init (tests, embedding) keeps the first subscriber
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}

pub fn format_success(msg: &str) -> String {
    format!("{} {}", "✓".green().bold(), msg.green())
}

pub fn format_error(msg: &str) -> String {
    format!("{} {}", "✗".red().bold(), msg.red())
}

pub fn format_warning(msg: &str) -> String {
    format!("{} {}", "⚠".yellow().bold(), msg.yellow())
}

pub fn format_info(msg: &str) -> String {
    format!("{} {}", "ℹ".blue().bold(), msg)
}

/// One line per executed tool call, e.g. `✓ get_gitlab_commits`.
pub fn format_tool_call(call: &ToolCall) -> String {
    match call.outcome() {
        Some(ToolOutcome::Success(_)) => format_success(&call.name),
        Some(ToolOutcome::Failure(error)) => format_error(&format!("{}: {}", call.name, error)),
        None => format_warning(&format!("{} (not executed)", call.name)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Map, json};

    #[test]
    fn test_format_tool_call() {
        colored::control::set_override(false);

        let mut ok = ToolCall::new("1", "get_github_commits", Map::new());
        ok.resolve(Ok(json!({})));
        assert_eq!(format_tool_call(&ok), "✓ get_github_commits");

        let pending = ToolCall::new("2", "get_projects", Map::new());
        assert_eq!(format_tool_call(&pending), "⚠ get_projects (not executed)");
    }
}
