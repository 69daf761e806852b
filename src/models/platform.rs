// file: src/models/platform.rs
// description: Git hosting platform identifiers
// reference: internal data structures

use crate::error::{Result, WorklogError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    GitLab,
    GitHub,
}

impl Platform {
    pub const ALL: [Platform; 2] = [Platform::GitLab, Platform::GitHub];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::GitLab => "gitlab",
            Platform::GitHub => "github",
        }
    }

    /// Prefix accepted on tool names to force routing to this platform.
    pub fn tool_prefix(&self) -> &'static str {
        match self {
            Platform::GitLab => "gitlab_",
            Platform::GitHub => "github_",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Platform::GitLab => "GitLab",
            Platform::GitHub => "GitHub",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = WorklogError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gitlab" => Ok(Platform::GitLab),
            "github" => Ok(Platform::GitHub),
            other => Err(WorklogError::Config(format!(
                "Unsupported platform: {}",
                other
            ))),
        }
    }
}
