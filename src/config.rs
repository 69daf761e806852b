// file: src/config.rs
// description: application configuration management with toml support
// reference: https://docs.rs/config

use crate::error::{Result, WorklogError};
use crate::llm::LlmProvider;
use crate::models::Platform;
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub llm: LlmConfig,
    pub chat: ChatConfig,
    pub credentials: CredentialsConfig,
    #[serde(default)]
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub base_url: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChatConfig {
    pub max_iterations: usize,
    pub history_limit: usize,
    #[serde(default = "default_tool_concurrency")]
    pub tool_concurrency: usize,
}

/// Git hosting credentials for the local user. Tokens are ciphertext when
/// `encrypted` is set and are decrypted with `security.encryption_key`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CredentialsConfig {
    pub default_platform: Option<Platform>,
    pub gitlab_url: Option<String>,
    pub gitlab_token: Option<String>,
    pub github_username: Option<String>,
    pub github_token: Option<String>,
    pub github_api_url: Option<String>,
    #[serde(default)]
    pub encrypted: bool,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SecurityConfig {
    pub encryption_key: Option<String>,
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_tool_concurrency() -> usize {
    4
}

impl Config {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenv().ok();

        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        } else {
            builder = builder.add_source(config::File::from(Path::new("config/default.toml")));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("WORKLOG")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .map_err(|e| WorklogError::Config(e.to_string()))?;

        let config: Config = settings
            .try_deserialize()
            .map_err(|e| WorklogError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    pub fn default_config() -> Self {
        Self {
            llm: LlmConfig {
                provider: LlmProvider::Anthropic,
                api_key: None,
                model: "claude-sonnet-4-5-20250929".to_string(),
                temperature: 0.7,
                max_tokens: 4096,
                base_url: None,
                timeout_secs: default_timeout_secs(),
            },
            chat: ChatConfig {
                max_iterations: 5,
                history_limit: 10,
                tool_concurrency: default_tool_concurrency(),
            },
            credentials: CredentialsConfig::default(),
            security: SecurityConfig::default(),
        }
    }

    fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.llm.temperature) {
            return Err(WorklogError::Config(format!(
                "temperature must be within [0, 1], got {}",
                self.llm.temperature
            )));
        }

        if self.llm.max_tokens == 0 {
            return Err(WorklogError::Config(
                "max_tokens must be greater than 0".to_string(),
            ));
        }

        if self.chat.max_iterations == 0 {
            return Err(WorklogError::Config(
                "max_iterations must be greater than 0".to_string(),
            ));
        }

        if self.chat.history_limit == 0 {
            return Err(WorklogError::Config(
                "history_limit must be greater than 0".to_string(),
            ));
        }

        if self.chat.tool_concurrency == 0 {
            return Err(WorklogError::Config(
                "tool_concurrency must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
