// file: src/settings.rs
// description: resolved per-user Git hosting settings handed to the tool layer
// reference: explicit credential structs checked at construction

use crate::config::{Config, CredentialsConfig};
use crate::error::{Result, WorklogError};
use crate::models::Platform;
use crate::utils::crypto::CredentialCipher;

pub const GITHUB_API_URL: &str = "https://api.github.com";

#[derive(Debug, Clone, PartialEq)]
pub struct GitLabCredentials {
    pub url: String,
    pub token: String,
}

impl GitLabCredentials {
    pub fn new(url: impl Into<String>, token: impl Into<String>) -> Result<Self> {
        let url = url.into().trim().trim_end_matches('/').to_string();
        let token = token.into();

        if url.is_empty() {
            return Err(WorklogError::Config("gitlab_url is required".to_string()));
        }
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(WorklogError::Config(format!("Invalid gitlab_url: {}", url)));
        }
        if token.trim().is_empty() {
            return Err(WorklogError::Config("gitlab_token is required".to_string()));
        }

        Ok(Self { url, token })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GitHubCredentials {
    pub username: String,
    pub token: String,
    pub api_url: String,
}

impl GitHubCredentials {
    pub fn new(username: impl Into<String>, token: impl Into<String>) -> Result<Self> {
        let username = username.into();
        let token = token.into();

        if username.trim().is_empty() {
            return Err(WorklogError::Config("github_username is required".to_string()));
        }
        if token.trim().is_empty() {
            return Err(WorklogError::Config("github_token is required".to_string()));
        }

        Ok(Self {
            username,
            token,
            api_url: GITHUB_API_URL.to_string(),
        })
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into().trim_end_matches('/').to_string();
        self
    }
}

/// Everything the tool layer needs to know about one user.
#[derive(Debug, Clone, PartialEq)]
pub struct UserSettings {
    pub default_platform: Platform,
    pub gitlab: Option<GitLabCredentials>,
    pub github: Option<GitHubCredentials>,
}

impl UserSettings {
    pub fn new(default_platform: Platform) -> Self {
        Self {
            default_platform,
            gitlab: None,
            github: None,
        }
    }

    pub fn with_gitlab(mut self, credentials: GitLabCredentials) -> Self {
        self.gitlab = Some(credentials);
        self
    }

    pub fn with_github(mut self, credentials: GitHubCredentials) -> Self {
        self.github = Some(credentials);
        self
    }

    pub fn is_configured(&self, platform: Platform) -> bool {
        match platform {
            Platform::GitLab => self.gitlab.is_some(),
            Platform::GitHub => self.github.is_some(),
        }
    }

    pub fn configured_platforms(&self) -> Vec<Platform> {
        Platform::ALL
            .into_iter()
            .filter(|p| self.is_configured(*p))
            .collect()
    }

    /// Builds settings from the application config, decrypting tokens when
    /// they are stored encrypted. Incomplete platforms are left unset.
    pub fn from_config(config: &Config) -> Result<Self> {
        let cipher = match (&config.security.encryption_key, config.credentials.encrypted) {
            (Some(key), true) => Some(CredentialCipher::new(key)?),
            (None, true) => {
                return Err(WorklogError::Config(
                    "credentials are marked encrypted but security.encryption_key is not set"
                        .to_string(),
                ));
            }
            _ => None,
        };

        Self::from_credentials(&config.credentials, cipher.as_ref())
    }

    pub fn from_credentials(
        credentials: &CredentialsConfig,
        cipher: Option<&CredentialCipher>,
    ) -> Result<Self> {
        let reveal = |token: &str| -> Result<String> {
            match cipher {
                Some(cipher) => cipher.decrypt(token),
                None => Ok(token.to_string()),
            }
        };

        let gitlab = match (&credentials.gitlab_url, &credentials.gitlab_token) {
            (Some(url), Some(token)) => Some(GitLabCredentials::new(url.as_str(), reveal(token)?)?),
            _ => None,
        };

        let github = match (&credentials.github_username, &credentials.github_token) {
            (Some(username), Some(token)) => {
                let creds = GitHubCredentials::new(username.as_str(), reveal(token)?)?;
                Some(match &credentials.github_api_url {
                    Some(api_url) => creds.with_api_url(api_url.as_str()),
                    None => creds,
                })
            }
            _ => None,
        };

        let default_platform = match credentials.default_platform {
            Some(platform) => platform,
            None if gitlab.is_some() => Platform::GitLab,
            None if github.is_some() => Platform::GitHub,
            None => {
                return Err(WorklogError::Config(
                    "No valid platform configuration found. Configure GitLab or GitHub."
                        .to_string(),
                ));
            }
        };

        Ok(Self {
            default_platform,
            gitlab,
            github,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gitlab_credentials_validation() {
        let creds = GitLabCredentials::new("https://gitlab.example.com/", "glpat-x").unwrap();
        assert_eq!(creds.url, "https://gitlab.example.com");
        assert!(GitLabCredentials::new("", "glpat-x").is_err());
        assert!(GitLabCredentials::new("gitlab.example.com", "glpat-x").is_err());
        assert!(GitLabCredentials::new("https://gitlab.example.com", " ").is_err());
    }

    #[test]
    fn test_github_credentials_validation() {
        let creds = GitHubCredentials::new("octocat", "ghp_x").unwrap();
        assert_eq!(creds.api_url, GITHUB_API_URL);
        assert!(GitHubCredentials::new("", "ghp_x").is_err());
        let err = GitHubCredentials::new("octocat", "").unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_from_credentials_infers_default_platform() {
        let credentials = CredentialsConfig {
            github_username: Some("octocat".to_string()),
            github_token: Some("ghp_x".to_string()),
            ..Default::default()
        };
        let settings = UserSettings::from_credentials(&credentials, None).unwrap();
        assert_eq!(settings.default_platform, Platform::GitHub);
        assert_eq!(settings.configured_platforms(), vec![Platform::GitHub]);
    }

    #[test]
    fn test_from_credentials_requires_a_platform() {
        let err = UserSettings::from_credentials(&CredentialsConfig::default(), None).unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_encrypted_tokens_are_decrypted() {
        let key = CredentialCipher::generate_key();
        let cipher = CredentialCipher::new(&key).unwrap();

        let mut config = Config::default_config();
        config.credentials = CredentialsConfig {
            default_platform: Some(Platform::GitLab),
            gitlab_url: Some("https://gitlab.example.com".to_string()),
            gitlab_token: Some(cipher.encrypt("glpat-secret").unwrap()),
            encrypted: true,
            ..Default::default()
        };
        config.security.encryption_key = Some(key);

        let settings = UserSettings::from_config(&config).unwrap();
        assert_eq!(settings.gitlab.unwrap().token, "glpat-secret");
    }

    #[test]
    fn test_encrypted_without_key_is_config_error() {
        let mut config = Config::default_config();
        config.credentials.encrypted = true;
        assert!(UserSettings::from_config(&config).unwrap_err().is_config());
    }
}
