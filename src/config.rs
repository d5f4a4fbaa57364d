use crate::error::{AppError, Result};
use crate::retry::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

const CONFIG_DIR_PREFIX: &str = "gsheets";

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    pub google: GoogleConfig,
    #[serde(default)]
    pub retry: RetryConfig,
}

/// Credentials for the Google APIs: either a service account key file or an
/// OAuth client for the interactive installed-app flow.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct GoogleConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_account_key: Option<PathBuf>,
    /// User to impersonate through domain-wide delegation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impersonate: Option<String>,
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    /// Sent as `quotaUser` on every request so quota is tracked per user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quota_user: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials<'a> {
    ServiceAccount {
        key_path: &'a PathBuf,
        subject: Option<&'a str>,
    },
    InstalledFlow {
        client_id: &'a str,
        client_secret: &'a str,
    },
}

impl GoogleConfig {
    pub fn credentials(&self) -> Result<Credentials<'_>> {
        if let Some(key_path) = &self.service_account_key {
            return Ok(Credentials::ServiceAccount {
                key_path,
                subject: self.impersonate.as_deref(),
            });
        }

        if self.impersonate.is_some() {
            return Err(AppError::Config(
                "impersonate requires service_account_key to be set".to_string(),
            ));
        }

        if self.client_id.is_empty() || self.client_secret.is_empty() {
            return Err(AppError::Config(
                "Either service_account_key or client_id and client_secret must be set in config file"
                    .to_string(),
            ));
        }

        Ok(Credentials::InstalledFlow {
            client_id: &self.client_id,
            client_secret: &self.client_secret,
        })
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct RetryConfig {
    pub delay_secs: u64,
    pub max_attempts: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            delay_secs: policy.delay.as_secs(),
            max_attempts: policy.max_attempts,
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        RetryPolicy::new(Duration::from_secs(config.delay_secs), config.max_attempts)
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_file()?;

        if !config_path.exists() {
            return Err(AppError::Config(format!(
                "Config file not found at {:?}. Please create one.",
                config_path
            )));
        }

        let contents = fs::read_to_string(&config_path)?;
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {}", e)))?;

        config.google.credentials()?;

        if config.retry.max_attempts == 0 {
            return Err(AppError::Config(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }

        Ok(config)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::from(&self.retry)
    }

    fn xdg_dirs() -> xdg::BaseDirectories {
        xdg::BaseDirectories::with_prefix(CONFIG_DIR_PREFIX)
    }

    /// Get the config file path
    pub fn config_file() -> Result<PathBuf> {
        let xdg_dirs = Self::xdg_dirs();
        xdg_dirs
            .place_config_file("config.toml")
            .map_err(|e| AppError::Config(format!("Failed to create config directory: {}", e)))
    }

    /// Get the cache directory path
    pub fn cache_dir() -> Result<PathBuf> {
        let xdg = Self::xdg_dirs();
        xdg.get_cache_home()
            .ok_or_else(|| AppError::Config("Failed to determine cache directory".to_string()))
    }

    /// Get a cache file path
    pub fn cache_file(filename: &str) -> Result<PathBuf> {
        let xdg = Self::xdg_dirs();
        xdg.place_cache_file(filename)
            .map_err(|e| AppError::Config(format!("Failed to create cache file path: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_serialization() {
        let config = Config {
            google: GoogleConfig {
                client_id: "test_client_id".to_string(),
                client_secret: "test_client_secret".to_string(),
                ..Default::default()
            },
            retry: RetryConfig {
                delay_secs: 20,
                max_attempts: 3,
            },
        };

        let serialized = toml::to_string(&config).unwrap();
        let deserialized = Config::parse(&serialized).unwrap();

        assert_eq!(config.google.client_id, deserialized.google.client_id);
        assert_eq!(config.retry, deserialized.retry);
    }

    #[test]
    fn test_retry_defaults() {
        let config = Config::parse(
            r#"
            [google]
            client_id = "id"
            client_secret = "secret"
            "#,
        )
        .unwrap();

        assert_eq!(config.retry_policy(), RetryPolicy::default());
    }

    #[test]
    fn test_retry_policy_from_config() {
        let config = Config::parse(
            r#"
            [google]
            service_account_key = "/tmp/key.json"

            [retry]
            delay_secs = 30
            max_attempts = 2
            "#,
        )
        .unwrap();

        let policy = config.retry_policy();
        assert_eq!(policy.delay, Duration::from_secs(30));
        assert_eq!(policy.max_attempts, 2);
    }

    #[test]
    fn test_partial_retry_section_keeps_defaults() {
        let config = Config::parse(
            r#"
            [google]
            client_id = "id"
            client_secret = "secret"

            [retry]
            delay_secs = 20
            "#,
        )
        .unwrap();

        let policy = config.retry_policy();
        assert_eq!(policy.delay, Duration::from_secs(20));
        assert_eq!(policy.max_attempts, RetryPolicy::default().max_attempts);
    }

    #[test]
    fn test_quota_user() {
        let config = Config::parse(
            r#"
            [google]
            service_account_key = "/tmp/key.json"
            quota_user = "importer-7"
            "#,
        )
        .unwrap();
        assert_eq!(config.google.quota_user.as_deref(), Some("importer-7"));

        let config = Config::parse(
            r#"
            [google]
            client_id = "id"
            client_secret = "secret"
            "#,
        )
        .unwrap();
        assert!(config.google.quota_user.is_none());
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let result = Config::parse(
            r#"
            [google]
            client_id = "id"
            client_secret = "secret"

            [retry]
            delay_secs = 15
            max_attempts = 0
            "#,
        );
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_credentials_service_account() {
        let google = GoogleConfig {
            service_account_key: Some(PathBuf::from("/tmp/key.json")),
            impersonate: Some("user@example.com".to_string()),
            ..Default::default()
        };

        match google.credentials().unwrap() {
            Credentials::ServiceAccount { key_path, subject } => {
                assert_eq!(key_path, &PathBuf::from("/tmp/key.json"));
                assert_eq!(subject, Some("user@example.com"));
            }
            other => panic!("unexpected credentials: {:?}", other),
        }
    }

    #[test]
    fn test_credentials_missing() {
        assert!(matches!(
            GoogleConfig::default().credentials(),
            Err(AppError::Config(_))
        ));

        let google = GoogleConfig {
            impersonate: Some("user@example.com".to_string()),
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
            ..Default::default()
        };
        assert!(matches!(google.credentials(), Err(AppError::Config(_))));
    }
}
