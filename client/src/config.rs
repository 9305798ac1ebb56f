//! Configuration management for the harvest client
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (config/development.toml, config/production.toml)
//! 3. Environment variable overrides with SPF__ prefix

use config::{ConfigError, Environment, File};
use serde::Deserialize;
use shared::{CurrentUser, UserRole};
use validator::Validate;

/// Main client configuration
#[derive(Debug, Deserialize, Clone, Validate)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Facility API configuration
    #[validate]
    pub api: ApiConfig,

    /// Acting user
    pub user: UserConfig,

    /// Stage workflow behaviour
    pub workflow: WorkflowConfig,
}

#[derive(Debug, Deserialize, Clone, Validate)]
pub struct ApiConfig {
    /// Base URL of the facility API, e.g. https://api.spfarms.example/api/v1
    #[validate(url)]
    pub base_url: String,

    /// Bearer token issued by the auth service
    pub token: Option<String>,

    /// Request timeout in seconds
    #[validate(range(min = 1, max = 300))]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UserConfig {
    pub id: Option<i64>,

    /// Display name
    pub name: String,

    /// Role string as issued by the auth service
    pub role: String,
}

impl UserConfig {
    pub fn current_user(&self) -> CurrentUser {
        CurrentUser {
            id: self.id,
            name: self.name.clone(),
            role: UserRole::from_str(&self.role),
        }
    }
}

/// How per-strain weights are sent before a transition
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum WeightSubmission {
    /// One `record_strain_weight` request per strain, in order
    #[default]
    Sequential,
    /// A single `record_strain_weights` request
    Batch,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WorkflowConfig {
    pub weight_submission: WeightSubmission,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            std::env::var("SPF_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("api.base_url", "http://localhost:3000/api/v1")?
            .set_default("api.timeout_secs", 30)?
            .set_default("user.name", "staff")?
            .set_default("user.role", "staff")?
            .set_default("workflow.weight_submission", "sequential")?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (SPF__ prefix)
            .add_source(
                Environment::with_prefix("SPF")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Config = config.try_deserialize()?;
        config
            .validate()
            .map_err(|e| ConfigError::Message(e.to_string()))?;
        Ok(config)
    }

    /// Configuration pointing at `base_url`, used by tests and tooling
    pub fn for_base_url(base_url: impl Into<String>) -> Self {
        Self {
            environment: "test".to_string(),
            api: ApiConfig {
                base_url: base_url.into(),
                token: None,
                timeout_secs: 30,
            },
            user: UserConfig {
                id: None,
                name: "staff".to_string(),
                role: "staff".to_string(),
            },
            workflow: WorkflowConfig {
                weight_submission: WeightSubmission::Sequential,
            },
        }
    }
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            weight_submission: WeightSubmission::Sequential,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_base_url_validates() {
        let config = Config::for_base_url("http://127.0.0.1:4000");
        assert!(config.validate().is_ok());
        assert_eq!(config.user.current_user().role, UserRole::Staff);
    }

    #[test]
    fn test_bad_url_and_timeout_fail_validation() {
        let mut config = Config::for_base_url("not a url");
        assert!(config.validate().is_err());
        config.api.base_url = "http://localhost:3000".to_string();
        config.api.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_weight_submission_parses_snake_case() {
        let parsed: WeightSubmission = serde_json::from_str(r#""batch""#).unwrap();
        assert_eq!(parsed, WeightSubmission::Batch);
    }
}
