//! Configuration for the operator role engine.
//!
//! All settings are optional: an absent file yields [`EngineConfig::default`].
//! The file is YAML and only ever read; command-line flags take precedence over
//! anything set here.
//!
//! ```yaml
//! ocm:
//!   url: https://api.openshift.com
//!   token_env: OCM_TOKEN
//! aws:
//!   region: us-east-1
//!   page_size: 100
//! interactive: false
//! ```

pub mod aws;
pub mod ocm;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub use aws::AwsConfig;
pub use ocm::OcmConfig;

/// Complete engine configuration loaded from a file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// OCM API connection.
    #[serde(default)]
    pub ocm: OcmConfig,

    /// AWS IAM client settings.
    #[serde(default)]
    pub aws: AwsConfig,

    /// Default for `--interactive` when the flag is not given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interactive: Option<bool>,
}

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl EngineConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML content.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` when given, defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => {
                tracing::debug!(path = %path.display(), "loading configuration");
                Self::from_file(path)
            }
            None => Ok(Self::default()),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.aws.page_size == 0 || self.aws.page_size > aws::MAX_IAM_PAGE_SIZE {
            return Err(ConfigError::Config(format!(
                "aws.page_size must be between 1 and {}",
                aws::MAX_IAM_PAGE_SIZE
            )));
        }
        if self.ocm.page_size == 0 {
            return Err(ConfigError::Config("ocm.page_size must be positive".to_string()));
        }
        if self.aws.max_pages == 0 {
            return Err(ConfigError::Config("aws.max_pages must be positive".to_string()));
        }
        Ok(())
    }
}
