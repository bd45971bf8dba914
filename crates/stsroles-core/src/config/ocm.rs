//! OCM API connection settings.

use crate::paginate::PageLimits;
use serde::{Deserialize, Serialize};

/// Connection to the OCM API serving clusters and the policy catalog.
///
/// The token is resolved in order of precedence:
/// 1. `token_env` (environment variable)
/// 2. `token` (inline value)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcmConfig {
    /// Base URL of the API.
    #[serde(default = "default_url")]
    pub url: String,

    /// Environment variable holding the bearer token. Highest precedence.
    #[serde(default = "default_token_env", skip_serializing_if = "Option::is_none")]
    pub token_env: Option<String>,

    /// Bearer token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Items requested per page from list endpoints.
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Upper bound on pages fetched from one list endpoint.
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,
}

impl Default for OcmConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            token_env: default_token_env(),
            token: None,
            page_size: default_page_size(),
            max_pages: default_max_pages(),
        }
    }
}

impl OcmConfig {
    pub fn resolve_token(&self) -> Option<String> {
        if let Some(env_var) = &self.token_env
            && let Ok(token) = std::env::var(env_var)
            && !token.is_empty()
        {
            return Some(token);
        }
        self.token.clone()
    }

    pub fn page_limits(&self) -> PageLimits {
        PageLimits {
            page_size: self.page_size,
            max_pages: self.max_pages,
        }
    }
}

fn default_url() -> String {
    "https://api.openshift.com".to_string()
}

fn default_token_env() -> Option<String> {
    Some("OCM_TOKEN".to_string())
}

fn default_page_size() -> usize {
    100
}

fn default_max_pages() -> usize {
    100
}
