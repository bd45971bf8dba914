//! AWS client settings.

use crate::paginate::PageLimits;
use serde::{Deserialize, Serialize};

/// Largest `MaxItems` IAM accepts on list calls.
pub const MAX_IAM_PAGE_SIZE: usize = 1000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AwsConfig {
    /// Region override. Falls back to the SDK's default chain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    /// Named profile from the shared credentials file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,

    /// `MaxItems` for IAM list calls.
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Upper bound on pages fetched by one list call.
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,
}

impl Default for AwsConfig {
    fn default() -> Self {
        Self {
            region: None,
            profile: None,
            page_size: default_page_size(),
            max_pages: default_max_pages(),
        }
    }
}

impl AwsConfig {
    pub fn page_limits(&self) -> PageLimits {
        PageLimits {
            page_size: self.page_size,
            max_pages: self.max_pages,
        }
    }
}

fn default_page_size() -> usize {
    100
}

fn default_max_pages() -> usize {
    100
}
