//! Wire shapes of the clusters management API.
//!
//! Only the fields the engine reads are modeled; everything else is ignored.

use serde::Deserialize;
use stsroles_core::{Cluster, ClusterSts};

/// Envelope of every list endpoint.
#[derive(Debug, Deserialize)]
pub struct List<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    #[serde(default)]
    pub total: usize,
}

#[derive(Debug, Deserialize)]
pub struct ClusterItem {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub aws: Option<AwsSection>,
    #[serde(default)]
    pub version: Option<VersionRef>,
    #[serde(default)]
    pub hypershift: Option<Hypershift>,
}

#[derive(Debug, Deserialize)]
pub struct AwsSection {
    #[serde(default)]
    pub account_id: String,
    #[serde(default)]
    pub sts: Option<StsSection>,
}

#[derive(Debug, Deserialize)]
pub struct StsSection {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub role_arn: String,
    #[serde(default)]
    pub operator_role_prefix: String,
    #[serde(default)]
    pub oidc_endpoint_url: String,
    #[serde(default)]
    pub permission_boundary: String,
}

#[derive(Debug, Deserialize)]
pub struct VersionRef {
    #[serde(default)]
    pub raw_id: String,
    #[serde(default)]
    pub id: String,
}

impl VersionRef {
    /// `raw_id` when set, otherwise the `openshift-v` id.
    pub fn raw(&self) -> &str {
        if self.raw_id.is_empty() {
            &self.id
        } else {
            &self.raw_id
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Hypershift {
    #[serde(default)]
    pub enabled: bool,
}

/// One entry of `aws_inquiries/sts_policies`.
#[derive(Debug, Deserialize)]
pub struct StsPolicyItem {
    pub id: String,
    /// Policy document as a JSON string.
    #[serde(default)]
    pub details: String,
}

impl From<ClusterItem> for Cluster {
    fn from(item: ClusterItem) -> Self {
        let (aws_account_id, sts) = match item.aws {
            Some(aws) => {
                let sts = aws
                    .sts
                    .filter(|sts| sts.enabled && !sts.role_arn.is_empty())
                    .map(|sts| ClusterSts {
                        installer_role_arn: sts.role_arn,
                        operator_role_prefix: sts.operator_role_prefix,
                        oidc_endpoint_url: sts.oidc_endpoint_url,
                        permissions_boundary: Some(sts.permission_boundary)
                            .filter(|b| !b.is_empty()),
                    });
                (aws.account_id, sts)
            }
            None => (String::new(), None),
        };
        Cluster {
            id: item.id,
            name: item.name,
            aws_account_id,
            version: item
                .version
                .as_ref()
                .map(|v| v.raw().to_string())
                .unwrap_or_default(),
            hosted_cp: item.hypershift.is_some_and(|h| h.enabled),
            sts,
        }
    }
}
