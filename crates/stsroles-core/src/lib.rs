use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub mod arn;
pub mod config;
pub mod error;
pub mod naming;
pub mod paginate;
pub mod version;

pub use config::{AwsConfig, ConfigError, EngineConfig, OcmConfig};
pub use error::{EngineError, EngineResult, ErrorCategory};
pub use version::PolicyVersion;

/// Tag keys written on roles and policies, and read back during inspection.
pub mod tags {
    pub const OPENSHIFT_VERSION: &str = "rosa_openshift_version";
    pub const ROLE_PREFIX: &str = "rosa_role_prefix";
    pub const CLUSTER_ID: &str = "rosa_cluster_id";
    pub const OPERATOR_NAMESPACE: &str = "operator_namespace";
    pub const OPERATOR_NAME: &str = "operator_name";
    pub const RED_HAT_MANAGED: &str = "red-hat-managed";
    pub const HCP_POLICIES: &str = "rosa_hcp_policies";
    pub const MANAGED_POLICIES: &str = "rosa_managed_policies";
}

/// How the engine reaches its end state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Create and attach resources directly.
    Auto,
    /// Print the equivalent AWS CLI commands.
    Manual,
}

impl Mode {
    pub const ALL: [Mode; 2] = [Mode::Auto, Mode::Manual];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Auto => "auto",
            Mode::Manual => "manual",
        }
    }
}

impl FromStr for Mode {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(Mode::Auto),
            "manual" => Ok(Mode::Manual),
            other => Err(EngineError::InvalidMode(other.to_string())),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Control-plane topology of the target cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Topology {
    Classic,
    HostedCp,
}

impl Topology {
    pub fn from_hosted_cp(hosted_cp: bool) -> Self {
        if hosted_cp {
            Topology::HostedCp
        } else {
            Topology::Classic
        }
    }
}

/// Snapshot of a cluster fetched once per invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cluster {
    pub id: String,
    pub name: String,
    pub aws_account_id: String,
    /// Raw desired OpenShift version, e.g. `4.15.3`.
    pub version: String,
    #[serde(default)]
    pub hosted_cp: bool,
    /// Present only on STS clusters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sts: Option<ClusterSts>,
}

/// STS settings recorded on a cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterSts {
    pub installer_role_arn: String,
    pub operator_role_prefix: String,
    pub oidc_endpoint_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions_boundary: Option<String>,
}

impl Cluster {
    pub fn oidc_endpoint_url(&self) -> Option<&str> {
        self.sts.as_ref().map(|sts| sts.oidc_endpoint_url.as_str())
    }

    /// Whether the cluster reuses an OIDC provider it did not generate.
    ///
    /// Generated endpoints embed the cluster ID; anything else was brought in.
    pub fn is_byo_oidc(&self) -> bool {
        match self.oidc_endpoint_url() {
            Some(url) => !url.contains(&self.id),
            None => false,
        }
    }
}

/// An in-cluster operator identified by its credentials request.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OperatorKey {
    pub namespace: String,
    pub name: String,
}

impl OperatorKey {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for OperatorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// What an operator needs: which service accounts assume its role, on which topologies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRequest {
    pub operator: OperatorKey,
    pub service_accounts: Vec<String>,
    pub topologies: Vec<Topology>,
}

impl CredentialRequest {
    pub fn applies_to(&self, topology: Topology) -> bool {
        self.topologies.contains(&topology)
    }

    /// Key of this operator's permission policy in the policy catalog.
    pub fn catalog_key(&self, topology: Topology) -> String {
        let base = format!("{}_{}", self.operator.namespace, self.operator.name).replace('-', "_");
        match topology {
            Topology::Classic => format!("openshift_{}_policy", base.trim_start_matches("openshift_")),
            Topology::HostedCp => format!("openshift_hcp_{}_policy", base.trim_start_matches("openshift_")),
        }
    }
}

/// Managed policy granting an operator its permissions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionPolicy {
    pub name: String,
    pub arn: String,
    pub path: String,
    pub document: serde_json::Value,
    pub version: PolicyVersion,
    pub tags: BTreeMap<String, String>,
}

/// Everything needed to create one operator role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorRoleSpec {
    pub operator: OperatorKey,
    pub role_name: String,
    pub role_arn: String,
    pub path: String,
    pub trust_policy: serde_json::Value,
    pub permission_policy: PermissionPolicy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions_boundary: Option<String>,
    pub tags: BTreeMap<String, String>,
}

/// Outcome of comparing one operator's deployed policy against the required version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompatibilityVerdict {
    pub operator: OperatorKey,
    pub compatible: bool,
    pub reason: String,
}

/// An IAM role as seen in the account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleDescriptor {
    pub name: String,
    pub arn: String,
    pub path: String,
    /// Decoded assume-role policy document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trust_policy: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions_boundary: Option<String>,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

impl RoleDescriptor {
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }
}

/// A customer-managed IAM policy as seen in the account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyDescriptor {
    pub name: String,
    pub arn: String,
    pub path: String,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

impl PolicyDescriptor {
    /// Version recorded in the policy's version tag, if it parses.
    pub fn version(&self) -> Option<PolicyVersion> {
        self.tags.get(tags::OPENSHIFT_VERSION)?.parse().ok()
    }
}
