//! Operator policy catalog and compatibility checks.
//!
//! The catalog supplies the canonical permission-policy documents for every
//! operator. Before any role is planned, two checks gate the run:
//!
//! 1. **Installer role** - the account-role family the operator roles will
//!    trust must support the target OpenShift version ([`installer`]).
//! 2. **Operator policies** - policies already deployed under the target
//!    prefix must carry a version at least as new as required ([`compat`]).

pub mod compat;
pub mod installer;

use async_trait::async_trait;
use std::collections::BTreeMap;
use stsroles_core::PolicyVersion;

pub use compat::{CompatibilityChecker, CompatibilityReport, PolicyRequirement};
pub use installer::InstallerRole;

/// Role kind whose policies the engine requests from the catalog.
pub const OPERATOR_ROLE_KIND: &str = "OperatorRole";

/// Source of canonical policy documents.
#[async_trait]
pub trait PolicyCatalog: Send + Sync {
    /// Policy documents for `role_kind`, keyed by catalog key.
    async fn get_policies(
        &self,
        role_kind: &str,
    ) -> anyhow::Result<BTreeMap<String, serde_json::Value>>;

    /// Policy version new policies are tagged with when no cluster is involved.
    async fn get_default_version(&self) -> anyhow::Result<PolicyVersion>;
}

/// Catalog held in memory.
///
/// Used when documents are supplied up front rather than fetched.
#[derive(Debug, Clone)]
pub struct StaticPolicyCatalog {
    policies: BTreeMap<String, serde_json::Value>,
    default_version: PolicyVersion,
}

impl StaticPolicyCatalog {
    pub fn new(policies: BTreeMap<String, serde_json::Value>, default_version: PolicyVersion) -> Self {
        Self {
            policies,
            default_version,
        }
    }
}

#[async_trait]
impl PolicyCatalog for StaticPolicyCatalog {
    async fn get_policies(
        &self,
        role_kind: &str,
    ) -> anyhow::Result<BTreeMap<String, serde_json::Value>> {
        if role_kind != OPERATOR_ROLE_KIND {
            anyhow::bail!("static catalog only holds '{}' policies", OPERATOR_ROLE_KIND);
        }
        Ok(self.policies.clone())
    }

    async fn get_default_version(&self) -> anyhow::Result<PolicyVersion> {
        Ok(self.default_version)
    }
}
