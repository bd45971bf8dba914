//! Installer role conventions and version gate.
//!
//! Operator roles trust the account-role family the installer role belongs to.
//! The installer role also carries the conventions operator policies follow:
//! its IAM path and its account-role prefix.

use stsroles_core::arn::validate_role_arn;
use stsroles_core::naming::account_prefix_from_installer;
use stsroles_core::{EngineError, EngineResult, PolicyVersion, RoleDescriptor, tags};

/// What the engine needs to know about the installer role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallerRole {
    pub arn: String,
    pub name: String,
    pub partition: String,
    pub account_id: String,
    /// IAM path shared by the installer role, operator roles and operator policies.
    pub path: String,
    /// Prefix of the account-level operator policies.
    pub policy_prefix: String,
    pub version: Option<PolicyVersion>,
    /// Account roles backed by AWS managed policies carry no version constraint.
    pub managed_policies: bool,
}

impl InstallerRole {
    /// Conventions readable from the ARN alone.
    pub fn from_arn(flag: &str, arn: &str) -> EngineResult<Self> {
        let (parsed, path, name) = validate_role_arn(flag, arn)?;
        let policy_prefix = account_prefix_from_installer(&name)
            .unwrap_or(name.as_str())
            .to_string();
        Ok(Self {
            arn: arn.to_string(),
            partition: parsed.partition,
            account_id: parsed.account_id,
            path,
            name,
            policy_prefix,
            version: None,
            managed_policies: false,
        })
    }

    /// Merge what the account reports about the role.
    ///
    /// Tags win over the name-derived prefix; the path stays the ARN's.
    pub fn with_descriptor(mut self, role: &RoleDescriptor) -> Self {
        if let Some(prefix) = role.tag(tags::ROLE_PREFIX).filter(|p| !p.is_empty()) {
            self.policy_prefix = prefix.to_string();
        }
        self.version = role
            .tag(tags::OPENSHIFT_VERSION)
            .and_then(|v| v.parse().ok());
        self.managed_policies = role
            .tag(tags::MANAGED_POLICIES)
            .is_some_and(|v| v.eq_ignore_ascii_case("true"));
        self
    }

    /// Fail unless this role supports `required`.
    pub fn ensure_compatible(&self, required: PolicyVersion) -> EngineResult<()> {
        if self.managed_policies {
            tracing::debug!(role = %self.name, "installer role uses managed policies");
            return Ok(());
        }
        match self.version {
            Some(found) if found >= required => Ok(()),
            found => Err(EngineError::InstallerRoleIncompatible {
                role: self.name.clone(),
                required: required.to_string(),
                found: found
                    .map(|v| v.to_string())
                    .unwrap_or_else(|| "none".to_string()),
            }),
        }
    }
}
