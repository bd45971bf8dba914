//! Version compatibility of deployed operator policies.
//!
//! A deployed policy is compatible when its version tag is at least the
//! required version. Operators without a deployed policy are compatible: their
//! policy will be created at the required version. Verdicts are computed fresh
//! from the listed policies on every run.

use std::collections::BTreeMap;
use stsroles_core::{
    CompatibilityVerdict, EngineError, EngineResult, OperatorKey, PolicyDescriptor, PolicyVersion,
};

/// One operator whose policy must be present at the required version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyRequirement {
    pub operator: OperatorKey,
    /// Name the operator's policy has, or will have, in the account.
    pub policy_name: String,
}

/// Verdicts for every required operator plus the deployed policies they refer to.
#[derive(Debug, Clone, Default)]
pub struct CompatibilityReport {
    pub required: Option<PolicyVersion>,
    pub verdicts: Vec<CompatibilityVerdict>,
    pub existing: BTreeMap<OperatorKey, PolicyDescriptor>,
}

impl CompatibilityReport {
    pub fn incompatible(&self) -> impl Iterator<Item = &CompatibilityVerdict> {
        self.verdicts.iter().filter(|v| !v.compatible)
    }

    /// Apply the force rule.
    ///
    /// Without force any incompatible verdict aborts the run. With force the
    /// verdicts become warnings and the returned operators get their policies
    /// overwritten.
    pub fn enforce(&self, force: bool) -> EngineResult<Vec<OperatorKey>> {
        let incompatible: Vec<&CompatibilityVerdict> = self.incompatible().collect();
        if incompatible.is_empty() {
            return Ok(Vec::new());
        }

        let required = self
            .required
            .map(|v| v.to_string())
            .unwrap_or_default();

        if !force {
            return Err(EngineError::IncompatiblePolicies {
                required,
                operators: incompatible.iter().map(|v| v.operator.to_string()).collect(),
            });
        }

        for verdict in &incompatible {
            tracing::warn!(
                operator = %verdict.operator,
                reason = %verdict.reason,
                "forcing policy overwrite"
            );
        }
        Ok(incompatible.into_iter().map(|v| v.operator.clone()).collect())
    }
}

/// Compares deployed policies against the version a run requires.
#[derive(Debug, Clone, Copy)]
pub struct CompatibilityChecker {
    required: PolicyVersion,
}

impl CompatibilityChecker {
    pub fn new(required: PolicyVersion) -> Self {
        Self { required }
    }

    pub fn required(&self) -> PolicyVersion {
        self.required
    }

    /// Verdict for one policy given its deployed state.
    pub fn verdict(
        &self,
        operator: &OperatorKey,
        deployed: Option<&PolicyDescriptor>,
    ) -> CompatibilityVerdict {
        let (compatible, reason) = match deployed {
            None => (true, "policy not deployed; will be created".to_string()),
            Some(policy) => match policy.version() {
                Some(found) if found >= self.required => (
                    true,
                    format!("policy '{}' has version {}", policy.name, found),
                ),
                Some(found) => (
                    false,
                    format!(
                        "policy '{}' has version {}, {} is required",
                        policy.name, found, self.required
                    ),
                ),
                None => (
                    false,
                    format!("policy '{}' carries no usable version tag", policy.name),
                ),
            },
        };
        CompatibilityVerdict {
            operator: operator.clone(),
            compatible,
            reason,
        }
    }

    /// Check every requirement against the policies listed under the target prefix.
    pub fn check(
        &self,
        requirements: &[PolicyRequirement],
        deployed: &[PolicyDescriptor],
    ) -> CompatibilityReport {
        let by_name: BTreeMap<&str, &PolicyDescriptor> =
            deployed.iter().map(|p| (p.name.as_str(), p)).collect();

        let mut report = CompatibilityReport {
            required: Some(self.required),
            ..Default::default()
        };

        for requirement in requirements {
            let existing = by_name.get(requirement.policy_name.as_str()).copied();
            let verdict = self.verdict(&requirement.operator, existing);
            tracing::debug!(
                operator = %verdict.operator,
                compatible = verdict.compatible,
                reason = %verdict.reason,
                "policy compatibility"
            );
            if let Some(policy) = existing {
                report
                    .existing
                    .insert(requirement.operator.clone(), policy.clone());
            }
            report.verdicts.push(verdict);
        }

        report
    }
}
