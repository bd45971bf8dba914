//! Diff a role plan against what the account already holds.

use std::collections::{BTreeMap, BTreeSet};
use stsroles_core::{OperatorKey, OperatorRoleSpec, PermissionPolicy, PolicyDescriptor, RoleDescriptor};
use stsroles_planner::documents_equivalent;

/// One IAM change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    CreatePolicy { policy: PermissionPolicy },
    /// Overwrite an outdated policy with a new default version.
    CreatePolicyVersion { policy: PermissionPolicy },
    CreateRole { spec: OperatorRoleSpec },
    UpdateTrustPolicy {
        role_name: String,
        document: serde_json::Value,
    },
    AttachPolicy { role_name: String, policy_arn: String },
}

impl Step {
    /// IAM API the step maps to.
    pub fn operation(&self) -> &'static str {
        match self {
            Step::CreatePolicy { .. } => "CreatePolicy",
            Step::CreatePolicyVersion { .. } => "CreatePolicyVersion",
            Step::CreateRole { .. } => "CreateRole",
            Step::UpdateTrustPolicy { .. } => "UpdateAssumeRolePolicy",
            Step::AttachPolicy { .. } => "AttachRolePolicy",
        }
    }
}

/// Steps for one operator, executed in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RolePlan {
    pub spec: OperatorRoleSpec,
    /// Whether the role is already present in the account.
    pub exists: bool,
    pub steps: Vec<Step>,
}

/// An existing role whose trust policy differs and was left untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustDrift {
    pub operator: OperatorKey,
    pub role_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionPlan {
    pub roles: Vec<RolePlan>,
    pub drift: Vec<TrustDrift>,
}

impl ExecutionPlan {
    pub fn steps(&self) -> impl Iterator<Item = &Step> {
        self.roles.iter().flat_map(|r| r.steps.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.steps().next().is_none()
    }
}

/// What the account already holds, keyed for lookup.
#[derive(Debug, Clone, Default)]
pub struct AccountState {
    pub roles: BTreeMap<String, RoleDescriptor>,
    /// Deployed policies by the operator they serve.
    pub policies: BTreeMap<OperatorKey, PolicyDescriptor>,
}

impl AccountState {
    pub fn new(
        roles: Vec<RoleDescriptor>,
        policies: BTreeMap<OperatorKey, PolicyDescriptor>,
    ) -> Self {
        Self {
            roles: roles.into_iter().map(|r| (r.name.clone(), r)).collect(),
            policies,
        }
    }
}

/// Turn specs into steps.
///
/// * Missing policy: create it. Outdated policy in `overwrite`: new version.
/// * Missing role: create it.
/// * Existing role with an equivalent trust policy: attach only.
/// * Divergent trust policy: replaced when `force`, otherwise reported as
///   drift and the operator gets no steps at all.
pub fn reconcile(
    specs: Vec<OperatorRoleSpec>,
    account: &AccountState,
    overwrite: &BTreeSet<OperatorKey>,
    force: bool,
) -> ExecutionPlan {
    let mut plan = ExecutionPlan::default();

    for spec in specs {
        let mut steps = Vec::new();

        match account.policies.get(&spec.operator) {
            None => steps.push(Step::CreatePolicy {
                policy: spec.permission_policy.clone(),
            }),
            Some(_) if overwrite.contains(&spec.operator) => {
                steps.push(Step::CreatePolicyVersion {
                    policy: spec.permission_policy.clone(),
                })
            }
            Some(_) => {}
        }

        let existing = account.roles.get(&spec.role_name);
        match existing {
            None => steps.push(Step::CreateRole { spec: spec.clone() }),
            Some(role) => {
                let equivalent = role
                    .trust_policy
                    .as_ref()
                    .is_some_and(|deployed| documents_equivalent(&spec.trust_policy, deployed));
                if !equivalent {
                    if !force {
                        tracing::warn!(
                            role = %spec.role_name,
                            "existing role trusts a different identity provider; leaving it unchanged"
                        );
                        plan.drift.push(TrustDrift {
                            operator: spec.operator.clone(),
                            role_name: spec.role_name.clone(),
                        });
                        plan.roles.push(RolePlan {
                            spec,
                            exists: true,
                            steps: Vec::new(),
                        });
                        continue;
                    }
                    steps.push(Step::UpdateTrustPolicy {
                        role_name: spec.role_name.clone(),
                        document: spec.trust_policy.clone(),
                    });
                }
            }
        }

        steps.push(Step::AttachPolicy {
            role_name: spec.role_name.clone(),
            policy_arn: spec.permission_policy.arn.clone(),
        });

        plan.roles.push(RolePlan {
            exists: existing.is_some(),
            spec,
            steps,
        });
    }

    plan
}
