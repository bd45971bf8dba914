//! Applying an [`ExecutionPlan`](crate::reconcile::ExecutionPlan).
//!
//! Auto mode calls IAM step by step. A failing step stops the rest of that
//! role's steps but not the other roles; failures are collected and reported
//! together. Manual mode renders the same steps as AWS CLI commands and makes
//! no mutating calls.

use crate::adapter::IamMutator;
use crate::reconcile::{ExecutionPlan, RolePlan, Step};
use crate::report::{CreatedRole, ExecutionReport, ReportSink, RoleFailure, StepEvent};
use std::collections::BTreeMap;
use std::fmt::Write as _;

pub struct AutoExecutor<'a> {
    iam: &'a dyn IamMutator,
    sink: &'a dyn ReportSink,
}

impl<'a> AutoExecutor<'a> {
    pub fn new(iam: &'a dyn IamMutator, sink: &'a dyn ReportSink) -> Self {
        Self { iam, sink }
    }

    pub async fn execute(&self, plan: &ExecutionPlan) -> ExecutionReport {
        let mut report = ExecutionReport {
            drift: plan.drift.clone(),
            ..Default::default()
        };

        for role in &plan.roles {
            if role.steps.is_empty() {
                continue;
            }
            if let Err(failure) = self.execute_role(role, &mut report).await {
                report.failures.push(failure);
            } else if role.exists && role.steps.iter().any(touches_role) {
                report.updated_roles.push(role.spec.role_name.clone());
            }
        }

        report
    }

    async fn execute_role(
        &self,
        role: &RolePlan,
        report: &mut ExecutionReport,
    ) -> Result<(), RoleFailure> {
        for step in &role.steps {
            let outcome = self.apply(step).await.map_err(|e| format!("{e:#}"));
            self.sink.record(&StepEvent {
                role_name: role.spec.role_name.clone(),
                operation: step.operation(),
                outcome: outcome.clone(),
            });

            let target = outcome.map_err(|message| RoleFailure {
                role_name: role.spec.role_name.clone(),
                operation: step.operation().to_string(),
                message,
            })?;

            match step {
                Step::CreatePolicy { policy } => report.created_policies.push(policy.name.clone()),
                Step::CreatePolicyVersion { policy } => {
                    report.updated_policies.push(policy.name.clone())
                }
                Step::CreateRole { spec } => report.created_roles.push(CreatedRole {
                    name: spec.role_name.clone(),
                    arn: target,
                }),
                Step::UpdateTrustPolicy { .. } | Step::AttachPolicy { .. } => {}
            }
        }
        Ok(())
    }

    async fn apply(&self, step: &Step) -> anyhow::Result<String> {
        match step {
            Step::CreatePolicy { policy } => self.iam.create_policy(policy).await,
            Step::CreatePolicyVersion { policy } => {
                self.iam.create_policy_version(policy).await?;
                Ok(policy.arn.clone())
            }
            Step::CreateRole { spec } => self.iam.create_role(spec).await,
            Step::UpdateTrustPolicy {
                role_name,
                document,
            } => {
                self.iam.update_trust_policy(role_name, document).await?;
                Ok(role_name.clone())
            }
            Step::AttachPolicy {
                role_name,
                policy_arn,
            } => {
                self.iam.attach_policy(role_name, policy_arn).await?;
                Ok(policy_arn.clone())
            }
        }
    }
}

fn touches_role(step: &Step) -> bool {
    matches!(
        step,
        Step::UpdateTrustPolicy { .. } | Step::AttachPolicy { .. }
    )
}

/// Render the plan as `aws iam` commands.
///
/// Commands are separated by a blank line. Each flag sits on its own
/// continuation line and JSON documents are single-quoted.
pub fn render_manual(plan: &ExecutionPlan) -> String {
    let commands: Vec<String> = plan.steps().flat_map(step_commands).collect();
    let mut out = commands.join("\n\n");
    if !out.is_empty() {
        out.push('\n');
    }
    out
}

fn step_commands(step: &Step) -> Vec<String> {
    match step {
        Step::CreatePolicy { policy } => vec![command(
            "create-policy",
            &[
                ("policy-name", policy.name.clone()),
                ("policy-document", quote_json(&policy.document)),
                ("path", policy.path.clone()),
                ("tags", render_tags(&policy.tags)),
            ],
        )],
        Step::CreatePolicyVersion { policy } => vec![
            command(
                "create-policy-version",
                &[
                    ("policy-arn", policy.arn.clone()),
                    ("policy-document", quote_json(&policy.document)),
                    ("set-as-default", String::new()),
                ],
            ),
            command(
                "tag-policy",
                &[
                    ("policy-arn", policy.arn.clone()),
                    ("tags", render_tags(&policy.tags)),
                ],
            ),
        ],
        Step::CreateRole { spec } => {
            let mut flags = vec![
                ("role-name", spec.role_name.clone()),
                ("assume-role-policy-document", quote_json(&spec.trust_policy)),
            ];
            if let Some(boundary) = &spec.permissions_boundary {
                flags.push(("permissions-boundary", boundary.clone()));
            }
            flags.push(("path", spec.path.clone()));
            flags.push(("tags", render_tags(&spec.tags)));
            vec![command("create-role", &flags)]
        }
        Step::UpdateTrustPolicy {
            role_name,
            document,
        } => vec![command(
            "update-assume-role-policy",
            &[
                ("role-name", role_name.clone()),
                ("policy-document", quote_json(document)),
            ],
        )],
        Step::AttachPolicy {
            role_name,
            policy_arn,
        } => vec![command(
            "attach-role-policy",
            &[
                ("role-name", role_name.clone()),
                ("policy-arn", policy_arn.clone()),
            ],
        )],
    }
}

/// An empty value renders a bare flag.
fn command(verb: &str, flags: &[(&str, String)]) -> String {
    let mut out = format!("aws iam {verb}");
    for (flag, value) in flags {
        out.push_str(" \\\n\t--");
        out.push_str(flag);
        if !value.is_empty() {
            out.push(' ');
            out.push_str(value);
        }
    }
    out
}

fn render_tags(tags: &BTreeMap<String, String>) -> String {
    let mut out = String::new();
    for (key, value) in tags {
        if !out.is_empty() {
            out.push(' ');
        }
        let _ = write!(out, "Key={key},Value={value}");
    }
    out
}

fn quote_json(document: &serde_json::Value) -> String {
    format!("'{}'", document.to_string().replace('\'', r"'\''"))
}
