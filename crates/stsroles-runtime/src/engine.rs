use crate::adapter::{ClusterLookup, IamMutator};
use crate::executor::{AutoExecutor, render_manual};
use crate::identity::{
    IdentityInput, ResolvedIdentity, complete_prefix_inputs, resolve_identity, select_identity,
};
use crate::mode::{ModeResolution, check_preset_mode, ensure_force_allowed, resolve_mode};
use crate::prompt::{self, Prompter};
use crate::reconcile::{AccountState, ExecutionPlan, reconcile};
use crate::report::{ExecutionReport, ReportSink};
use crate::request::{Invocation, non_empty};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use stsroles_core::arn::validate_arn;
use stsroles_core::naming::operator_policy_name;
use stsroles_core::{Cluster, CredentialRequest, EngineError, EngineResult, Mode, PolicyVersion};
use stsroles_planner::{PlanInput, Planner, RolePlanBuilder, default_credential_requests};
use stsroles_policy::{CompatibilityChecker, OPERATOR_ROLE_KIND, PolicyCatalog, PolicyRequirement};

/// What a run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutput {
    /// Commands for the user to run.
    Manual { commands: String },
    Auto { report: ExecutionReport },
    /// The user declined the confirmation; nothing was changed.
    Declined,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    pub mode: Mode,
    pub plan: ExecutionPlan,
    pub output: RunOutput,
    /// Follow-up hints printed after the output.
    pub notes: Vec<String>,
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        match &self.output {
            RunOutput::Auto { report } => report.is_success(),
            RunOutput::Manual { .. } | RunOutput::Declined => true,
        }
    }
}

/// Checks that need nothing but the invocation: boundary ARN syntax, identity
/// selection and a preset mode.
///
/// [`Engine::run`] starts with these. Callers can run them before building any
/// collaborator.
pub fn check_invocation(invocation: &Invocation) -> EngineResult<()> {
    if let Some(boundary) = invocation.permissions_boundary() {
        validate_arn("permissions-boundary", boundary)?;
    }
    select_identity(invocation)?;
    check_preset_mode(invocation)
}

/// Drives one invocation from raw inputs to applied (or printed) changes.
///
/// Everything that can be checked from the invocation alone is checked before
/// the first remote call, and every prompt happens before the first mutation.
pub struct Engine<S: ReportSink> {
    clusters: Arc<dyn ClusterLookup>,
    catalog: Arc<dyn PolicyCatalog>,
    iam: Arc<dyn IamMutator>,
    prompter: Arc<dyn Prompter>,
    planner: Box<dyn Planner>,
    sink: S,
    credential_requests: Vec<CredentialRequest>,
}

impl<S: ReportSink> Engine<S> {
    pub fn new(
        clusters: Arc<dyn ClusterLookup>,
        catalog: Arc<dyn PolicyCatalog>,
        iam: Arc<dyn IamMutator>,
        prompter: Arc<dyn Prompter>,
        sink: S,
    ) -> Self {
        Self {
            clusters,
            catalog,
            iam,
            prompter,
            planner: Box::new(RolePlanBuilder),
            sink,
            credential_requests: default_credential_requests(),
        }
    }

    pub fn with_planner(mut self, planner: Box<dyn Planner>) -> Self {
        self.planner = planner;
        self
    }

    pub fn with_credential_requests(mut self, requests: Vec<CredentialRequest>) -> Self {
        self.credential_requests = requests;
        self
    }

    pub async fn run(&self, invocation: &Invocation) -> EngineResult<RunOutcome> {
        let prompter = self.prompter.as_ref();

        check_invocation(invocation)?;
        let identity_input = select_identity(invocation)?;
        let ModeResolution { mode, interactive } = resolve_mode(invocation, prompter).await?;
        let force = invocation.force_policy_creation();
        ensure_force_allowed(force, mode)?;

        let identity_input = match identity_input {
            IdentityInput::Prefix(inputs) => IdentityInput::Prefix(
                complete_prefix_inputs(inputs, interactive, prompter).await?,
            ),
            cluster => cluster,
        };

        let mut boundary = invocation.permissions_boundary().map(str::to_string);
        if interactive {
            let answer = prompter
                .ask_string(
                    "Permissions boundary ARN (optional)",
                    boundary.as_deref().unwrap_or_default(),
                    &[prompt::optional_arn],
                )
                .await?;
            boundary = non_empty(Some(&answer)).map(str::to_string);
            if let Some(boundary) = &boundary {
                validate_arn("permissions-boundary", boundary)?;
            }
        }

        tracing::info!(%mode, interactive, force, "inputs resolved");

        let identity =
            resolve_identity(&identity_input, self.clusters.as_ref(), self.iam.as_ref()).await?;
        if boundary.is_none() {
            boundary = identity
                .cluster
                .as_ref()
                .and_then(|c| c.sts.as_ref())
                .and_then(|sts| sts.permissions_boundary.clone());
        }

        let policies = self
            .catalog
            .get_policies(OPERATOR_ROLE_KIND)
            .await
            .map_err(|e| EngineError::remote("GetPolicies", format!("{e:#}")))?;
        let required = match &identity.cluster {
            Some(cluster) => cluster_version(cluster)?,
            None => self
                .catalog
                .get_default_version()
                .await
                .map_err(|e| EngineError::remote("GetDefaultVersion", format!("{e:#}")))?,
        };

        identity.installer.ensure_compatible(required)?;

        let requests: Vec<CredentialRequest> = self
            .credential_requests
            .iter()
            .filter(|req| req.applies_to(identity.topology))
            .cloned()
            .collect();
        let requirements: Vec<PolicyRequirement> = requests
            .iter()
            .map(|req| PolicyRequirement {
                operator: req.operator.clone(),
                policy_name: operator_policy_name(&identity.installer.policy_prefix, &req.operator),
            })
            .collect();

        let deployed = self
            .iam
            .list_policies(&identity.installer.path, &identity.installer.policy_prefix)
            .await
            .map_err(|e| EngineError::remote("ListPolicies", format!("{e:#}")))?;
        let compatibility = CompatibilityChecker::new(required).check(&requirements, &deployed);
        let overwrite: BTreeSet<_> = compatibility.enforce(force)?.into_iter().collect();

        let specs = self
            .planner
            .plan(&plan_input(&identity, boundary, required, policies, requests))?;

        let roles = self
            .iam
            .list_roles(&identity.prefix)
            .await
            .map_err(|e| EngineError::remote("ListRoles", format!("{e:#}")))?;
        let account = AccountState::new(roles, compatibility.existing);
        let plan = reconcile(specs, &account, &overwrite, force);

        let notes = notes(&identity);

        let output = match mode {
            Mode::Manual => RunOutput::Manual {
                commands: render_manual(&plan),
            },
            Mode::Auto => {
                if interactive && !invocation.assume_yes() && !plan.is_empty() {
                    let pending = plan.roles.iter().filter(|r| !r.steps.is_empty()).count();
                    let question = format!("Create {pending} operator roles?");
                    if !prompter.confirm(&question).await? {
                        return Ok(RunOutcome {
                            mode,
                            plan,
                            output: RunOutput::Declined,
                            notes,
                        });
                    }
                }
                let report = AutoExecutor::new(self.iam.as_ref(), &self.sink)
                    .execute(&plan)
                    .await;
                RunOutput::Auto { report }
            }
        };

        Ok(RunOutcome {
            mode,
            plan,
            output,
            notes,
        })
    }
}

fn cluster_version(cluster: &Cluster) -> EngineResult<PolicyVersion> {
    cluster.version.parse().map_err(|e| {
        EngineError::remote(
            "ReadClusterVersion",
            format!("cluster '{}' reports version '{}': {e}", cluster.name, cluster.version),
        )
    })
}

fn plan_input(
    identity: &ResolvedIdentity,
    permissions_boundary: Option<String>,
    version: PolicyVersion,
    policies: BTreeMap<String, serde_json::Value>,
    credential_requests: Vec<CredentialRequest>,
) -> PlanInput {
    PlanInput {
        prefix: identity.prefix.clone(),
        policy_prefix: identity.installer.policy_prefix.clone(),
        partition: identity.installer.partition.clone(),
        account_id: identity.installer.account_id.clone(),
        oidc_endpoint_url: identity.oidc_endpoint_url.clone(),
        path: identity.installer.path.clone(),
        topology: identity.topology,
        permissions_boundary,
        version,
        cluster_id: identity.cluster_id().map(str::to_string),
        policies,
        credential_requests,
    }
}

fn notes(identity: &ResolvedIdentity) -> Vec<String> {
    match &identity.cluster {
        Some(cluster) if !identity.byo_oidc => vec![format!(
            "The OIDC provider for cluster '{}' is managed by the cluster; \
             run 'rosa create oidc-provider --cluster {}' if it does not exist yet",
            cluster.name, cluster.name
        )],
        _ => Vec::new(),
    }
}
