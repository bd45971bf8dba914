//! Role plan builder.
//!
//! Turns a resolved identity and the catalog's policy documents into the
//! ordered list of [`OperatorRoleSpec`]s a run creates. Building is pure: the
//! same input always yields the same specs in the same order.

pub mod credentials;
pub mod trust;

use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use stsroles_core::arn::{policy_arn, role_arn, validate_arn};
use stsroles_core::naming::{operator_policy_name, operator_role_name};
use stsroles_core::{
    CredentialRequest, EngineError, EngineResult, OperatorRoleSpec, PermissionPolicy,
    PolicyVersion, Topology, tags,
};

pub use credentials::{credential_requests_for, default_credential_requests};
pub use trust::{documents_equivalent, operator_trust_policy};

/// Everything the builder needs, already resolved.
#[derive(Debug, Clone)]
pub struct PlanInput {
    /// Operator role name prefix.
    pub prefix: String,
    /// Prefix of the account-level operator policies.
    pub policy_prefix: String,
    pub partition: String,
    pub account_id: String,
    pub oidc_endpoint_url: String,
    /// IAM path for roles and policies.
    pub path: String,
    pub topology: Topology,
    pub permissions_boundary: Option<String>,
    /// Version new policies are tagged with.
    pub version: PolicyVersion,
    pub cluster_id: Option<String>,
    /// Catalog documents keyed by catalog key.
    pub policies: BTreeMap<String, Value>,
    /// Candidate operators; filtered by topology.
    pub credential_requests: Vec<CredentialRequest>,
}

/// Builds an ordered plan from a [`PlanInput`].
pub trait Planner: Send + Sync {
    fn plan(&self, input: &PlanInput) -> EngineResult<Vec<OperatorRoleSpec>>;
}

/// The default planner.
#[derive(Debug, Clone, Copy, Default)]
pub struct RolePlanBuilder;

impl Planner for RolePlanBuilder {
    fn plan(&self, input: &PlanInput) -> EngineResult<Vec<OperatorRoleSpec>> {
        if let Some(boundary) = &input.permissions_boundary {
            validate_arn("permissions-boundary", boundary)?;
        }

        let mut requests: Vec<&CredentialRequest> = input
            .credential_requests
            .iter()
            .filter(|req| req.applies_to(input.topology))
            .collect();
        requests.sort_by(|a, b| a.operator.cmp(&b.operator));

        let mut seen = BTreeSet::new();
        let mut specs = Vec::with_capacity(requests.len());

        for request in requests {
            let spec = build_spec(input, request)?;
            if !seen.insert(spec.role_name.clone()) {
                return Err(EngineError::DuplicateRoleName(spec.role_name));
            }
            specs.push(spec);
        }

        tracing::debug!(
            roles = specs.len(),
            topology = ?input.topology,
            prefix = %input.prefix,
            "built operator role plan"
        );
        Ok(specs)
    }
}

fn build_spec(input: &PlanInput, request: &CredentialRequest) -> EngineResult<OperatorRoleSpec> {
    let catalog_key = request.catalog_key(input.topology);
    let document = input
        .policies
        .get(&catalog_key)
        .ok_or_else(|| EngineError::not_found("policy catalog entry", catalog_key.clone()))?;
    let document = substitute_partition(document, &input.partition);

    let role_tags = spec_tags(input, request);

    let policy_name = operator_policy_name(&input.policy_prefix, &request.operator);
    let permission_policy = PermissionPolicy {
        arn: policy_arn(&input.partition, &input.account_id, &input.path, &policy_name),
        name: policy_name,
        path: input.path.clone(),
        document,
        version: input.version,
        tags: policy_tags(input, request),
    };

    let role_name = operator_role_name(&input.prefix, &request.operator);
    Ok(OperatorRoleSpec {
        operator: request.operator.clone(),
        role_arn: role_arn(&input.partition, &input.account_id, &input.path, &role_name),
        role_name,
        path: input.path.clone(),
        trust_policy: operator_trust_policy(
            &input.partition,
            &input.account_id,
            &input.oidc_endpoint_url,
            request,
        ),
        permission_policy,
        permissions_boundary: input.permissions_boundary.clone(),
        tags: role_tags,
    })
}

fn policy_tags(input: &PlanInput, request: &CredentialRequest) -> BTreeMap<String, String> {
    let mut out = BTreeMap::from([
        (tags::OPENSHIFT_VERSION.to_string(), input.version.to_string()),
        (tags::ROLE_PREFIX.to_string(), input.policy_prefix.clone()),
        (
            tags::OPERATOR_NAMESPACE.to_string(),
            request.operator.namespace.clone(),
        ),
        (tags::OPERATOR_NAME.to_string(), request.operator.name.clone()),
        (tags::RED_HAT_MANAGED.to_string(), "true".to_string()),
    ]);
    if input.topology == Topology::HostedCp {
        out.insert(tags::HCP_POLICIES.to_string(), "true".to_string());
    }
    out
}

fn spec_tags(input: &PlanInput, request: &CredentialRequest) -> BTreeMap<String, String> {
    let mut out = policy_tags(input, request);
    out.insert(tags::ROLE_PREFIX.to_string(), input.prefix.clone());
    if let Some(cluster_id) = &input.cluster_id {
        out.insert(tags::CLUSTER_ID.to_string(), cluster_id.clone());
    }
    out
}

/// Catalog documents use `%{partition}` where the ARN partition goes.
fn substitute_partition(document: &Value, partition: &str) -> Value {
    match document {
        Value::String(s) => Value::String(s.replace("%{partition}", partition)),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|v| substitute_partition(v, partition))
                .collect(),
        ),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), substitute_partition(v, partition)))
                .collect(),
        ),
        other => other.clone(),
    }
}
