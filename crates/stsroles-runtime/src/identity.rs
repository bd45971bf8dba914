//! Identity resolution: which cluster, or which prefix, the roles are for.
//!
//! Selection and prompting ([`select_identity`], [`complete_prefix_inputs`])
//! are local. [`resolve_identity`] is the first step that reaches out to OCM
//! or IAM.

use crate::adapter::{ClusterLookup, IamInspector};
use crate::prompt::{self, Prompter};
use crate::request::{Invocation, non_empty};
use stsroles_core::arn::validate_role_arn;
use stsroles_core::{Cluster, EngineError, EngineResult, Topology};
use stsroles_policy::InstallerRole;

/// Identity as named by the invocation, before any lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityInput {
    Cluster { key: String },
    Prefix(PrefixInputs),
}

/// Prefix-path fields. Required ones may still be missing until
/// [`complete_prefix_inputs`] runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrefixInputs {
    pub prefix: String,
    pub oidc_endpoint_url: Option<String>,
    pub installer_role_arn: Option<String>,
    pub hosted_cp: bool,
}

/// Identity after lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedIdentity {
    /// Operator role name prefix.
    pub prefix: String,
    pub oidc_endpoint_url: String,
    pub installer: InstallerRole,
    pub topology: Topology,
    /// Set on the cluster path only.
    pub cluster: Option<Cluster>,
    /// Set when the cluster reuses an OIDC provider it did not create.
    pub byo_oidc: bool,
}

impl ResolvedIdentity {
    pub fn cluster_id(&self) -> Option<&str> {
        self.cluster.as_ref().map(|c| c.id.as_str())
    }
}

/// Exactly one of cluster key and prefix must be present.
pub fn select_identity(invocation: &Invocation) -> EngineResult<IdentityInput> {
    match invocation {
        Invocation::Programmatic(req) => match non_empty(Some(&req.cluster_key)) {
            Some(key) => Ok(IdentityInput::Cluster {
                key: key.to_string(),
            }),
            None => Err(EngineError::AmbiguousIdentity),
        },
        Invocation::Flags(flags) => {
            match (
                non_empty(flags.cluster.as_deref()),
                non_empty(flags.prefix.as_deref()),
            ) {
                (Some(key), None) => Ok(IdentityInput::Cluster {
                    key: key.to_string(),
                }),
                (None, Some(prefix)) => Ok(IdentityInput::Prefix(PrefixInputs {
                    prefix: prefix.to_string(),
                    oidc_endpoint_url: non_empty(flags.oidc_endpoint_url.as_deref())
                        .map(str::to_string),
                    installer_role_arn: non_empty(flags.installer_role_arn.as_deref())
                        .map(str::to_string),
                    hosted_cp: flags.hosted_cp,
                })),
                _ => Err(EngineError::AmbiguousIdentity),
            }
        }
    }
}

/// Fill in prefix-path fields, prompting when allowed, then require them.
///
/// Interactive runs ask for the prefix (defaulting to the flag value), the
/// OIDC endpoint URL and the installer role ARN, in that order.
pub async fn complete_prefix_inputs(
    mut inputs: PrefixInputs,
    interactive: bool,
    prompter: &dyn Prompter,
) -> EngineResult<PrefixInputs> {
    if interactive {
        inputs.prefix = prompter
            .ask_string("Operator roles prefix", &inputs.prefix, &[prompt::required])
            .await?
            .trim()
            .to_string();

        let oidc = prompter
            .ask_string(
                "OIDC endpoint URL",
                inputs.oidc_endpoint_url.as_deref().unwrap_or_default(),
                &[prompt::required, prompt::https_url],
            )
            .await?;
        inputs.oidc_endpoint_url = non_empty(Some(&oidc)).map(str::to_string);

        let installer = prompter
            .ask_string(
                "Installer role ARN",
                inputs.installer_role_arn.as_deref().unwrap_or_default(),
                &[prompt::required, prompt::role_arn],
            )
            .await?;
        inputs.installer_role_arn = non_empty(Some(&installer)).map(str::to_string);
    }

    if inputs.oidc_endpoint_url.is_none() {
        return Err(EngineError::missing("oidc-endpoint-url"));
    }
    match &inputs.installer_role_arn {
        None => return Err(EngineError::missing("installer-role-arn")),
        Some(arn) => {
            validate_role_arn("installer-role-arn", arn)?;
        }
    }
    Ok(inputs)
}

/// Look up the cluster or installer role and derive the naming context.
pub async fn resolve_identity<I>(
    input: &IdentityInput,
    clusters: &dyn ClusterLookup,
    iam: &I,
) -> EngineResult<ResolvedIdentity>
where
    I: IamInspector + ?Sized,
{
    match input {
        IdentityInput::Cluster { key } => {
            let cluster = clusters
                .find_cluster(key)
                .await
                .map_err(|e| EngineError::remote("GetCluster", format!("{e:#}")))?
                .ok_or_else(|| EngineError::not_found("cluster", key.clone()))?;

            let Some(sts) = cluster.sts.clone() else {
                return Err(EngineError::InvalidCombination(format!(
                    "cluster '{}' is not an STS cluster",
                    cluster.name
                )));
            };

            let installer = load_installer(&sts.installer_role_arn, "installer-role-arn", iam).await?;
            let byo_oidc = cluster.is_byo_oidc();
            tracing::debug!(
                cluster = %cluster.id,
                prefix = %sts.operator_role_prefix,
                byo_oidc,
                "resolved cluster identity"
            );
            Ok(ResolvedIdentity {
                prefix: sts.operator_role_prefix,
                oidc_endpoint_url: sts.oidc_endpoint_url,
                installer,
                topology: Topology::from_hosted_cp(cluster.hosted_cp),
                byo_oidc,
                cluster: Some(cluster),
            })
        }
        IdentityInput::Prefix(inputs) => {
            let oidc_endpoint_url = inputs
                .oidc_endpoint_url
                .clone()
                .ok_or_else(|| EngineError::missing("oidc-endpoint-url"))?;
            let arn = inputs
                .installer_role_arn
                .as_deref()
                .ok_or_else(|| EngineError::missing("installer-role-arn"))?;
            let installer = load_installer(arn, "installer-role-arn", iam).await?;
            Ok(ResolvedIdentity {
                prefix: inputs.prefix.clone(),
                oidc_endpoint_url,
                installer,
                topology: Topology::from_hosted_cp(inputs.hosted_cp),
                cluster: None,
                byo_oidc: false,
            })
        }
    }
}

async fn load_installer<I>(arn: &str, flag: &str, iam: &I) -> EngineResult<InstallerRole>
where
    I: IamInspector + ?Sized,
{
    let installer = InstallerRole::from_arn(flag, arn)?;
    let descriptor = iam
        .get_role(&installer.name)
        .await
        .map_err(|e| EngineError::remote("GetRole", format!("{e:#}")))?
        .ok_or_else(|| EngineError::not_found("installer role", installer.name.clone()))?;
    Ok(installer.with_descriptor(&descriptor))
}
