//! IAM adapter backed by `aws-sdk-iam`.
//!
//! List calls page with `Marker`/`MaxItems` through
//! [`collect_pages`](stsroles_core::paginate::collect_pages). Missing entities
//! come back as `None` rather than errors.

pub mod document;

use async_trait::async_trait;
use aws_sdk_iam::Client;
use aws_sdk_iam::error::DisplayErrorContext;
use aws_sdk_iam::types::{Policy, PolicyScopeType, Role};
use std::collections::BTreeMap;
use std::future::Future;
use stsroles_core::config::aws::MAX_IAM_PAGE_SIZE;
use stsroles_core::paginate::{Page, PageLimits, collect_pages};
use stsroles_core::{
    AwsConfig, OperatorRoleSpec, PermissionPolicy, PolicyDescriptor, RoleDescriptor,
};
use stsroles_runtime::{IamInspector, IamMutator};

use document::{map_to_tags, role_descriptor, tags_to_map};

/// IAM keeps at most this many versions per managed policy.
pub const MAX_POLICY_VERSIONS: usize = 5;

pub struct AwsIam {
    client: Client,
    limits: PageLimits,
}

impl AwsIam {
    pub fn new(client: Client, limits: PageLimits) -> Self {
        let limits = PageLimits {
            page_size: limits.page_size.clamp(1, MAX_IAM_PAGE_SIZE),
            ..limits
        };
        Self { client, limits }
    }

    /// Client from the SDK's default credential chain, honoring region and profile overrides.
    pub async fn from_config(config: &AwsConfig) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(region) = &config.region {
            loader = loader.region(aws_config::Region::new(region.clone()));
        }
        if let Some(profile) = &config.profile {
            loader = loader.profile_name(profile);
        }
        let sdk_config = loader.load().await;
        Self::new(Client::new(&sdk_config), config.page_limits())
    }

    fn max_items(&self) -> i32 {
        i32::try_from(self.limits.page_size).unwrap_or(MAX_IAM_PAGE_SIZE as i32)
    }

    async fn policy_tags(&self, arn: &str) -> anyhow::Result<BTreeMap<String, String>> {
        let output = self
            .client
            .list_policy_tags()
            .policy_arn(arn)
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("ListPolicyTags {arn}: {}", DisplayErrorContext(&e)))?;
        Ok(tags_to_map(output.tags()))
    }

    /// Delete the oldest non-default version once the version cap is reached.
    async fn prune_policy_versions(&self, arn: &str) -> anyhow::Result<()> {
        let output = self
            .client
            .list_policy_versions()
            .policy_arn(arn)
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("ListPolicyVersions {arn}: {}", DisplayErrorContext(&e)))?;

        let versions = output.versions();
        if versions.len() < MAX_POLICY_VERSIONS {
            return Ok(());
        }

        let oldest = versions
            .iter()
            .filter(|v| !v.is_default_version())
            .min_by_key(|v| v.create_date().map(|d| (d.secs(), d.subsec_nanos())))
            .and_then(|v| v.version_id());

        if let Some(version_id) = oldest {
            tracing::debug!(policy = arn, version = version_id, "pruning policy version");
            self.client
                .delete_policy_version()
                .policy_arn(arn)
                .version_id(version_id)
                .send()
                .await
                .map_err(|e| {
                    anyhow::anyhow!("DeletePolicyVersion {arn}: {}", DisplayErrorContext(&e))
                })?;
        }
        Ok(())
    }
}

#[async_trait]
impl IamInspector for AwsIam {
    async fn get_role(&self, name: &str) -> anyhow::Result<Option<RoleDescriptor>> {
        match self.client.get_role().role_name(name).send().await {
            Ok(output) => Ok(output.role().map(role_descriptor)),
            Err(e)
                if e.as_service_error()
                    .is_some_and(|se| se.is_no_such_entity_exception()) =>
            {
                Ok(None)
            }
            Err(e) => Err(anyhow::anyhow!("GetRole {name}: {}", DisplayErrorContext(&e))),
        }
    }

    async fn list_roles(&self, prefix: &str) -> anyhow::Result<Vec<RoleDescriptor>> {
        let roles = collect_prefixed(self.limits, prefix, raw_role_name, |_, marker| async move {
            let output = self
                .client
                .list_roles()
                .max_items(self.max_items())
                .set_marker(marker)
                .send()
                .await
                .map_err(|e| anyhow::anyhow!("ListRoles: {}", DisplayErrorContext(&e)))?;
            Ok::<_, anyhow::Error>(Page {
                items: output.roles().to_vec(),
                next: output.marker().map(str::to_string),
                more: output.is_truncated(),
            })
        })
        .await?;
        tracing::debug!(prefix, count = roles.len(), "listed roles");
        Ok(roles.iter().map(role_descriptor).collect())
    }

    async fn list_policies(
        &self,
        path: &str,
        prefix: &str,
    ) -> anyhow::Result<Vec<PolicyDescriptor>> {
        let listed = collect_prefixed(self.limits, prefix, raw_policy_name, |_, marker| async move {
            let output = self
                .client
                .list_policies()
                .scope(PolicyScopeType::Local)
                .path_prefix(path)
                .max_items(self.max_items())
                .set_marker(marker)
                .send()
                .await
                .map_err(|e| anyhow::anyhow!("ListPolicies: {}", DisplayErrorContext(&e)))?;
            Ok::<_, anyhow::Error>(Page {
                items: output.policies().to_vec(),
                next: output.marker().map(str::to_string),
                more: output.is_truncated(),
            })
        })
        .await?;

        let mut policies = Vec::with_capacity(listed.len());
        for policy in &listed {
            let (Some(name), Some(arn)) = (policy.policy_name(), policy.arn()) else {
                continue;
            };
            policies.push(PolicyDescriptor {
                name: name.to_string(),
                arn: arn.to_string(),
                path: policy.path().unwrap_or(path).to_string(),
                tags: self.policy_tags(arn).await?,
            });
        }
        tracing::debug!(path, prefix, count = policies.len(), "listed policies");
        Ok(policies)
    }
}

fn raw_role_name(role: &Role) -> Option<&str> {
    Some(role.role_name())
}

fn raw_policy_name(policy: &Policy) -> Option<&str> {
    policy.policy_name()
}

/// Collect every page of a list call, then keep the items named with `prefix`.
///
/// Pages reach [`collect_pages`] unfiltered: it ends the loop on a short page,
/// and a page of other entities is still a full one.
async fn collect_prefixed<T, F, Fut>(
    limits: PageLimits,
    prefix: &str,
    name: fn(&T) -> Option<&str>,
    fetch: F,
) -> anyhow::Result<Vec<T>>
where
    F: FnMut(usize, Option<String>) -> Fut,
    Fut: Future<Output = anyhow::Result<Page<T>>>,
{
    let items = collect_pages(limits, fetch).await?;
    Ok(items
        .into_iter()
        .filter(|item| name(item).is_some_and(|n| n.starts_with(prefix)))
        .collect())
}

#[async_trait]
impl IamMutator for AwsIam {
    async fn create_policy(&self, policy: &PermissionPolicy) -> anyhow::Result<String> {
        self.client
            .create_policy()
            .policy_name(&policy.name)
            .path(&policy.path)
            .policy_document(policy.document.to_string())
            .set_tags(Some(map_to_tags(&policy.tags)?))
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("CreatePolicy {}: {}", policy.name, DisplayErrorContext(&e)))?;
        Ok(policy.arn.clone())
    }

    async fn create_policy_version(&self, policy: &PermissionPolicy) -> anyhow::Result<()> {
        self.prune_policy_versions(&policy.arn).await?;
        self.client
            .create_policy_version()
            .policy_arn(&policy.arn)
            .policy_document(policy.document.to_string())
            .set_as_default(true)
            .send()
            .await
            .map_err(|e| {
                anyhow::anyhow!("CreatePolicyVersion {}: {}", policy.name, DisplayErrorContext(&e))
            })?;
        self.client
            .tag_policy()
            .policy_arn(&policy.arn)
            .set_tags(Some(map_to_tags(&policy.tags)?))
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("TagPolicy {}: {}", policy.name, DisplayErrorContext(&e)))?;
        Ok(())
    }

    async fn create_role(&self, spec: &OperatorRoleSpec) -> anyhow::Result<String> {
        self.client
            .create_role()
            .role_name(&spec.role_name)
            .path(&spec.path)
            .assume_role_policy_document(spec.trust_policy.to_string())
            .set_permissions_boundary(spec.permissions_boundary.clone())
            .set_tags(Some(map_to_tags(&spec.tags)?))
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("CreateRole {}: {}", spec.role_name, DisplayErrorContext(&e)))?;
        Ok(spec.role_arn.clone())
    }

    async fn update_trust_policy(
        &self,
        role_name: &str,
        document: &serde_json::Value,
    ) -> anyhow::Result<()> {
        self.client
            .update_assume_role_policy()
            .role_name(role_name)
            .policy_document(document.to_string())
            .send()
            .await
            .map_err(|e| {
                anyhow::anyhow!("UpdateAssumeRolePolicy {role_name}: {}", DisplayErrorContext(&e))
            })?;
        Ok(())
    }

    async fn attach_policy(&self, role_name: &str, policy_arn: &str) -> anyhow::Result<()> {
        self.client
            .attach_role_policy()
            .role_name(role_name)
            .policy_arn(policy_arn)
            .send()
            .await
            .map_err(|e| {
                anyhow::anyhow!("AttachRolePolicy {role_name}: {}", DisplayErrorContext(&e))
            })?;
        Ok(())
    }
}
