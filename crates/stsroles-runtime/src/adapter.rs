use async_trait::async_trait;
use stsroles_core::{Cluster, OperatorRoleSpec, PermissionPolicy, PolicyDescriptor, RoleDescriptor};

/// Fetches cluster snapshots by ID or name.
#[async_trait]
pub trait ClusterLookup: Send + Sync {
    /// `Ok(None)` when no cluster matches `key`.
    async fn find_cluster(&self, key: &str) -> anyhow::Result<Option<Cluster>>;
}

/// Read-only view of IAM in the target account.
#[async_trait]
pub trait IamInspector: Send + Sync {
    /// `Ok(None)` when the role does not exist.
    async fn get_role(&self, name: &str) -> anyhow::Result<Option<RoleDescriptor>>;

    /// Roles whose name starts with `prefix`. Paginates internally.
    async fn list_roles(&self, prefix: &str) -> anyhow::Result<Vec<RoleDescriptor>>;

    /// Customer-managed policies under `path` whose name starts with `prefix`, with tags.
    async fn list_policies(&self, path: &str, prefix: &str)
    -> anyhow::Result<Vec<PolicyDescriptor>>;
}

/// Mutating IAM calls. Each call must be safe to repeat.
#[async_trait]
pub trait IamMutator: IamInspector {
    /// Create a managed policy and return its ARN.
    async fn create_policy(&self, policy: &PermissionPolicy) -> anyhow::Result<String>;

    /// Make `policy.document` the default version of an existing policy and retag it.
    async fn create_policy_version(&self, policy: &PermissionPolicy) -> anyhow::Result<()>;

    /// Create a role and return its ARN.
    async fn create_role(&self, spec: &OperatorRoleSpec) -> anyhow::Result<String>;

    async fn update_trust_policy(
        &self,
        role_name: &str,
        document: &serde_json::Value,
    ) -> anyhow::Result<()>;

    async fn attach_policy(&self, role_name: &str, policy_arn: &str) -> anyhow::Result<()>;
}
