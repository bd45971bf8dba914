//! IAM naming conventions for operator roles and policies.

use crate::OperatorKey;

/// IAM limit on role names.
pub const MAX_ROLE_NAME_LEN: usize = 64;
/// IAM limit on managed policy names.
pub const MAX_POLICY_NAME_LEN: usize = 128;

const INSTALLER_ROLE_SUFFIXES: [&str; 2] = ["-HCP-ROSA-Installer-Role", "-Installer-Role"];

/// `<prefix>-<namespace>-<name>`, truncated to the IAM role name limit.
pub fn operator_role_name(prefix: &str, operator: &OperatorKey) -> String {
    truncate(
        format!("{}-{}-{}", prefix, operator.namespace, operator.name),
        MAX_ROLE_NAME_LEN,
    )
}

/// `<policy_prefix>-<namespace>-<name>`, truncated to the IAM policy name limit.
pub fn operator_policy_name(policy_prefix: &str, operator: &OperatorKey) -> String {
    truncate(
        format!("{}-{}-{}", policy_prefix, operator.namespace, operator.name),
        MAX_POLICY_NAME_LEN,
    )
}

/// Account-role prefix implied by an installer role name, if it follows the convention.
pub fn account_prefix_from_installer(role_name: &str) -> Option<&str> {
    INSTALLER_ROLE_SUFFIXES
        .iter()
        .find_map(|suffix| role_name.strip_suffix(suffix))
        .filter(|prefix| !prefix.is_empty())
}

fn truncate(mut name: String, max: usize) -> String {
    if name.len() > max {
        // names are ASCII, byte truncation is safe
        name.truncate(max);
    }
    name
}
