//! Conversions between IAM wire shapes and engine types.

use anyhow::Context;
use aws_sdk_iam::types::{Role, Tag};
use percent_encoding::percent_decode_str;
use serde_json::Value;
use std::collections::BTreeMap;
use stsroles_core::RoleDescriptor;

/// IAM returns policy documents URL-encoded.
pub fn decode_document(raw: &str) -> anyhow::Result<Value> {
    let decoded = percent_decode_str(raw)
        .decode_utf8()
        .context("policy document is not valid UTF-8 after URL decoding")?;
    serde_json::from_str(&decoded).context("policy document is not valid JSON")
}

pub fn tags_to_map(tags: &[Tag]) -> BTreeMap<String, String> {
    tags.iter()
        .map(|t| (t.key().to_string(), t.value().to_string()))
        .collect()
}

pub fn map_to_tags(tags: &BTreeMap<String, String>) -> anyhow::Result<Vec<Tag>> {
    tags.iter()
        .map(|(key, value)| {
            Tag::builder()
                .key(key)
                .value(value)
                .build()
                .with_context(|| format!("invalid tag '{key}'"))
        })
        .collect()
}

/// A trust document that fails to decode is kept as `None`, which later reads
/// as divergent.
pub fn role_descriptor(role: &Role) -> RoleDescriptor {
    let trust_policy = role
        .assume_role_policy_document()
        .and_then(|raw| match decode_document(raw) {
            Ok(doc) => Some(doc),
            Err(e) => {
                tracing::warn!(role = role.role_name(), error = %e, "unreadable trust policy");
                None
            }
        });
    RoleDescriptor {
        name: role.role_name().to_string(),
        arn: role.arn().to_string(),
        path: role.path().to_string(),
        trust_policy,
        permissions_boundary: role
            .permissions_boundary()
            .and_then(|b| b.permissions_boundary_arn())
            .map(str::to_string),
        tags: tags_to_map(role.tags()),
    }
}
