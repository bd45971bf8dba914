//! Syntactic ARN handling.
//!
//! Nothing here talks to AWS: ARNs are parsed, validated and composed purely
//! from their text form.

use crate::error::{EngineError, EngineResult};
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

fn arn_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^arn:([a-z][a-z0-9-]*):([a-z0-9-]+):([a-z0-9-]*):(\d{12}|aws)?:(.+)$")
            .expect("static ARN pattern compiles")
    })
}

/// A parsed Amazon Resource Name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arn {
    pub partition: String,
    pub service: String,
    pub region: String,
    pub account_id: String,
    pub resource: String,
}

impl Arn {
    /// Parse `arn:partition:service:region:account:resource`.
    pub fn parse(value: &str) -> Result<Self, String> {
        if !value.starts_with("arn:") {
            return Err("does not start with 'arn:'".to_string());
        }
        let caps = arn_regex()
            .captures(value)
            .ok_or_else(|| "is not of the form arn:partition:service:region:account:resource".to_string())?;
        Ok(Self {
            partition: caps[1].to_string(),
            service: caps[2].to_string(),
            region: caps[3].to_string(),
            account_id: caps.get(4).map(|m| m.as_str().to_string()).unwrap_or_default(),
            resource: caps[5].to_string(),
        })
    }

    /// Path and name of an IAM role ARN (`role/<path>/<name>`).
    ///
    /// The path always starts and ends with `/`; a role without path gives `/`.
    pub fn role_path_and_name(&self) -> Option<(String, String)> {
        if self.service != "iam" {
            return None;
        }
        let rest = self.resource.strip_prefix("role/")?;
        match rest.rsplit_once('/') {
            Some((path, name)) if !name.is_empty() => Some((format!("/{}/", path), name.to_string())),
            None if !rest.is_empty() => Some(("/".to_string(), rest.to_string())),
            _ => None,
        }
    }
}

impl fmt::Display for Arn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "arn:{}:{}:{}:{}:{}",
            self.partition, self.service, self.region, self.account_id, self.resource
        )
    }
}

/// Validate `value` as an ARN supplied through `--<flag>`.
pub fn validate_arn(flag: &str, value: &str) -> EngineResult<Arn> {
    Arn::parse(value).map_err(|reason| EngineError::InvalidArn {
        flag: flag.to_string(),
        value: value.to_string(),
        reason,
    })
}

/// Validate an IAM role ARN and return it with its path and name.
pub fn validate_role_arn(flag: &str, value: &str) -> EngineResult<(Arn, String, String)> {
    let arn = validate_arn(flag, value)?;
    let (path, name) = arn.role_path_and_name().ok_or_else(|| EngineError::InvalidArn {
        flag: flag.to_string(),
        value: value.to_string(),
        reason: "is not an IAM role ARN".to_string(),
    })?;
    Ok((arn, path, name))
}

pub fn policy_arn(partition: &str, account_id: &str, path: &str, name: &str) -> String {
    format!("arn:{}:iam::{}:policy{}{}", partition, account_id, path, name)
}

pub fn role_arn(partition: &str, account_id: &str, path: &str, name: &str) -> String {
    format!("arn:{}:iam::{}:role{}{}", partition, account_id, path, name)
}

/// Issuer as IAM knows it: the endpoint URL without scheme or trailing slash.
pub fn oidc_issuer(endpoint_url: &str) -> String {
    endpoint_url
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_end_matches('/')
        .to_string()
}

pub fn oidc_provider_arn(partition: &str, account_id: &str, endpoint_url: &str) -> String {
    format!(
        "arn:{}:iam::{}:oidc-provider/{}",
        partition,
        account_id,
        oidc_issuer(endpoint_url)
    )
}
