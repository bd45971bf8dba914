//! Trust policies binding operator roles to a cluster's OIDC issuer.

use serde_json::{Map, Value, json};
use stsroles_core::arn::{oidc_issuer, oidc_provider_arn};
use stsroles_core::CredentialRequest;

/// Assume-role policy letting `request`'s service accounts federate through the issuer.
///
/// `serde_json` maps keep keys sorted, so equal inputs render to equal bytes.
pub fn operator_trust_policy(
    partition: &str,
    account_id: &str,
    oidc_endpoint_url: &str,
    request: &CredentialRequest,
) -> Value {
    let issuer = oidc_issuer(oidc_endpoint_url);
    let subjects: Vec<String> = request
        .service_accounts
        .iter()
        .map(|sa| format!("system:serviceaccount:{}:{}", request.operator.namespace, sa))
        .collect();
    let mut string_equals = Map::new();
    string_equals.insert(format!("{}:sub", issuer), json!(subjects));

    json!({
        "Version": "2012-10-17",
        "Statement": [{
            "Effect": "Allow",
            "Principal": {
                "Federated": oidc_provider_arn(partition, account_id, oidc_endpoint_url),
            },
            "Action": "sts:AssumeRoleWithWebIdentity",
            "Condition": {
                "StringEquals": string_equals,
            },
        }],
    })
}

/// Whether two policy documents grant the same thing.
///
/// IAM collapses single-element lists to scalars and does not preserve list
/// order, so both are normalized before comparing.
pub fn documents_equivalent(a: &Value, b: &Value) -> bool {
    normalize(a) == normalize(b)
}

fn normalize(value: &Value) -> Value {
    match value {
        Value::Array(items) if items.len() == 1 => normalize(&items[0]),
        Value::Array(items) => {
            let mut items: Vec<Value> = items.iter().map(normalize).collect();
            items.sort_by_key(|v| v.to_string());
            Value::Array(items)
        }
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), normalize(v)))
                .collect(),
        ),
        other => other.clone(),
    }
}
