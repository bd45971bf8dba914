//! End-to-end runs.

use super::common::*;
use pretty_assertions::assert_eq;
use stsroles_core::{EngineError, Mode, RoleDescriptor, Topology, tags};
use stsroles_runtime::{Invocation, ProgrammaticRequest, RunOutput};
use std::collections::BTreeMap;

fn commands(output: &RunOutput) -> &str {
    match output {
        RunOutput::Manual { commands } => commands,
        other => panic!("expected manual output, got {other:?}"),
    }
}

fn report(output: &RunOutput) -> &stsroles_runtime::ExecutionReport {
    match output {
        RunOutput::Auto { report } => report,
        other => panic!("expected auto output, got {other:?}"),
    }
}

// =============================================================================
// MANUAL MODE
// =============================================================================

#[tokio::test]
async fn test_manual_prefix_path_prints_role_commands() {
    let iam = FakeIam::with_installer("4.15");
    iam.add_all_policies(Topology::Classic, "4.15");
    let ctx = TestContext::new(iam);

    let outcome = ctx.run(prefix_flags("manual")).await.unwrap();
    let text = commands(&outcome.output);

    assert_eq!(text.matches("aws iam create-role \\\n").count(), 6);
    assert_eq!(text.matches("aws iam attach-role-policy \\\n").count(), 6);
    assert!(!text.contains("create-policy"));
    assert!(text.contains("\t--role-name demo-openshift-ingress-operator-cloud-credentials \\\n"));
    assert!(text.contains("\t--path / \\\n"));
    // manual runs still inspect the account: GetRole (installer), ListPolicies, ListRoles
    let operations: Vec<String> = ctx
        .iam
        .calls()
        .iter()
        .map(|c| c.split(':').next().unwrap_or_default().to_string())
        .collect();
    assert_eq!(operations, vec!["GetRole", "ListPolicies", "ListRoles"]);
    assert!(ctx.iam.mutating_calls().is_empty());
    assert!(outcome.is_success());
}

#[tokio::test]
async fn test_manual_fresh_account_creates_policies_first() {
    let ctx = TestContext::new(FakeIam::with_installer("4.15"));

    let outcome = ctx.run(prefix_flags("manual")).await.unwrap();
    let text = commands(&outcome.output);
    let blocks: Vec<&str> = text.trim_end().split("\n\n").collect();

    assert_eq!(blocks.len(), 18);
    assert!(blocks[0].starts_with("aws iam create-policy \\\n"));
    assert!(blocks[1].starts_with("aws iam create-role \\\n"));
    assert!(blocks[2].starts_with("aws iam attach-role-policy \\\n"));
    assert!(text.contains("Key=rosa_openshift_version,Value=4.15"));
    assert!(text.contains("arn:aws:iam::*:role/"));
    assert!(ctx.iam.mutating_calls().is_empty());
}

#[tokio::test]
async fn test_programmatic_triplet_never_prompts() {
    let iam = FakeIam::with_installer("4.15");
    iam.add_all_policies(Topology::Classic, "4.15");
    let ctx = TestContext::new(iam);

    let outcome = ctx
        .engine()
        .run(&Invocation::Programmatic(ProgrammaticRequest {
            cluster_key: CLUSTER_ID.to_string(),
            mode: "manual".to_string(),
            permissions_boundary: BOUNDARY.to_string(),
        }))
        .await
        .unwrap();

    let text = commands(&outcome.output);
    assert!(text.contains(&format!("\t--permissions-boundary {BOUNDARY} \\\n")));
    assert!(text.contains(&format!("Key={},Value={CLUSTER_ID}", tags::CLUSTER_ID)));
    assert!(ctx.prompter.questions().is_empty());
    assert!(ctx.iam.mutating_calls().is_empty());
}

#[tokio::test]
async fn test_programmatic_triplet_without_mode_prompts() {
    let iam = FakeIam::with_installer("4.15");
    iam.add_all_policies(Topology::Classic, "4.15");
    let ctx = TestContext::new(iam).with_prompter(ScriptedPrompter::new(&["manual", ""], true));

    let outcome = ctx
        .engine()
        .run(&Invocation::Programmatic(ProgrammaticRequest {
            cluster_key: CLUSTER_ID.to_string(),
            mode: String::new(),
            permissions_boundary: BOUNDARY.to_string(),
        }))
        .await
        .unwrap();

    assert_eq!(outcome.mode, Mode::Manual);
    assert_eq!(
        ctx.prompter.questions(),
        vec!["Role creation mode", "Permissions boundary ARN (optional)"]
    );
    // the triplet's boundary is offered as the default
    let text = commands(&outcome.output);
    assert!(text.contains(&format!("\t--permissions-boundary {BOUNDARY} \\\n")));
}

// =============================================================================
// AUTO MODE
// =============================================================================

#[tokio::test]
async fn test_auto_cluster_path_creates_roles() {
    let ctx = TestContext::new(FakeIam::with_installer("4.15"));

    let outcome = ctx.run(cluster_flags("auto")).await.unwrap();
    let report = report(&outcome.output);

    assert!(report.is_success());
    assert_eq!(report.created_roles.len(), 6);
    assert_eq!(report.created_policies.len(), 6);

    let ingress = role_name(CLUSTER_PREFIX, "openshift-ingress-operator", "cloud-credentials");
    let role = ctx.iam.role(&ingress).unwrap();
    assert_eq!(role.tags[tags::CLUSTER_ID], CLUSTER_ID);
    assert_eq!(role.tags[tags::ROLE_PREFIX], CLUSTER_PREFIX);
    assert_eq!(role.tags[tags::OPENSHIFT_VERSION], "4.15");
    assert!(ctx.iam.is_attached(
        &ingress,
        "arn:aws:iam::111122223333:policy/demo-openshift-ingress-operator-cloud-credentials"
    ));

    let trust = role.trust_policy.unwrap();
    assert_eq!(
        trust["Statement"][0]["Principal"]["Federated"],
        format!("arn:aws:iam::{ACCOUNT}:oidc-provider/rh-oidc.s3.us-east-1.amazonaws.com/{CLUSTER_ID}")
    );

    // one event per step: policy, role, attach
    assert_eq!(ctx.sink.events().len(), 18);
}

#[tokio::test]
async fn test_auto_partial_failure_is_collected() {
    let failing = role_name(CLUSTER_PREFIX, "openshift-image-registry", "installer-cloud-credentials");
    let iam = FakeIam::with_installer("4.15");
    iam.fail_create_role(&failing);
    let ctx = TestContext::new(iam);

    let outcome = ctx.run(cluster_flags("auto")).await.unwrap();
    let report = report(&outcome.output);

    assert!(!outcome.is_success());
    assert_eq!(report.created_roles.len(), 5);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].role_name, failing);
    assert_eq!(report.failures[0].operation, "CreateRole");
    assert!(report.failures[0].message.contains("AccessDenied"));

    // the failing role never reached its attach step, the next role did
    assert!(!ctx.iam.calls().contains(&format!("AttachRolePolicy:{failing}")));
    let ingress = role_name(CLUSTER_PREFIX, "openshift-ingress-operator", "cloud-credentials");
    assert!(ctx.iam.role(&ingress).is_some());
}

#[tokio::test]
async fn test_auto_rerun_is_idempotent() {
    let ctx = TestContext::new(FakeIam::with_installer("4.15"));

    ctx.run(cluster_flags("auto")).await.unwrap();
    let first = ctx.iam.mutating_calls().len();

    let outcome = ctx.run(cluster_flags("auto")).await.unwrap();
    let report = report(&outcome.output);
    let second: Vec<String> = ctx.iam.mutating_calls().split_off(first);

    assert!(report.created_roles.is_empty());
    assert!(report.created_policies.is_empty());
    assert_eq!(report.updated_roles.len(), 6);
    assert_eq!(second.len(), 6);
    assert!(second.iter().all(|c| c.starts_with("AttachRolePolicy:")));
}

#[tokio::test]
async fn test_hosted_cp_prefix_path() {
    let ctx = TestContext::new(FakeIam::with_installer("4.15"));
    let mut flags = prefix_flags("auto");
    flags.hosted_cp = true;

    let outcome = ctx.run(flags).await.unwrap();
    let report = report(&outcome.output);

    assert_eq!(report.created_roles.len(), 8);
    let kms = role_name("demo", "kube-system", "kms-provider");
    let role = ctx.iam.role(&kms).unwrap();
    assert_eq!(role.tags[tags::HCP_POLICIES], "true");
    assert!(!role.tags.contains_key(tags::CLUSTER_ID));
    assert!(
        ctx.iam
            .role(&role_name("demo", "openshift-machine-api", "aws-cloud-credentials"))
            .is_none()
    );
}

// =============================================================================
// COMPATIBILITY
// =============================================================================

#[tokio::test]
async fn test_outdated_policy_without_force_fails_before_mutation() {
    let iam = FakeIam::with_installer("4.15");
    iam.add_policy("openshift-ingress-operator", "cloud-credentials", "4.13");
    let ctx = TestContext::new(iam);

    let err = ctx.run(cluster_flags("auto")).await.unwrap_err();
    match err {
        EngineError::IncompatiblePolicies { required, operators } => {
            assert_eq!(required, "4.15");
            assert_eq!(operators, vec!["openshift-ingress-operator/cloud-credentials".to_string()]);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(ctx.iam.mutating_calls().is_empty());
}

#[tokio::test]
async fn test_outdated_policy_with_force_gets_new_version() {
    let iam = FakeIam::with_installer("4.15");
    iam.add_policy("openshift-ingress-operator", "cloud-credentials", "4.13");
    let ctx = TestContext::new(iam);
    let mut flags = cluster_flags("auto");
    flags.force_policy_creation = true;

    let outcome = ctx.run(flags).await.unwrap();
    let report = report(&outcome.output);

    let policy = policy_name("openshift-ingress-operator", "cloud-credentials");
    assert_eq!(report.updated_policies, vec![policy.clone()]);
    assert_eq!(report.created_policies.len(), 5);
    assert_eq!(
        ctx.iam.policy(&policy).unwrap().tags[tags::OPENSHIFT_VERSION],
        "4.15"
    );
}

#[tokio::test]
async fn test_outdated_installer_role_fails_before_policy_listing() {
    let ctx = TestContext::new(FakeIam::with_installer("4.14"));

    let err = ctx.run(cluster_flags("auto")).await.unwrap_err();
    assert!(matches!(err, EngineError::InstallerRoleIncompatible { .. }));
    assert!(err.to_string().contains("rosa create account-roles"));
    assert!(!ctx.iam.calls().iter().any(|c| c.starts_with("ListPolicies")));
}

#[tokio::test]
async fn test_managed_policy_installer_skips_version_gate() {
    let iam = FakeIam::default();
    iam.add_role(RoleDescriptor {
        name: INSTALLER_NAME.to_string(),
        arn: INSTALLER_ARN.to_string(),
        path: "/".to_string(),
        trust_policy: None,
        permissions_boundary: None,
        tags: BTreeMap::from([(tags::MANAGED_POLICIES.to_string(), "true".to_string())]),
    });
    let ctx = TestContext::new(iam);

    assert!(ctx.run(cluster_flags("manual")).await.is_ok());
}

// =============================================================================
// EXISTING ROLES
// =============================================================================

fn foreign_role(name: &str) -> RoleDescriptor {
    RoleDescriptor {
        name: name.to_string(),
        arn: format!("arn:aws:iam::{ACCOUNT}:role/{name}"),
        path: "/".to_string(),
        trust_policy: Some(serde_json::json!({
            "Version": "2012-10-17",
            "Statement": [{"Effect": "Allow", "Principal": {"Federated": "arn:aws:iam::111122223333:oidc-provider/elsewhere"}}]
        })),
        permissions_boundary: None,
        tags: BTreeMap::new(),
    }
}

#[tokio::test]
async fn test_divergent_trust_is_reported_not_overwritten() {
    let ingress = role_name(CLUSTER_PREFIX, "openshift-ingress-operator", "cloud-credentials");
    let iam = FakeIam::with_installer("4.15");
    iam.add_role(foreign_role(&ingress));
    let ctx = TestContext::new(iam);

    let outcome = ctx.run(cluster_flags("auto")).await.unwrap();
    let report = report(&outcome.output);

    assert_eq!(report.drift.len(), 1);
    assert_eq!(report.drift[0].role_name, ingress);
    assert_eq!(report.created_roles.len(), 5);
    assert!(outcome.is_success());
    assert!(!ctx.iam.calls().iter().any(|c| c.ends_with(&format!(":{ingress}"))));
    assert!(report.to_string().contains("different trust policy"));
}

#[tokio::test]
async fn test_divergent_trust_replaced_with_force() {
    let ingress = role_name(CLUSTER_PREFIX, "openshift-ingress-operator", "cloud-credentials");
    let iam = FakeIam::with_installer("4.15");
    iam.add_role(foreign_role(&ingress));
    let ctx = TestContext::new(iam);
    let mut flags = cluster_flags("auto");
    flags.force_policy_creation = true;

    let outcome = ctx.run(flags).await.unwrap();
    let report = report(&outcome.output);

    assert!(report.drift.is_empty());
    assert!(report.updated_roles.contains(&ingress));
    assert!(ctx.iam.calls().contains(&format!("UpdateAssumeRolePolicy:{ingress}")));
    let trust = ctx.iam.role(&ingress).unwrap().trust_policy.unwrap();
    assert_eq!(trust["Statement"][0]["Action"], "sts:AssumeRoleWithWebIdentity");
}

// =============================================================================
// CLUSTER PATH
// =============================================================================

#[tokio::test]
async fn test_unknown_cluster() {
    let ctx = TestContext::with_clusters(FakeIam::with_installer("4.15"), vec![]);
    let err = ctx.run(cluster_flags("manual")).await.unwrap_err();
    assert_eq!(err, EngineError::not_found("cluster", CLUSTER_NAME));
}

#[tokio::test]
async fn test_non_sts_cluster_rejected() {
    let mut classic = cluster();
    classic.sts = None;
    let ctx = TestContext::with_clusters(FakeIam::with_installer("4.15"), vec![classic]);

    let err = ctx.run(cluster_flags("manual")).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidCombination(ref msg) if msg.contains("not an STS cluster")));
    assert!(ctx.iam.calls().is_empty());
}

#[tokio::test]
async fn test_oidc_hint_only_for_generated_endpoints() {
    let ctx = TestContext::new(FakeIam::with_installer("4.15"));
    let outcome = ctx.run(cluster_flags("manual")).await.unwrap();
    assert_eq!(outcome.notes.len(), 1);
    assert!(outcome.notes[0].contains("oidc-provider"));

    let mut byo = cluster();
    if let Some(sts) = byo.sts.as_mut() {
        sts.oidc_endpoint_url = "https://oidc.example/shared".to_string();
    }
    let ctx = TestContext::with_clusters(FakeIam::with_installer("4.15"), vec![byo]);
    let outcome = ctx.run(cluster_flags("manual")).await.unwrap();
    assert!(outcome.notes.is_empty());
}

#[tokio::test]
async fn test_cluster_boundary_used_when_not_supplied() {
    let mut bounded = cluster();
    if let Some(sts) = bounded.sts.as_mut() {
        sts.permissions_boundary = Some(BOUNDARY.to_string());
    }
    let ctx = TestContext::with_clusters(FakeIam::with_installer("4.15"), vec![bounded]);

    let outcome = ctx.run(cluster_flags("auto")).await.unwrap();
    assert!(report(&outcome.output).is_success());
    let ingress = role_name(CLUSTER_PREFIX, "openshift-ingress-operator", "cloud-credentials");
    assert_eq!(
        ctx.iam.role(&ingress).unwrap().permissions_boundary.as_deref(),
        Some(BOUNDARY)
    );
}
