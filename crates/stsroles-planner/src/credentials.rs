//! Operators that need an IAM role, per control-plane topology.

use stsroles_core::{CredentialRequest, OperatorKey, Topology};

const BOTH: &[Topology] = &[Topology::Classic, Topology::HostedCp];
const CLASSIC: &[Topology] = &[Topology::Classic];
const HOSTED_CP: &[Topology] = &[Topology::HostedCp];

const TABLE: &[(&str, &str, &[&str], &[Topology])] = &[
    (
        "openshift-cloud-credential-operator",
        "cloud-credential-operator-iam-ro-creds",
        &["cloud-credential-operator"],
        CLASSIC,
    ),
    (
        "openshift-cloud-network-config-controller",
        "cloud-credentials",
        &["cloud-network-config-controller"],
        BOTH,
    ),
    (
        "openshift-cluster-csi-drivers",
        "ebs-cloud-credentials",
        &["aws-ebs-csi-driver-operator", "aws-ebs-csi-driver-controller-sa"],
        BOTH,
    ),
    (
        "openshift-image-registry",
        "installer-cloud-credentials",
        &["cluster-image-registry-operator", "registry"],
        BOTH,
    ),
    (
        "openshift-ingress-operator",
        "cloud-credentials",
        &["ingress-operator"],
        BOTH,
    ),
    (
        "openshift-machine-api",
        "aws-cloud-credentials",
        &["machine-api-controllers"],
        CLASSIC,
    ),
    (
        "kube-system",
        "capa-controller-manager",
        &["capa-controller-manager"],
        HOSTED_CP,
    ),
    (
        "kube-system",
        "control-plane-operator",
        &["control-plane-operator"],
        HOSTED_CP,
    ),
    ("kube-system", "kms-provider", &["kms-provider"], HOSTED_CP),
    (
        "kube-system",
        "kube-controller-manager",
        &["kube-controller-manager"],
        HOSTED_CP,
    ),
];

/// Every known credentials request, across topologies.
pub fn default_credential_requests() -> Vec<CredentialRequest> {
    TABLE
        .iter()
        .map(|(namespace, name, service_accounts, topologies)| CredentialRequest {
            operator: OperatorKey::new(*namespace, *name),
            service_accounts: service_accounts.iter().map(|s| s.to_string()).collect(),
            topologies: topologies.to_vec(),
        })
        .collect()
}

/// Credentials requests that apply to `topology`.
pub fn credential_requests_for(topology: Topology) -> Vec<CredentialRequest> {
    default_credential_requests()
        .into_iter()
        .filter(|req| req.applies_to(topology))
        .collect()
}
