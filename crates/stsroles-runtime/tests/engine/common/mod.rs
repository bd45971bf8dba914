//! Shared fixtures for engine tests.
//!
//! This module provides:
//! - In-memory IAM, cluster and catalog fakes that record every call
//! - A scripted prompter
//! - Cluster and installer role fixtures

use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use stsroles_core::{
    Cluster, ClusterSts, EngineError, EngineResult, OperatorKey, OperatorRoleSpec,
    PermissionPolicy, PolicyDescriptor, PolicyVersion, RoleDescriptor, Topology, tags,
};
use stsroles_planner::credential_requests_for;
use stsroles_policy::PolicyCatalog;
use stsroles_runtime::prompt::{Validator, check};
use stsroles_runtime::{
    ClusterLookup, Engine, IamInspector, IamMutator, Invocation, OperatorRolesFlags, Prompter,
    ReportSink, StepEvent,
};

// =============================================================================
// FIXTURE CONSTANTS
// =============================================================================

pub const ACCOUNT: &str = "111122223333";
pub const INSTALLER_NAME: &str = "demo-Installer-Role";
pub const INSTALLER_ARN: &str = "arn:aws:iam::111122223333:role/demo-Installer-Role";
pub const OIDC: &str = "https://oidc.example/demo123";
pub const CLUSTER_ID: &str = "25ab9cd";
pub const CLUSTER_NAME: &str = "demo-cluster";
pub const CLUSTER_PREFIX: &str = "demo-cluster-x1y2";
pub const BOUNDARY: &str = "arn:aws:iam::111122223333:policy/perm-boundary";

pub fn policy_name(namespace: &str, name: &str) -> String {
    format!("demo-{namespace}-{name}")
}

// =============================================================================
// FAKE IAM
// =============================================================================

#[derive(Default)]
struct IamState {
    roles: BTreeMap<String, RoleDescriptor>,
    policies: BTreeMap<String, PolicyDescriptor>,
    attachments: BTreeSet<(String, String)>,
}

/// IAM account held in memory. Every call is recorded as `Operation:target`.
#[derive(Default)]
pub struct FakeIam {
    state: Mutex<IamState>,
    calls: Mutex<Vec<String>>,
    failing_roles: Mutex<BTreeSet<String>>,
}

impl FakeIam {
    /// Account holding the installer role tagged with `version`.
    pub fn with_installer(version: &str) -> Self {
        let iam = Self::default();
        iam.add_role(RoleDescriptor {
            name: INSTALLER_NAME.to_string(),
            arn: INSTALLER_ARN.to_string(),
            path: "/".to_string(),
            trust_policy: None,
            permissions_boundary: None,
            tags: BTreeMap::from([(tags::OPENSHIFT_VERSION.to_string(), version.to_string())]),
        });
        iam
    }

    pub fn add_role(&self, role: RoleDescriptor) {
        self.state
            .lock()
            .unwrap()
            .roles
            .insert(role.name.clone(), role);
    }

    /// Deployed operator policy under the `demo` account prefix.
    pub fn add_policy(&self, namespace: &str, name: &str, version: &str) {
        let policy_name = policy_name(namespace, name);
        self.state.lock().unwrap().policies.insert(
            policy_name.clone(),
            PolicyDescriptor {
                arn: format!("arn:aws:iam::{ACCOUNT}:policy/{policy_name}"),
                name: policy_name,
                path: "/".to_string(),
                tags: BTreeMap::from([(tags::OPENSHIFT_VERSION.to_string(), version.to_string())]),
            },
        );
    }

    /// Every operator policy of `topology`, at `version`.
    pub fn add_all_policies(&self, topology: Topology, version: &str) {
        for req in credential_requests_for(topology) {
            self.add_policy(&req.operator.namespace, &req.operator.name, version);
        }
    }

    pub fn fail_create_role(&self, role_name: &str) {
        self.failing_roles
            .lock()
            .unwrap()
            .insert(role_name.to_string());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn mutating_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| !c.starts_with("Get") && !c.starts_with("List"))
            .collect()
    }

    pub fn role(&self, name: &str) -> Option<RoleDescriptor> {
        self.state.lock().unwrap().roles.get(name).cloned()
    }

    pub fn policy(&self, name: &str) -> Option<PolicyDescriptor> {
        self.state.lock().unwrap().policies.get(name).cloned()
    }

    pub fn is_attached(&self, role_name: &str, policy_arn: &str) -> bool {
        self.state
            .lock()
            .unwrap()
            .attachments
            .contains(&(role_name.to_string(), policy_arn.to_string()))
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl IamInspector for FakeIam {
    async fn get_role(&self, name: &str) -> anyhow::Result<Option<RoleDescriptor>> {
        self.record(format!("GetRole:{name}"));
        Ok(self.role(name))
    }

    async fn list_roles(&self, prefix: &str) -> anyhow::Result<Vec<RoleDescriptor>> {
        self.record(format!("ListRoles:{prefix}"));
        let state = self.state.lock().unwrap();
        Ok(state
            .roles
            .values()
            .filter(|r| r.name.starts_with(prefix))
            .cloned()
            .collect())
    }

    async fn list_policies(
        &self,
        path: &str,
        prefix: &str,
    ) -> anyhow::Result<Vec<PolicyDescriptor>> {
        self.record(format!("ListPolicies:{prefix}"));
        let state = self.state.lock().unwrap();
        Ok(state
            .policies
            .values()
            .filter(|p| p.path == path && p.name.starts_with(prefix))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl IamMutator for FakeIam {
    async fn create_policy(&self, policy: &PermissionPolicy) -> anyhow::Result<String> {
        self.record(format!("CreatePolicy:{}", policy.name));
        let mut state = self.state.lock().unwrap();
        if state.policies.contains_key(&policy.name) {
            anyhow::bail!("EntityAlreadyExists: policy {}", policy.name);
        }
        state.policies.insert(
            policy.name.clone(),
            PolicyDescriptor {
                name: policy.name.clone(),
                arn: policy.arn.clone(),
                path: policy.path.clone(),
                tags: policy.tags.clone(),
            },
        );
        Ok(policy.arn.clone())
    }

    async fn create_policy_version(&self, policy: &PermissionPolicy) -> anyhow::Result<()> {
        self.record(format!("CreatePolicyVersion:{}", policy.name));
        let mut state = self.state.lock().unwrap();
        let Some(existing) = state.policies.get_mut(&policy.name) else {
            anyhow::bail!("NoSuchEntity: policy {}", policy.name);
        };
        existing.tags = policy.tags.clone();
        Ok(())
    }

    async fn create_role(&self, spec: &OperatorRoleSpec) -> anyhow::Result<String> {
        self.record(format!("CreateRole:{}", spec.role_name));
        if self.failing_roles.lock().unwrap().contains(&spec.role_name) {
            anyhow::bail!("AccessDenied: not authorized to create {}", spec.role_name);
        }
        let mut state = self.state.lock().unwrap();
        if state.roles.contains_key(&spec.role_name) {
            anyhow::bail!("EntityAlreadyExists: role {}", spec.role_name);
        }
        state.roles.insert(
            spec.role_name.clone(),
            RoleDescriptor {
                name: spec.role_name.clone(),
                arn: spec.role_arn.clone(),
                path: spec.path.clone(),
                trust_policy: Some(spec.trust_policy.clone()),
                permissions_boundary: spec.permissions_boundary.clone(),
                tags: spec.tags.clone(),
            },
        );
        Ok(spec.role_arn.clone())
    }

    async fn update_trust_policy(&self, role_name: &str, document: &Value) -> anyhow::Result<()> {
        self.record(format!("UpdateAssumeRolePolicy:{role_name}"));
        let mut state = self.state.lock().unwrap();
        let Some(role) = state.roles.get_mut(role_name) else {
            anyhow::bail!("NoSuchEntity: role {role_name}");
        };
        role.trust_policy = Some(document.clone());
        Ok(())
    }

    async fn attach_policy(&self, role_name: &str, policy_arn: &str) -> anyhow::Result<()> {
        self.record(format!("AttachRolePolicy:{role_name}"));
        self.state
            .lock()
            .unwrap()
            .attachments
            .insert((role_name.to_string(), policy_arn.to_string()));
        Ok(())
    }
}

// =============================================================================
// FAKE OCM
// =============================================================================

#[derive(Default)]
pub struct FakeClusters {
    clusters: Vec<Cluster>,
    calls: AtomicUsize,
}

impl FakeClusters {
    pub fn new(clusters: Vec<Cluster>) -> Self {
        Self {
            clusters,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ClusterLookup for FakeClusters {
    async fn find_cluster(&self, key: &str) -> anyhow::Result<Option<Cluster>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .clusters
            .iter()
            .find(|c| c.id == key || c.name == key)
            .cloned())
    }
}

pub struct FakeCatalog {
    policies: BTreeMap<String, Value>,
    default_version: PolicyVersion,
    calls: AtomicUsize,
}

impl FakeCatalog {
    pub fn new(default_version: PolicyVersion) -> Self {
        let mut policies = BTreeMap::new();
        for topology in [Topology::Classic, Topology::HostedCp] {
            for req in credential_requests_for(topology) {
                policies.insert(
                    req.catalog_key(topology),
                    json!({
                        "Version": "2012-10-17",
                        "Statement": [{
                            "Effect": "Allow",
                            "Action": ["ec2:DescribeInstances"],
                            "Resource": format!("arn:%{{partition}}:iam::*:role/{}", req.operator.name),
                        }]
                    }),
                );
            }
        }
        Self {
            policies,
            default_version,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PolicyCatalog for FakeCatalog {
    async fn get_policies(&self, _role_kind: &str) -> anyhow::Result<BTreeMap<String, Value>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.policies.clone())
    }

    async fn get_default_version(&self) -> anyhow::Result<PolicyVersion> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.default_version)
    }
}

// =============================================================================
// SCRIPTED PROMPTER
// =============================================================================

/// Answers questions from a script. An empty answer takes the default.
#[derive(Default)]
pub struct ScriptedPrompter {
    answers: Mutex<VecDeque<String>>,
    questions: Mutex<Vec<String>>,
    confirm: bool,
}

impl ScriptedPrompter {
    pub fn new(answers: &[&str], confirm: bool) -> Self {
        Self {
            answers: Mutex::new(answers.iter().map(|a| a.to_string()).collect()),
            questions: Mutex::new(Vec::new()),
            confirm,
        }
    }

    pub fn questions(&self) -> Vec<String> {
        self.questions.lock().unwrap().clone()
    }

    fn next(&self, question: &str, default: &str) -> EngineResult<String> {
        self.questions.lock().unwrap().push(question.to_string());
        let answer = self
            .answers
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| EngineError::Prompt(format!("no scripted answer for '{question}'")))?;
        Ok(if answer.is_empty() {
            default.to_string()
        } else {
            answer
        })
    }
}

#[async_trait]
impl Prompter for ScriptedPrompter {
    async fn ask_choice(
        &self,
        question: &str,
        _options: &[&str],
        default: &str,
    ) -> EngineResult<String> {
        self.next(question, default)
    }

    async fn ask_string(
        &self,
        question: &str,
        default: &str,
        validators: &[Validator],
    ) -> EngineResult<String> {
        let answer = self.next(question, default)?;
        check(&answer, validators).map_err(EngineError::Prompt)?;
        Ok(answer)
    }

    async fn confirm(&self, question: &str) -> EngineResult<bool> {
        self.questions.lock().unwrap().push(question.to_string());
        Ok(self.confirm)
    }
}

// =============================================================================
// REPORT SINK
// =============================================================================

#[derive(Default, Clone)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<StepEvent>>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<StepEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl ReportSink for RecordingSink {
    fn record(&self, event: &StepEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

// =============================================================================
// TEST CONTEXT
// =============================================================================

pub fn cluster() -> Cluster {
    Cluster {
        id: CLUSTER_ID.to_string(),
        name: CLUSTER_NAME.to_string(),
        aws_account_id: ACCOUNT.to_string(),
        version: "4.15.3".to_string(),
        hosted_cp: false,
        sts: Some(ClusterSts {
            installer_role_arn: INSTALLER_ARN.to_string(),
            operator_role_prefix: CLUSTER_PREFIX.to_string(),
            oidc_endpoint_url: format!("https://rh-oidc.s3.us-east-1.amazonaws.com/{CLUSTER_ID}"),
            permissions_boundary: None,
        }),
    }
}

/// Flags for the prefix path with every required field present.
pub fn prefix_flags(mode: &str) -> OperatorRolesFlags {
    OperatorRolesFlags {
        prefix: Some("demo".to_string()),
        oidc_endpoint_url: Some(OIDC.to_string()),
        installer_role_arn: Some(INSTALLER_ARN.to_string()),
        mode: Some(mode.to_string()),
        ..Default::default()
    }
}

pub fn cluster_flags(mode: &str) -> OperatorRolesFlags {
    OperatorRolesFlags {
        cluster: Some(CLUSTER_NAME.to_string()),
        mode: Some(mode.to_string()),
        ..Default::default()
    }
}

/// Role name for `operator` under `prefix`.
pub fn role_name(prefix: &str, namespace: &str, name: &str) -> String {
    stsroles_core::naming::operator_role_name(prefix, &OperatorKey::new(namespace, name))
}

pub struct TestContext {
    pub iam: Arc<FakeIam>,
    pub clusters: Arc<FakeClusters>,
    pub catalog: Arc<FakeCatalog>,
    pub prompter: Arc<ScriptedPrompter>,
    pub sink: RecordingSink,
}

impl TestContext {
    pub fn new(iam: FakeIam) -> Self {
        Self::with_clusters(iam, vec![cluster()])
    }

    pub fn with_clusters(iam: FakeIam, clusters: Vec<Cluster>) -> Self {
        Self {
            iam: Arc::new(iam),
            clusters: Arc::new(FakeClusters::new(clusters)),
            catalog: Arc::new(FakeCatalog::new(PolicyVersion::new(4, 15))),
            prompter: Arc::new(ScriptedPrompter::default()),
            sink: RecordingSink::default(),
        }
    }

    pub fn with_prompter(mut self, prompter: ScriptedPrompter) -> Self {
        self.prompter = Arc::new(prompter);
        self
    }

    pub fn engine(&self) -> Engine<RecordingSink> {
        Engine::new(
            self.clusters.clone(),
            self.catalog.clone(),
            self.iam.clone(),
            self.prompter.clone(),
            self.sink.clone(),
        )
    }

    pub async fn run(&self, flags: OperatorRolesFlags) -> EngineResult<stsroles_runtime::RunOutcome> {
        self.engine().run(&Invocation::Flags(flags)).await
    }

    /// No collaborator was contacted.
    pub fn assert_untouched(&self) {
        assert!(self.iam.calls().is_empty(), "iam calls: {:?}", self.iam.calls());
        assert_eq!(self.clusters.calls(), 0);
        assert_eq!(self.catalog.calls(), 0);
    }
}
