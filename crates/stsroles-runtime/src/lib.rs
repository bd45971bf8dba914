//! Resolution, reconciliation and execution of operator role plans.
//!
//! The [`Engine`] runs one invocation end to end:
//!
//! 1. Resolve mode and identity from the invocation, prompting if allowed.
//! 2. Look up the cluster or installer role, then the policy catalog.
//! 3. Gate on installer-role and operator-policy compatibility.
//! 4. Build the role plan and reconcile it against the account.
//! 5. Apply it (auto) or render it as AWS CLI commands (manual).
//!
//! Collaborators sit behind the traits in [`adapter`] and [`prompt`].

pub mod adapter;
pub mod engine;
pub mod executor;
pub mod identity;
pub mod mode;
pub mod prompt;
pub mod reconcile;
pub mod report;
pub mod request;

pub use adapter::{ClusterLookup, IamInspector, IamMutator};
pub use engine::{Engine, RunOutcome, RunOutput, check_invocation};
pub use prompt::{NoPrompt, Prompter, Validator};
pub use reconcile::{ExecutionPlan, RolePlan, Step, TrustDrift};
pub use report::{ExecutionReport, ReportSink, StepEvent, TracingReportSink};
pub use request::{Invocation, OperatorRolesFlags, ProgrammaticRequest};
