use crate::reconcile::TrustDrift;
use std::fmt;

/// Outcome of one executed step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepEvent {
    pub role_name: String,
    pub operation: &'static str,
    /// ARN or name of what the step touched, or the failure message.
    pub outcome: Result<String, String>,
}

/// Where step outcomes go as they happen.
pub trait ReportSink: Send + Sync {
    fn record(&self, event: &StepEvent);
}

/// Sink that writes step outcomes to the log.
pub struct TracingReportSink;

impl ReportSink for TracingReportSink {
    fn record(&self, event: &StepEvent) {
        match &event.outcome {
            Ok(target) => tracing::info!(
                role = %event.role_name,
                operation = event.operation,
                target = %target,
                "step applied"
            ),
            Err(message) => tracing::warn!(
                role = %event.role_name,
                operation = event.operation,
                error = %message,
                "step failed"
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedRole {
    pub name: String,
    pub arn: String,
}

/// A role whose steps stopped at `operation`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleFailure {
    pub role_name: String,
    pub operation: String,
    pub message: String,
}

/// Summary of an auto-mode run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionReport {
    pub created_roles: Vec<CreatedRole>,
    /// Existing roles that had policies attached or trust replaced.
    pub updated_roles: Vec<String>,
    pub created_policies: Vec<String>,
    pub updated_policies: Vec<String>,
    pub drift: Vec<TrustDrift>,
    pub failures: Vec<RoleFailure>,
}

impl ExecutionReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

impl fmt::Display for ExecutionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for role in &self.created_roles {
            writeln!(f, "Created role '{}' with ARN '{}'", role.name, role.arn)?;
        }
        for name in &self.updated_roles {
            writeln!(f, "Updated role '{}'", name)?;
        }
        for drift in &self.drift {
            writeln!(
                f,
                "Role '{}' already exists with a different trust policy; left unchanged",
                drift.role_name
            )?;
        }
        for failure in &self.failures {
            writeln!(
                f,
                "Failed to {} for role '{}': {}",
                failure.operation, failure.role_name, failure.message
            )?;
        }
        Ok(())
    }
}
