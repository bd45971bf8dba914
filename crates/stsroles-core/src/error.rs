//! Error taxonomy for operator role provisioning.
//!
//! Every failure the engine can report is a variant of [`EngineError`]. Each
//! variant belongs to one [`ErrorCategory`], which decides when it can occur:
//! input errors are raised before any network call, compatibility errors after
//! the catalog and account have been inspected, remote errors whenever a
//! collaborator fails.

use thiserror::Error;

/// Errors raised while resolving, checking, planning or executing.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EngineError {
    /// `--mode` held something other than `auto` or `manual`.
    #[error("invalid mode '{0}': expected one of 'auto', 'manual'")]
    InvalidMode(String),

    /// Both or neither of `--cluster` and `--prefix` were supplied.
    #[error("either a cluster key for an STS cluster or an operator roles prefix must be specified, but not both")]
    AmbiguousIdentity,

    /// A flag required by the chosen identity path is missing.
    #[error("--{flag} is mandatory for --prefix param flow")]
    MissingRequiredField { flag: String },

    /// Two individually valid inputs cannot be used together.
    #[error("{0}")]
    InvalidCombination(String),

    /// A value expected to be an ARN is not one.
    #[error("expected a valid ARN for --{flag}: '{value}' {reason}")]
    InvalidArn {
        flag: String,
        value: String,
        reason: String,
    },

    /// A remote lookup found nothing for the requested key.
    #[error("{kind} '{key}' not found")]
    NotFound { kind: String, key: String },

    /// The installer role belongs to an account-role family older than the cluster.
    #[error(
        "account role '{role}' is not compatible with version {required} (role version: {found}). \
         Run 'rosa create account-roles' to create compatible roles and try again"
    )]
    InstallerRoleIncompatible {
        role: String,
        required: String,
        found: String,
    },

    /// Existing operator policies are older than the required version.
    #[error(
        "operator policies are not compatible with version {required}: {}. \
         Upgrade the account roles or pass --force-policy-creation in auto mode",
        .operators.join(", ")
    )]
    IncompatiblePolicies {
        required: String,
        operators: Vec<String>,
    },

    /// Two planned roles ended up with the same name.
    #[error("operator role name '{0}' is produced by more than one operator")]
    DuplicateRoleName(String),

    /// A collaborator (OCM, policy catalog, AWS) failed.
    #[error("{operation} failed: {message}")]
    Remote { operation: String, message: String },

    /// The interactive prompt could not obtain an answer.
    #[error("prompt failed: {0}")]
    Prompt(String),
}

/// When an error can surface relative to network activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Detected from the invocation alone.
    Input,
    /// Detected after inspecting the catalog and the account.
    Compatibility,
    /// Raised by a collaborator.
    Remote,
}

impl EngineError {
    pub fn missing(flag: impl Into<String>) -> Self {
        Self::MissingRequiredField { flag: flag.into() }
    }

    pub fn remote(operation: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::Remote {
            operation: operation.into(),
            message: err.to_string(),
        }
    }

    pub fn not_found(kind: impl Into<String>, key: impl Into<String>) -> Self {
        Self::NotFound {
            kind: kind.into(),
            key: key.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            EngineError::InvalidMode(_)
            | EngineError::AmbiguousIdentity
            | EngineError::MissingRequiredField { .. }
            | EngineError::InvalidCombination(_)
            | EngineError::InvalidArn { .. }
            | EngineError::DuplicateRoleName(_)
            | EngineError::Prompt(_) => ErrorCategory::Input,
            EngineError::InstallerRoleIncompatible { .. }
            | EngineError::IncompatiblePolicies { .. } => ErrorCategory::Compatibility,
            EngineError::NotFound { .. } | EngineError::Remote { .. } => ErrorCategory::Remote,
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
