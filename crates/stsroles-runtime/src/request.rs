//! The two ways a run can be requested.

/// Flags of `create operator-roles`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperatorRolesFlags {
    pub cluster: Option<String>,
    pub prefix: Option<String>,
    pub hosted_cp: bool,
    pub oidc_endpoint_url: Option<String>,
    pub installer_role_arn: Option<String>,
    pub permissions_boundary: Option<String>,
    pub force_policy_creation: bool,
    /// Raw `--mode` value; parsed during resolution.
    pub mode: Option<String>,
    pub interactive: bool,
    /// Skip the confirmation before the first mutating call.
    pub yes: bool,
}

/// Positional triplet supplied by callers that already know what they want.
///
/// With a mode it never prompts. An empty mode leaves the run interactive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgrammaticRequest {
    pub cluster_key: String,
    pub mode: String,
    pub permissions_boundary: String,
}

impl ProgrammaticRequest {
    /// Whether the caller fixed the mode, so nothing may be asked.
    pub fn is_unattended(&self) -> bool {
        non_empty(Some(&self.mode)).is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    Flags(OperatorRolesFlags),
    Programmatic(ProgrammaticRequest),
}

impl Invocation {
    /// Explicitly supplied permissions boundary, if any.
    pub fn permissions_boundary(&self) -> Option<&str> {
        match self {
            Invocation::Flags(flags) => non_empty(flags.permissions_boundary.as_deref()),
            Invocation::Programmatic(req) => non_empty(Some(&req.permissions_boundary)),
        }
    }

    pub fn force_policy_creation(&self) -> bool {
        match self {
            Invocation::Flags(flags) => flags.force_policy_creation,
            Invocation::Programmatic(_) => false,
        }
    }

    /// Whether the run may need a terminal to answer prompts.
    pub fn may_prompt(&self) -> bool {
        match self {
            Invocation::Flags(_) => true,
            Invocation::Programmatic(req) => !req.is_unattended(),
        }
    }

    /// Whether the run was asked to skip confirmation.
    pub fn assume_yes(&self) -> bool {
        match self {
            Invocation::Flags(flags) => flags.yes,
            Invocation::Programmatic(req) => req.is_unattended(),
        }
    }
}

/// Blank strings count as absent.
pub(crate) fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
