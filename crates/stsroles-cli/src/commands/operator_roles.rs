//! `stsroles create operator-roles` command implementation.

use anyhow::Result;
use clap::Args;
use std::process::ExitCode;
use std::sync::Arc;
use stsroles_aws::AwsIam;
use stsroles_core::{EngineConfig, EngineError, EngineResult};
use stsroles_ocm::OcmClient;
use stsroles_runtime::{
    Engine, Invocation, NoPrompt, OperatorRolesFlags, ProgrammaticRequest, Prompter, RunOutput,
    TracingReportSink, check_invocation,
};

use crate::terminal::TerminalPrompter;

#[derive(Args, Debug, Default)]
pub struct OperatorRolesArgs {
    /// Programmatic form: <CLUSTER> <MODE> <PERMISSIONS_BOUNDARY>. Prompts only when MODE is empty.
    #[arg(value_name = "ARGS")]
    pub positional: Vec<String>,

    /// ID or name of the cluster to create operator roles for
    #[arg(long, short = 'c', conflicts_with = "prefix")]
    pub cluster: Option<String>,

    /// Prefix for the operator role names when no cluster exists yet
    #[arg(long)]
    pub prefix: Option<String>,

    /// Create roles for a hosted control plane cluster
    #[arg(long, default_value_t = false)]
    pub hosted_cp: bool,

    /// OIDC endpoint URL the roles will trust
    #[arg(long)]
    pub oidc_endpoint_url: Option<String>,

    /// ARN of the installer role the operator roles belong with
    #[arg(long)]
    pub installer_role_arn: Option<String>,

    /// ARN of the policy used as permissions boundary on the roles
    #[arg(long)]
    pub permissions_boundary: Option<String>,

    /// Replace operator policies that are older than the cluster requires
    #[arg(long, short = 'f', default_value_t = false)]
    pub force_policy_creation: bool,

    /// How to apply the roles: auto or manual
    #[arg(long, short = 'm', env = "STSROLES_MODE")]
    pub mode: Option<String>,

    /// Prompt for every input
    #[arg(long, short = 'i', default_value_t = false)]
    pub interactive: bool,

    /// Answer yes to the confirmation before creating roles
    #[arg(long, short = 'y', default_value_t = false)]
    pub yes: bool,
}

impl OperatorRolesArgs {
    /// Map the parsed arguments to an engine invocation.
    ///
    /// `default_interactive` comes from the configuration file and only
    /// applies when `--interactive` is not given.
    pub fn into_invocation(self, default_interactive: bool) -> EngineResult<Invocation> {
        if self.positional.is_empty() {
            return Ok(Invocation::Flags(OperatorRolesFlags {
                cluster: self.cluster,
                prefix: self.prefix,
                hosted_cp: self.hosted_cp,
                oidc_endpoint_url: self.oidc_endpoint_url,
                installer_role_arn: self.installer_role_arn,
                permissions_boundary: self.permissions_boundary,
                force_policy_creation: self.force_policy_creation,
                mode: self.mode,
                interactive: self.interactive || default_interactive,
                yes: self.yes,
            }));
        }

        let with_flags = self.cluster.is_some()
            || self.prefix.is_some()
            || self.hosted_cp
            || self.oidc_endpoint_url.is_some()
            || self.installer_role_arn.is_some()
            || self.permissions_boundary.is_some()
            || self.force_policy_creation
            || self.interactive
            || self.yes;
        if with_flags {
            return Err(EngineError::InvalidCombination(
                "positional arguments cannot be combined with flags".to_string(),
            ));
        }

        let [cluster_key, mut mode, permissions_boundary] =
            <[String; 3]>::try_from(self.positional).map_err(|values| {
                EngineError::InvalidCombination(format!(
                    "expected 3 positional arguments (cluster, mode, permissions boundary), got {}",
                    values.len()
                ))
            })?;

        // `--mode` (or STSROLES_MODE) fills an empty positional mode
        if let Some(flag_mode) = self.mode.filter(|m| !m.trim().is_empty()) {
            if mode.trim().is_empty() {
                mode = flag_mode;
            } else if mode.trim() != flag_mode.trim() {
                return Err(EngineError::InvalidCombination(format!(
                    "positional mode '{mode}' conflicts with --mode '{flag_mode}'"
                )));
            }
        }

        Ok(Invocation::Programmatic(ProgrammaticRequest {
            cluster_key,
            mode,
            permissions_boundary,
        }))
    }
}

/// Parse and check the invocation. Nothing here reaches the network.
fn prepare(args: OperatorRolesArgs, config: &EngineConfig) -> EngineResult<Invocation> {
    let invocation = args.into_invocation(config.interactive.unwrap_or(false))?;
    check_invocation(&invocation)?;
    tracing::debug!(?invocation, "parsed invocation");
    Ok(invocation)
}

pub async fn run(args: OperatorRolesArgs, config: &EngineConfig) -> Result<ExitCode> {
    let invocation = prepare(args, config)?;

    let prompter: Arc<dyn Prompter> = if invocation.may_prompt() {
        Arc::new(TerminalPrompter::new())
    } else {
        Arc::new(NoPrompt)
    };
    let ocm = Arc::new(OcmClient::new(&config.ocm)?);
    let iam = Arc::new(AwsIam::from_config(&config.aws).await);

    let engine = Engine::new(ocm.clone(), ocm, iam, prompter, TracingReportSink);
    let outcome = engine.run(&invocation).await?;

    match &outcome.output {
        RunOutput::Manual { commands } => print!("{commands}"),
        RunOutput::Auto { report } => print!("{report}"),
        RunOutput::Declined => eprintln!("Operator roles were not created"),
    }
    for note in &outcome.notes {
        eprintln!("{note}");
    }

    if outcome.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
