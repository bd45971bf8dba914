//! Mode resolution.
//!
//! Runs before anything touches the network. The outcome is the final mode
//! plus whether the rest of the run may prompt.

use crate::prompt::Prompter;
use crate::request::Invocation;
use stsroles_core::{EngineError, EngineResult, Mode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeResolution {
    pub mode: Mode,
    pub interactive: bool,
}

const MODE_QUESTION: &str = "Role creation mode";

/// Settle the run mode.
///
/// * Programmatic triplet with a mode: that mode verbatim. Never prompts.
/// * Programmatic triplet without a mode: interactive, the prompt defaults to auto.
/// * `--mode` given: parsed strictly; prompts only when already interactive.
/// * `--mode` absent: interactive is switched on and the prompt defaults to auto.
pub async fn resolve_mode(
    invocation: &Invocation,
    prompter: &dyn Prompter,
) -> EngineResult<ModeResolution> {
    let (default, interactive) = match invocation {
        Invocation::Programmatic(req) if req.is_unattended() => {
            return Ok(ModeResolution {
                mode: req.mode.trim().parse()?,
                interactive: false,
            });
        }
        Invocation::Programmatic(_) => (Mode::Auto, true),
        Invocation::Flags(flags) => match flags.mode.as_deref() {
            Some(raw) => (raw.parse::<Mode>()?, flags.interactive),
            None => (Mode::Auto, true),
        },
    };

    if !interactive {
        return Ok(ModeResolution {
            mode: default,
            interactive,
        });
    }

    let options: Vec<&str> = Mode::ALL.iter().map(Mode::as_str).collect();
    let answer = prompter
        .ask_choice(MODE_QUESTION, &options, default.as_str())
        .await?;
    let mode = answer.trim().parse()?;
    tracing::debug!(%mode, "mode chosen interactively");

    Ok(ModeResolution { mode, interactive })
}

/// Mode checks that need no prompt.
///
/// A preset mode must parse, and once no prompt can change it, it must allow
/// `--force-policy-creation`.
pub fn check_preset_mode(invocation: &Invocation) -> EngineResult<()> {
    match invocation {
        Invocation::Programmatic(req) if req.is_unattended() => {
            req.mode.trim().parse::<Mode>()?;
        }
        Invocation::Programmatic(_) => {}
        Invocation::Flags(flags) => {
            if let Some(raw) = flags.mode.as_deref() {
                let mode = raw.parse::<Mode>()?;
                if !flags.interactive {
                    ensure_force_allowed(flags.force_policy_creation, mode)?;
                }
            }
        }
    }
    Ok(())
}

/// Forced policy overwrite is only meaningful when the engine applies changes itself.
pub fn ensure_force_allowed(force: bool, mode: Mode) -> EngineResult<()> {
    if force && mode != Mode::Auto {
        return Err(EngineError::InvalidCombination(format!(
            "--force-policy-creation is only supported in auto mode, not '{mode}'"
        )));
    }
    Ok(())
}
