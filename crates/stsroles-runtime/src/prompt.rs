//! Interactive prompting seam.
//!
//! The engine never reads a terminal itself. Every question goes through a
//! [`Prompter`], so non-interactive runs and tests can answer (or refuse to
//! answer) without one.

use async_trait::async_trait;
use stsroles_core::arn::{validate_arn, validate_role_arn};
use stsroles_core::{EngineError, EngineResult};

/// Rejects an answer with a message shown to the user.
pub type Validator = fn(&str) -> Result<(), String>;

#[async_trait]
pub trait Prompter: Send + Sync {
    /// Pick one of `options`. An empty answer selects `default`.
    async fn ask_choice(&self, question: &str, options: &[&str], default: &str)
    -> EngineResult<String>;

    /// Free-form answer that must pass every validator.
    async fn ask_string(
        &self,
        question: &str,
        default: &str,
        validators: &[Validator],
    ) -> EngineResult<String>;

    async fn confirm(&self, question: &str) -> EngineResult<bool>;
}

/// Prompter for runs that must not ask anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPrompt;

#[async_trait]
impl Prompter for NoPrompt {
    async fn ask_choice(
        &self,
        question: &str,
        _options: &[&str],
        _default: &str,
    ) -> EngineResult<String> {
        Err(EngineError::Prompt(format!(
            "cannot ask '{question}' in a non-interactive run"
        )))
    }

    async fn ask_string(
        &self,
        question: &str,
        _default: &str,
        _validators: &[Validator],
    ) -> EngineResult<String> {
        Err(EngineError::Prompt(format!(
            "cannot ask '{question}' in a non-interactive run"
        )))
    }

    async fn confirm(&self, _question: &str) -> EngineResult<bool> {
        Ok(true)
    }
}

pub fn required(answer: &str) -> Result<(), String> {
    if answer.trim().is_empty() {
        return Err("a value is required".to_string());
    }
    Ok(())
}

/// Accepts an empty answer or a syntactically valid ARN.
pub fn optional_arn(answer: &str) -> Result<(), String> {
    if answer.trim().is_empty() {
        return Ok(());
    }
    validate_arn("permissions-boundary", answer.trim())
        .map(|_| ())
        .map_err(|e| e.to_string())
}

pub fn role_arn(answer: &str) -> Result<(), String> {
    validate_role_arn("installer-role-arn", answer.trim())
        .map(|_| ())
        .map_err(|e| e.to_string())
}

pub fn https_url(answer: &str) -> Result<(), String> {
    let answer = answer.trim();
    match answer.strip_prefix("https://") {
        Some(rest) if !rest.is_empty() => Ok(()),
        _ => Err(format!("'{answer}' is not an https URL")),
    }
}

/// First validator failure for `answer`, if any.
pub fn check(answer: &str, validators: &[Validator]) -> Result<(), String> {
    validators.iter().try_for_each(|validate| validate(answer))
}
