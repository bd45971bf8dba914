//! Prompts on the controlling terminal.
//!
//! Questions go to stderr so stdout carries only command output.

use async_trait::async_trait;
use std::io::Write;
use stsroles_core::{EngineError, EngineResult};
use stsroles_runtime::prompt::check;
use stsroles_runtime::{Prompter, Validator};
use tokio::io::{AsyncBufReadExt, BufReader, Stdin};
use tokio::sync::Mutex;

pub struct TerminalPrompter {
    input: Mutex<BufReader<Stdin>>,
}

impl TerminalPrompter {
    pub fn new() -> Self {
        Self {
            input: Mutex::new(BufReader::new(tokio::io::stdin())),
        }
    }

    async fn ask(&self, line: &str) -> EngineResult<String> {
        let mut stderr = std::io::stderr();
        write!(stderr, "? {line}: ")
            .and_then(|_| stderr.flush())
            .map_err(|e| EngineError::Prompt(e.to_string()))?;

        let mut answer = String::new();
        let read = self
            .input
            .lock()
            .await
            .read_line(&mut answer)
            .await
            .map_err(|e| EngineError::Prompt(e.to_string()))?;
        if read == 0 {
            return Err(EngineError::Prompt("input closed".to_string()));
        }
        Ok(answer.trim().to_string())
    }
}

impl Default for TerminalPrompter {
    fn default() -> Self {
        Self::new()
    }
}

/// Question line with its default, e.g. `Role creation mode [auto/manual] (auto)`.
fn render_question(question: &str, options: &[&str], default: &str) -> String {
    let mut line = question.to_string();
    if !options.is_empty() {
        line.push_str(&format!(" [{}]", options.join("/")));
    }
    if !default.is_empty() {
        line.push_str(&format!(" ({default})"));
    }
    line
}

fn parse_yes_no(answer: &str) -> Option<bool> {
    match answer.to_ascii_lowercase().as_str() {
        "y" | "yes" => Some(true),
        "" | "n" | "no" => Some(false),
        _ => None,
    }
}

#[async_trait]
impl Prompter for TerminalPrompter {
    async fn ask_choice(
        &self,
        question: &str,
        options: &[&str],
        default: &str,
    ) -> EngineResult<String> {
        let line = render_question(question, options, default);
        loop {
            let answer = self.ask(&line).await?;
            if answer.is_empty() && !default.is_empty() {
                return Ok(default.to_string());
            }
            if options.contains(&answer.as_str()) {
                return Ok(answer);
            }
            eprintln!("  expected one of: {}", options.join(", "));
        }
    }

    async fn ask_string(
        &self,
        question: &str,
        default: &str,
        validators: &[Validator],
    ) -> EngineResult<String> {
        let line = render_question(question, &[], default);
        loop {
            let mut answer = self.ask(&line).await?;
            if answer.is_empty() {
                answer = default.to_string();
            }
            match check(&answer, validators) {
                Ok(()) => return Ok(answer),
                Err(message) => eprintln!("  {message}"),
            }
        }
    }

    async fn confirm(&self, question: &str) -> EngineResult<bool> {
        let line = format!("{question} [y/N]");
        loop {
            let answer = self.ask(&line).await?;
            if let Some(yes) = parse_yes_no(&answer) {
                return Ok(yes);
            }
        }
    }
}
