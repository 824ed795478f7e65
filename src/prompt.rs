// Interactive decisions - trait + terminal implementation

use std::io::{stdin, IsTerminal};

use colored::Colorize;
use inquire::{Confirm, Select, Text};

use crate::error::Error;

const PREFER_BACKEND: &str = "Prefer backend values";
const PREFER_FRONTEND: &str = "Prefer frontend values";
const MANUAL: &str = "Manual selection for each conflict";

/// How keys present in both env files with differing values are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergePolicy {
    PreferBackend,
    PreferFrontend,
    Manual,
}

/// Which side wins a single conflicting key under manual resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueChoice {
    Backend,
    Frontend,
}

/// Every decision the pipeline needs from a human goes through here, so the
/// pipeline itself never reads standard input.
pub trait Prompter {
    /// Ask for a secret name or ARN when no flag supplied one.
    fn secret_id(&self) -> Result<String, Error>;
    /// Ask how to resolve the conflicting keys printed beforehand.
    fn merge_policy(&self) -> MergePolicy;
    /// Ask which value to keep for one conflicting key.
    fn choose_value(&self, key: &str, backend: &str, frontend: &str) -> ValueChoice;
    /// Final confirmation before overwriting the remote secret.
    fn confirm_update(&self) -> bool;
}

/// Real prompting over the terminal. When standard input is not a terminal,
/// every prompt degrades to its safe answer: no secret id (fatal upstream),
/// backend values for conflicts, and no to the update.
pub struct TerminalPrompter;

impl TerminalPrompter {
    fn interactive() -> bool {
        stdin().is_terminal()
    }
}

impl Prompter for TerminalPrompter {
    fn secret_id(&self) -> Result<String, Error> {
        if !Self::interactive() {
            return Err(Error::Prompt(
                "standard input is not a terminal".to_string(),
            ));
        }
        let answer = Text::new("Secret name or ARN:")
            .prompt()
            .map_err(|e| Error::Prompt(e.to_string()))?;
        let answer = answer.trim();
        if answer.is_empty() {
            return Err(Error::MissingSecretId);
        }
        Ok(answer.to_string())
    }

    fn merge_policy(&self) -> MergePolicy {
        if Self::interactive() {
            let options = vec![PREFER_BACKEND, PREFER_FRONTEND, MANUAL];
            match Select::new("How do you want to resolve these conflicts?", options).prompt() {
                Ok(PREFER_FRONTEND) => return MergePolicy::PreferFrontend,
                Ok(MANUAL) => return MergePolicy::Manual,
                Ok(_) => return MergePolicy::PreferBackend,
                Err(_) => {}
            }
        }
        eprintln!(
            "{}: No choice made. Using backend values for conflicts.",
            "Warning".yellow()
        );
        MergePolicy::PreferBackend
    }

    fn choose_value(&self, key: &str, backend: &str, frontend: &str) -> ValueChoice {
        if Self::interactive() {
            let options = vec![
                format!("Backend: {}", backend),
                format!("Frontend: {}", frontend),
            ];
            match Select::new(&format!("Choose value for {}", key), options).prompt() {
                Ok(choice) if choice.starts_with("Frontend:") => return ValueChoice::Frontend,
                Ok(_) => return ValueChoice::Backend,
                Err(_) => {}
            }
        }
        eprintln!(
            "{}: No choice made for {}. Keeping backend value.",
            "Warning".yellow(),
            key
        );
        ValueChoice::Backend
    }

    fn confirm_update(&self) -> bool {
        if !Self::interactive() {
            return false;
        }
        Confirm::new("Do you want to update AWS Secrets Manager with your combined local values?")
            .with_default(false)
            .prompt()
            .unwrap_or(false)
    }
}
