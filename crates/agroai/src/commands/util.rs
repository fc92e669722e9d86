//! Shared helpers for command handlers.

use std::io::IsTerminal;

use agroai_core::{Controller, SessionState};

use crate::error::CliError;

/// Prompt for confirmation, auto-approving if `--yes` was passed.
///
/// Without a terminal to prompt on, `--yes` is required.
pub fn confirm(message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: message.into(),
        });
    }
    dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(prompt_err)
}

/// Map a dialoguer / interactive I/O failure into CliError.
pub fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

/// Fail early when there is no token to send.
pub fn require_session(controller: &Controller) -> Result<(), CliError> {
    match controller.session().state() {
        SessionState::Anonymous => Err(CliError::NotLoggedIn),
        SessionState::Expired => Err(CliError::SessionExpired),
        SessionState::Guest | SessionState::Authenticated => Ok(()),
    }
}
