//! Assistant chat: one question, or an interactive session.

use std::io::IsTerminal;

use dialoguer::Input;

use agroai_core::{CHAT_WELCOME, ChatTranscript, Controller, CoreError};

use crate::cli::{ChatArgs, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

pub async fn handle(
    controller: &Controller,
    args: ChatArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    util::require_session(controller)?;
    let mut transcript = ChatTranscript::new();

    if let Some(message) = args.message {
        let reply = transcript.send(controller, &message).await?;
        let out = output::render_single(
            &global.output,
            reply,
            |m| m.text.clone(),
            |m| m.text.clone(),
        )?;
        output::print_output(&out, global.quiet);
        return Ok(());
    }

    if !std::io::stdin().is_terminal() {
        return Err(CliError::Validation {
            field: "message".into(),
            reason: "pass a message, or run in a terminal for an interactive session".into(),
        });
    }

    output::print_output(CHAT_WELCOME, false);
    output::status("(empty line or \"exit\" to leave)", global.quiet);
    loop {
        let line: String = Input::new()
            .with_prompt("you")
            .allow_empty(true)
            .interact_text()
            .map_err(util::prompt_err)?;
        let line = line.trim();
        if line.is_empty() || matches!(line, "exit" | "quit") {
            return Ok(());
        }

        match transcript.send(controller, line).await {
            Ok(reply) => output::print_output(&reply.text, false),
            Err(CoreError::SessionExpired) => return Err(CliError::SessionExpired),
            Err(e) => {
                if let Some(fallback) = transcript.messages().last() {
                    output::print_output(&fallback.text, false);
                }
                output::status(&e.user_message(), global.quiet);
            }
        }
    }
}
