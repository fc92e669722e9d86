//! AI-mode switch handler.

use agroai_core::Controller;

use crate::cli::{AiArgs, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

pub async fn handle(
    controller: &Controller,
    args: AiArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    util::require_session(controller)?;

    let on = args.state.is_on();
    controller.switch_ai_mode(args.greenhouse, on).await?;
    output::status(
        &format!(
            "AI mode {} for greenhouse {}",
            if on { "enabled" } else { "disabled" },
            args.greenhouse
        ),
        global.quiet,
    );
    Ok(())
}
