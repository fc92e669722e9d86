//! Device switch handler.

use agroai_core::Controller;

use crate::cli::{DeviceArgs, GlobalOpts, SwitchAction};
use crate::error::CliError;
use crate::output;

use super::util;

pub async fn handle(
    controller: &Controller,
    args: DeviceArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    util::require_session(controller)?;

    let DeviceArgs {
        greenhouse,
        kind,
        action,
    } = args;
    let on = match action {
        SwitchAction::On => {
            controller.switch_device(greenhouse, kind, true).await?;
            true
        }
        SwitchAction::Off => {
            controller.switch_device(greenhouse, kind, false).await?;
            false
        }
        SwitchAction::Toggle => controller.toggle_device(greenhouse, kind).await?,
    };

    output::status(
        &format!(
            "{} switched {} in greenhouse {greenhouse}",
            kind.label(),
            if on { "on" } else { "off" }
        ),
        global.quiet,
    );
    Ok(())
}
