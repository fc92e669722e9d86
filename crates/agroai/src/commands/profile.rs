//! Account profile handlers.

use agroai_core::{Controller, UpdateProfile};

use crate::cli::{GlobalOpts, ProfileArgs, ProfileCommand};
use crate::error::CliError;
use crate::output;

use super::{auth, util};

pub async fn handle(
    controller: &Controller,
    args: ProfileArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    util::require_session(controller)?;

    match args.command.unwrap_or(ProfileCommand::Show) {
        ProfileCommand::Show => {
            let user = controller.profile().await?;
            auth::render_user(&user, global)
        }

        ProfileCommand::Update {
            first_name,
            last_name,
        } => {
            let update = UpdateProfile {
                first_name,
                last_name,
            };
            if update.is_empty() {
                return Err(CliError::Validation {
                    field: "profile".into(),
                    reason: "pass --first-name and/or --last-name".into(),
                });
            }
            let user = controller.update_profile(update).await?;
            output::status(&format!("Profile updated: {}", user.display_name()), global.quiet);
            Ok(())
        }
    }
}
