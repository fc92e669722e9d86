//! Command dispatch: bridges CLI args to controller calls and output.

pub mod ai;
pub mod auth;
pub mod chat;
pub mod config_cmd;
pub mod devices;
pub mod greenhouses;
pub mod plants;
pub mod profile;
pub mod util;
pub mod watch;

use agroai_config::Config;
use agroai_core::Controller;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a backend-bound command to its handler.
pub async fn dispatch(
    cmd: Command,
    controller: &Controller,
    config: &Config,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Login(args) => auth::login(controller, args, config, global).await,
        Command::Logout => {
            auth::logout(controller, global);
            Ok(())
        }
        Command::Whoami => auth::whoami(controller, global).await,
        Command::Register(args) => auth::register(controller, args, config, global).await,
        Command::Profile(args) => profile::handle(controller, args, global).await,
        Command::Chat(args) => chat::handle(controller, args, global).await,
        Command::Greenhouses(args) => greenhouses::handle(controller, args, global).await,
        Command::Device(args) => devices::handle(controller, args, global).await,
        Command::Ai(args) => ai::handle(controller, args, global).await,
        Command::Plants(args) => plants::handle(controller, args, global).await,
        Command::Watch(args) => watch::handle(controller, args, global).await,
        // Handled before a controller exists.
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
