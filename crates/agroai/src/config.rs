//! CLI configuration: thin wrapper around `agroai_config`.
//!
//! Adds resolution that respects `GlobalOpts` overrides (--api-url,
//! --timeout) and wires the profile's session file into a controller.

use std::sync::Arc;

use agroai_config::{Config, FileSessionStore, profile_to_sync_config};
use agroai_core::{Controller, Session, SyncConfig};

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use agroai_config::{config_path, load_config};

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    config.profile_name(global.profile.as_deref()).to_owned()
}

/// Translate the active profile plus global flags into a `SyncConfig`.
///
/// Flag overrides take priority over profile values.
pub fn resolve_sync_config(global: &GlobalOpts, config: &Config) -> Result<SyncConfig, CliError> {
    let name = active_profile_name(global, config);
    let mut profile = config.profile(&name)?;
    if let Some(ref url) = global.api_url {
        profile.api_url.clone_from(url);
    }
    if let Some(timeout) = global.timeout {
        profile.timeout = Some(timeout);
    }
    Ok(profile_to_sync_config(&profile, &config.defaults)?)
}

/// Build a controller whose session persists to the profile's file.
pub fn build_controller(global: &GlobalOpts, config: &Config) -> Result<Controller, CliError> {
    let name = active_profile_name(global, config);
    let sync = resolve_sync_config(global, config)?;
    let store = Arc::new(FileSessionStore::for_profile(&name));
    let session = Arc::new(Session::restore(store, sync.guest_token.clone()));
    Ok(Controller::new(sync, session)?)
}
