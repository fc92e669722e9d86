//! Config subcommand handlers.

use agroai_config::Config;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config;
use crate::error::CliError;
use crate::output;

const MASK: &str = "****";

/// Copy of `cfg` with plaintext secrets masked.
fn redacted(cfg: &Config) -> Config {
    let mut cfg = cfg.clone();
    for profile in cfg.profiles.values_mut() {
        if profile.guest_token.is_some() {
            profile.guest_token = Some(MASK.into());
        }
    }
    cfg
}

fn profile_names(cfg: &Config) -> String {
    let mut names: Vec<&str> = cfg.profiles.keys().map(String::as_str).collect();
    names.sort_unstable();
    names.join("\n")
}

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string(), global.quiet);
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = redacted(&config::load_config()?);
            let out = output::render_single(
                &global.output,
                &cfg,
                |c| toml::to_string_pretty(c).unwrap_or_default(),
                profile_names,
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use agroai_config::Profile;

    use super::*;

    #[test]
    fn guest_tokens_are_masked() {
        let mut cfg = Config::default();
        cfg.profiles.insert(
            "farm".into(),
            Profile {
                guest_token: Some("secret-token".into()),
                ..Profile::default()
            },
        );
        cfg.profiles.insert("local".into(), Profile::default());

        let shown = redacted(&cfg);
        assert_eq!(shown.profiles["farm"].guest_token.as_deref(), Some(MASK));
        assert_eq!(shown.profiles["local"].guest_token, None);
        assert_eq!(profile_names(&shown), "farm\nlocal");
    }
}
