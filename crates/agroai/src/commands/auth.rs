//! Login, registration, logout, and whoami.

use dialoguer::Input;
use secrecy::SecretString;
use serde::Serialize;

use agroai_config::Config;
use agroai_core::{Controller, RegisterRequest, User};

use crate::cli::{GlobalOpts, LoginArgs, RegisterArgs};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Serialize)]
struct UserOut<'a> {
    #[serde(flatten)]
    user: &'a User,
    display_name: String,
}

fn detail(u: &UserOut<'_>) -> String {
    [
        format!("ID:     {}", u.user.id),
        format!("Name:   {}", u.display_name),
        format!("Email:  {}", u.user.email),
        format!("Active: {}", if u.user.is_active { "yes" } else { "no" }),
    ]
    .join("\n")
}

pub(crate) fn render_user(user: &User, global: &GlobalOpts) -> Result<(), CliError> {
    let out = UserOut {
        user,
        display_name: user.display_name(),
    };
    let rendered = output::render_single(&global.output, &out, detail, |u| u.user.email.clone())?;
    output::print_output(&rendered, global.quiet);
    Ok(())
}

/// Email from the flag, the profile, or a prompt; password from the flag
/// or a hidden prompt.
fn credentials(
    email: Option<String>,
    password: Option<String>,
    config: &Config,
    global: &GlobalOpts,
) -> Result<(String, String), CliError> {
    let profile_email = config
        .profile(config.profile_name(global.profile.as_deref()))
        .ok()
        .and_then(|p| p.email);

    let email = match email.or(profile_email) {
        Some(email) => email,
        None => Input::new()
            .with_prompt("Email")
            .interact_text()
            .map_err(util::prompt_err)?,
    };
    let password = match password {
        Some(password) => password,
        None => rpassword::prompt_password("Password: ").map_err(util::prompt_err)?,
    };

    if email.trim().is_empty() || password.is_empty() {
        return Err(CliError::Validation {
            field: "credentials".into(),
            reason: "email and password cannot be empty".into(),
        });
    }
    Ok((email.trim().to_owned(), password))
}

pub async fn login(
    controller: &Controller,
    args: LoginArgs,
    config: &Config,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let (email, password) = credentials(args.email, args.password, config, global)?;
    let user = controller
        .login(&email, SecretString::from(password))
        .await?;
    output::status(&format!("Logged in as {}", user.display_name()), global.quiet);
    Ok(())
}

pub async fn register(
    controller: &Controller,
    args: RegisterArgs,
    config: &Config,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let (email, password) = credentials(args.email, args.password, config, global)?;
    let request = RegisterRequest {
        email,
        password: SecretString::from(password),
        first_name: args.first_name.trim().to_owned(),
        last_name: args.last_name.trim().to_owned(),
    };
    let user = controller.register(&request).await?;
    output::status(&format!("Registered as {}", user.display_name()), global.quiet);
    Ok(())
}

pub fn logout(controller: &Controller, global: &GlobalOpts) {
    controller.logout();
    output::status("Logged out", global.quiet);
}

pub async fn whoami(controller: &Controller, global: &GlobalOpts) -> Result<(), CliError> {
    util::require_session(controller)?;
    let user = controller.whoami().await?;
    render_user(&user, global)
}
