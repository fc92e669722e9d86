//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and a process exit code.

use miette::Diagnostic;
use thiserror::Error;

use agroai_config::ConfigError;
use agroai_core::CoreError;

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the AgroAI backend")]
    #[diagnostic(
        code(agroai::connection_failed),
        help(
            "Check that the backend is running and reachable.\n\
             Reason: {reason}\n\
             Override the URL with --api-url or AGROAI_API_URL."
        )
    )]
    ConnectionFailed { reason: String },

    #[error("Request timed out after {seconds}s")]
    #[diagnostic(
        code(agroai::timeout),
        help("Increase the timeout with --timeout or check backend responsiveness.")
    )]
    Timeout { seconds: u64 },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(code(agroai::auth_failed), help("Check your email and password."))]
    AuthFailed { message: String },

    #[error("Not logged in")]
    #[diagnostic(code(agroai::not_logged_in), help("Run: agroai login"))]
    NotLoggedIn,

    #[error("Session expired")]
    #[diagnostic(code(agroai::session_expired), help("Run: agroai login"))]
    SessionExpired,

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(agroai::not_found),
        help("Run: agroai {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    #[error("{message}")]
    #[diagnostic(
        code(agroai::device_unavailable),
        help("Check the device's wiring, or turn AI mode off for manual control.")
    )]
    DeviceUnavailable { message: String },

    // ── API ──────────────────────────────────────────────────────────
    #[error("API error (HTTP {status}): {message}")]
    #[diagnostic(code(agroai::api_error))]
    ApiError { status: u16, message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(agroai::validation))]
    Validation { field: String, reason: String },

    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(agroai::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(agroai::profile_not_found),
        help("Add a [profiles.{name}] table to the config file (see: agroai config path).")
    )]
    ProfileNotFound { name: String },

    #[error("Configuration error: {0}")]
    #[diagnostic(code(agroai::config))]
    Config(String),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to encode output: {0}")]
    #[diagnostic(code(agroai::serialization))]
    Serialization(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::AuthFailed { .. } | Self::NotLoggedIn | Self::SessionExpired => exit_code::AUTH,
            Self::NotFound { .. } | Self::ApiError { status: 404, .. } => exit_code::NOT_FOUND,
            Self::DeviceUnavailable { .. } => exit_code::CONFLICT,
            Self::Validation { .. }
            | Self::NonInteractiveRequiresYes { .. }
            | Self::ProfileNotFound { .. }
            | Self::Config(_) => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { reason } => Self::ConnectionFailed { reason },
            CoreError::Timeout { timeout_secs } => Self::Timeout {
                seconds: timeout_secs,
            },
            CoreError::AuthenticationFailed { message } => Self::AuthFailed { message },
            CoreError::SessionExpired => Self::SessionExpired,
            CoreError::NotFound { entity, identifier } => Self::NotFound {
                list_command: format!("{entity}s list"),
                resource_type: entity,
                identifier,
            },
            CoreError::ValidationFailed { message } => Self::Validation {
                field: "input".into(),
                reason: message,
            },
            CoreError::DeviceOffline { device } => Self::DeviceUnavailable {
                message: format!("Device {device} is offline"),
            },
            CoreError::UnknownDevice { name } => Self::Validation {
                field: "device".into(),
                reason: format!("unknown device '{name}'"),
            },
            CoreError::Api { status, message } => Self::ApiError { status, message },
            CoreError::UnexpectedResponse { message } => Self::ApiError { status: 0, message },
            CoreError::Config { message } => Self::Config(message),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::UnknownProfile { name } => Self::ProfileNotFound { name },
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::Io(e) => Self::Io(e),
            other => Self::Config(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_error_class() {
        let auth = CliError::from(CoreError::SessionExpired);
        assert_eq!(auth.exit_code(), exit_code::AUTH);

        let missing = CliError::from(CoreError::Api {
            status: 404,
            message: "Greenhouse not found".into(),
        });
        assert_eq!(missing.exit_code(), exit_code::NOT_FOUND);

        let down = CliError::from(CoreError::ConnectionFailed {
            reason: "refused".into(),
        });
        assert_eq!(down.exit_code(), exit_code::CONNECTION);

        let slow = CliError::from(CoreError::Timeout { timeout_secs: 5 });
        assert_eq!(slow.exit_code(), exit_code::TIMEOUT);
    }

    #[test]
    fn offline_device_is_a_conflict() {
        let err = CliError::from(CoreError::DeviceOffline {
            device: "Fan".into(),
        });
        assert_eq!(err.exit_code(), exit_code::CONFLICT);
        assert_eq!(err.to_string(), "Device Fan is offline");
    }

    #[test]
    fn unknown_profile_is_usage_error() {
        let err = CliError::from(ConfigError::UnknownProfile {
            name: "staging".into(),
        });
        assert!(matches!(err, CliError::ProfileNotFound { .. }));
        assert_eq!(err.exit_code(), exit_code::USAGE);
    }
}
