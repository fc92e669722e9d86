// ── Core error types ──
//
// Consumers never see raw HTTP status codes or JSON parse failures.
// `From<agroai_api::Error>` translates transport errors into domain
// variants, and `user_message` produces the text for a notification.

use thiserror::Error;

/// Shown for any network-level failure.
pub const CONNECTION_PROBLEM: &str = "Connection problem. Please try again.";

#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Cannot reach the AgroAI backend: {reason}")]
    ConnectionFailed { reason: String },

    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── Auth ─────────────────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Session expired -- please log in again")]
    SessionExpired,

    // ── Data ─────────────────────────────────────────────────────────
    #[error("{entity} {identifier} not found")]
    NotFound { entity: String, identifier: String },

    #[error("{message}")]
    ValidationFailed { message: String },

    #[error("Device {device} is offline")]
    DeviceOffline { device: String },

    #[error("Unknown device kind: {name}")]
    UnknownDevice { name: String },

    // ── Backend ──────────────────────────────────────────────────────
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Unexpected response: {message}")]
    UnexpectedResponse { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl CoreError {
    /// Notification text for this failure.
    pub fn user_message(&self) -> String {
        match self {
            Self::ConnectionFailed { .. } | Self::Timeout { .. } => CONNECTION_PROBLEM.to_owned(),
            Self::ValidationFailed { message }
            | Self::Api { message, .. }
            | Self::AuthenticationFailed { message } => message.clone(),
            _ => self.to_string(),
        }
    }

    pub fn is_session_expired(&self) -> bool {
        matches!(self, Self::SessionExpired)
    }
}

impl From<agroai_api::Error> for CoreError {
    fn from(err: agroai_api::Error) -> Self {
        use agroai_api::Error as Api;

        match err {
            Api::Authentication { message } => Self::AuthenticationFailed { message },
            Api::SessionExpired => Self::SessionExpired,
            Api::Timeout { timeout_secs } => Self::Timeout { timeout_secs },
            Api::Transport(ref e) if e.is_timeout() => Self::Timeout { timeout_secs: 0 },
            Api::Transport(e) => Self::ConnectionFailed {
                reason: e.to_string(),
            },
            Api::InvalidUrl(e) => Self::Config {
                message: format!("invalid API URL: {e}"),
            },
            Api::Tls(message) => Self::Config { message },
            Api::Api { status: 422, message } => Self::ValidationFailed { message },
            Api::Api { status, message } => Self::Api { status, message },
            Api::Deserialization { message, .. } => Self::UnexpectedResponse { message },
        }
    }
}
