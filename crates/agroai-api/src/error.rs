use thiserror::Error;

/// Fallback shown when an error response carries no usable `detail`.
pub const GENERIC_FAILURE: &str = "Something went wrong";

/// Top-level error type for the `agroai-api` crate.
///
/// Covers every failure mode of the backend surface: authentication,
/// session expiry, transport, structured API errors, and malformed bodies.
/// `agroai-core` maps these into user-facing notifications.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Login rejected (wrong credentials, inactive account, etc.).
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// A non-login request was answered with 401. The session has
    /// already been torn down by the time the caller sees this.
    #[error("Session expired -- please log in again")]
    SessionExpired,

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request timed out.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Backend ─────────────────────────────────────────────────────
    /// Non-2xx response. `message` is taken from the `detail` payload
    /// when the body has one.
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if the session is gone and logging in again might help.
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, Self::SessionExpired)
    }

    /// Returns `true` for network-level failures (connect, timeout).
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Self::Timeout { .. } => true,
            _ => false,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// HTTP status code, when the failure came with one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::SessionExpired | Self::Authentication { .. } => Some(401),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Pull a human-readable message out of an error body.
///
/// The backend answers validation failures as `{"detail": "..."}` or
/// `{"detail": [{"msg": "...", ...}]}`. Anything else yields `None`.
pub fn extract_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        serde_json::Value::Array(items) => items
            .first()
            .and_then(|item| item.get("msg"))
            .and_then(serde_json::Value::as_str)
            .map(String::from),
        _ => None,
    }
}

/// Like [`extract_detail`], falling back to [`GENERIC_FAILURE`].
pub fn detail_or_generic(body: &str) -> String {
    extract_detail(body).unwrap_or_else(|| GENERIC_FAILURE.to_owned())
}
