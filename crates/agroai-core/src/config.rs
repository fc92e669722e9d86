// ── Runtime sync configuration ──
//
// Describes where the backend lives and how aggressively to poll it.
// Built by the CLI from a config profile; core never reads config files.

use std::time::Duration;

use secrecy::SecretString;

use agroai_api::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT, TlsMode, TransportConfig};

/// Greenhouse list refresh period.
pub const DEFAULT_LIST_POLL: Duration = Duration::from_secs(5);
/// Greenhouse detail refresh period. Shorter than the list.
pub const DEFAULT_DETAIL_POLL: Duration = Duration::from_secs(4);
/// How long a switched AI-mode value survives fetches that omit it.
pub const DEFAULT_AI_MODE_HOLD: Duration = Duration::from_secs(15);

#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Backend base URL. A trailing slash is ignored.
    pub api_url: String,
    pub tls: TlsMode,
    pub timeout: Duration,
    pub list_poll_interval: Duration,
    pub detail_poll_interval: Duration,
    pub ai_mode_hold: Duration,
    /// Token used when no user session is stored.
    pub guest_token: Option<SecretString>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_BASE_URL.to_owned(),
            tls: TlsMode::System,
            timeout: DEFAULT_TIMEOUT,
            list_poll_interval: DEFAULT_LIST_POLL,
            detail_poll_interval: DEFAULT_DETAIL_POLL,
            ai_mode_hold: DEFAULT_AI_MODE_HOLD,
            guest_token: None,
        }
    }
}

impl SyncConfig {
    pub fn with_api_url(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            ..Self::default()
        }
    }

    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: self.tls.clone(),
            timeout: self.timeout,
        }
    }
}
