//! Shared configuration for AgroAI tools.
//!
//! TOML profiles merged with `AGROAI_*` environment variables, translation
//! to `agroai_core::SyncConfig`, and a file-backed session store so a
//! login survives between invocations.

mod session_file;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use agroai_api::TlsMode;
use agroai_core::SyncConfig;

pub use session_file::FileSessionStore;

/// Overrides the config file location.
pub const CONFIG_PATH_ENV: &str = "AGROAI_CONFIG";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found")]
    UnknownProfile { name: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// Name of the profile to use: `requested`, else the default profile.
    pub fn profile_name<'a>(&'a self, requested: Option<&'a str>) -> &'a str {
        requested
            .or(self.default_profile.as_deref())
            .unwrap_or("default")
    }

    /// Look up a profile. A missing `default` profile resolves to the
    /// built-in one so a fresh install works against a local backend.
    pub fn profile(&self, name: &str) -> Result<Profile, ConfigError> {
        match self.profiles.get(name) {
            Some(profile) => Ok(profile.clone()),
            None if name == "default" => Ok(Profile::default()),
            None => Err(ConfigError::UnknownProfile { name: name.into() }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default = "default_list_poll")]
    pub list_poll_secs: u64,

    #[serde(default = "default_detail_poll")]
    pub detail_poll_secs: u64,

    #[serde(default = "default_ai_mode_hold")]
    pub ai_mode_hold_secs: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            timeout: default_timeout(),
            list_poll_secs: default_list_poll(),
            detail_poll_secs: default_detail_poll(),
            ai_mode_hold_secs: default_ai_mode_hold(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_list_poll() -> u64 {
    5
}
fn default_detail_poll() -> u64 {
    4
}
fn default_ai_mode_hold() -> u64 {
    15
}
fn default_api_url() -> String {
    agroai_api::DEFAULT_BASE_URL.into()
}

/// A named backend profile.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Profile {
    /// Backend base URL (e.g. "https://agroai.example.com").
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Email to prefill at login.
    pub email: Option<String>,

    /// Guest token (plaintext -- prefer `guest_token_env`).
    pub guest_token: Option<String>,

    /// Environment variable holding the guest token.
    pub guest_token_env: Option<String>,

    /// Path to an extra CA certificate.
    pub ca_cert: Option<PathBuf>,

    pub timeout: Option<u64>,
    pub list_poll_secs: Option<u64>,
    pub detail_poll_secs: Option<u64>,
    pub ai_mode_hold_secs: Option<u64>,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            email: None,
            guest_token: None,
            guest_token_env: None,
            ca_cert: None,
            timeout: None,
            list_poll_secs: None,
            detail_poll_secs: None,
            ai_mode_hold_secs: None,
        }
    }
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "agroai", "agroai")
}

/// Config file path: `$AGROAI_CONFIG`, else the platform config dir.
pub fn config_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV) {
        return PathBuf::from(path);
    }
    project_dirs().map_or_else(
        || fallback_dir(".config").join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Directory holding per-profile session files.
pub fn data_dir() -> PathBuf {
    project_dirs().map_or_else(
        || fallback_dir(".local/share"),
        |dirs| dirs.data_dir().to_path_buf(),
    )
}

fn fallback_dir(base: &str) -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(base);
    p.push("agroai");
    p
}

// ── Loading & saving ────────────────────────────────────────────────

/// Load config from the canonical path plus environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load config from `path` plus `AGROAI_*` environment overrides.
///
/// Nested keys use a double underscore: `AGROAI_DEFAULTS__TIMEOUT=60`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let config: Config = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("AGROAI_").split("__"))
        .extract()?;
    Ok(config)
}

pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, toml::to_string_pretty(cfg)?)?;
    Ok(())
}

// ── Translation ─────────────────────────────────────────────────────

/// Resolve the guest token: named env var first, then plaintext.
pub fn resolve_guest_token(profile: &Profile) -> Option<SecretString> {
    if let Some(ref env_name) = profile.guest_token_env {
        if let Ok(val) = std::env::var(env_name) {
            return Some(SecretString::from(val));
        }
    }
    profile.guest_token.clone().map(SecretString::from)
}

fn positive_secs(field: &str, secs: u64) -> Result<Duration, ConfigError> {
    if secs == 0 {
        return Err(ConfigError::Validation {
            field: field.into(),
            reason: "must be at least 1 second".into(),
        });
    }
    Ok(Duration::from_secs(secs))
}

/// Build a `SyncConfig` from a profile, falling back to `defaults`.
pub fn profile_to_sync_config(
    profile: &Profile,
    defaults: &Defaults,
) -> Result<SyncConfig, ConfigError> {
    url::Url::parse(&profile.api_url).map_err(|_| ConfigError::Validation {
        field: "api_url".into(),
        reason: format!("invalid URL: {}", profile.api_url),
    })?;

    let tls = profile
        .ca_cert
        .clone()
        .map_or(TlsMode::System, TlsMode::CustomCa);

    Ok(SyncConfig {
        api_url: profile.api_url.clone(),
        tls,
        timeout: positive_secs("timeout", profile.timeout.unwrap_or(defaults.timeout))?,
        list_poll_interval: positive_secs(
            "list_poll_secs",
            profile.list_poll_secs.unwrap_or(defaults.list_poll_secs),
        )?,
        detail_poll_interval: positive_secs(
            "detail_poll_secs",
            profile.detail_poll_secs.unwrap_or(defaults.detail_poll_secs),
        )?,
        ai_mode_hold: Duration::from_secs(
            profile.ai_mode_hold_secs.unwrap_or(defaults.ai_mode_hold_secs),
        ),
        guest_token: resolve_guest_token(profile),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg.defaults.detail_poll_secs, 4);
        assert_eq!(cfg.defaults.list_poll_secs, 5);
        assert_eq!(cfg.profile_name(None), "default");
        assert_eq!(cfg.profile("default").unwrap().api_url, "http://localhost:8000");
    }

    #[test]
    fn profiles_round_trip_through_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut cfg = Config::default();
        cfg.profiles.insert(
            "farm".into(),
            Profile {
                api_url: "https://farm.example.com".into(),
                detail_poll_secs: Some(2),
                ..Profile::default()
            },
        );
        cfg.default_profile = Some("farm".into());
        save_config_to(&cfg, &path).unwrap();

        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded.profile_name(None), "farm");
        assert_eq!(loaded.profile("farm").unwrap().detail_poll_secs, Some(2));
        assert!(matches!(
            loaded.profile("nope"),
            Err(ConfigError::UnknownProfile { .. })
        ));
    }

    #[test]
    fn sync_config_merges_profile_over_defaults() {
        let profile = Profile {
            api_url: "https://farm.example.com/".into(),
            list_poll_secs: Some(10),
            guest_token: Some("guest".into()),
            ..Profile::default()
        };
        let sync = profile_to_sync_config(&profile, &Defaults::default()).unwrap();
        assert_eq!(sync.list_poll_interval, Duration::from_secs(10));
        assert_eq!(sync.detail_poll_interval, Duration::from_secs(4));
        assert_eq!(sync.ai_mode_hold, Duration::from_secs(15));
        assert!(sync.guest_token.is_some());
    }

    #[test]
    fn invalid_values_are_rejected() {
        let bad_url = Profile {
            api_url: "not a url".into(),
            ..Profile::default()
        };
        assert!(matches!(
            profile_to_sync_config(&bad_url, &Defaults::default()),
            Err(ConfigError::Validation { ref field, .. }) if field == "api_url"
        ));

        let zero_poll = Profile {
            detail_poll_secs: Some(0),
            ..Profile::default()
        };
        assert!(profile_to_sync_config(&zero_poll, &Defaults::default()).is_err());
    }
}
