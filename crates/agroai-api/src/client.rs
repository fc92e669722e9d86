// AgroAI HTTP client
//
// Wraps `reqwest::Client` with base-URL joining, bearer-token injection
// from the shared `Session`, and uniform error mapping. Endpoint groups
// (auth, greenhouses, plants, chat) are inherent methods in separate files.

use std::sync::Arc;

use reqwest::{Method, StatusCode};
use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, trace, warn};
use url::Url;

use crate::error::{Error, detail_or_generic, extract_detail};
use crate::session::Session;
use crate::transport::TransportConfig;

/// Default backend location for local development.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

pub(crate) const LOGIN_PATH: &str = "/auth/login";
pub(crate) const REGISTER_PATH: &str = "/auth/register";

/// Paths whose 401 means "bad credentials" rather than "expired".
const CREDENTIAL_PATHS: [&str; 2] = [LOGIN_PATH, REGISTER_PATH];

/// Raw HTTP client for the AgroAI REST API.
///
/// Cheap to clone: the connection pool and session are shared.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: Arc<Session>,
    timeout_secs: u64,
}

impl ApiClient {
    /// Build a client for `base_url`. A trailing slash is stripped; request
    /// paths are appended verbatim.
    pub fn new(
        base_url: &str,
        transport: &TransportConfig,
        session: Arc<Session>,
    ) -> Result<Self, Error> {
        let base_url = base_url.trim_end_matches('/').to_owned();
        Url::parse(&base_url)?;
        Ok(Self {
            http: transport.build_client()?,
            base_url,
            session,
            timeout_secs: transport.timeout_secs(),
        })
    }

    /// Use a pre-built `reqwest::Client`.
    pub fn with_client(
        http: reqwest::Client,
        base_url: &str,
        session: Arc<Session>,
    ) -> Result<Self, Error> {
        let base_url = base_url.trim_end_matches('/').to_owned();
        Url::parse(&base_url)?;
        Ok(Self {
            http,
            base_url,
            session,
            timeout_secs: crate::transport::DEFAULT_TIMEOUT.as_secs(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// `{base}{path}`, validated.
    pub fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(Url::parse(&format!("{}{path}", self.base_url))?)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send a request and return the decoded JSON body.
    ///
    /// An empty success body decodes to `Value::Null`; a non-JSON success
    /// body is returned as `Value::String`.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value, Error> {
        let url = self.url(path)?;
        debug!("{method} {url}");

        let mut builder = self.http.request(method, url);
        if let Some(token) = self.session.token() {
            builder = builder.bearer_auth(token.expose_secret());
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let resp = builder.send().await.map_err(|e| self.map_send_error(e))?;
        self.parse_response(path, resp).await
    }

    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let value = self.request(Method::GET, path, None).await?;
        decode(value)
    }

    pub(crate) async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &(impl Serialize + Sync),
    ) -> Result<T, Error> {
        let body = encode(body)?;
        let value = self.request(Method::POST, path, Some(&body)).await?;
        decode(value)
    }

    pub(crate) async fn patch<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &(impl Serialize + Sync),
    ) -> Result<T, Error> {
        let body = encode(body)?;
        let value = self.request(Method::PATCH, path, Some(&body)).await?;
        decode(value)
    }

    pub(crate) async fn put<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &(impl Serialize + Sync),
    ) -> Result<T, Error> {
        let body = encode(body)?;
        let value = self.request(Method::PUT, path, Some(&body)).await?;
        decode(value)
    }

    pub(crate) async fn delete(&self, path: &str) -> Result<Value, Error> {
        self.request(Method::DELETE, path, None).await
    }

    fn map_send_error(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Timeout {
                timeout_secs: self.timeout_secs,
            }
        } else {
            Error::Transport(err)
        }
    }

    /// Map status codes to errors and decode the body.
    ///
    /// A 401 outside the credential endpoints tears the session down before the
    /// error is returned, so every caller sees a consistent state.
    async fn parse_response(&self, path: &str, resp: reqwest::Response) -> Result<Value, Error> {
        let status = resp.status();
        let body = resp.text().await.map_err(|e| self.map_send_error(e))?;
        trace!(%status, len = body.len(), "response received");

        if status == StatusCode::UNAUTHORIZED {
            if is_credential_path(path) {
                return Err(Error::Authentication {
                    message: extract_detail(&body)
                        .unwrap_or_else(|| "invalid credentials".into()),
                });
            }
            warn!(path, "request rejected with 401, dropping session");
            self.session.expire();
            return Err(Error::SessionExpired);
        }

        if !status.is_success() {
            return Err(Error::Api {
                status: status.as_u16(),
                message: detail_or_generic(&body),
            });
        }

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&body).unwrap_or(Value::String(body)))
    }
}

fn is_credential_path(path: &str) -> bool {
    let path = path.split('?').next().unwrap_or(path);
    CREDENTIAL_PATHS.contains(&path.trim_end_matches('/'))
}

fn encode(body: &impl Serialize) -> Result<Value, Error> {
    serde_json::to_value(body).map_err(|e| Error::Deserialization {
        message: format!("failed to encode request body: {e}"),
        body: String::new(),
    })
}

pub(crate) fn decode<T: DeserializeOwned>(value: Value) -> Result<T, Error> {
    serde_json::from_value::<T>(value.clone()).map_err(|e| {
        let body = value.to_string();
        let preview: String = body.chars().take(200).collect();
        Error::Deserialization {
            message: format!("{e} (body preview: {preview:?})"),
            body,
        }
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_stripped() {
        let client = ApiClient::new(
            "http://example.test:8000/",
            &TransportConfig::default(),
            Arc::new(Session::in_memory()),
        )
        .unwrap();
        assert_eq!(client.base_url(), "http://example.test:8000");
        assert_eq!(
            client.url("/greenhouses/1/ai/switch/on/").unwrap().as_str(),
            "http://example.test:8000/greenhouses/1/ai/switch/on/"
        );
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let err = ApiClient::new(
            "not a url",
            &TransportConfig::default(),
            Arc::new(Session::in_memory()),
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidUrl(_)));
    }

    #[test]
    fn credential_path_detection() {
        assert!(is_credential_path("/auth/login"));
        assert!(is_credential_path("/auth/login/"));
        assert!(is_credential_path("/auth/register"));
        assert!(!is_credential_path("/auth/whoami"));
        assert!(!is_credential_path("/users/me"));
    }
}
