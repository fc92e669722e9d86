// Authentication and account endpoints
//
// Login and registration are the only requests allowed to fail with 401
// without tearing the session down; see `ApiClient::parse_response`.

use secrecy::SecretString;
use tracing::{debug, info};

use crate::client::{ApiClient, LOGIN_PATH, REGISTER_PATH};
use crate::error::Error;
use crate::models::{LoginRequest, LoginResponse, RegisterRequest, UpdateProfile, User};

impl ApiClient {
    /// Exchange credentials for a bearer token and install it in the session.
    ///
    /// `POST /auth/login` with `{email, password}`
    pub async fn login(&self, email: &str, password: SecretString) -> Result<LoginResponse, Error> {
        debug!(email, "logging in");
        let request = LoginRequest {
            email: email.to_owned(),
            password,
        };
        let resp: LoginResponse = self.post(LOGIN_PATH, &request.to_json()).await?;
        self.adopt(&resp);
        info!(user = %resp.user.email, "logged in");
        Ok(resp)
    }

    /// Create an account. The backend answers like a login, so the new
    /// token is installed right away.
    ///
    /// `POST /auth/register` with `{email, password, first_name, last_name}`
    pub async fn register(&self, request: &RegisterRequest) -> Result<LoginResponse, Error> {
        debug!(email = %request.email, "registering");
        let resp: LoginResponse = self.post(REGISTER_PATH, &request.to_json()).await?;
        self.adopt(&resp);
        info!(user = %resp.user.email, "registered");
        Ok(resp)
    }

    fn adopt(&self, resp: &LoginResponse) {
        self.session().establish(
            SecretString::from(resp.access_token.clone()),
            Some(resp.user.clone()),
        );
    }

    /// The user owning the current token.
    ///
    /// `GET /auth/whoami`
    pub async fn whoami(&self) -> Result<User, Error> {
        self.get("/auth/whoami").await
    }

    /// `GET /users/me`
    pub async fn profile(&self) -> Result<User, Error> {
        self.get("/users/me").await
    }

    /// `PUT /users/me` with the names to change.
    pub async fn update_profile(&self, update: &UpdateProfile) -> Result<User, Error> {
        debug!("updating profile");
        self.put("/users/me", update).await
    }

    /// Drop the local session. The backend keeps no server-side session.
    pub fn logout(&self) {
        self.session().clear();
    }
}
