//! Name/password login against the store's auth endpoints.
//!
//! Endpoints: `POST /login` and `POST /signup`, both taking
//! `{name, password}` and answering `{user: {name}, token?}`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{AuthError, Authenticator, Identity};

/// Whether to log into an existing account or register a new one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordMode {
    Login,
    Signup,
}

impl PasswordMode {
    fn path(&self) -> &'static str {
        match self {
            PasswordMode::Login => "login",
            PasswordMode::Signup => "signup",
        }
    }
}

#[derive(Debug, Serialize)]
struct CredentialsBody<'a> {
    name: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct AuthResponse {
    user: AuthUser,
    #[serde(default)]
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AuthUser {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

/// Password-based strategy
pub struct PasswordLogin {
    base_url: String,
    name: String,
    password: String,
    mode: PasswordMode,
    client: reqwest::Client,
}

impl PasswordLogin {
    pub fn new(
        base_url: impl Into<String>,
        name: impl Into<String>,
        password: impl Into<String>,
        mode: PasswordMode,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            name: name.into(),
            password: password.into(),
            mode,
            client: reqwest::Client::new(),
        }
    }

    /// Build API URL
    fn api_url(&self) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), self.mode.path())
    }
}

#[async_trait]
impl Authenticator for PasswordLogin {
    fn name(&self) -> &str {
        match self.mode {
            PasswordMode::Login => "password-login",
            PasswordMode::Signup => "password-signup",
        }
    }

    async fn authenticate(&self) -> Result<Identity, AuthError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(AuthError::MissingField("Name"));
        }
        if self.password.is_empty() {
            return Err(AuthError::MissingField("Password"));
        }

        let url = self.api_url();
        debug!(%url, "authenticating");

        let response = self
            .client
            .post(&url)
            .json(&CredentialsBody {
                name,
                password: &self.password,
            })
            .send()
            .await
            .map_err(|e| AuthError::Service(e.to_string()))?;

        let status = response.status();
        if status.as_u16() == 401 {
            return Err(AuthError::InvalidCredentials);
        }
        if !status.is_success() {
            let message = response
                .json::<ErrorBody>()
                .await
                .ok()
                .and_then(|b| b.error)
                .unwrap_or_else(|| format!("HTTP {}", status));
            return Err(AuthError::Service(message));
        }

        let body: AuthResponse = response
            .json()
            .await
            .map_err(|e| AuthError::Service(format!("Failed to parse auth response: {}", e)))?;

        info!(user = %body.user.name, "authenticated");
        Ok(Identity::Named {
            name: body.user.name,
            token: body.token,
        })
    }
}
