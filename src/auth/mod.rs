//! Identity and authentication.
//!
//! Every outgoing call carries an explicit `Identity`; nothing is stored on
//! a shared HTTP client. Two strategies produce identities:
//! - `EmailAllowlist`: any address on an allowed company domain
//! - `PasswordLogin`: name/password against the store's login or signup
//!
//! The chosen identity is persisted with `SessionStore`.

pub mod allowlist;
pub mod credentials;
pub mod session;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use allowlist::EmailAllowlist;
pub use credentials::{PasswordLogin, PasswordMode};
pub use session::SessionStore;

/// Header carrying an email identity
pub const EMAIL_HEADER: &str = "X-User-Email";

/// Header carrying a named identity
pub const NAME_HEADER: &str = "X-User-Name";

/// Who is making a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Identity {
    /// Company email address
    Email { email: String },

    /// Registered user name, optionally with a bearer token from login
    Named {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        token: Option<String>,
    },
}

impl Identity {
    pub fn email(email: impl Into<String>) -> Self {
        Identity::Email {
            email: email.into(),
        }
    }

    pub fn named(name: impl Into<String>) -> Self {
        Identity::Named {
            name: name.into(),
            token: None,
        }
    }

    /// The value the store records in `created_by`
    pub fn id(&self) -> &str {
        match self {
            Identity::Email { email } => email,
            Identity::Named { name, .. } => name,
        }
    }

    /// Headers that identify this caller to the store
    pub fn headers(&self) -> Vec<(&'static str, String)> {
        match self {
            Identity::Email { email } => vec![(EMAIL_HEADER, email.clone())],
            Identity::Named { name, token } => {
                let mut headers = vec![(NAME_HEADER, name.clone())];
                if let Some(token) = token {
                    headers.push(("Authorization", format!("Bearer {}", token)));
                }
                headers
            }
        }
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

/// Authentication failures
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Only {allowed} emails are allowed")]
    DomainNotAllowed { allowed: String },

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("{0} required")]
    MissingField(&'static str),

    #[error("Authentication service error: {0}")]
    Service(String),
}

/// A way of establishing who the user is
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Human-readable strategy name
    fn name(&self) -> &str;

    /// Produce an identity or explain why not
    async fn authenticate(&self) -> Result<Identity, AuthError>;
}
