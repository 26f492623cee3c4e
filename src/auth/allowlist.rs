//! Email-domain allowlist login.
//!
//! No password: any address on an allowed company domain is accepted as-is.

use async_trait::async_trait;
use tracing::debug;

use super::{AuthError, Authenticator, Identity};

/// Domains accepted when no configuration overrides them
pub const DEFAULT_ALLOWED_DOMAINS: [&str; 3] = ["adda247.com", "addaeducation.com", "studyiq.com"];

/// Accepts addresses whose domain is on the list
#[derive(Debug, Clone)]
pub struct EmailAllowlist {
    email: String,
    allowed_domains: Vec<String>,
}

impl EmailAllowlist {
    pub fn new(email: impl Into<String>, allowed_domains: Vec<String>) -> Self {
        Self {
            email: email.into(),
            allowed_domains,
        }
    }

    /// Allowlist with the default company domains
    pub fn with_default_domains(email: impl Into<String>) -> Self {
        Self::new(
            email,
            DEFAULT_ALLOWED_DOMAINS.iter().map(|d| d.to_string()).collect(),
        )
    }

    /// Whether `email` ends in `@<domain>` for an allowed domain
    pub fn is_allowed(&self, email: &str) -> bool {
        let email = email.trim().to_lowercase();
        self.allowed_domains
            .iter()
            .any(|domain| email.ends_with(&format!("@{}", domain.to_lowercase())))
    }

    fn allowed_display(&self) -> String {
        self.allowed_domains.join(", ")
    }
}

#[async_trait]
impl Authenticator for EmailAllowlist {
    fn name(&self) -> &str {
        "email-allowlist"
    }

    async fn authenticate(&self) -> Result<Identity, AuthError> {
        let email = self.email.trim();
        if email.is_empty() {
            return Err(AuthError::MissingField("Email"));
        }

        if !self.is_allowed(email) {
            return Err(AuthError::DomainNotAllowed {
                allowed: self.allowed_display(),
            });
        }

        debug!(email, "email accepted by allowlist");
        Ok(Identity::email(email))
    }
}
