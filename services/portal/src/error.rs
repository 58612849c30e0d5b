//! services/portal/src/error.rs
//!
//! Defines the primary error type for the portal client service.

use crate::config::ConfigError;
use civic_portal_core::ports::PortError;

/// The primary error type for the `portal` service.
#[derive(Debug, thiserror::Error)]
pub enum PortalError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from one of the core operations.
    #[error("{0}")]
    Port(#[from] PortError),

    /// Represents an error from the HTTP client library itself, e.g. while
    /// building the client.
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// Represents a standard Input/Output error (e.g., reading an attachment).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The server refused the email and password on login or registration.
    #[error("Incorrect email or password")]
    CredentialsRejected,

    /// The command needs a signed-in session.
    #[error("Please log in first")]
    LoginRequired,

    /// Invalid command line input that clap cannot catch.
    #[error("{0}")]
    Usage(String),
}

impl PortalError {
    /// For login and registration a 401 means the credentials were refused,
    /// not that an existing session ended.
    pub fn from_sign_in(err: PortError) -> Self {
        match err {
            PortError::Unauthorized => PortalError::CredentialsRejected,
            other => PortalError::Port(other),
        }
    }

    /// Unauthorized answers from the server mean the same thing as no session.
    pub fn requires_login(&self) -> bool {
        matches!(
            self,
            PortalError::LoginRequired | PortalError::Port(PortError::Unauthorized)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::FileSessionStorage;
    use async_trait::async_trait;
    use civic_portal_core::domain::Credentials;
    use civic_portal_core::ports::{ApiRequest, HttpTransport, PortResult, RawResponse};
    use civic_portal_core::session::AuthStore;
    use civic_portal_core::ApiClient;
    use std::sync::Arc;

    struct RejectingBackend;

    #[async_trait]
    impl HttpTransport for RejectingBackend {
        async fn send(&self, _request: ApiRequest) -> PortResult<RawResponse> {
            Ok(RawResponse {
                status: 401,
                body: br#"{"detail": "Incorrect email or password"}"#.to_vec(),
            })
        }
    }

    #[tokio::test]
    async fn wrong_password_login_reports_rejected_credentials() {
        let dir = tempfile::tempdir().unwrap();
        let client = ApiClient::new(
            Arc::new(RejectingBackend),
            Arc::new(FileSessionStorage::new(dir.path())),
        );
        let mut auth = AuthStore::restore(client);

        let err = auth
            .login(
                &Credentials {
                    email: "amal@example.com".to_string(),
                    password: "wrong".to_string(),
                },
                true,
            )
            .await
            .map_err(PortalError::from_sign_in)
            .unwrap_err();

        assert!(matches!(err, PortalError::CredentialsRejected));
        assert!(!err.requires_login());
        assert!(!auth.is_authenticated());
    }

    #[test]
    fn rejected_sign_in_is_not_an_ended_session() {
        let err = PortalError::from_sign_in(PortError::Unauthorized);

        assert!(matches!(err, PortalError::CredentialsRejected));
        assert!(!err.requires_login());
        assert_eq!(err.to_string(), "Incorrect email or password");
    }

    #[test]
    fn other_sign_in_failures_pass_through() {
        let err = PortalError::from_sign_in(PortError::Validation {
            status: Some(400),
            message: "Email already registered".to_string(),
        });

        assert_eq!(err.to_string(), "Email already registered");
        assert!(!err.requires_login());
    }

    #[test]
    fn unauthorized_outside_sign_in_asks_for_login() {
        assert!(PortalError::from(PortError::Unauthorized).requires_login());
        assert!(PortalError::LoginRequired.requires_login());
    }
}
