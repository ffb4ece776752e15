//! Session, credential and token models

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::constants::{DEFAULT_TIMEOUT_SECS, TOKEN_EXPIRY_SKEW_SECS};
use super::error::{ApiError, ApiResult};

/// How the session obtains its bearer token
#[derive(Clone, PartialEq, Eq)]
pub enum CredentialSet {
    /// OAuth2 resource-owner password grant
    Password {
        client_id: String,
        client_secret: String,
        username: String,
        password: String,
    },
    /// OAuth2 client-credentials grant
    ClientCredentials {
        client_id: String,
        client_secret: String,
    },
    /// A token issued elsewhere; never refreshed
    BearerToken(String),
}

impl CredentialSet {
    /// Pick the grant from optional user credentials.
    ///
    /// Both `username` and `password` select the password grant, neither
    /// selects client credentials. Anything in between is rejected.
    pub fn from_parts(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        username: Option<String>,
        password: Option<String>,
    ) -> ApiResult<Self> {
        let client_id = client_id.into();
        let client_secret = client_secret.into();

        if client_id.trim().is_empty() {
            return Err(ApiError::Config("client id is empty".to_string()));
        }

        match (username, password) {
            (Some(username), Some(password)) => Ok(Self::Password {
                client_id,
                client_secret,
                username,
                password,
            }),
            (None, None) => Ok(Self::ClientCredentials {
                client_id,
                client_secret,
            }),
            (Some(_), None) => Err(ApiError::Config(
                "username given without password".to_string(),
            )),
            (None, Some(_)) => Err(ApiError::Config(
                "password given without username".to_string(),
            )),
        }
    }

    /// Grant name for logging
    pub fn grant_type(&self) -> &'static str {
        match self {
            Self::Password { .. } => "password",
            Self::ClientCredentials { .. } => "client_credentials",
            Self::BearerToken(_) => "bearer",
        }
    }
}

/// Secrets are never printed
impl fmt::Debug for CredentialSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Password {
                client_id,
                username,
                ..
            } => f
                .debug_struct("Password")
                .field("client_id", client_id)
                .field("client_secret", &REDACTED)
                .field("username", username)
                .field("password", &REDACTED)
                .finish(),
            Self::ClientCredentials { client_id, .. } => f
                .debug_struct("ClientCredentials")
                .field("client_id", client_id)
                .field("client_secret", &REDACTED)
                .finish(),
            Self::BearerToken(_) => f.debug_tuple("BearerToken").field(&REDACTED).finish(),
        }
    }
}

/// Stand-in for secret values in `Debug` output
pub(crate) const REDACTED: Redacted = Redacted;

#[derive(Clone, Copy)]
pub(crate) struct Redacted;

impl fmt::Debug for Redacted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<redacted>")
    }
}

/// Everything needed to open a [`Session`](super::client::Session)
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// OAuth2 token endpoint, e.g. `https://api.hellohi.nl/v1/oauth/token`
    pub auth_url: String,
    /// Resource API root, e.g. `https://api.hellohi.nl/v1`
    pub base_url: String,
    pub credentials: CredentialSet,
    /// Sent as `X-Tenant` on every request
    pub tenant_id: Option<String>,
    pub timeout: std::time::Duration,
}

impl SessionConfig {
    pub fn new(
        auth_url: impl Into<String>,
        base_url: impl Into<String>,
        credentials: CredentialSet,
        tenant_id: Option<String>,
    ) -> Self {
        Self {
            auth_url: auth_url.into(),
            base_url: base_url.into(),
            credentials,
            tenant_id,
            timeout: std::time::Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Token endpoint response body
#[derive(Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// A cached access token
#[derive(Clone)]
pub struct TokenInfo {
    pub access_token: String,
    pub refresh_token: Option<String>,
    /// `None` means the server did not say; such tokens are used until rejected
    pub expires_at: Option<DateTime<Utc>>,
}

impl fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenResponse")
            .field("access_token", &REDACTED)
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| REDACTED))
            .finish()
    }
}

impl fmt::Debug for TokenInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenInfo")
            .field("access_token", &REDACTED)
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| REDACTED))
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

impl TokenInfo {
    pub fn from_response(response: TokenResponse, issued_at: DateTime<Utc>) -> Self {
        Self {
            access_token: response.access_token,
            refresh_token: response.refresh_token,
            // Lifetimes too large to represent are treated as unbounded
            expires_at: response.expires_in.and_then(|secs| {
                Duration::try_seconds(secs).and_then(|ttl| issued_at.checked_add_signed(ttl))
            }),
        }
    }

    /// Expired, or close enough to expiry that it should be replaced
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires_at) => match now.checked_add_signed(Duration::seconds(TOKEN_EXPIRY_SKEW_SECS)) {
                Some(deadline) => deadline >= expires_at,
                None => true,
            },
            None => false,
        }
    }
}

/// `meta.pagination` block of list responses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub total: u64,
    pub per_page: u64,
    pub current_page: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_grant_selected() {
        let creds = CredentialSet::from_parts(
            "1",
            "secret",
            Some("admin@example.com".to_string()),
            Some("pw".to_string()),
        )
        .unwrap();
        assert_eq!(creds.grant_type(), "password");
    }

    #[test]
    fn test_client_credentials_selected() {
        let creds = CredentialSet::from_parts("1", "secret", None, None).unwrap();
        assert_eq!(
            creds,
            CredentialSet::ClientCredentials {
                client_id: "1".to_string(),
                client_secret: "secret".to_string(),
            }
        );
    }

    #[test]
    fn test_half_password_grant_rejected() {
        let err = CredentialSet::from_parts("1", "secret", Some("admin".to_string()), None)
            .unwrap_err();
        assert!(matches!(err, ApiError::Config(_)));

        let err = CredentialSet::from_parts("", "secret", None, None).unwrap_err();
        assert!(matches!(err, ApiError::Config(_)));
    }

    #[test]
    fn test_token_expiry_with_skew() {
        let issued = Utc::now();
        let token = TokenInfo::from_response(
            TokenResponse {
                access_token: "abc".to_string(),
                token_type: Some("Bearer".to_string()),
                expires_in: Some(3600),
                refresh_token: None,
            },
            issued,
        );

        assert!(!token.is_expired(issued));
        assert!(token.is_expired(issued + Duration::seconds(3600 - TOKEN_EXPIRY_SKEW_SECS)));

        let forever = TokenInfo {
            access_token: "abc".to_string(),
            refresh_token: None,
            expires_at: None,
        };
        assert!(!forever.is_expired(issued + Duration::days(365)));
    }

    #[test]
    fn test_out_of_range_lifetime_never_expires() {
        let issued = Utc::now();
        let response: TokenResponse =
            serde_json::from_str(r#"{"access_token":"t","expires_in":9223372036854775}"#).unwrap();
        let token = TokenInfo::from_response(response, issued);

        assert_eq!(token.expires_at, None);
        assert!(!token.is_expired(issued));

        let token = TokenInfo::from_response(
            TokenResponse {
                access_token: "t".to_string(),
                token_type: None,
                expires_in: Some(i64::MAX),
                refresh_token: None,
            },
            issued,
        );
        assert_eq!(token.expires_at, None);
    }

    #[test]
    fn test_debug_output_hides_secrets() {
        let creds = CredentialSet::Password {
            client_id: "client-1".to_string(),
            client_secret: "s3cret".to_string(),
            username: "admin@example.com".to_string(),
            password: "hunter2".to_string(),
        };
        let config = SessionConfig::new(
            "https://api.hellohi.nl/v1/oauth/token",
            "https://api.hellohi.nl/v1",
            creds,
            None,
        );
        let printed = format!("{:?}", config);
        assert!(printed.contains("client-1"));
        assert!(printed.contains("admin@example.com"));
        assert!(!printed.contains("s3cret"));
        assert!(!printed.contains("hunter2"));

        let bearer = format!("{:?}", CredentialSet::BearerToken("tok-123".to_string()));
        assert!(!bearer.contains("tok-123"));

        let token = TokenInfo {
            access_token: "access-abc".to_string(),
            refresh_token: Some("refresh-xyz".to_string()),
            expires_at: None,
        };
        let printed = format!("{:?}", token);
        assert!(!printed.contains("access-abc"));
        assert!(!printed.contains("refresh-xyz"));
    }

    #[test]
    fn test_pagination_ignores_extra_fields() {
        let json = r#"{"total":40,"count":15,"per_page":15,"current_page":2,"total_pages":3,"links":{}}"#;
        let pagination: Pagination = serde_json::from_str(json).unwrap();
        assert_eq!(
            pagination,
            Pagination {
                total: 40,
                per_page: 15,
                current_page: 2
            }
        );
    }
}
