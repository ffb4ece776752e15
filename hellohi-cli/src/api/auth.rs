//! OAuth2 token handling
//!
//! The session never talks to the token endpoint itself; it asks a
//! [`TokenSource`] for the current access token before every call.

use async_trait::async_trait;
use chrono::Utc;
use log::{debug, warn};
use serde_json::Value;
use tokio::sync::Mutex;

use super::error::{ApiError, ApiResult, parse_error_message};
use super::models::{CredentialSet, REDACTED, TokenInfo, TokenResponse};

/// Supplies bearer tokens to the session
#[async_trait]
pub trait TokenSource: Send + Sync + std::fmt::Debug {
    /// Current access token, fetching or refreshing it when needed
    async fn access_token(&self) -> ApiResult<String>;

    /// Forget the cached token so the next call authenticates again
    async fn invalidate(&self) {}
}

/// A pre-issued token that is used as-is
#[derive(Clone)]
pub struct StaticToken(String);

impl std::fmt::Debug for StaticToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("StaticToken").field(&REDACTED).finish()
    }
}

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait]
impl TokenSource for StaticToken {
    async fn access_token(&self) -> ApiResult<String> {
        Ok(self.0.clone())
    }
}

/// Token source backed by an OAuth2 token endpoint
///
/// Tokens are cached until shortly before they expire. A refresh-token grant
/// is attempted first when the server issued a refresh token; if that fails
/// the primary grant (password or client credentials) runs again.
#[derive(Debug)]
pub struct AuthManager {
    http: reqwest::Client,
    auth_url: String,
    credentials: CredentialSet,
    token: Mutex<Option<TokenInfo>>,
}

impl AuthManager {
    pub fn new(
        http: reqwest::Client,
        auth_url: impl Into<String>,
        credentials: CredentialSet,
    ) -> ApiResult<Self> {
        if matches!(credentials, CredentialSet::BearerToken(_)) {
            return Err(ApiError::Config(
                "bearer tokens do not use the OAuth token endpoint".to_string(),
            ));
        }

        Ok(Self {
            http,
            auth_url: auth_url.into(),
            credentials,
            token: Mutex::new(None),
        })
    }

    /// Snapshot of the cached token, if any
    pub async fn cached_token(&self) -> Option<TokenInfo> {
        self.token.lock().await.clone()
    }

    fn client_id_and_secret(&self) -> (&str, &str) {
        match &self.credentials {
            CredentialSet::Password {
                client_id,
                client_secret,
                ..
            }
            | CredentialSet::ClientCredentials {
                client_id,
                client_secret,
            } => (client_id.as_str(), client_secret.as_str()),
            CredentialSet::BearerToken(_) => ("", ""),
        }
    }

    async fn primary_grant(&self) -> ApiResult<TokenInfo> {
        let (client_id, client_secret) = self.client_id_and_secret();
        let mut form = vec![
            ("grant_type", self.credentials.grant_type()),
            ("client_id", client_id),
            ("client_secret", client_secret),
        ];
        if let CredentialSet::Password {
            username, password, ..
        } = &self.credentials
        {
            form.push(("username", username.as_str()));
            form.push(("password", password.as_str()));
        }

        self.request_token(&form).await
    }

    async fn refresh_grant(&self, refresh_token: &str) -> ApiResult<TokenInfo> {
        let (client_id, client_secret) = self.client_id_and_secret();
        let form = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", client_id),
            ("client_secret", client_secret),
        ];

        self.request_token(&form).await
    }

    async fn request_token(&self, form: &[(&str, &str)]) -> ApiResult<TokenInfo> {
        let grant = form
            .iter()
            .find(|(key, _)| *key == "grant_type")
            .map(|(_, value)| *value)
            .unwrap_or("unknown");
        debug!("Requesting {} token from {}", grant, self.auth_url);

        let issued_at = Utc::now();
        let response = self
            .http
            .post(&self.auth_url)
            .header(reqwest::header::ACCEPT, "application/json")
            .form(form)
            .send()
            .await
            .map_err(|source| ApiError::Transport {
                endpoint: self.auth_url.clone(),
                source,
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|source| ApiError::Transport {
            endpoint: self.auth_url.clone(),
            source,
        })?;

        if !status.is_success() {
            return Err(ApiError::Auth {
                status: status.as_u16(),
                message: oauth_error_message(&body)
                    .unwrap_or_else(|| status.canonical_reason().unwrap_or("").to_string()),
            });
        }

        let token: TokenResponse =
            serde_json::from_str(&body).map_err(|source| ApiError::Decode {
                endpoint: self.auth_url.clone(),
                source,
            })?;

        Ok(TokenInfo::from_response(token, issued_at))
    }
}

#[async_trait]
impl TokenSource for AuthManager {
    async fn access_token(&self) -> ApiResult<String> {
        // Held across the request so concurrent callers share one refresh
        let mut cached = self.token.lock().await;

        if let Some(token) = cached.as_ref() {
            if !token.is_expired(Utc::now()) {
                return Ok(token.access_token.clone());
            }
        }

        let refresh_token = cached.as_ref().and_then(|t| t.refresh_token.clone());
        let fresh = match refresh_token {
            Some(refresh_token) => match self.refresh_grant(&refresh_token).await {
                Ok(token) => token,
                Err(e) => {
                    warn!("Token refresh failed, re-authenticating: {}", e);
                    self.primary_grant().await?
                }
            },
            None => self.primary_grant().await?,
        };

        let access_token = fresh.access_token.clone();
        *cached = Some(fresh);
        Ok(access_token)
    }

    async fn invalidate(&self) {
        *self.token.lock().await = None;
    }
}

/// OAuth servers report failures as `error`/`error_description`; the API
/// itself uses `errors`/`message`.
fn oauth_error_message(body: &str) -> Option<String> {
    if let Some(message) = parse_error_message(body) {
        return Some(message);
    }

    let parsed: Value = serde_json::from_str(body).ok()?;
    parsed
        .get("error_description")
        .or_else(|| parsed.get("error"))
        .and_then(Value::as_str)
        .map(str::to_string)
}
