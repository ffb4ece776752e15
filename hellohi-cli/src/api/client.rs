//! Authenticated HTTP session against the HelloHi REST API

use arc_swap::ArcSwapOption;
use log::{debug, warn};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use super::auth::{AuthManager, StaticToken, TokenSource};
use super::constants::{DEFAULT_TIMEOUT_SECS, headers};
use super::error::{ApiError, ApiResult, parse_error_message};
use super::models::{CredentialSet, SessionConfig};
use super::query::{ListQuery, build_url};

/// An open connection to one tenant of the API
///
/// Cheap to share behind an `Arc`: the token cache and the last error are
/// internally synchronised.
#[derive(Debug)]
pub struct Session {
    http: reqwest::Client,
    base_url: String,
    tenant_id: Option<String>,
    tokens: Box<dyn TokenSource>,
    last_error: ArcSwapOption<String>,
}

impl Session {
    /// Open a session that authenticates through the OAuth token endpoint
    /// (or uses the bearer token in `config.credentials` directly)
    pub fn open(config: SessionConfig) -> ApiResult<Self> {
        validate_url("base URL", &config.base_url)?;
        let http = build_http_client(config.timeout)?;

        let tokens: Box<dyn TokenSource> = match config.credentials {
            CredentialSet::BearerToken(token) => Box::new(StaticToken::new(token)),
            credentials => {
                validate_url("auth URL", &config.auth_url)?;
                debug!(
                    "Opening session for {} with {} grant",
                    config.base_url,
                    credentials.grant_type()
                );
                Box::new(AuthManager::new(http.clone(), config.auth_url, credentials)?)
            }
        };

        Ok(Self::with_token_source(
            http,
            config.base_url,
            config.tenant_id,
            tokens,
        ))
    }

    /// Open a session around a token that was issued elsewhere
    pub fn open_with_bearer_token(
        base_url: impl Into<String>,
        access_token: impl Into<String>,
        tenant_id: Option<String>,
    ) -> ApiResult<Self> {
        let base_url = base_url.into();
        validate_url("base URL", &base_url)?;
        let http = build_http_client(Duration::from_secs(DEFAULT_TIMEOUT_SECS))?;

        Ok(Self::with_token_source(
            http,
            base_url,
            tenant_id,
            Box::new(StaticToken::new(access_token)),
        ))
    }

    /// Assemble a session from parts; the token source is used as-is
    pub fn with_token_source(
        http: reqwest::Client,
        base_url: impl Into<String>,
        tenant_id: Option<String>,
        tokens: Box<dyn TokenSource>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            tenant_id,
            tokens,
            last_error: ArcSwapOption::empty(),
        }
    }

    /// End the session and drop any cached token
    pub async fn close(self) {
        self.tokens.invalidate().await;
        debug!("Closed session for {}", self.base_url);
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn tenant_id(&self) -> Option<&str> {
        self.tenant_id.as_deref()
    }

    /// Message of the most recent failed call, kept until the next failure
    pub fn last_error(&self) -> Option<String> {
        self.last_error.load_full().map(|message| (*message).clone())
    }

    pub fn clear_last_error(&self) {
        self.last_error.store(None);
    }

    fn record_error(&self, message: impl Into<String>) {
        self.last_error.store(Some(Arc::new(message.into())));
    }

    /// Bearer token and tenant header
    async fn authorize(&self, request: RequestBuilder) -> ApiResult<RequestBuilder> {
        let token = match self.tokens.access_token().await {
            Ok(token) => token,
            Err(e) => {
                self.record_error(e.to_string());
                return Err(e);
            }
        };

        let request = request.bearer_auth(token);
        Ok(match &self.tenant_id {
            Some(tenant) => request.header(headers::TENANT, tenant),
            None => request,
        })
    }

    // === JSON calls ===

    /// Send one JSON request.
    ///
    /// `endpoint` is relative to the base URL and may carry its own query
    /// string; `query` adds `include`, `limit` and `page`. A success response
    /// with an empty body yields `Value::Null`.
    pub async fn call(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&Value>,
        query: &ListQuery,
    ) -> ApiResult<Value> {
        let url = build_url(&self.base_url, endpoint, query);
        debug!("{} {}", method, url);

        let mut request = self
            .http
            .request(method, &url)
            .header(CONTENT_TYPE, headers::CONTENT_TYPE_JSON)
            .header(ACCEPT, headers::ACCEPT_JSON);
        if let Some(body) = body {
            request = request.json(body);
        }

        let request = self.authorize(request).await?;
        let response = self.send(endpoint, request).await?;
        self.read_json(endpoint, response).await
    }

    /// [`call`](Self::call) for scripts that prefer to carry on after a
    /// failure: `None` on any error, which is logged and kept as
    /// [`last_error`](Self::last_error)
    pub async fn try_call(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&Value>,
        query: &ListQuery,
    ) -> Option<Value> {
        match self.call(method, endpoint, body, query).await {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("{}", e);
                None
            }
        }
    }

    pub async fn get(&self, endpoint: &str, query: &ListQuery) -> ApiResult<Value> {
        self.call(Method::GET, endpoint, None, query).await
    }

    pub async fn post(&self, endpoint: &str, body: &Value, query: &ListQuery) -> ApiResult<Value> {
        self.call(Method::POST, endpoint, Some(body), query).await
    }

    pub async fn patch(&self, endpoint: &str, body: &Value, query: &ListQuery) -> ApiResult<Value> {
        self.call(Method::PATCH, endpoint, Some(body), query).await
    }

    pub async fn delete(&self, endpoint: &str) -> ApiResult<Value> {
        self.call(Method::DELETE, endpoint, None, &ListQuery::default())
            .await
    }

    // === Raw transport ===

    /// POST a multipart form. Only `Accept` is set explicitly; reqwest
    /// supplies the multipart content type with its boundary.
    pub async fn post_multipart(
        &self,
        endpoint: &str,
        form: reqwest::multipart::Form,
    ) -> ApiResult<Value> {
        let url = build_url(&self.base_url, endpoint, &ListQuery::default());
        debug!("POST (multipart) {}", url);

        let request = self
            .http
            .post(&url)
            .header(ACCEPT, headers::ACCEPT_JSON)
            .multipart(form);

        let request = self.authorize(request).await?;
        let response = self.send(endpoint, request).await?;
        self.read_json(endpoint, response).await
    }

    /// GET `endpoint` and return the body bytes untouched
    pub async fn get_bytes(&self, endpoint: &str) -> ApiResult<Vec<u8>> {
        let url = build_url(&self.base_url, endpoint, &ListQuery::default());
        debug!("GET (raw) {}", url);

        let request = self.authorize(self.http.get(&url)).await?;
        let response = self.send(endpoint, request).await?;

        let bytes = response.bytes().await.map_err(|source| {
            self.record_error(source.to_string());
            ApiError::Transport {
                endpoint: endpoint.to_string(),
                source,
            }
        })?;
        Ok(bytes.to_vec())
    }

    /// Send the request and turn non-success statuses into [`ApiError::Http`]
    async fn send(&self, endpoint: &str, request: RequestBuilder) -> ApiResult<Response> {
        let response = match request.send().await {
            Ok(response) => response,
            Err(source) => {
                self.record_error(source.to_string());
                return Err(ApiError::Transport {
                    endpoint: endpoint.to_string(),
                    source,
                });
            }
        };

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::UNAUTHORIZED {
            // Next call authenticates from scratch
            self.tokens.invalidate().await;
        }

        let body = response.text().await.unwrap_or_default();
        let message = parse_error_message(&body)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());
        self.record_error(message.clone());

        Err(ApiError::Http {
            endpoint: endpoint.to_string(),
            status: status.as_u16(),
            message,
        })
    }

    async fn read_json(&self, endpoint: &str, response: Response) -> ApiResult<Value> {
        let body = response.text().await.map_err(|source| {
            self.record_error(source.to_string());
            ApiError::Transport {
                endpoint: endpoint.to_string(),
                source,
            }
        })?;

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&body).map_err(|source| {
            self.record_error(source.to_string());
            ApiError::Decode {
                endpoint: endpoint.to_string(),
                source,
            }
        })
    }
}

fn build_http_client(timeout: Duration) -> ApiResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ApiError::Config(format!("failed to build HTTP client: {}", e)))
}

fn validate_url(label: &str, url: &str) -> ApiResult<()> {
    match reqwest::Url::parse(url) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Ok(()),
        Ok(parsed) => Err(ApiError::Config(format!(
            "{} must use http or https, got '{}'",
            label,
            parsed.scheme()
        ))),
        Err(e) => Err(ApiError::Config(format!("{} '{}' is invalid: {}", label, url, e))),
    }
}
