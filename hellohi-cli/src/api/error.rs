//! Error type for HelloHi API calls
//!
//! Every failure is terminal for the call that produced it; nothing here is
//! retried.

use serde_json::Value;
use thiserror::Error;

/// Result alias used throughout the API layer
pub type ApiResult<T> = Result<T, ApiError>;

/// Errors produced by the session, the entity façade and the token source
#[derive(Debug, Error)]
pub enum ApiError {
    /// The session configuration is unusable (bad URL, half a password grant, ...)
    #[error("invalid session configuration: {0}")]
    Config(String),

    /// No session has been opened in the client manager
    #[error("no HelloHi session is open; open one before making API calls")]
    NotInitialized,

    /// The token endpoint refused to issue a token
    #[error("authentication failed ({status}): {message}")]
    Auth { status: u16, message: String },

    /// The request never produced an HTTP response (DNS, TLS, timeout, ...)
    #[error("{endpoint}: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    /// The API answered with a non-success status
    #[error("{endpoint}: {message} (HTTP {status})")]
    Http {
        endpoint: String,
        status: u16,
        message: String,
    },

    /// A success response whose body is not JSON
    #[error("{endpoint}: response is not valid JSON: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },

    /// An instance operation needs the entity's `id` attribute
    #[error("{endpoint}: entity has no id attribute")]
    MissingId { endpoint: String },
}

impl ApiError {
    /// HTTP status code, for the variants that carry one
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } | Self::Auth { status, .. } => Some(*status),
            Self::Transport { source, .. } => source.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// True for 4xx responses from the API
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Http { status, .. } if (400..500).contains(status))
    }

    /// True when the resource does not exist on the server
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Http { status: 404, .. })
    }
}

/// Extract a human-readable message from an error response body.
///
/// The API reports validation failures under `errors` (kept as compact JSON)
/// and everything else under `message`.
pub fn parse_error_message(body: &str) -> Option<String> {
    let parsed: Value = serde_json::from_str(body).ok()?;

    if let Some(errors) = parsed.get("errors") {
        return serde_json::to_string(errors).ok();
    }

    match parsed.get("message") {
        Some(Value::String(message)) => Some(message.clone()),
        Some(Value::Null) | None => None,
        Some(other) => Some(other.to_string()),
    }
}
