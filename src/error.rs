//! Error types for the Salesforce REST client.

use serde_json::Value;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// All failure modes surfaced by this crate.
///
/// HTTP-level rejections keep the status line and the parsed response body so
/// callers can log or re-surface them verbatim. Nothing in the crate retries
/// or swallows a failure; every error propagates to the caller.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Required configuration is missing or inconsistent (e.g. a JWT grant
    /// with neither a private key nor a key path).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The signing key could not be parsed or the signature operation failed.
    #[error("signing error: {0}")]
    Signing(String),

    /// The token endpoint returned a non-success response.
    #[error("authentication failed: {status} {status_text}")]
    Auth {
        status: u16,
        status_text: String,
        body: Value,
    },

    /// A data API call (query, CRUD, batch, discovery) returned a non-success
    /// response.
    #[error("api call failed: {status} {status_text}")]
    Api {
        status: u16,
        status_text: String,
        body: Value,
    },

    /// An operation was invoked on a surface that has no transport.
    #[error("not implemented: {0}")]
    NotImplemented(&'static str),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Build an [`Error::Auth`] or [`Error::Api`] from a non-success response,
    /// preserving the body as parsed JSON when possible and as a raw string
    /// otherwise.
    pub(crate) async fn from_response(response: reqwest::Response, auth: bool) -> Self {
        let status = response.status();
        let status_text = status
            .canonical_reason()
            .unwrap_or("Unknown Status")
            .to_string();
        let body = match response.text().await {
            Ok(text) => serde_json::from_str(&text).unwrap_or(Value::String(text)),
            Err(_) => Value::Null,
        };
        if auth {
            Self::Auth {
                status: status.as_u16(),
                status_text,
                body,
            }
        } else {
            Self::Api {
                status: status.as_u16(),
                status_text,
                body,
            }
        }
    }
}
