//! Credential acquisition via OAuth grant strategies.
//!
//! A [`CredentialProvider`] owns one grant configuration and memoizes the
//! credential it produces. The exchange is single-flight: the first caller
//! triggers the network call and concurrent callers await the same pending
//! operation, so a burst of requests never duplicates token traffic.

pub mod assertion;

use std::path::PathBuf;
use std::time::Duration;

use tokio::sync::OnceCell;

use crate::constants::{
    DEFAULT_ASSERTION_EXPIRY_MS, DEFAULT_LOGIN_URL, JWT_BEARER_GRANT_TYPE, token_endpoint,
    userinfo_endpoint,
};
use crate::error::{Error, Result};
use crate::models::{Credential, UserInfo};

pub use assertion::{KeySource, sign_assertion};

/// Grant strategy used to obtain a credential.
#[derive(Debug, Clone)]
pub enum Grant {
    /// Server-to-server flow backed by a signed bearer assertion.
    JwtBearer {
        /// Connected app client id; becomes the assertion issuer.
        client_id: String,
        /// Username the assertion is issued for.
        username: String,
        /// Inline PEM private key (PKCS#8 or PKCS#1).
        private_key: Option<String>,
        /// Path to a PEM private key file; read per exchange, never cached.
        private_key_path: Option<PathBuf>,
        /// Assertion lifetime; defaults to
        /// [`DEFAULT_ASSERTION_EXPIRY_MS`] when `None`.
        expiry_interval: Option<Duration>,
    },
    /// Resource-owner password flow.
    Password {
        client_id: String,
        client_secret: String,
        username: String,
        password: String,
    },
    /// Exchange of a previously issued refresh token.
    RefreshToken {
        refresh_token: String,
        client_id: String,
        client_secret: String,
    },
    /// A pre-acquired credential; no network exchange is performed.
    Static(Credential),
}

impl Grant {
    fn kind(&self) -> &'static str {
        match self {
            Self::JwtBearer { .. } => "jwt-bearer",
            Self::Password { .. } => "password",
            Self::RefreshToken { .. } => "refresh_token",
            Self::Static(_) => "static",
        }
    }
}

/// Exchanges a grant for an access credential and caches the result.
///
/// The cached credential lives for the provider's lifetime; it is never
/// refreshed on expiry. A failed exchange is not cached — the next caller
/// retries. Replacing the grant with [`replace_grant`](Self::replace_grant)
/// discards the cached credential wholesale.
pub struct CredentialProvider {
    http: reqwest::Client,
    login_url: String,
    token_endpoint: Option<String>,
    grant: Grant,
    cell: OnceCell<Credential>,
}

impl CredentialProvider {
    pub fn new(grant: Grant) -> Self {
        Self {
            http: reqwest::Client::new(),
            login_url: DEFAULT_LOGIN_URL.to_string(),
            token_endpoint: None,
            grant,
            cell: OnceCell::new(),
        }
    }

    /// Override the login host (e.g. `https://test.salesforce.com`).
    pub fn with_login_url(mut self, login_url: impl Into<String>) -> Self {
        self.login_url = login_url.into();
        self
    }

    /// Override the token endpoint entirely; takes precedence over the
    /// login-host derived endpoint.
    pub fn with_token_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.token_endpoint = Some(endpoint.into());
        self
    }

    pub fn login_url(&self) -> &str {
        &self.login_url
    }

    /// Swap the grant source and invalidate the cached credential.
    pub fn replace_grant(&mut self, grant: Grant) {
        self.grant = grant;
        self.cell = OnceCell::new();
    }

    /// Get the memoized credential, performing the exchange on first use.
    ///
    /// Concurrent callers before resolution observe the same in-flight
    /// exchange; exactly one token-endpoint call is made.
    pub async fn credential(&self) -> Result<&Credential> {
        self.cell.get_or_try_init(|| self.exchange()).await
    }

    async fn exchange(&self) -> Result<Credential> {
        let form = match &self.grant {
            Grant::Static(credential) => {
                log::debug!("using statically configured credential");
                return Ok(credential.clone());
            }
            Grant::JwtBearer {
                client_id,
                username,
                private_key,
                private_key_path,
                expiry_interval,
            } => {
                let key = KeySource::from_options(private_key.as_deref(), private_key_path.as_ref())?;
                let expiry = expiry_interval
                    .unwrap_or(Duration::from_millis(DEFAULT_ASSERTION_EXPIRY_MS));
                let assertion =
                    sign_assertion(client_id, username, &self.login_url, expiry, &key)?;
                vec![
                    ("grant_type".to_string(), JWT_BEARER_GRANT_TYPE.to_string()),
                    ("assertion".to_string(), assertion),
                ]
            }
            Grant::Password {
                client_id,
                client_secret,
                username,
                password,
            } => vec![
                ("grant_type".to_string(), "password".to_string()),
                ("client_id".to_string(), client_id.clone()),
                ("client_secret".to_string(), client_secret.clone()),
                ("username".to_string(), username.clone()),
                ("password".to_string(), password.clone()),
            ],
            Grant::RefreshToken {
                refresh_token,
                client_id,
                client_secret,
            } => vec![
                ("grant_type".to_string(), "refresh_token".to_string()),
                ("refresh_token".to_string(), refresh_token.clone()),
                ("client_id".to_string(), client_id.clone()),
                ("client_secret".to_string(), client_secret.clone()),
            ],
        };

        let endpoint = self
            .token_endpoint
            .clone()
            .unwrap_or_else(|| token_endpoint(&self.login_url));

        log::info!("exchanging {} grant at {}", self.grant.kind(), endpoint);
        let response = self.http.post(&endpoint).form(&form).send().await?;
        log::debug!("token request status: {}", response.status());

        if !response.status().is_success() {
            return Err(Error::from_response(response, true).await);
        }
        Ok(response.json::<Credential>().await?)
    }

    /// Fetch the OpenID userinfo profile for the cached credential.
    pub async fn user_info(&self) -> Result<UserInfo> {
        let credential = self.credential().await?;
        let response = self
            .http
            .get(userinfo_endpoint(&self.login_url))
            .bearer_auth(&credential.access_token)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Error::from_response(response, true).await);
        }
        Ok(response.json::<UserInfo>().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn jwt_grant_without_key_material_fails_configuration() {
        let provider = CredentialProvider::new(Grant::JwtBearer {
            client_id: "id".to_string(),
            username: "user".to_string(),
            private_key: None,
            private_key_path: None,
            expiry_interval: None,
        });

        let err = provider.credential().await.unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[tokio::test]
    async fn static_grant_resolves_without_network() {
        let provider = CredentialProvider::new(Grant::Static(Credential::new(
            "token",
            "https://example.my.salesforce.com",
        )));
        let credential = provider.credential().await.unwrap();
        assert_eq!(credential.access_token, "token");
    }

    #[tokio::test]
    async fn replace_grant_discards_cached_credential() {
        let mut provider =
            CredentialProvider::new(Grant::Static(Credential::new("first", "https://a")));
        assert_eq!(provider.credential().await.unwrap().access_token, "first");

        provider.replace_grant(Grant::Static(Credential::new("second", "https://b")));
        assert_eq!(provider.credential().await.unwrap().access_token, "second");
    }
}
