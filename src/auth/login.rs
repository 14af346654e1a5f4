//! Fresh login against the primary store.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use tracing::{debug, info, instrument};

use super::CredentialCache;
use crate::user_agent;

const LOGIN_TIMEOUT_SECS: u64 = 30;
const TOKEN_PATH: &str = "/v4/auth/o/token/";

/// Errors returned by a login attempt.
#[derive(Debug, thiserror::Error)]
pub enum LoginError {
    /// The login request never got a response.
    #[error("login request to {url} failed: {source}")]
    Network {
        /// Token endpoint.
        url: String,
        /// Underlying client error.
        #[source]
        source: reqwest::Error,
    },
    /// The server refused the credentials or the request.
    #[error("login rejected with HTTP {status}: {body}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Response body, truncated.
        body: String,
    },
    /// The token response could not be decoded.
    #[error("unexpected login response: {0}")]
    Decode(String),
    /// The HTTP client could not be built (bad proxy, TLS backend).
    #[error("cannot build login client: {0}")]
    Client(String),
}

/// Produces a brand-new session for the configured account.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Performs the login flow and returns the resulting session.
    async fn login(&self) -> Result<CredentialCache, LoginError>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    expires_in: u64,
}

/// Password-grant login against `{api_base}/v4/auth/o/token/`.
#[derive(Clone)]
pub struct PasswordLogin {
    client: Client,
    token_url: String,
    username: String,
    password: String,
    client_id: Option<String>,
}

impl std::fmt::Debug for PasswordLogin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordLogin")
            .field("token_url", &self.token_url)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl PasswordLogin {
    /// Builds a login client for `api_base`.
    ///
    /// # Errors
    ///
    /// Returns [`LoginError::Client`] when the proxy URL is rejected or the
    /// client cannot be built.
    pub fn new(
        api_base: &str,
        username: impl Into<String>,
        password: impl Into<String>,
        client_id: Option<String>,
        proxy: Option<&str>,
    ) -> Result<Self, LoginError> {
        let mut builder = Client::builder()
            .timeout(Duration::from_secs(LOGIN_TIMEOUT_SECS))
            .user_agent(user_agent::default_user_agent());
        if let Some(proxy) = proxy {
            let proxy =
                reqwest::Proxy::all(proxy).map_err(|e| LoginError::Client(e.to_string()))?;
            builder = builder.proxy(proxy);
        }
        let client = builder
            .build()
            .map_err(|e| LoginError::Client(e.to_string()))?;

        Ok(Self {
            client,
            token_url: format!("{}{TOKEN_PATH}", api_base.trim_end_matches('/')),
            username: username.into(),
            password: password.into(),
            client_id,
        })
    }

    fn form_body(&self) -> String {
        let mut form = url::form_urlencoded::Serializer::new(String::new());
        form.append_pair("grant_type", "password");
        form.append_pair("username", &self.username);
        form.append_pair("password", &self.password);
        if let Some(client_id) = &self.client_id {
            form.append_pair("client_id", client_id);
        }
        form.finish()
    }
}

#[async_trait]
impl Authenticator for PasswordLogin {
    #[instrument(level = "debug", skip(self), fields(user = %self.username))]
    async fn login(&self) -> Result<CredentialCache, LoginError> {
        info!("Logging in");
        let response = self
            .client
            .post(&self.token_url)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(self.form_body())
            .send()
            .await
            .map_err(|source| LoginError::Network {
                url: self.token_url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LoginError::Rejected {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| LoginError::Decode(e.to_string()))?;
        if token.access_token.trim().is_empty() {
            return Err(LoginError::Decode("empty access_token".to_string()));
        }
        debug!(expires_in = token.expires_in, "login succeeded");

        let mut cache =
            CredentialCache::issued_now(token.access_token, token.refresh_token, token.expires_in);
        if let Some(token_type) = token.token_type {
            cache.token_type = token_type;
        }
        Ok(cache)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_token_url_joins_base_without_double_slash() {
        let login = PasswordLogin::new("https://api.example.com/", "u", "p", None, None).unwrap();
        assert_eq!(login.token_url, "https://api.example.com/v4/auth/o/token/");
    }

    #[test]
    fn test_form_body_encodes_credentials() {
        let login = PasswordLogin::new(
            "https://api.example.com",
            "dj name",
            "p&ss",
            Some("cid".to_string()),
            None,
        )
        .unwrap();
        let body = login.form_body();
        assert!(body.contains("grant_type=password"));
        assert!(body.contains("username=dj+name"));
        assert!(body.contains("password=p%26ss"));
        assert!(body.contains("client_id=cid"));
    }

    #[test]
    fn test_debug_hides_password() {
        let login = PasswordLogin::new("https://api.example.com", "u", "secret", None, None).unwrap();
        assert!(!format!("{login:?}").contains("secret"));
    }
}
