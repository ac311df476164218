//! GitHub OAuth client
//!
//! Two provider calls back the login gate: exchanging an authorization
//! code for an access token, and resolving that token to a GitHub identity.

use axum::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::GitHubOAuthConfig;
use crate::error::{AppError, OAuthError};

/// Identity returned by the provider for an access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalIdentity {
    pub login: String,
    pub id: i64,
    pub avatar_url: String,
}

/// Body of the token endpoint response
///
/// GitHub answers a bad or expired code with a 200 carrying an `error`
/// field, so both shapes are expected on success.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum TokenResponse {
    Granted {
        access_token: String,
    },
    Rejected {
        #[serde(default)]
        error: Option<String>,
        #[serde(default)]
        error_description: Option<String>,
    },
}

impl TokenResponse {
    /// The granted token, if any. An empty token counts as none.
    pub fn access_token(&self) -> Option<&str> {
        match self {
            TokenResponse::Granted { access_token } if !access_token.is_empty() => {
                Some(access_token)
            }
            _ => None,
        }
    }
}

/// Code exchange and identity lookup against an OAuth provider.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OAuthProvider: Send + Sync {
    /// Exchange an authorization code for an access token.
    async fn exchange_code(&self, code: &str) -> Result<TokenResponse, OAuthError>;

    /// Resolve an access token to the identity it belongs to.
    async fn fetch_identity(&self, access_token: &str) -> Result<ExternalIdentity, OAuthError>;
}

#[derive(Serialize)]
struct TokenRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    code: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    redirect_uri: Option<&'a str>,
}

/// GitHub implementation of [`OAuthProvider`]
pub struct GitHubClient {
    config: GitHubOAuthConfig,
    http: reqwest::Client,
}

impl GitHubClient {
    /// Build a client from configuration
    ///
    /// No timeout is applied unless `timeout_seconds` is set.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built
    pub fn new(config: GitHubOAuthConfig) -> Result<Self, AppError> {
        let mut builder = reqwest::Client::builder().user_agent("deploychat/0.1.0");
        if let Some(seconds) = config.timeout_seconds {
            builder = builder.timeout(std::time::Duration::from_secs(seconds));
        }
        let http = builder.build()?;

        Ok(Self { config, http })
    }

    /// Authorization page URL the login button sends the browser to
    ///
    /// # Errors
    /// Returns error if `authorize_url` is not a valid URL
    pub fn authorize_url(&self) -> Result<Url, AppError> {
        let mut url = Url::parse(&self.config.authorize_url)
            .map_err(|e| AppError::Config(format!("auth.github.authorize_url: {e}")))?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("client_id", &self.config.client_id)
                .append_pair("scope", "read:user");
            if let Some(redirect_uri) = &self.config.redirect_uri {
                query.append_pair("redirect_uri", redirect_uri);
            }
        }
        Ok(url)
    }

    /// Checks HTTP response status; returns the response on success or an error with details.
    async fn ensure_success(
        response: reqwest::Response,
        operation: &'static str,
    ) -> Result<reqwest::Response, OAuthError> {
        let status = response.status();
        crate::metrics::OAUTH_REQUESTS_TOTAL
            .with_label_values(&[operation, status.as_str()])
            .inc();

        if status.is_success() {
            return Ok(response);
        }
        let detail = response.text().await.unwrap_or_default();
        Err(OAuthError::Status {
            operation,
            status: status.as_u16(),
            detail,
        })
    }
}

#[async_trait]
impl OAuthProvider for GitHubClient {
    async fn exchange_code(&self, code: &str) -> Result<TokenResponse, OAuthError> {
        let body = TokenRequest {
            client_id: &self.config.client_id,
            client_secret: &self.config.client_secret,
            code,
            redirect_uri: self.config.redirect_uri.as_deref(),
        };

        let response = self
            .http
            .post(&self.config.token_url)
            .header(ACCEPT, "application/json")
            .json(&body)
            .send()
            .await?;

        let response = Self::ensure_success(response, "token_exchange").await?;
        Ok(response.json::<TokenResponse>().await?)
    }

    async fn fetch_identity(&self, access_token: &str) -> Result<ExternalIdentity, OAuthError> {
        let response = self
            .http
            .get(&self.config.user_url)
            .header(ACCEPT, "application/vnd.github+json")
            .header(AUTHORIZATION, format!("token {access_token}"))
            .send()
            .await?;

        let response = Self::ensure_success(response, "user").await?;
        Ok(response.json::<ExternalIdentity>().await?)
    }
}
