//! Login gate
//!
//! Decides whether a request to the login page is authenticated, completes
//! a GitHub login when it carries a callback code, and produces the payload
//! the page renderer needs.
//!
//! # States
//!
//! ```text
//!   cookie matches a user ───────────────────────────► Authenticated { issued: None }
//!   no cookie / unknown token ──► NoSession
//!   NoSession + ?code ──────────► PendingCallback
//!   PendingCallback + token ────► (identity, upsert) ─► Authenticated { issued: Some }
//!   PendingCallback, no token ──► LoginFailed
//! ```
//!
//! Session store and identity lookup errors abort with a 400. Room catalog
//! errors are never softened and surface as a 500.

use std::sync::Arc;

use super::oauth::OAuthProvider;
use super::session::{SessionSettings, session_cookie};
use crate::data::{RoomCatalog, RoomSummary, SessionStore, UserRecord};
use crate::error::AppError;

/// Payload handed to the page renderer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    /// Show the login button
    LoggedOut,
    /// Authenticated, show the room list
    Rooms(Vec<RoomSummary>),
}

/// Where one pass through the gate currently stands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateState {
    /// No valid session and nothing else tried yet
    NoSession,
    /// The request carries an OAuth callback code
    PendingCallback { code: String },
    /// Session confirmed, or freshly issued when `issued_token` is set
    Authenticated { issued_token: Option<String> },
    /// The provider gave no access token for the code
    LoginFailed,
}

impl GateState {
    fn label(&self) -> &'static str {
        match self {
            GateState::NoSession => "no_session",
            GateState::PendingCallback { .. } => "pending_callback",
            GateState::Authenticated { issued_token: None } => "session",
            GateState::Authenticated { issued_token: Some(_) } => "login",
            GateState::LoginFailed => "login_failed",
        }
    }
}

/// Result of [`AuthGate::resolve`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateResponse {
    /// Final state of the pass
    pub state: GateState,
    pub outcome: AuthOutcome,
}

impl GateResponse {
    /// Token that must be set as the new session cookie, if a login just completed
    pub fn issued_token(&self) -> Option<&str> {
        match &self.state {
            GateState::Authenticated {
                issued_token: Some(token),
            } => Some(token),
            _ => None,
        }
    }
}

/// Session check + GitHub login completion
pub struct AuthGate {
    store: Arc<dyn SessionStore>,
    catalog: Arc<dyn RoomCatalog>,
    provider: Arc<dyn OAuthProvider>,
    settings: SessionSettings,
}

impl AuthGate {
    pub fn new(
        store: Arc<dyn SessionStore>,
        catalog: Arc<dyn RoomCatalog>,
        provider: Arc<dyn OAuthProvider>,
        settings: SessionSettings,
    ) -> Self {
        Self {
            store,
            catalog,
            provider,
            settings,
        }
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    /// Cookie to attach for a freshly issued token
    pub fn cookie_for(&self, token: &str) -> axum_extra::extract::cookie::Cookie<'static> {
        session_cookie(&self.settings, token)
    }

    /// Run one request through the gate
    ///
    /// # Arguments
    /// * `session_token` - value of the session cookie, if any
    /// * `code` - `code` query parameter, if any
    ///
    /// # Errors
    /// - `AppError::SessionStore` if the lookup or the upsert fails
    /// - `AppError::OAuthProvider` if the identity lookup fails after a token was granted
    /// - `AppError::Catalog` if the room list cannot be read
    pub async fn resolve(
        &self,
        session_token: Option<&str>,
        code: Option<&str>,
    ) -> Result<GateResponse, AppError> {
        let mut state = match session_token.filter(|token| !token.is_empty()) {
            Some(token) => self.check_session(token).await?,
            None => GateState::NoSession,
        };

        while let Some(next) = self.advance(&state, code).await? {
            tracing::debug!(from = state.label(), to = next.label(), "Gate transition");
            state = next;
        }

        self.finish(state).await
    }

    /// Confirm the cookie against the store
    ///
    /// An unknown token is not an error: the pass continues as `NoSession`
    /// and the stale cookie is left in place.
    async fn check_session(&self, token: &str) -> Result<GateState, AppError> {
        match self.store.find_by_token(token).await? {
            Some(user) => {
                tracing::debug!(login = %user.login, "Session cookie matched a user");
                Ok(GateState::Authenticated { issued_token: None })
            }
            None => {
                tracing::debug!("Session cookie did not match any user");
                Ok(GateState::NoSession)
            }
        }
    }

    /// Next state, or `None` once the state is final
    async fn advance(
        &self,
        state: &GateState,
        code: Option<&str>,
    ) -> Result<Option<GateState>, AppError> {
        match state {
            GateState::NoSession => Ok(code
                .filter(|code| !code.is_empty())
                .map(|code| GateState::PendingCallback {
                    code: code.to_string(),
                })),
            GateState::PendingCallback { code } => self.complete_login(code).await.map(Some),
            GateState::Authenticated { .. } | GateState::LoginFailed => Ok(None),
        }
    }

    /// Exchange the code, resolve the identity, persist the user
    async fn complete_login(&self, code: &str) -> Result<GateState, AppError> {
        let token_response = match self.provider.exchange_code(code).await {
            Ok(response) => response,
            Err(error) => {
                tracing::warn!(%error, "Token exchange failed");
                return Ok(GateState::LoginFailed);
            }
        };

        let Some(access_token) = token_response.access_token() else {
            tracing::info!(response = ?token_response, "Token exchange returned no access token");
            return Ok(GateState::LoginFailed);
        };

        let identity = self.provider.fetch_identity(access_token).await?;

        let user = UserRecord {
            id: identity.id,
            login: identity.login,
            avatar_url: identity.avatar_url,
            access_token: access_token.to_string(),
        };
        self.store.upsert_user(&user).await?;

        tracing::info!(login = %user.login, github_id = user.id, "GitHub login completed");

        Ok(GateState::Authenticated {
            issued_token: Some(user.access_token),
        })
    }

    async fn finish(&self, state: GateState) -> Result<GateResponse, AppError> {
        crate::metrics::LOGIN_OUTCOMES_TOTAL
            .with_label_values(&[state.label()])
            .inc();

        let outcome = match &state {
            GateState::Authenticated { .. } => AuthOutcome::Rooms(self.catalog.list_rooms().await?),
            _ => AuthOutcome::LoggedOut,
        };

        Ok(GateResponse { state, outcome })
    }
}
