//! Login routes
//!
//! Routes:
//! - GET /login-page - Session check, OAuth callback, room list
//! - GET /auth/github - Redirect to GitHub
//! - POST /logout - Drop the session cookie

use axum::{
    Router,
    extract::{Query, State},
    response::{Html, IntoResponse, Redirect},
    routing::{get, post},
};
use axum_extra::extract::CookieJar;
use serde::Deserialize;

use super::session::{clear_session_cookie, session_token};
use crate::AppState;
use crate::error::AppError;
use crate::render::{self, PageContext};

/// Path of the login page
pub const LOGIN_PAGE_PATH: &str = "/login-page";

/// Create authentication router
pub fn auth_router() -> Router<AppState> {
    Router::new()
        .route(LOGIN_PAGE_PATH, get(login_page))
        .route("/auth/github", get(github_redirect))
        .route("/logout", post(logout))
}

// =============================================================================
// Login Page
// =============================================================================

/// Query parameters of the login page
///
/// GitHub sends the user back here with `?code=...` after authorization.
#[derive(Debug, Deserialize)]
struct LoginPageQuery {
    code: Option<String>,
}

/// GET /login-page
///
/// # Steps
/// 1. Read the session cookie
/// 2. Run the gate (session lookup, or code exchange + user upsert)
/// 3. Attach a new session cookie if a login just completed
/// 4. Render rooms or the login button
async fn login_page(
    State(state): State<AppState>,
    Query(query): Query<LoginPageQuery>,
    jar: CookieJar,
) -> Result<(CookieJar, Html<String>), AppError> {
    let token = session_token(&jar, &state.gate.settings().cookie_name);

    let response = state
        .gate
        .resolve(token.as_deref(), query.code.as_deref())
        .await?;

    let jar = match response.issued_token() {
        Some(issued) => jar.add(state.gate.cookie_for(issued)),
        None => jar,
    };

    Ok((
        jar,
        render::login_page(&response.outcome, &PageContext::default()),
    ))
}

// =============================================================================
// GitHub OAuth
// =============================================================================

/// GET /auth/github
///
/// Redirects the browser to the GitHub authorization page.
async fn github_redirect(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let url = state.github.authorize_url()?;
    Ok(Redirect::to(url.as_str()))
}

// =============================================================================
// Logout
// =============================================================================

/// POST /logout
///
/// Clears the session cookie and returns to the login page. The stored
/// token stays in the database until the next login supersedes it.
async fn logout(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    let jar = jar.remove(clear_session_cookie(&state.gate.settings().cookie_name));
    (jar, Redirect::to(LOGIN_PAGE_PATH))
}
