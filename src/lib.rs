//! deploychat - login gate for a small chat service
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      HTTP Layer (Axum)                       │
//! │  - GET /login-page (session check / OAuth callback)         │
//! │  - GET /auth/github, POST /logout                           │
//! │  - /health, /metrics                                        │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        AuthGate                              │
//! │  - SessionStore / RoomCatalog / OAuthProvider seams         │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌──────────────────────────────┐ ┌────────────────────────────┐
//! │  SQLite (sqlx)               │ │  GitHub (reqwest)          │
//! │  users, rooms_with_activity  │ │  access_token, /user       │
//! └──────────────────────────────┘ └────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - `auth`: login gate, GitHub client, session cookies, routes
//! - `data`: SQLite database and store seams
//! - `render`: HTML for the login page
//! - `api`: metrics endpoint
//! - `config`: layered settings
//! - `error`: `AppError` and its HTTP mapping

pub mod api;
pub mod auth;
pub mod config;
pub mod data;
pub mod error;
pub mod metrics;
pub mod render;

use std::sync::Arc;

/// Handles every route needs, cloned per request
#[derive(Clone)]
pub struct AppState {
    /// Settings the process started with
    pub config: Arc<config::AppConfig>,

    /// SQLite pool behind the session store and room catalog
    pub db: Arc<data::Database>,

    /// GitHub OAuth client
    pub github: Arc<auth::GitHubClient>,

    /// Session check and login completion
    pub gate: Arc<auth::AuthGate>,
}

impl AppState {
    /// Connect and wire everything the routes need
    ///
    /// # Steps
    /// 1. Connect to SQLite database (runs migrations)
    /// 2. Build the GitHub client
    /// 3. Wire the login gate
    ///
    /// # Errors
    /// Fails when the database cannot be opened or migrated, or the HTTP client cannot be built
    pub async fn new(config: config::AppConfig) -> Result<Self, error::AppError> {
        tracing::info!(path = %config.database.path.display(), "Opening database");

        let db = Arc::new(data::Database::connect(&config.database.path).await?);
        tracing::info!("Migrations applied");

        let github = Arc::new(auth::GitHubClient::new(config.auth.github.clone())?);

        let gate = Arc::new(auth::AuthGate::new(
            db.clone(),
            db.clone(),
            github.clone(),
            auth::SessionSettings::from_config(&config),
        ));

        tracing::info!(token_url = %config.auth.github.token_url, "Login gate ready");

        Ok(Self {
            config: Arc::new(config),
            db,
            github,
            gate,
        })
    }
}

/// Full route table: login page, OAuth redirect, logout, health, metrics.
///
/// The binary and the integration tests both serve this router.
pub fn build_router(state: AppState) -> axum::Router {
    use axum::Router;
    use axum::response::Redirect;
    use tower_http::{compression::CompressionLayer, trace::TraceLayer};

    let cors_layer = build_cors_layer(&state.config.server);

    Router::new()
        .route("/health", axum::routing::get(health_check))
        .route(
            "/",
            axum::routing::get(|| async { Redirect::to(auth::LOGIN_PAGE_PATH) }),
        )
        .merge(auth::auth_router())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .with_state(state)
        .merge(api::metrics_router())
}

fn build_cors_layer(server: &config::ServerConfig) -> tower_http::cors::CorsLayer {
    use axum::http::HeaderValue;
    use tower_http::cors::{Any, CorsLayer};

    if !server.protocol.eq_ignore_ascii_case("https") {
        return CorsLayer::permissive();
    }

    let allowed_origin = server.base_url();
    match HeaderValue::from_str(&allowed_origin) {
        Ok(origin) => CorsLayer::new()
            .allow_origin([origin])
            .allow_methods(Any)
            .allow_headers(Any),
        Err(error) => {
            tracing::error!(
                %error,
                origin = %allowed_origin,
                "Public origin is not a valid header value; cross-origin requests will be refused"
            );
            CorsLayer::new().allow_methods(Any).allow_headers(Any)
        }
    }
}

async fn health_check() -> &'static str {
    "OK"
}
