//! Common test utilities for E2E tests
//!
//! Every `TestServer` gets its own SQLite file and its own fake GitHub
//! listening on a random port.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::IntoResponse,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use deploychat::{AppState, config, data::UserRecord};
use serde::Deserialize;
use serde_json::json;
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Codes understood by the fake GitHub token endpoint
pub const GOOD_CODE: &str = "good-code";
pub const SECOND_GOOD_CODE: &str = "second-good-code";
pub const REJECTED_CODE: &str = "rejected-code";
pub const BROKEN_IDENTITY_CODE: &str = "broken-identity-code";

/// Tokens the fake GitHub hands out for the codes above
pub const GOOD_TOKEN: &str = "gho_alice_first";
pub const SECOND_GOOD_TOKEN: &str = "gho_alice_second";
pub const BROKEN_TOKEN: &str = "gho_broken";

/// GitHub id of the identity behind the good tokens
pub const ALICE_ID: i64 = 7;

/// Test server instance
pub struct TestServer {
    pub addr: String,
    pub state: AppState,
    pub github: FakeGitHub,
    pub _temp_dir: TempDir,
    pub client: reqwest::Client,
}

impl TestServer {
    /// Create a new test server instance
    pub async fn new() -> Self {
        let github = FakeGitHub::start().await;

        // Create temporary directory for test database
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");

        let config = config::AppConfig {
            server: config::ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                domain: "localhost".to_string(),
                protocol: "http".to_string(),
            },
            database: config::DatabaseConfig { path: db_path },
            auth: config::AuthConfig {
                session_cookie_name: "session_token".to_string(),
                session_max_age: 604800,
                github: config::GitHubOAuthConfig {
                    client_id: "test-client-id".to_string(),
                    client_secret: "test-client-secret".to_string(),
                    authorize_url: format!("{}/login/oauth/authorize", github.addr),
                    token_url: format!("{}/login/oauth/access_token", github.addr),
                    user_url: format!("{}/user", github.addr),
                    redirect_uri: None,
                    timeout_seconds: Some(5),
                },
            },
            logging: config::LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        };

        let state = AppState::new(config).await.unwrap();

        // Redirects are asserted on, never followed
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = deploychat::build_router(state.clone());

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr: format!("http://{}", addr),
            state,
            github,
            _temp_dir: temp_dir,
            client,
        }
    }

    /// Get base URL for a path
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.addr, path)
    }

    /// GET /login-page with an optional session cookie and callback code
    pub async fn login_page(&self, cookie: Option<&str>, code: Option<&str>) -> reqwest::Response {
        let mut request = self.client.get(self.url("/login-page"));
        if let Some(code) = code {
            request = request.query(&[("code", code)]);
        }
        if let Some(token) = cookie {
            request = request.header("Cookie", format!("session_token={token}"));
        }
        request.send().await.unwrap()
    }

    /// Store a user directly, as if they had logged in before
    pub async fn create_test_user(&self, id: i64, login: &str, token: &str) -> UserRecord {
        let user = UserRecord {
            id,
            login: login.to_string(),
            avatar_url: format!("https://avatars.example.com/{login}.png"),
            access_token: token.to_string(),
        };
        self.state.db.upsert_user(&user).await.unwrap();
        user
    }

    /// Create a room, optionally with one message at `last_message_at`
    pub async fn create_test_room(&self, name: &str, last_message_at: Option<DateTime<Utc>>) -> i64 {
        let room_id = self.state.db.insert_room(name).await.unwrap();
        if let Some(at) = last_message_at {
            self.state
                .db
                .insert_message(room_id, None, "hello", at)
                .await
                .unwrap();
        }
        room_id
    }
}

/// Value of the `session_token` Set-Cookie header, if any
pub fn set_cookie(response: &reqwest::Response) -> Option<String> {
    response
        .headers()
        .get_all("set-cookie")
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find(|value| value.starts_with("session_token="))
        .map(str::to_string)
}

// =============================================================================
// Fake GitHub
// =============================================================================

/// Minimal stand-in for github.com's token and user endpoints
#[derive(Clone)]
pub struct FakeGitHub {
    pub addr: String,
    calls: Arc<AtomicUsize>,
}

impl FakeGitHub {
    async fn start() -> Self {
        let calls = Arc::new(AtomicUsize::new(0));

        let app = Router::new()
            .route("/login/oauth/access_token", post(access_token))
            .route("/user", get(user))
            .with_state(calls.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr: format!("http://{}", addr),
            calls,
        }
    }

    /// Number of requests the fake has received
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[derive(Deserialize)]
struct AccessTokenRequest {
    client_id: String,
    client_secret: String,
    code: String,
}

async fn access_token(
    State(calls): State<Arc<AtomicUsize>>,
    Json(request): Json<AccessTokenRequest>,
) -> impl IntoResponse {
    calls.fetch_add(1, Ordering::SeqCst);

    if request.client_id != "test-client-id" || request.client_secret != "test-client-secret" {
        return Json(json!({ "error": "incorrect_client_credentials" }));
    }

    match request.code.as_str() {
        GOOD_CODE => Json(json!({ "access_token": GOOD_TOKEN, "token_type": "bearer" })),
        SECOND_GOOD_CODE => Json(json!({ "access_token": SECOND_GOOD_TOKEN, "token_type": "bearer" })),
        BROKEN_IDENTITY_CODE => Json(json!({ "access_token": BROKEN_TOKEN, "token_type": "bearer" })),
        _ => Json(json!({
            "error": "bad_verification_code",
            "error_description": "The code passed is incorrect or expired."
        })),
    }
}

async fn user(State(calls): State<Arc<AtomicUsize>>, headers: HeaderMap) -> impl IntoResponse {
    calls.fetch_add(1, Ordering::SeqCst);

    let token = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("token "))
        .unwrap_or_default();

    match token {
        GOOD_TOKEN | SECOND_GOOD_TOKEN => (
            StatusCode::OK,
            Json(json!({
                "login": "alice",
                "id": ALICE_ID,
                "avatar_url": "https://avatars.example.com/alice.png"
            })),
        ),
        _ => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "Bad credentials" })),
        ),
    }
}
