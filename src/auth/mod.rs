//! GitHub OAuth authentication
//!
//! Handles:
//! - Session cookie lookup
//! - GitHub OAuth code exchange and user upsert
//! - The login page and its supporting routes

mod gate;
pub mod oauth;
mod routes;
pub mod session;

pub use gate::{AuthGate, AuthOutcome, GateResponse, GateState};
pub use oauth::{ExternalIdentity, GitHubClient, OAuthProvider, TokenResponse};
pub use routes::{LOGIN_PAGE_PATH, auth_router};
pub use session::SessionSettings;
