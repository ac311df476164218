//! Store seams used by the login gate
//!
//! The gate only talks to these traits. `Database` implements both; tests
//! swap in mockall doubles.

use axum::async_trait;

use super::models::{RoomSummary, SessionUser, UserRecord};
use crate::error::{CatalogError, StoreError};

/// User records keyed by external id, looked up by session token.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Find the user whose stored token equals `token`.
    ///
    /// `Ok(None)` means the token is unknown (stale or forged cookie).
    async fn find_by_token(&self, token: &str) -> Result<Option<SessionUser>, StoreError>;

    /// Insert the user, or overwrite login/avatar/token of the row with the same id.
    async fn upsert_user(&self, user: &UserRecord) -> Result<(), StoreError>;
}

/// Read-only room list, most recently active first.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoomCatalog: Send + Sync {
    async fn list_rooms(&self) -> Result<Vec<RoomSummary>, CatalogError>;
}
