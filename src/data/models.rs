//! Data models
//!
//! Rust structs representing database rows and view projections.
//! Timestamps use chrono; ids are the provider's numeric ids.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Users
// =============================================================================

/// A persisted user row
///
/// Keyed by the GitHub user id. The access token is also the session
/// token carried by the cookie, so a new login supersedes the old session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserRecord {
    pub id: i64,
    pub login: String,
    pub avatar_url: String,
    pub access_token: String,
}

/// Display fields of the user behind a valid session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct SessionUser {
    pub login: String,
    pub avatar_url: String,
}

// =============================================================================
// Rooms
// =============================================================================

/// A room with its latest activity, as read from `rooms_with_activity`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct RoomSummary {
    pub id: i64,
    pub name: String,
    /// Time of the newest message, `None` for rooms nobody has written in
    pub last_message_at: Option<DateTime<Utc>>,
}
