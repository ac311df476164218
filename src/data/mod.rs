//! Data layer module
//!
//! Handles all data persistence:
//! - SQLite database operations
//! - Session store and room catalog seams

mod database;
mod models;
mod store;

pub use database::Database;
pub use models::*;
pub use store::{RoomCatalog, SessionStore};

#[cfg(test)]
pub use store::{MockRoomCatalog, MockSessionStore};
