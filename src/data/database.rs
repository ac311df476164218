//! SQLite database operations
//!
//! All database access goes through this module.
//! Uses SQLx with embedded migrations.

use chrono::{DateTime, Utc};
use sqlx::{Pool, Sqlite, SqlitePool};
use std::path::Path;
use std::time::Instant;

use axum::async_trait;

use super::models::*;
use super::store::{RoomCatalog, SessionStore};
use crate::error::{AppError, CatalogError, StoreError};

/// Database connection pool wrapper.
pub struct Database {
    pool: Pool<Sqlite>,
}

fn observe_query(operation: &str, table: &str, started: Instant) {
    crate::metrics::DB_QUERIES_TOTAL
        .with_label_values(&[operation, table])
        .inc();
    crate::metrics::DB_QUERY_DURATION_SECONDS
        .with_label_values(&[operation, table])
        .observe(started.elapsed().as_secs_f64());
}

impl Database {
    /// Connect to SQLite database
    ///
    /// Creates the database file if it doesn't exist.
    /// Runs pending migrations automatically.
    ///
    /// # Arguments
    /// * `path` - Path to SQLite database file
    ///
    /// # Errors
    /// Returns error if connection or migration fails
    pub async fn connect(path: &Path) -> Result<Self, AppError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| AppError::Database(sqlx::Error::Io(e)))?;
        }

        let connection_string = format!("sqlite:{}?mode=rwc", path.display());
        let pool = SqlitePool::connect(&connection_string).await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| {
                tracing::error!("Migration failed: {}", e);
                AppError::Internal(anyhow::anyhow!("Migration failed: {}", e))
            })?;

        tracing::info!("Database connected and migrated successfully");

        Ok(Self { pool })
    }

    // =========================================================================
    // Users
    // =========================================================================

    /// Look up the display fields of the user owning `token`
    pub async fn find_user_by_token(&self, token: &str) -> Result<Option<SessionUser>, AppError> {
        let started = Instant::now();
        let user = sqlx::query_as::<_, SessionUser>(
            "SELECT login, avatar_url FROM users WHERE access_token = ? LIMIT 1",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        observe_query("select", "users", started);

        Ok(user)
    }

    /// Create or update a user keyed by its GitHub id
    ///
    /// Login, avatar and token are overwritten on conflict; `created_at`
    /// keeps the time of the first login.
    pub async fn upsert_user(&self, user: &UserRecord) -> Result<(), AppError> {
        let started = Instant::now();
        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO users (id, login, avatar_url, access_token, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                login = excluded.login,
                avatar_url = excluded.avatar_url,
                access_token = excluded.access_token,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(user.id)
        .bind(&user.login)
        .bind(&user.avatar_url)
        .bind(&user.access_token)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;
        observe_query("upsert", "users", started);

        Ok(())
    }

    /// Get a full user row by GitHub id
    pub async fn get_user(&self, id: i64) -> Result<Option<UserRecord>, AppError> {
        let user = sqlx::query_as::<_, UserRecord>(
            "SELECT id, login, avatar_url, access_token FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Count persisted users
    pub async fn count_users(&self) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    // =========================================================================
    // Rooms
    // =========================================================================

    /// List rooms, most recent activity first, idle rooms last
    pub async fn get_rooms_with_activity(&self) -> Result<Vec<RoomSummary>, AppError> {
        let started = Instant::now();
        let rooms = sqlx::query_as::<_, RoomSummary>(
            r#"
            SELECT id, name, last_message_at
            FROM rooms_with_activity
            ORDER BY last_message_at IS NULL, last_message_at DESC, id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        observe_query("select", "rooms_with_activity", started);

        Ok(rooms)
    }

    /// Create a room and return its id
    pub async fn insert_room(&self, name: &str) -> Result<i64, AppError> {
        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO rooms (name, created_at) VALUES (?, ?) RETURNING id",
        )
        .bind(name)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    /// Record a message in a room
    ///
    /// Only the timestamp matters to the login gate; it feeds the
    /// `last_message_at` column of the activity view.
    pub async fn insert_message(
        &self,
        room_id: i64,
        user_id: Option<i64>,
        body: &str,
        created_at: DateTime<Utc>,
    ) -> Result<i64, AppError> {
        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO messages (room_id, user_id, body, created_at) VALUES (?, ?, ?, ?) RETURNING id",
        )
        .bind(room_id)
        .bind(user_id)
        .bind(body)
        .bind(created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    /// Close the pool. Later queries fail with `PoolClosed`.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn into_store_error(err: AppError) -> StoreError {
    match err {
        AppError::Database(e) => e.into(),
        other => StoreError::new(other.to_string()),
    }
}

fn into_catalog_error(err: AppError) -> CatalogError {
    match err {
        AppError::Database(e) => e.into(),
        other => CatalogError(other.to_string()),
    }
}

#[async_trait]
impl SessionStore for Database {
    async fn find_by_token(&self, token: &str) -> Result<Option<SessionUser>, StoreError> {
        self.find_user_by_token(token)
            .await
            .map_err(into_store_error)
    }

    async fn upsert_user(&self, user: &UserRecord) -> Result<(), StoreError> {
        Database::upsert_user(self, user)
            .await
            .map_err(into_store_error)
    }
}

#[async_trait]
impl RoomCatalog for Database {
    async fn list_rooms(&self) -> Result<Vec<RoomSummary>, CatalogError> {
        self.get_rooms_with_activity()
            .await
            .map_err(into_catalog_error)
    }
}
