//! Error types for deploychat
//!
//! Seam-level errors (`StoreError`, `CatalogError`, `OAuthError`) are
//! converted into `AppError`, which implements `IntoResponse`.
//!
//! Session store failures are surfaced to the client verbatim as a 400.
//! Room catalog failures are never softened: they become a generic 500.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Failure reported by the session store (user lookup or upsert).
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct StoreError {
    pub message: String,
}

impl StoreError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        Self::new(err.to_string())
    }
}

/// Failure reading the room catalog.
#[derive(Debug, Error)]
#[error("Room catalog error: {0}")]
pub struct CatalogError(pub String);

impl From<sqlx::Error> for CatalogError {
    fn from(err: sqlx::Error) -> Self {
        Self(err.to_string())
    }
}

/// Failure talking to the OAuth provider.
#[derive(Debug, Error)]
pub enum OAuthError {
    /// Transport or body decoding failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider answered with a non-success status
    #[error("{operation} failed with status {status}: {detail}")]
    Status {
        operation: &'static str,
        status: u16,
        detail: String,
    },
}

/// Application-wide error type
///
/// Maps each failure to the HTTP response the login gate promises:
/// store and identity errors become a 400 carrying the raw message,
/// everything else falls back to the usual JSON error body.
#[derive(Debug, Error)]
pub enum AppError {
    /// Session store read or write failed (400, raw message)
    #[error("{0}")]
    SessionStore(#[from] StoreError),

    /// Room catalog read failed (500)
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// OAuth provider failed after a token was granted (400, raw message)
    #[error("{0}")]
    OAuthProvider(#[from] OAuthError),

    /// Database error (500)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// HTTP client error (502)
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// Configuration error (500)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal server error (500)
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl AppError {
    fn error_type(&self) -> &'static str {
        match self {
            AppError::SessionStore(_) => "session_store",
            AppError::Catalog(_) => "catalog",
            AppError::OAuthProvider(_) => "oauth_provider",
            AppError::Database(_) => "database",
            AppError::HttpClient(_) => "http_client",
            AppError::Config(_) => "config",
            AppError::Internal(_) => "internal",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        use axum::Json;
        use crate::metrics::ERRORS_TOTAL;

        ERRORS_TOTAL
            .with_label_values(&[self.error_type(), "unknown"])
            .inc();

        // The store message is the whole body, no JSON envelope.
        if let AppError::SessionStore(err) = &self {
            tracing::warn!(error = %err, "Session store error");
            return (StatusCode::BAD_REQUEST, err.message.clone()).into_response();
        }
        if let AppError::OAuthProvider(err) = &self {
            tracing::warn!(error = %err, "Identity lookup failed");
            return (StatusCode::BAD_REQUEST, err.to_string()).into_response();
        }

        let (status, error_message) = match &self {
            AppError::HttpClient(_) => (StatusCode::BAD_GATEWAY, self.to_string()),
            AppError::Config(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            AppError::Database(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Database error".to_string(),
            ),
            AppError::Catalog(_)
            | AppError::Internal(_)
            | AppError::SessionStore(_)
            | AppError::OAuthProvider(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        let body = Json(serde_json::json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body is readable");
        String::from_utf8(bytes.to_vec()).expect("body is utf-8")
    }

    #[tokio::test]
    async fn store_error_is_400_with_raw_message() {
        let response =
            AppError::SessionStore(StoreError::new("connection refused")).into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_text(response).await, "connection refused");
    }

    #[tokio::test]
    async fn catalog_error_is_generic_500() {
        let response =
            AppError::Catalog(CatalogError("no such table: rooms".to_string())).into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_text(response).await;
        assert!(body.contains("Internal server error"));
        assert!(!body.contains("no such table"));
    }

    #[tokio::test]
    async fn identity_error_is_400_with_provider_message() {
        let response = AppError::OAuthProvider(OAuthError::Status {
            operation: "user",
            status: 401,
            detail: "Bad credentials".to_string(),
        })
        .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_text(response).await,
            "user failed with status 401: Bad credentials"
        );
    }

    #[test]
    fn oauth_status_error_mentions_operation() {
        let err = OAuthError::Status {
            operation: "user request",
            status: 401,
            detail: "Bad credentials".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "user request failed with status 401: Bad credentials"
        );
    }
}
