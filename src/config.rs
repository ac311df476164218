//! deploychat settings
//!
//! Sources, later ones winning:
//! 1. Default values
//! 2. Configuration file (config/default.toml, config/local.toml)
//! 3. `DEPLOYCHAT__*` environment variables

use serde::Deserialize;
use std::{net::IpAddr, path::PathBuf};

/// Root of the settings tree
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Listen address
    pub host: String,
    /// Listen port
    pub port: u16,
    /// Public domain (e.g., "chat.example.com")
    pub domain: String,
    /// Public scheme, "https" turns on Secure cookies
    pub protocol: String,
}

impl ServerConfig {
    /// Public origin of the login page
    ///
    /// # Returns
    /// Full URL like "https://chat.example.com"
    pub fn base_url(&self) -> String {
        format!("{}://{}", self.protocol, self.domain)
    }
}

/// Where the users and rooms live
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite file, created on first start
    pub path: PathBuf,
}

/// Authentication configuration (session cookie + GitHub OAuth)
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Name of the cookie carrying the session token
    pub session_cookie_name: String,
    /// Session cookie max age in seconds (default: 604800 = 7 days)
    pub session_max_age: i64,
    pub github: GitHubOAuthConfig,
}

/// GitHub OAuth app credentials and endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubOAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    /// Authorization page the login button points at
    pub authorize_url: String,
    /// Code-for-token exchange endpoint
    pub token_url: String,
    /// Token-for-identity endpoint
    pub user_url: String,
    /// Optional callback URL sent with the authorization request
    #[serde(default)]
    pub redirect_uri: Option<String>,
    /// Optional timeout for provider calls. Unset means no timeout.
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Default level when RUST_LOG is unset
    pub level: String,
    /// "pretty" for terminals, "json" for log shippers
    pub format: String,
}

impl LoggingConfig {
    /// Filter directives used when RUST_LOG is unset
    pub fn default_filter(&self) -> String {
        format!("deploychat={},tower_http=debug", self.level.trim())
    }

    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

impl AppConfig {
    /// Build the settings from defaults, files and environment
    ///
    /// # Loading Order
    /// 1. Default values
    /// 2. config/default.toml (if exists)
    /// 3. config/local.toml (if exists)
    /// 4. Environment variables (DEPLOYCHAT__*)
    ///
    /// # Errors
    /// `AppError::Config` when a source fails to parse or `validate` rejects the result
    pub fn load() -> Result<Self, crate::error::AppError> {
        use config::{Config, Environment, File};

        let config = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("server.domain", "localhost")?
            .set_default("server.protocol", "http")?
            .set_default("database.path", "data/deploychat.db")?
            .set_default("auth.session_cookie_name", "session_token")?
            .set_default("auth.session_max_age", 604800)?
            .set_default(
                "auth.github.authorize_url",
                "https://github.com/login/oauth/authorize",
            )?
            .set_default(
                "auth.github.token_url",
                "https://github.com/login/oauth/access_token",
            )?
            .set_default("auth.github.user_url", "https://api.github.com/user")?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                Environment::with_prefix("DEPLOYCHAT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;

        let app_config: Self = config
            .try_deserialize()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;
        app_config.validate()?;
        Ok(app_config)
    }

    pub fn should_use_secure_cookies(&self) -> bool {
        self.server.protocol.eq_ignore_ascii_case("https")
    }

    pub fn validate(&self) -> Result<(), crate::error::AppError> {
        use crate::error::AppError;

        if self.auth.github.client_id.trim().is_empty() {
            return Err(AppError::Config(
                "auth.github.client_id is required".to_string(),
            ));
        }

        if self.auth.github.client_secret.trim().is_empty() {
            return Err(AppError::Config(
                "auth.github.client_secret is required".to_string(),
            ));
        }

        if self.auth.session_cookie_name.trim().is_empty() {
            return Err(AppError::Config(
                "auth.session_cookie_name must not be empty".to_string(),
            ));
        }

        if self.auth.session_max_age <= 0 {
            return Err(AppError::Config(
                "auth.session_max_age must be greater than 0".to_string(),
            ));
        }

        for (key, value) in [
            ("auth.github.authorize_url", &self.auth.github.authorize_url),
            ("auth.github.token_url", &self.auth.github.token_url),
            ("auth.github.user_url", &self.auth.github.user_url),
        ] {
            url::Url::parse(value).map_err(|e| AppError::Config(format!("{key}: {e}")))?;
        }

        if self.should_use_secure_cookies() {
            return Ok(());
        }

        if is_local_server_domain(&self.server.domain) {
            let host = normalized_server_host(&self.server.domain);
            tracing::warn!(
                host = %host,
                protocol = %self.server.protocol,
                "Using insecure session cookies for local development"
            );
            Ok(())
        } else {
            Err(AppError::Config(
                "server.protocol must be https for non-local server domains".to_string(),
            ))
        }
    }
}

fn normalized_server_host(domain: &str) -> String {
    let trimmed = domain.trim();
    let parsed_host = url::Url::parse(&format!("http://{trimmed}"))
        .ok()
        .and_then(|url| url.host_str().map(|host| host.to_string()));
    let host = parsed_host.unwrap_or_else(|| trimmed.to_string());
    host.trim_end_matches('.').to_ascii_lowercase()
}

fn is_local_server_domain(domain: &str) -> bool {
    let host = normalized_server_host(domain);
    if host == "localhost" || host.ends_with(".localhost") {
        return true;
    }

    if let Ok(ip) = host.parse::<IpAddr>() {
        return ip.is_loopback() || ip.is_unspecified();
    }

    false
}
