//! Session cookie helpers
//!
//! The session token is an opaque string: the GitHub access token issued
//! at login. It is stored as-is in the cookie and in the `users` table.

use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::Cookie;
use time::Duration;

/// Cookie settings handed to the gate at construction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    /// Cookie name (default `session_token`)
    pub cookie_name: String,
    /// Cookie lifetime in seconds
    pub max_age_seconds: i64,
    /// Add the `Secure` attribute
    pub secure: bool,
}

impl SessionSettings {
    pub fn from_config(config: &crate::config::AppConfig) -> Self {
        Self {
            cookie_name: config.auth.session_cookie_name.clone(),
            max_age_seconds: config.auth.session_max_age,
            secure: config.should_use_secure_cookies(),
        }
    }
}

/// Read the session token from the request cookies. Empty values count as absent.
pub fn session_token(jar: &CookieJar, cookie_name: &str) -> Option<String> {
    jar.get(cookie_name)
        .map(|cookie| cookie.value().to_owned())
        .filter(|value| !value.is_empty())
}

/// Build the cookie issued after a successful login
pub fn session_cookie(settings: &SessionSettings, token: &str) -> Cookie<'static> {
    Cookie::build((settings.cookie_name.clone(), token.to_owned()))
        .http_only(true)
        .secure(settings.secure)
        .max_age(Duration::seconds(settings.max_age_seconds))
        .build()
}

/// Build the removal cookie used by logout
pub fn clear_session_cookie(cookie_name: &str) -> Cookie<'static> {
    Cookie::build((cookie_name.to_owned(), "")).build()
}
