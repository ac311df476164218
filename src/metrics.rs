//! Prometheus metrics registry and instruments.
//!
//! This module is framework-agnostic and can be used from any layer.

use lazy_static::lazy_static;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry};

lazy_static! {
    /// Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // Login Metrics
    pub static ref LOGIN_OUTCOMES_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("deploychat_login_outcomes_total", "Login page requests by final gate state"),
        &["state"]
    ).expect("metric can be created");
    pub static ref OAUTH_REQUESTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("deploychat_oauth_requests_total", "Requests sent to the OAuth provider"),
        &["endpoint", "status"]
    ).expect("metric can be created");

    // Database Metrics
    pub static ref DB_QUERIES_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("deploychat_db_queries_total", "Total number of database queries"),
        &["operation", "table"]
    ).expect("metric can be created");
    pub static ref DB_QUERY_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "deploychat_db_query_duration_seconds",
            "Database query duration in seconds"
        ).buckets(vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0]),
        &["operation", "table"]
    ).expect("metric can be created");

    // Error Metrics
    pub static ref ERRORS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("deploychat_errors_total", "Total number of errors"),
        &["error_type", "endpoint"]
    ).expect("metric can be created");
}

/// Initialize metrics registry.
///
/// Call once per process; registering twice fails.
pub fn init_metrics() {
    REGISTRY
        .register(Box::new(LOGIN_OUTCOMES_TOTAL.clone()))
        .expect("LOGIN_OUTCOMES_TOTAL can be registered");
    REGISTRY
        .register(Box::new(OAUTH_REQUESTS_TOTAL.clone()))
        .expect("OAUTH_REQUESTS_TOTAL can be registered");
    REGISTRY
        .register(Box::new(DB_QUERIES_TOTAL.clone()))
        .expect("DB_QUERIES_TOTAL can be registered");
    REGISTRY
        .register(Box::new(DB_QUERY_DURATION_SECONDS.clone()))
        .expect("DB_QUERY_DURATION_SECONDS can be registered");
    REGISTRY
        .register(Box::new(ERRORS_TOTAL.clone()))
        .expect("ERRORS_TOTAL can be registered");

    tracing::info!("Metrics registry initialized");
}
