//! API layer
//!
//! HTTP handlers outside the login flow:
//! - Metrics (Prometheus)

pub mod metrics;

pub use metrics::metrics_router;
