//! Rejuvenators observability.
//!
//! Console, file and OTLP logging plus Prometheus metrics. Everything beyond
//! plain console logging sits behind the `observability` feature (on by
//! default). At runtime `OBSERVABILITY_ENABLED=false` switches the same
//! build down to console logging and no-op metrics.
//!
//! ```no_run
//! use rejuvenators_observability::{init_tracing, shutdown_tracer};
//!
//! #[tokio::main]
//! async fn main() {
//!     init_tracing();
//!     // ... serve ...
//!     shutdown_tracer().await;
//! }
//! ```

mod basic_logging;

pub use basic_logging::init_basic_console_logging;

#[cfg(feature = "observability")]
pub mod logging;
#[cfg(feature = "observability")]
pub mod metrics;

#[cfg(feature = "observability")]
pub use metrics_exporter_prometheus::PrometheusHandle;

#[cfg(feature = "observability")]
pub use logging::{init_tracing, logging_middleware, shutdown_tracer};
#[cfg(feature = "observability")]
pub use metrics::{
    init_metrics, metrics_app, metrics_middleware, track_authorization_denied,
    track_booking_created, track_booking_deleted, track_booking_transition, track_bulk_operation,
};

/// Runtime switch read once from `OBSERVABILITY_ENABLED` (default on).
#[cfg(feature = "observability")]
pub fn is_observability_enabled() -> bool {
    use std::sync::OnceLock;

    static OBSERVABILITY_ENABLED: OnceLock<bool> = OnceLock::new();
    *OBSERVABILITY_ENABLED.get_or_init(|| {
        std::env::var("OBSERVABILITY_ENABLED")
            .map(|v| v.to_lowercase() != "false" && v != "0")
            .unwrap_or(true)
    })
}

// No-op stubs when observability is disabled
#[cfg(not(feature = "observability"))]
pub mod stubs {
    use axum::{Router, extract::Request, middleware::Next, response::Response};

    pub fn is_observability_enabled() -> bool {
        false
    }

    pub async fn logging_middleware(req: Request, next: Next) -> Response {
        next.run(req).await
    }

    pub async fn metrics_middleware(req: Request, next: Next) -> Response {
        next.run(req).await
    }

    pub fn init_tracing() {
        super::init_basic_console_logging();
    }

    pub async fn shutdown_tracer() {}

    /// Never produces a handle; there is nothing to scrape.
    pub fn init_metrics() -> Option<()> {
        None
    }

    pub fn metrics_app(_handle: ()) -> Router {
        Router::new()
    }

    pub fn track_booking_created() {}
    pub fn track_booking_deleted(_outcome: &str) {}
    pub fn track_booking_transition(_axis: &str, _target: &str, _outcome: &str) {}
    pub fn track_bulk_operation(_operation: &str, _succeeded: usize, _failed: usize) {}
    pub fn track_authorization_denied(_role: &str, _requirement: &str) {}
}

#[cfg(not(feature = "observability"))]
pub use stubs::*;
