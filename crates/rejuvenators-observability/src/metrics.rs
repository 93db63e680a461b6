use axum::{
    Router,
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
    routing::get,
};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::{Duration, Instant};

use crate::is_observability_enabled;

const HTTP_DURATION_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.01, 0.025, 0.05, 0.075, 0.1, 0.25, 0.5, 0.75, 1.0, 2.5, 5.0, 7.5, 10.0,
];

/// Installs the Prometheus recorder and its upkeep task.
///
/// Returns `None` when observability is off or the recorder cannot be
/// installed (for example because another recorder already is).
pub fn init_metrics() -> Option<PrometheusHandle> {
    if !is_observability_enabled() {
        return None;
    }

    let builder = match PrometheusBuilder::new().set_buckets_for_metric(
        Matcher::Full("http_request_duration_seconds".to_string()),
        HTTP_DURATION_BUCKETS,
    ) {
        Ok(builder) => builder,
        Err(e) => {
            tracing::error!(error = %e, "Invalid histogram buckets; metrics disabled");
            return None;
        }
    };

    let handle = match builder.install_recorder() {
        Ok(handle) => handle,
        Err(e) => {
            tracing::error!(error = %e, "Failed to install Prometheus recorder; metrics disabled");
            return None;
        }
    };

    let upkeep_handle = handle.clone();
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_secs(5)).await;
            upkeep_handle.run_upkeep();
        }
    });

    Some(handle)
}

/// Counts a request as in flight until dropped, so cancelled requests still
/// leave the active gauge.
struct InFlight {
    method: String,
    route: String,
    started: Instant,
}

impl InFlight {
    fn begin(req: &Request) -> Self {
        gauge!("http_requests_active").increment(1.0);
        let route = match req.extensions().get::<MatchedPath>() {
            Some(matched) => matched.as_str().to_owned(),
            None => req.uri().path().to_owned(),
        };
        Self {
            method: req.method().to_string(),
            route,
            started: Instant::now(),
        }
    }

    fn finish(&self, status: u16) {
        let class = match status / 100 {
            2 => "2xx",
            4 => "4xx",
            5 => "5xx",
            _ => "other",
        };
        counter!(
            "http_requests_total",
            "method" => self.method.clone(),
            "path" => self.route.clone(),
            "status" => status.to_string()
        )
        .increment(1);
        counter!("http_requests_by_status", "status_category" => class).increment(1);
        histogram!(
            "http_request_duration_seconds",
            "method" => self.method.clone(),
            "path" => self.route.clone()
        )
        .record(self.started.elapsed().as_secs_f64());
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        gauge!("http_requests_active").decrement(1.0);
    }
}

pub async fn metrics_middleware(req: Request, next: Next) -> Response {
    if !is_observability_enabled() {
        return next.run(req).await;
    }

    let in_flight = InFlight::begin(&req);
    let response = next.run(req).await;
    in_flight.finish(response.status().as_u16());
    response
}

/// Router for the scrape endpoint, served on its own port.
pub fn metrics_app(handle: PrometheusHandle) -> Router {
    Router::new().route("/metrics", get(move || async move { handle.render() }))
}

pub fn track_booking_created() {
    if !is_observability_enabled() {
        return;
    }
    counter!("bookings_created_total").increment(1);
}

/// `outcome` is `deleted` or the failure kind.
pub fn track_booking_deleted(outcome: &str) {
    if !is_observability_enabled() {
        return;
    }
    counter!("booking_deletions_total", "outcome" => outcome.to_string()).increment(1);
}

/// `axis` is `status` or `payment_status`; `outcome` is `applied` or the
/// rejection kind.
pub fn track_booking_transition(axis: &str, target: &str, outcome: &str) {
    if !is_observability_enabled() {
        return;
    }
    counter!(
        "booking_transitions_total",
        "axis" => axis.to_string(),
        "target" => target.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

pub fn track_bulk_operation(operation: &str, succeeded: usize, failed: usize) {
    if !is_observability_enabled() {
        return;
    }
    counter!("booking_bulk_operations_total", "operation" => operation.to_string()).increment(1);
    counter!("booking_bulk_items_total", "operation" => operation.to_string(), "result" => "success")
        .increment(succeeded as u64);
    counter!("booking_bulk_items_total", "operation" => operation.to_string(), "result" => "failed")
        .increment(failed as u64);
}

pub fn track_authorization_denied(role: &str, requirement: &str) {
    if !is_observability_enabled() {
        return;
    }
    counter!(
        "authorization_denials_total",
        "role" => role.to_string(),
        "requirement" => requirement.to_string()
    )
    .increment(1);
}
