//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define request metrics (count, latency) and static cache gauges
//! - Render the Prometheus text exposition for the metrics endpoint
//!
//! # Metrics
//! - `http_requests` (counter): requests by status code and method
//! - `http_request_duration_seconds` (histogram): latency distribution
//! - `static_cache_entries` (gauge): memoized static paths
//! - `static_cache_bytes` (gauge): bytes held by the static cache
//! - `static_cache_disk_loads_total` (counter): static cache misses that hit disk
//!
//! # Design Decisions
//! - The recorder is owned by `Telemetry` and used through
//!   `metrics::with_local_recorder`; nothing is installed globally
//! - Path is deliberately not a label: 404 probes would explode cardinality

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use axum::http::{Method, StatusCode};
use metrics::{describe_counter, describe_gauge, describe_histogram, Unit};
use metrics_exporter_prometheus::{
    BuildError, Matcher, PrometheusBuilder, PrometheusHandle, PrometheusRecorder,
};

use crate::assets::CacheStats;

pub const REQUESTS: &str = "http_requests";
pub const REQUEST_DURATION: &str = "http_request_duration_seconds";
pub const STATIC_CACHE_ENTRIES: &str = "static_cache_entries";
pub const STATIC_CACHE_BYTES: &str = "static_cache_bytes";
pub const STATIC_CACHE_DISK_LOADS: &str = "static_cache_disk_loads_total";

/// Latency buckets in seconds.
pub const DURATION_BUCKETS: &[f64] = &[
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0,
];

/// Process-wide metrics state, built once at startup and shared by reference.
pub struct Telemetry {
    recorder: PrometheusRecorder,
    handle: PrometheusHandle,
    reported_disk_loads: AtomicU64,
}

impl Telemetry {
    pub fn new() -> Result<Self, BuildError> {
        let recorder = PrometheusBuilder::new()
            .set_buckets_for_metric(Matcher::Full(REQUEST_DURATION.to_string()), DURATION_BUCKETS)?
            .build_recorder();
        let handle = recorder.handle();

        metrics::with_local_recorder(&recorder, describe_metrics);

        Ok(Self {
            recorder,
            handle,
            reported_disk_loads: AtomicU64::new(0),
        })
    }

    /// Record one finished request.
    pub fn record_request(&self, method: &Method, status: StatusCode, elapsed: Duration) {
        metrics::with_local_recorder(&self.recorder, || {
            metrics::counter!(
                REQUESTS,
                "code" => status.as_u16().to_string(),
                "method" => method.as_str().to_ascii_uppercase()
            )
            .increment(1);
            metrics::histogram!(REQUEST_DURATION).record(elapsed.as_secs_f64());
        });
    }

    /// Publish the static cache state.
    pub fn observe_static_cache(&self, stats: &CacheStats) {
        let previous = self
            .reported_disk_loads
            .fetch_max(stats.disk_loads, Ordering::Relaxed);
        metrics::with_local_recorder(&self.recorder, || {
            metrics::gauge!(STATIC_CACHE_ENTRIES).set(stats.entries as f64);
            metrics::gauge!(STATIC_CACHE_BYTES).set(stats.bytes as f64);
            metrics::counter!(STATIC_CACHE_DISK_LOADS)
                .increment(stats.disk_loads.saturating_sub(previous));
        });
    }

    /// Prometheus text exposition of everything recorded so far.
    pub fn render(&self) -> String {
        self.handle.render()
    }

    /// Drain histogram buckets; call periodically.
    pub fn run_upkeep(&self) {
        self.handle.run_upkeep();
    }

    /// Spawn a task that runs upkeep on an interval for the process lifetime.
    pub fn spawn_upkeep(self: &std::sync::Arc<Self>, every: Duration) -> tokio::task::JoinHandle<()> {
        let telemetry = std::sync::Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            loop {
                interval.tick().await;
                telemetry.run_upkeep();
            }
        })
    }
}

impl std::fmt::Debug for Telemetry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Telemetry").finish_non_exhaustive()
    }
}

fn describe_metrics() {
    describe_counter!(REQUESTS, Unit::Count, "HTTP requests by status code and method.");
    describe_histogram!(REQUEST_DURATION, Unit::Seconds, "Time spent serving a request.");
    describe_gauge!(STATIC_CACHE_ENTRIES, Unit::Count, "Static paths held in memory.");
    describe_gauge!(STATIC_CACHE_BYTES, Unit::Bytes, "Bytes held by the static cache.");
    describe_counter!(
        STATIC_CACHE_DISK_LOADS,
        Unit::Count,
        "Static cache misses that read from disk."
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_requests_by_code_and_method() {
        let telemetry = Telemetry::new().unwrap();
        telemetry.record_request(&Method::GET, StatusCode::OK, Duration::from_millis(3));
        telemetry.record_request(&Method::GET, StatusCode::OK, Duration::from_millis(7));
        telemetry.record_request(&Method::POST, StatusCode::NOT_FOUND, Duration::from_millis(1));

        let text = telemetry.render();
        assert!(text.contains(r#"http_requests{code="200",method="GET"} 2"#), "{text}");
        assert!(text.contains(r#"http_requests{code="404",method="POST"} 1"#), "{text}");
        assert!(text.contains("http_request_duration_seconds_bucket"), "{text}");
        assert!(text.contains("http_request_duration_seconds_count 3"), "{text}");
        assert!(!text.contains("http_requests_total"), "{text}");
    }

    #[test]
    fn instances_do_not_share_state() {
        let a = Telemetry::new().unwrap();
        let b = Telemetry::new().unwrap();
        a.record_request(&Method::GET, StatusCode::OK, Duration::ZERO);
        assert!(a.render().contains("http_requests"));
        assert!(!b.render().contains("http_requests{"));
    }

    #[test]
    fn static_cache_counter_only_moves_forward() {
        let telemetry = Telemetry::new().unwrap();
        let mut stats = CacheStats {
            entries: 2,
            bytes: 40,
            disk_loads: 2,
            hits: 0,
        };
        telemetry.observe_static_cache(&stats);
        telemetry.observe_static_cache(&stats);
        stats.disk_loads = 3;
        telemetry.observe_static_cache(&stats);

        let text = telemetry.render();
        assert!(text.contains("static_cache_entries 2"), "{text}");
        assert!(text.contains("static_cache_bytes 40"), "{text}");
        assert!(text.contains("static_cache_disk_loads_total 3"), "{text}");
    }
}
