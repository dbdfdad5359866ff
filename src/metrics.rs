use tracing::trace;

// Trace-based counters; the Prometheus recorder in main picks up the
// tower-http layer, these cover per-stage timings without macro churn.

pub fn inc_requests(route: &'static str) {
    trace!(
        target = "bluberry.metrics",
        route = route,
        "requests_total_inc"
    );
}

pub fn stage_elapsed(stage: &'static str, elapsed_ms: u128) {
    trace!(
        target = "bluberry.metrics",
        stage = stage,
        elapsed_ms = elapsed_ms as u64,
        "stage_elapsed"
    );
}
