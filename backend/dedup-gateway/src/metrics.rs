//! Prometheus exposition for the gateway's protocol counters, in the style
//! of the teacher's `streaming_service::metrics`.

use std::time::Duration;

use actix_web::HttpResponse;
use once_cell::sync::Lazy;
use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, TextEncoder};

static PROCESS_OUTCOMES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    let counter = IntCounterVec::new(
        Opts::new(
            "dedup_gateway_process_outcomes_total",
            "DedupProcessor::process results by classified outcome",
        ),
        &["outcome"],
    )
    .expect("failed to create dedup_gateway_process_outcomes_total");
    prometheus::default_registry()
        .register(Box::new(counter.clone()))
        .expect("failed to register dedup_gateway_process_outcomes_total");
    counter
});

static PROCESS_DURATION_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    let histogram = HistogramVec::new(
        HistogramOpts::new(
            "dedup_gateway_process_duration_seconds",
            "End-to-end DedupProcessor::process latency",
        )
        .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5]),
        &["outcome"],
    )
    .expect("failed to create dedup_gateway_process_duration_seconds");
    prometheus::default_registry()
        .register(Box::new(histogram.clone()))
        .expect("failed to register dedup_gateway_process_duration_seconds");
    histogram
});

pub fn observe_process(outcome: &str, elapsed: Duration) {
    PROCESS_OUTCOMES_TOTAL.with_label_values(&[outcome]).inc();
    PROCESS_DURATION_SECONDS
        .with_label_values(&[outcome])
        .observe(elapsed.as_secs_f64());
}

pub async fn serve_metrics() -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        return HttpResponse::InternalServerError().body(err.to_string());
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}
