use once_cell::sync::Lazy;
use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

// Global Prometheus registry
pub static REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

fn service_and_env() -> (String, String) {
    let service = std::env::var("APP_SERVICE").unwrap_or_else(|_| env!("CARGO_PKG_NAME").to_string());
    let env_name = std::env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string());
    (service, env_name)
}

fn labeled(name: &str, help: &str) -> Opts {
    let (service, env_name) = service_and_env();
    Opts::new(name, help)
        .const_label("service", service)
        .const_label("env", env_name)
}

pub static GRADING_REQUESTS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    let c = IntCounter::with_opts(labeled("grading_requests_total", "Total grading requests")).unwrap();
    REGISTRY.register(Box::new(c.clone())).ok();
    c
});

pub static GRADING_FAILURES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    let cv = IntCounterVec::new(
        labeled("grading_failures_total", "Failed grading requests partitioned by error kind"),
        &["kind"],
    )
    .unwrap();
    REGISTRY.register(Box::new(cv.clone())).ok();
    cv
});

pub static GRADING_LATENCY_MS: Lazy<Histogram> = Lazy::new(|| {
    let (service, env_name) = service_and_env();
    let buckets = vec![100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0, 10000.0, 30000.0, 60000.0];
    let mut opts = HistogramOpts::new("grading_latency_ms", "Grading round-trip latency in milliseconds")
        .buckets(buckets);
    opts.common_opts = opts.common_opts.const_label("service", service).const_label("env", env_name);
    let h = Histogram::with_opts(opts).unwrap();
    REGISTRY.register(Box::new(h.clone())).ok();
    h
});

pub static REFERENCE_SNIPPETS_TOTAL: Lazy<IntGauge> = Lazy::new(|| {
    let g = IntGauge::with_opts(labeled(
        "reference_snippets_total",
        "Number of reference snippets sent as grounding documents",
    ))
    .unwrap();
    REGISTRY.register(Box::new(g.clone())).ok();
    g
});

pub fn observe_grading_latency_ms(duration_ms: f64) {
    GRADING_LATENCY_MS.observe(duration_ms);
}

// Exporter for Prometheus text format
pub fn export_prometheus() -> String {
    // Touch the lazies so every series shows up before the first request.
    Lazy::force(&GRADING_REQUESTS_TOTAL);
    Lazy::force(&GRADING_FAILURES_TOTAL);
    Lazy::force(&GRADING_LATENCY_MS);
    Lazy::force(&REFERENCE_SNIPPETS_TOTAL);

    let metric_families = REGISTRY.gather();
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if encoder.encode(&metric_families, &mut buffer).is_ok() {
        String::from_utf8(buffer).unwrap_or_default()
    } else {
        "".to_string()
    }
}
