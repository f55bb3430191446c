use lazy_static::lazy_static;
use prometheus::{
    Counter, GaugeVec, Histogram, IntCounterVec, register_counter, register_gauge_vec,
    register_histogram, register_int_counter_vec,
};


lazy_static! {
    pub static ref REQUEST_TOTAL: Counter =
        register_counter!("gateway_requests_total", "Total number of requests").unwrap();
    pub static ref RATE_LIMITED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "gateway_rate_limited_total",
        "Requests denied by a rate limiter",
        &["limiter"]
    )
    .unwrap();
    pub static ref ORIGIN_REJECTED_TOTAL: Counter = register_counter!(
        "gateway_origin_rejected_total",
        "Requests rejected for an untrusted origin"
    )
    .unwrap();
    pub static ref TRACKED_KEYS: GaugeVec = register_gauge_vec!(
        "gateway_rate_limit_tracked_keys",
        "Keys currently tracked by a rate limiter",
        &["limiter"]
    )
    .unwrap();
    pub static ref UPSTREAM_LATENCY: Histogram = register_histogram!(
        "gateway_upstream_latency_seconds",
        "Upstream request latency in seconds"
    )
    .unwrap();
}
