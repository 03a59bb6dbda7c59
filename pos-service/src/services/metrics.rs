//! Prometheus metrics for pos-service.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram_vec, CounterVec, HistogramVec, TextEncoder,
};

/// Sale counter by payment method.
pub static SALES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "pos_sales_total",
        "Total number of recorded sales by payment method",
        &["payment_method"]
    )
    .expect("Failed to register sales_total")
});

/// Reverted-sale counter.
pub static SALES_REVERTED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "pos_sales_reverted_total",
        "Total number of reverted sales",
        &["ledger_adjusted"] // yes, no
    )
    .expect("Failed to register sales_reverted_total")
});

/// Cash-day close counter.
pub static CASH_DAYS_CLOSED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "pos_cash_days_closed_total",
        "Total number of closed cash days by count outcome",
        &["outcome"] // balanced, over, short
    )
    .expect("Failed to register cash_days_closed_total")
});

/// Error counter for alerting.
pub static ERRORS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "pos_errors_total",
        "Total number of errors by type",
        &["error_type"]
    )
    .expect("Failed to register errors_total")
});

/// Database query duration histogram.
pub static DB_QUERY_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "pos_db_query_duration_seconds",
        "Database query duration in seconds",
        &["operation"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]
    )
    .expect("Failed to register db_query_duration")
});

/// Initialize all metrics (forces lazy initialization).
pub fn init_metrics() {
    Lazy::force(&SALES_TOTAL);
    Lazy::force(&SALES_REVERTED_TOTAL);
    Lazy::force(&CASH_DAYS_CLOSED_TOTAL);
    Lazy::force(&ERRORS_TOTAL);
    Lazy::force(&DB_QUERY_DURATION);
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    encoder
        .encode_to_string(&metric_families)
        .unwrap_or_default()
}
