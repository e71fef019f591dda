use once_cell::sync::Lazy;
use prometheus::{register_int_counter_vec, register_int_gauge, Encoder, IntCounterVec, IntGauge, TextEncoder};

use service::cart::{CartError, CartErrorKind, CartOperation};

// Prometheus metrics (default registry)
pub static CART_OPERATIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "cart_operations_total",
        "Cart operations by operation and outcome",
        &["operation", "outcome"]
    )
    .expect("register cart_operations_total")
});

pub static CART_LINE_ITEMS: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!("cart_line_items", "Line items in the current cart")
        .expect("register cart_line_items")
});

/// Count one finished operation. Outcome is `ok`, `stock_exceeded` or `error`.
pub fn record<T>(op: CartOperation, result: &Result<T, CartError>) {
    let outcome = match result {
        Ok(_) => "ok",
        Err(e) if e.kind() == CartErrorKind::StockExceeded => "stock_exceeded",
        Err(_) => "error",
    };
    CART_OPERATIONS_TOTAL.with_label_values(&[op.as_str(), outcome]).inc();
}

pub fn set_line_items(count: usize) {
    CART_LINE_ITEMS.set(i64::try_from(count).unwrap_or(i64::MAX));
}

pub fn encode_metrics() -> (axum::http::StatusCode, String) {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return (
            axum::http::StatusCode::INTERNAL_SERVER_ERROR,
            format!("metrics encode error: {e}"),
        );
    }
    (
        axum::http::StatusCode::OK,
        String::from_utf8(buffer).unwrap_or_default(),
    )
}
