use crate::error::{AppError, Result};
use prometheus::{Encoder, TextEncoder};

pub async fn metrics_handler() -> Result<String> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| AppError::Internal(format!("Failed to encode metrics: {}", e)))?;
    String::from_utf8(buffer).map_err(|e| AppError::Internal(format!("Metrics are not UTF-8: {}", e)))
}
