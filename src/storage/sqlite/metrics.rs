//! Metrics recording for store operations.

use std::time::Instant;

/// Records count and latency for one store operation.
///
/// Emits `storage_operations_total` and `storage_operation_duration_ms`,
/// labelled by table and operation. Without an installed recorder these are
/// no-ops.
pub fn record_operation_metrics(
    table: &'static str,
    operation: &'static str,
    start: Instant,
    status: &'static str,
) {
    metrics::counter!(
        "storage_operations_total",
        "table" => table,
        "operation" => operation,
        "status" => status
    )
    .increment(1);
    metrics::histogram!(
        "storage_operation_duration_ms",
        "table" => table,
        "operation" => operation,
        "status" => status
    )
    .record(start.elapsed().as_secs_f64() * 1000.0);
}

/// Maps a result to the `status` label value.
pub const fn status_label<T, E>(result: &Result<T, E>) -> &'static str {
    if result.is_ok() { "success" } else { "error" }
}
