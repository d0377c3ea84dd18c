//! Tracing setup and the log-backed audit sink.

/// Initialize process-wide tracing with `info` as the fallback filter.
///
/// Safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init("info");
}

/// Tracing configuration (filters, layers).
pub mod tracing;

/// Audit events written as structured log lines.
pub mod audit;

pub use audit::{AUDIT_TARGET, TracingAuditSink};
