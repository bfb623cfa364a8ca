//! Request middleware: Prometheus metrics and per-organization rate limiting.

pub mod metrics;
pub mod rate_limit;
