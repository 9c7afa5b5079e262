//! Telemetry metric name constants.
//!
//! Centralised metric names for charla dispatch. Consumers install their
//! own `metrics` recorder (e.g. prometheus, statsd); without a recorder
//! installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `charla_`. Counters end in `_total`,
//! histograms use meaningful units (e.g. `_seconds`).
//!
//! # Common labels
//!
//! - `provider`: provider id (e.g. "openai", "cerebras_qwen3_32b")
//! - `status`: attempt outcome, "ok" | "connection" | "other"
//! - `outcome`: turn outcome, same values as `status`

/// Total provider attempts, one per HTTP request issued.
///
/// Labels: `provider`, `status`.
pub const REQUESTS_TOTAL: &str = "charla_requests_total";

/// Attempt duration in seconds, including response normalization.
///
/// Labels: `provider`.
pub const REQUEST_DURATION_SECONDS: &str = "charla_request_duration_seconds";

/// Fallback chains started by a connection failure.
///
/// Labels: `provider` (the provider that failed first).
pub const FALLBACKS_TOTAL: &str = "charla_fallbacks_total";

/// Fallback chains that ended without any provider answering.
pub const FALLBACKS_EXHAUSTED_TOTAL: &str = "charla_fallbacks_exhausted_total";

/// Completed turns.
///
/// Labels: `outcome`.
pub const TURNS_TOTAL: &str = "charla_turns_total";
