//! Cost tracking for docchat conversations.
//!
//! Converts per-turn token usage into a monetary estimate and keeps the
//! session's running total.

pub mod pricing;

pub use pricing::{CostEstimator, CostSummary, format_cost};

/// Errors from the telemetry subsystem.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("invalid cost rate: {0} (must be a finite, non-negative number)")]
    InvalidRate(f64),
}
