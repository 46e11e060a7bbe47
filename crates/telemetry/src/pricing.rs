//! Flat-rate cost estimation.
//!
//! Every model is billed at one configured price per 1000 tokens. There is
//! no per-model table and no prompt/completion split.

use docchat_core::session::ConversationSession;
use serde::{Deserialize, Serialize};

use crate::TelemetryError;

/// Converts token usage into an estimated price in USD.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostEstimator {
    rate_per_1k: f64,
}

impl CostEstimator {
    /// Create an estimator. The rate must be finite and non-negative.
    pub fn new(rate_per_1k: f64) -> Result<Self, TelemetryError> {
        if !rate_per_1k.is_finite() || rate_per_1k < 0.0 {
            return Err(TelemetryError::InvalidRate(rate_per_1k));
        }
        Ok(Self { rate_per_1k })
    }

    /// `total_tokens * rate / 1000`.
    pub fn estimate(&self, total_tokens: u32) -> f64 {
        total_tokens as f64 * self.rate_per_1k / 1000.0
    }

    /// Add `cost` to the session's running total.
    pub fn accumulate(&self, session: &mut ConversationSession, cost: f64) {
        session.add_cost(cost);
        tracing::debug!(
            session = %session.id(),
            cost,
            total = session.total_cost(),
            "Cost accumulated"
        );
    }
}

impl Default for CostEstimator {
    fn default() -> Self {
        Self { rate_per_1k: 0.0015 }
    }
}

/// Aggregate usage of a session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostSummary {
    pub turns: usize,
    pub total_tokens: u64,
    pub total_cost: f64,
}

impl CostSummary {
    pub fn of(session: &ConversationSession) -> Self {
        Self {
            turns: session.len(),
            total_tokens: session.token_counts().iter().map(|t| *t as u64).sum(),
            total_cost: session.total_cost(),
        }
    }
}

/// Render a cost the way the transcript shows it: `$0.00123`.
pub fn format_cost(cost: f64) -> String {
    format!("${cost:.5}")
}
