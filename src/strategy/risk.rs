//! Risk gate.
//!
//! Stateless accept/reject predicate applied to ranked candidates. The
//! gate is silent: it returns `false` and never raises — the caller
//! decides what to log. Balance is passed in freshly read so a
//! concurrent external drawdown is caught here, not at order time.

use crate::types::{Opportunity, RiskLimits};

/// Default speed score at or below which a candidate is stale.
pub const DEFAULT_STALE_THRESHOLD: f64 = 0.5;

pub struct RiskGate {
    limits: RiskLimits,
    /// Candidates at or below this speed score are rejected regardless of
    /// profit — the external price has likely already moved.
    stale_threshold: f64,
}

impl RiskGate {
    pub fn new(limits: RiskLimits, stale_threshold: f64) -> Self {
        Self {
            limits,
            stale_threshold,
        }
    }

    pub fn limits(&self) -> &RiskLimits {
        &self.limits
    }

    /// Accept an opportunity iff every guardrail holds:
    /// balance sufficiency, minimum confidence, positive net profit
    /// (defensive re-check of the scanner's contract), the per-cycle
    /// trade cap, and freshness.
    pub fn approve(
        &self,
        opportunity: &Opportunity,
        available_balance: f64,
        accepted_this_cycle: usize,
    ) -> bool {
        if accepted_this_cycle >= self.limits.max_trades_per_cycle {
            return false;
        }
        if available_balance < opportunity.amount {
            return false;
        }
        if opportunity.confidence < self.limits.min_confidence {
            return false;
        }
        if opportunity.net_profit <= 0.0 {
            return false;
        }
        if opportunity.speed_score <= self.stale_threshold {
            return false;
        }
        true
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
