//! Opportunity construction and ranking.
//!
//! Turns signals that clear a minimum-movement threshold into fee-checked
//! `Opportunity` records, then ranks them by urgency. Candidates that
//! cannot clear their own fees never leave this module; the risk gate
//! only ever sees net-profitable trades.

use std::time::Duration;
use tracing::debug;

use super::fees::TradeCosts;
use crate::types::{Opportunity, Side, Signal};

/// Target and stop prices are clamped into this band to avoid degenerate
/// near-certain prices.
const PRICE_CLAMP_MIN: f64 = 0.05;
const PRICE_CLAMP_MAX: f64 = 0.95;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ScannerConfig {
    /// Minimum |24h % change| for the momentum trigger.
    pub min_momentum: f64,
    /// Minimum divergence for the velocity trigger.
    pub min_divergence: f64,
    /// Probability-point shift from entry to the assumed exit.
    pub profit_target: f64,
    /// Probability-point shift from entry to the stop.
    pub stop_loss: f64,
    /// Fraction of available balance committed before the position cap.
    pub participation_fraction: f64,
    pub max_position_usd: f64,
    pub min_position_usd: f64,
    /// Fee rate for the markets this scanner trades (fast-settling).
    pub fee_rate: f64,
    /// Minimum net return on notional to keep a candidate.
    pub min_profit_ratio: f64,
    /// |momentum| at which confidence saturates.
    pub momentum_normalization: f64,
    /// Divergence at which confidence saturates.
    pub divergence_normalization: f64,
    /// Scan latency budget; speed score reaches 0 when it is spent.
    pub max_latency_budget: Duration,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            min_momentum: 0.30,
            min_divergence: 0.005,
            profit_target: 0.05,
            stop_loss: 0.03,
            participation_fraction: 0.10,
            max_position_usd: 2.0,
            min_position_usd: 1.0,
            fee_rate: 0.10,
            min_profit_ratio: 0.01,
            momentum_normalization: 0.5,
            divergence_normalization: 0.05,
            max_latency_budget: Duration::from_secs(15),
        }
    }
}

// ---------------------------------------------------------------------------
// Scanner
// ---------------------------------------------------------------------------

pub struct OpportunityScanner {
    config: ScannerConfig,
}

impl OpportunityScanner {
    pub fn new(config: ScannerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    /// Urgency of a candidate discovered `elapsed` into the scan: 1 at
    /// zero latency, decaying linearly to 0 once the budget is spent.
    /// Always in [0, 1].
    pub fn speed_score(&self, elapsed: Duration) -> f64 {
        let budget = self.config.max_latency_budget.as_secs_f64();
        if budget <= 0.0 {
            return 0.0;
        }
        (1.0 - elapsed.as_secs_f64() / budget).clamp(0.0, 1.0)
    }

    /// Build a candidate from a momentum trigger, or nothing if the signal
    /// is below threshold or cannot clear its fees.
    pub fn momentum_opportunity(
        &self,
        signal: &Signal,
        available_balance: f64,
        elapsed: Duration,
    ) -> Option<Opportunity> {
        let momentum = signal.percent_change_24h;
        if momentum.abs() < self.config.min_momentum {
            debug!(
                asset = %signal.asset,
                momentum,
                threshold = self.config.min_momentum,
                "Momentum below threshold"
            );
            return None;
        }

        let confidence = (momentum.abs() / self.config.momentum_normalization).clamp(0.0, 1.0);
        self.build(
            signal,
            signal.momentum_side(),
            confidence,
            available_balance,
            elapsed,
        )
    }

    /// Build a candidate from a divergence trigger, or nothing if the gap
    /// is below threshold or cannot clear its fees.
    pub fn divergence_opportunity(
        &self,
        signal: &Signal,
        available_balance: f64,
        elapsed: Duration,
    ) -> Option<Opportunity> {
        let divergence = signal.divergence();
        if divergence < self.config.min_divergence {
            debug!(
                asset = %signal.asset,
                divergence,
                threshold = self.config.min_divergence,
                "Divergence below threshold"
            );
            return None;
        }

        let confidence = (divergence / self.config.divergence_normalization).clamp(0.0, 1.0);
        self.build(
            signal,
            signal.divergence_side(),
            confidence,
            available_balance,
            elapsed,
        )
    }

    /// Sort candidates by the execution contract: speed score descending,
    /// ties broken by confidence descending.
    pub fn rank(&self, mut opportunities: Vec<Opportunity>) -> Vec<Opportunity> {
        opportunities.sort_by(|a, b| a.ranking(b));
        opportunities
    }

    // -- Construction ----------------------------------------------------

    fn build(
        &self,
        signal: &Signal,
        side: Side,
        confidence: f64,
        available_balance: f64,
        elapsed: Duration,
    ) -> Option<Opportunity> {
        let entry_price = signal.internal_price;

        // Shift entry toward the expected move, clamped away from the
        // near-certain edges.
        let (target_price, stop_loss_price) = match side {
            Side::Yes => (
                clamp_price(entry_price + self.config.profit_target),
                clamp_price(entry_price - self.config.stop_loss),
            ),
            Side::No => (
                clamp_price(entry_price - self.config.profit_target),
                clamp_price(entry_price + self.config.stop_loss),
            ),
        };

        let amount = f64::min(
            self.config.max_position_usd,
            available_balance * self.config.participation_fraction,
        );
        if amount < self.config.min_position_usd {
            debug!(
                asset = %signal.asset,
                amount,
                min = self.config.min_position_usd,
                "Position below minimum size"
            );
            return None;
        }

        // Price the round trip on the share class actually held: a NO
        // position is bought and exited at the complement probabilities.
        let (cost_entry, cost_exit) = match side {
            Side::Yes => (entry_price, target_price),
            Side::No => (1.0 - entry_price, 1.0 - target_price),
        };

        let costs = match TradeCosts::compute(cost_entry, cost_exit, amount, self.config.fee_rate)
        {
            Ok(costs) => costs,
            Err(e) => {
                debug!(asset = %signal.asset, error = %e, "Candidate rejected at pricing");
                return None;
            }
        };

        if costs.net_profit <= 0.0
            || !costs.is_profitable(amount, self.config.min_profit_ratio)
        {
            debug!(
                asset = %signal.asset,
                net = costs.net_profit,
                "Not profitable after fees"
            );
            return None;
        }

        let opportunity = Opportunity {
            market_id: signal.market_id.clone(),
            market_name: signal.market_question.clone(),
            side,
            entry_price,
            target_price,
            stop_loss_price,
            amount,
            gross_profit: costs.gross_profit,
            fees: costs.fees(),
            net_profit: costs.net_profit,
            confidence,
            speed_score: self.speed_score(elapsed),
            time_horizon: signal.time_horizon,
        };

        debug!(opportunity = %opportunity, "Opportunity built");
        Some(opportunity)
    }
}

fn clamp_price(price: f64) -> f64 {
    price.clamp(PRICE_CLAMP_MIN, PRICE_CLAMP_MAX)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
