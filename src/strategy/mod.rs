//! Trading strategies.
//!
//! The signal-to-decision pipeline: fee modeling, signal normalization,
//! opportunity construction, and risk gating, composed into strategy
//! variants behind the `TradingStrategy` trait. The engine drives any
//! variant through the same two operations: find candidates, then
//! evaluate each one against the guardrails.

pub mod fees;
pub mod risk;
pub mod scanner;
pub mod signal;

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use crate::backend::TradingBackend;
use crate::feeds::PriceFeed;
use crate::types::Opportunity;

use risk::RiskGate;
use scanner::{OpportunityScanner, ScannerConfig};
use signal::SignalAdapter;

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Result of one scan pass.
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    /// Signals collected this tick (before thresholds).
    pub signals: usize,
    /// Ranked candidates: speed score descending, confidence breaking ties.
    pub opportunities: Vec<Opportunity>,
}

/// A strategy variant. Implementations share the scan/evaluate shape and
/// differ only in how a signal becomes a candidate.
#[async_trait]
pub trait TradingStrategy: Send + Sync {
    /// Strategy name, used as the bot tag in logs, notes, and notifications.
    fn name(&self) -> &str;

    /// Scan the feeds and produce this cycle's ranked candidates.
    async fn find_opportunities(&self, available_balance: f64) -> Result<ScanOutcome>;

    /// Whether a candidate passes the risk guardrails right now, given a
    /// freshly read balance and the number already accepted this cycle.
    fn evaluate_opportunity(
        &self,
        opportunity: &Opportunity,
        available_balance: f64,
        accepted_this_cycle: usize,
    ) -> bool;
}

// ---------------------------------------------------------------------------
// Momentum variant
// ---------------------------------------------------------------------------

/// Fast-loop micro trader: rides the trailing 24h momentum of each asset
/// into its 5/15-minute markets.
pub struct MomentumStrategy {
    adapter: SignalAdapter,
    scanner: OpportunityScanner,
    gate: RiskGate,
}

impl MomentumStrategy {
    pub fn new(
        feed: Arc<dyn PriceFeed>,
        backend: Arc<dyn TradingBackend>,
        assets: Vec<String>,
        config: ScannerConfig,
        gate: RiskGate,
    ) -> Self {
        Self {
            adapter: SignalAdapter::new(feed, backend, assets),
            scanner: OpportunityScanner::new(config),
            gate,
        }
    }
}

#[async_trait]
impl TradingStrategy for MomentumStrategy {
    fn name(&self) -> &str {
        "fastloop:micro"
    }

    async fn find_opportunities(&self, available_balance: f64) -> Result<ScanOutcome> {
        let started = Instant::now();
        let signals = self.adapter.collect_signals().await;

        let candidates: Vec<Opportunity> = signals
            .iter()
            .filter_map(|s| {
                self.scanner
                    .momentum_opportunity(s, available_balance, started.elapsed())
            })
            .collect();

        info!(
            strategy = self.name(),
            signals = signals.len(),
            candidates = candidates.len(),
            "Scan complete"
        );

        Ok(ScanOutcome {
            signals: signals.len(),
            opportunities: self.scanner.rank(candidates),
        })
    }

    fn evaluate_opportunity(
        &self,
        opportunity: &Opportunity,
        available_balance: f64,
        accepted_this_cycle: usize,
    ) -> bool {
        self.gate
            .approve(opportunity, available_balance, accepted_this_cycle)
    }
}

// ---------------------------------------------------------------------------
// Velocity variant
// ---------------------------------------------------------------------------

/// Velocity trader: trades the divergence between the spot reference
/// price and the market's implied probability across several assets.
pub struct VelocityStrategy {
    adapter: SignalAdapter,
    scanner: OpportunityScanner,
    gate: RiskGate,
}

impl VelocityStrategy {
    pub fn new(
        feed: Arc<dyn PriceFeed>,
        backend: Arc<dyn TradingBackend>,
        assets: Vec<String>,
        config: ScannerConfig,
        gate: RiskGate,
    ) -> Self {
        Self {
            adapter: SignalAdapter::new(feed, backend, assets),
            scanner: OpportunityScanner::new(config),
            gate,
        }
    }
}

#[async_trait]
impl TradingStrategy for VelocityStrategy {
    fn name(&self) -> &str {
        "velocity"
    }

    async fn find_opportunities(&self, available_balance: f64) -> Result<ScanOutcome> {
        let started = Instant::now();
        let signals = self.adapter.collect_signals().await;

        let candidates: Vec<Opportunity> = signals
            .iter()
            .filter_map(|s| {
                self.scanner
                    .divergence_opportunity(s, available_balance, started.elapsed())
            })
            .collect();

        info!(
            strategy = self.name(),
            signals = signals.len(),
            candidates = candidates.len(),
            "Scan complete"
        );

        Ok(ScanOutcome {
            signals: signals.len(),
            opportunities: self.scanner.rank(candidates),
        })
    }

    fn evaluate_opportunity(
        &self,
        opportunity: &Opportunity,
        available_balance: f64,
        accepted_this_cycle: usize,
    ) -> bool {
        self.gate
            .approve(opportunity, available_balance, accepted_this_cycle)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
