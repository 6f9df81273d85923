//! Shared types for the VELO bot.
//!
//! These types form the data model used across all modules.
//! They are designed to be stable so that feed, backend, strategy,
//! and engine modules can depend on them without circular references.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Trade direction on a binary market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Yes,
    No,
}

impl Side {
    /// The opposite side.
    pub fn opposite(&self) -> Self {
        match self {
            Side::Yes => Side::No,
            Side::No => Side::Yes,
        }
    }

    /// Wire representation used by the trading backend ("yes" / "no").
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Yes => "yes",
            Side::No => "no",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Yes => write!(f, "YES"),
            Side::No => write!(f, "NO"),
        }
    }
}

/// Settlement window of a fast market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeHorizon {
    /// 5-minute markets.
    Short,
    /// 15-minute markets.
    Medium,
}

impl fmt::Display for TimeHorizon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeHorizon::Short => write!(f, "5min"),
            TimeHorizon::Medium => write!(f, "15min"),
        }
    }
}

// ---------------------------------------------------------------------------
// Signal
// ---------------------------------------------------------------------------

/// A normalized observation pairing an external reference price with the
/// implied probability of a matching fast market. Immutable once produced;
/// at most one per asset per scan tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    /// Asset symbol, e.g. "BTC".
    pub asset: String,
    /// Last trade price on the external spot exchange (absolute currency).
    pub reference_price: f64,
    /// Trailing 24h price change in percent, signed.
    pub percent_change_24h: f64,
    /// Implied probability (0..1) of the matched prediction market.
    pub internal_price: f64,
    /// Backend id of the matched market.
    pub market_id: String,
    /// Question text of the matched market.
    pub market_question: String,
    pub time_horizon: TimeHorizon,
    pub observed_at: DateTime<Utc>,
}

impl Signal {
    /// Normalized absolute gap between the reference price and the market's
    /// implied probability: `|reference - internal| / internal`.
    ///
    /// The two inputs live on different scales (absolute currency vs
    /// probability), so this is a magnitude-of-change proxy used as a
    /// leading indicator — NOT a price-parity or arbitrage statement.
    pub fn divergence(&self) -> f64 {
        (self.reference_price - self.internal_price).abs() / self.internal_price
    }

    /// Direction implied by the divergence: reference above the implied
    /// probability biases YES, below biases NO.
    pub fn divergence_side(&self) -> Side {
        if self.reference_price > self.internal_price {
            Side::Yes
        } else {
            Side::No
        }
    }

    /// Direction implied by the trailing momentum.
    pub fn momentum_side(&self) -> Side {
        if self.percent_change_24h > 0.0 {
            Side::Yes
        } else {
            Side::No
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ref=${:.2} ({:+.2}%) | mkt {:.0}¢ [{}]",
            self.asset,
            self.reference_price,
            self.percent_change_24h,
            self.internal_price * 100.0,
            self.time_horizon,
        )
    }
}

// ---------------------------------------------------------------------------
// Opportunity
// ---------------------------------------------------------------------------

/// A fee-checked candidate trade. Built only by the scanner, consumed and
/// discarded within the same cycle. `net_profit = gross_profit - fees`
/// holds by construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Opportunity {
    pub market_id: String,
    pub market_name: String,
    pub side: Side,
    /// Entry price (implied probability, 0..1).
    pub entry_price: f64,
    /// Exit price the profit model assumes, clamped to [0.05, 0.95].
    pub target_price: f64,
    pub stop_loss_price: f64,
    /// Requested notional in USD.
    pub amount: f64,
    pub gross_profit: f64,
    pub fees: f64,
    pub net_profit: f64,
    /// Normalized magnitude of the triggering signal, 0..1.
    pub confidence: f64,
    /// Urgency, 0..1 — decays with elapsed scan latency.
    pub speed_score: f64,
    pub time_horizon: TimeHorizon,
}

impl Opportunity {
    /// Ranking contract: most time-sensitive first, ties broken by
    /// confidence. Execution order always follows this comparison.
    pub fn ranking(&self, other: &Self) -> Ordering {
        other
            .speed_score
            .partial_cmp(&self.speed_score)
            .unwrap_or(Ordering::Equal)
            .then(
                other
                    .confidence
                    .partial_cmp(&self.confidence)
                    .unwrap_or(Ordering::Equal),
            )
    }

    /// Human-readable note attached to the placed trade.
    pub fn note(&self, strategy: &str) -> String {
        format!(
            "{strategy}: {} | entry {:.2} -> target {:.2} | net ${:.2}",
            self.side, self.entry_price, self.target_price, self.net_profit,
        )
    }
}

impl fmt::Display for Opportunity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} ${:.2} @ {:.0}¢→{:.0}¢ | net=${:.2} conf={:.0}% speed={:.0}%",
            self.side,
            self.market_id,
            self.amount,
            self.entry_price * 100.0,
            self.target_price * 100.0,
            self.net_profit,
            self.confidence * 100.0,
            self.speed_score * 100.0,
        )
    }
}

// ---------------------------------------------------------------------------
// Risk limits
// ---------------------------------------------------------------------------

/// Position and cycle limits. Read-only at run time, loaded from config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskLimits {
    pub max_position_usd: f64,
    pub min_position_usd: f64,
    pub max_trades_per_cycle: usize,
    pub min_confidence: f64,
    /// Deployment spending envelope. Carried for reporting; the per-cycle
    /// trade cap is the only portfolio constraint the gate enforces.
    pub daily_budget: f64,
}

impl Default for RiskLimits {
    fn default() -> Self {
        Self {
            max_position_usd: 2.0,
            min_position_usd: 1.0,
            max_trades_per_cycle: 3,
            min_confidence: 0.5,
            daily_budget: 10.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Bot run statistics
// ---------------------------------------------------------------------------

/// Per-bot counters. Owned by the runner, mutated only by the executor
/// after each attempt; reset only at process restart.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BotStats {
    pub trades_executed: u64,
    pub trades_failed: u64,
    pub last_run_at: Option<DateTime<Utc>>,
}

impl BotStats {
    pub fn record_success(&mut self) {
        self.trades_executed += 1;
        self.last_run_at = Some(Utc::now());
    }

    pub fn record_failure(&mut self) {
        self.trades_failed += 1;
        self.last_run_at = Some(Utc::now());
    }

    pub fn attempts(&self) -> u64 {
        self.trades_executed + self.trades_failed
    }
}

impl fmt::Display for BotStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "executed={} failed={} last_run={}",
            self.trades_executed,
            self.trades_failed,
            self.last_run_at
                .map(|t| t.to_rfc3339())
                .unwrap_or_else(|| "never".to_string()),
        )
    }
}

// ---------------------------------------------------------------------------
// Cycle report
// ---------------------------------------------------------------------------

/// Outcome classification of one scan→gate→execute cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CycleStatus {
    /// Ran to completion (possibly with zero accepted trades).
    Completed,
    /// Backend reported no available balance; nothing was attempted.
    NoBalance,
    /// Scan produced no candidates above threshold.
    NoOpportunities,
}

impl fmt::Display for CycleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CycleStatus::Completed => write!(f, "completed"),
            CycleStatus::NoBalance => write!(f, "no_balance"),
            CycleStatus::NoOpportunities => write!(f, "no_opportunities"),
        }
    }
}

/// Summary of a single cycle, reported through the notification sink.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleReport {
    pub cycle: u64,
    pub strategy: String,
    pub status: CycleStatus,
    pub signals: usize,
    pub opportunities: usize,
    pub trades_executed: usize,
    pub trades_failed: usize,
    pub balance_after: f64,
    pub elapsed_ms: u64,
    pub timestamp: DateTime<Utc>,
}

impl fmt::Display for CycleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Cycle #{} [{}]: {} | signals={} opps={} trades={} failed={} balance=${:.2} ({}ms)",
            self.cycle,
            self.strategy,
            self.status,
            self.signals,
            self.opportunities,
            self.trades_executed,
            self.trades_failed,
            self.balance_after,
            self.elapsed_ms,
        )
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain-specific error types for VELO.
#[derive(Debug, thiserror::Error)]
pub enum VeloError {
    /// Bad price/amount bounds — rejected at construction.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Feed or backend timeout / network fault. Affected asset or market
    /// is skipped for the tick; the cycle continues.
    #[error("Feed error ({source_name}): {message}")]
    Feed { source_name: String, message: String },

    /// Trading backend request failed outright.
    #[error("Backend error: {0}")]
    Backend(String),

    /// Backend accepted the request but rejected the trade.
    #[error("Execution failed for {market_id}: {message}")]
    Execution { market_id: String, message: String },

    #[error("Insufficient balance: need ${needed:.2}, have ${available:.2}")]
    InsufficientBalance { needed: f64, available: f64 },

    /// Missing credentials or inconsistent limits — fatal at startup.
    #[error("Configuration error: {0}")]
    Config(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
