//! Trading backend integration.
//!
//! Defines the `TradingBackend` trait the pipeline trades through and
//! provides the Simmer REST implementation. The backend owns all
//! persistence (balances, positions, order history); this crate only
//! reads and submits.

pub mod simmer;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::Side;

// ---------------------------------------------------------------------------
// Backend-facing types
// ---------------------------------------------------------------------------

/// A tradable market as listed by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketListing {
    pub id: String,
    pub question: String,
    /// Current implied YES probability (0.0–1.0).
    pub current_probability: f64,
}

impl fmt::Display for MarketListing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({:.0}¢) {}",
            self.id,
            self.current_probability * 100.0,
            self.question,
        )
    }
}

/// An open position reported by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub market_id: String,
    pub shares: f64,
    pub value: f64,
}

/// Receipt returned after a trade is accepted by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeReceipt {
    pub trade_id: String,
    pub market_id: String,
    pub side: Side,
    pub amount: f64,
    pub shares_bought: f64,
    pub timestamp: DateTime<Utc>,
}

impl fmt::Display for TradeReceipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} ${:.2} ({:.2} shares) [{}]",
            self.side, self.market_id, self.amount, self.shares_bought, self.trade_id,
        )
    }
}

/// Filter for market listing requests.
#[derive(Debug, Clone)]
pub struct MarketFilter {
    pub status: String,
    pub limit: u32,
}

impl Default for MarketFilter {
    fn default() -> Self {
        Self {
            status: "active".to_string(),
            limit: 100,
        }
    }
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Abstraction over the trading backend.
///
/// Balance reads must reflect the account at call time; callers re-read
/// immediately before gating and executing rather than caching a value
/// from the start of the cycle.
#[async_trait]
pub trait TradingBackend: Send + Sync {
    /// Available balance in USD: total minus open exposure.
    async fn get_balance(&self) -> Result<f64>;

    /// List markets matching the filter.
    async fn get_markets(&self, filter: &MarketFilter) -> Result<Vec<MarketListing>>;

    /// Submit a trade. A backend-side rejection surfaces as an error
    /// carrying the backend's reason.
    async fn place_trade(
        &self,
        market_id: &str,
        side: Side,
        amount: f64,
        note: &str,
    ) -> Result<TradeReceipt>;

    /// Current open positions.
    async fn get_positions(&self) -> Result<Vec<Position>>;

    /// Backend name for logging and identification.
    fn name(&self) -> &str;
}
