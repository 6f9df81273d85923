//! In-memory collaborators for integration testing.
//!
//! Deterministic `TradingBackend` and `PriceFeed` implementations with
//! fully controllable state: balance, market list, per-market trade
//! rejections, forced transport errors, and a record of every submitted
//! trade.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use velo::backend::{MarketFilter, MarketListing, Position, TradeReceipt, TradingBackend};
use velo::feeds::{PriceFeed, Ticker};
use velo::types::{Side, VeloError};

// ---------------------------------------------------------------------------
// Mock backend
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct RecordedTrade {
    pub market_id: String,
    pub side: Side,
    pub amount: f64,
    pub note: String,
}

pub struct MockBackend {
    balance: Arc<Mutex<f64>>,
    markets: Arc<Mutex<Vec<MarketListing>>>,
    trades: Arc<Mutex<Vec<RecordedTrade>>>,
    /// Market ids whose trades the backend rejects (business-level error).
    rejecting: Arc<Mutex<HashSet<String>>>,
    /// If set, all operations fail at the transport level.
    force_error: Arc<Mutex<Option<String>>>,
    /// If set, only the market listing fails.
    fail_markets: Arc<Mutex<bool>>,
}

impl MockBackend {
    pub fn new(balance: f64, markets: Vec<MarketListing>) -> Self {
        Self {
            balance: Arc::new(Mutex::new(balance)),
            markets: Arc::new(Mutex::new(markets)),
            trades: Arc::new(Mutex::new(Vec::new())),
            rejecting: Arc::new(Mutex::new(HashSet::new())),
            force_error: Arc::new(Mutex::new(None)),
            fail_markets: Arc::new(Mutex::new(false)),
        }
    }

    pub fn set_balance(&self, balance: f64) {
        *self.balance.lock().unwrap() = balance;
    }

    /// Make the backend reject trades on one market.
    pub fn reject_market(&self, market_id: &str) {
        self.rejecting.lock().unwrap().insert(market_id.to_string());
    }

    /// Force all subsequent operations to fail at the transport level.
    pub fn set_error(&self, msg: &str) {
        *self.force_error.lock().unwrap() = Some(msg.to_string());
    }

    pub fn clear_error(&self) {
        *self.force_error.lock().unwrap() = None;
    }

    /// Make only the market listing fail; balance and trading stay up.
    pub fn fail_markets(&self) {
        *self.fail_markets.lock().unwrap() = true;
    }

    /// Every trade submitted so far, in submission order.
    pub fn trades(&self) -> Vec<RecordedTrade> {
        self.trades.lock().unwrap().clone()
    }

    fn check_error(&self) -> Result<()> {
        match &*self.force_error.lock().unwrap() {
            Some(msg) => Err(anyhow!("forced error: {msg}")),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl TradingBackend for MockBackend {
    async fn get_balance(&self) -> Result<f64> {
        self.check_error()?;
        Ok(*self.balance.lock().unwrap())
    }

    async fn get_markets(&self, _filter: &MarketFilter) -> Result<Vec<MarketListing>> {
        self.check_error()?;
        if *self.fail_markets.lock().unwrap() {
            return Err(anyhow!("market listing unavailable"));
        }
        Ok(self.markets.lock().unwrap().clone())
    }

    async fn place_trade(
        &self,
        market_id: &str,
        side: Side,
        amount: f64,
        note: &str,
    ) -> Result<TradeReceipt> {
        self.check_error()?;

        if self.rejecting.lock().unwrap().contains(market_id) {
            return Err(VeloError::Execution {
                market_id: market_id.to_string(),
                message: "rejected by backend".to_string(),
            }
            .into());
        }

        self.trades.lock().unwrap().push(RecordedTrade {
            market_id: market_id.to_string(),
            side,
            amount,
            note: note.to_string(),
        });
        *self.balance.lock().unwrap() -= amount;

        Ok(TradeReceipt {
            trade_id: format!("mock-{}", self.trades.lock().unwrap().len()),
            market_id: market_id.to_string(),
            side,
            amount,
            shares_bought: amount / 0.5,
            timestamp: Utc::now(),
        })
    }

    async fn get_positions(&self) -> Result<Vec<Position>> {
        self.check_error()?;
        Ok(Vec::new())
    }

    fn name(&self) -> &str {
        "mock"
    }
}

// ---------------------------------------------------------------------------
// Mock feed
// ---------------------------------------------------------------------------

pub struct MockFeed {
    tickers: HashMap<String, Ticker>,
    failing: HashSet<String>,
}

impl MockFeed {
    pub fn new() -> Self {
        Self {
            tickers: HashMap::new(),
            failing: HashSet::new(),
        }
    }

    pub fn with_ticker(mut self, asset: &str, last_price: f64, percent_change_24h: f64) -> Self {
        self.tickers.insert(
            asset.to_string(),
            Ticker {
                last_price,
                percent_change_24h,
            },
        );
        self
    }

    /// Make one asset's ticker fetch fail.
    pub fn with_failure(mut self, asset: &str) -> Self {
        self.failing.insert(asset.to_string());
        self
    }
}

#[async_trait]
impl PriceFeed for MockFeed {
    async fn ticker(&self, asset: &str) -> Result<Ticker> {
        if self.failing.contains(asset) {
            return Err(anyhow!("ticker unavailable for {asset}"));
        }
        self.tickers
            .get(asset)
            .copied()
            .ok_or_else(|| anyhow!("unknown asset {asset}"))
    }

    fn name(&self) -> &str {
        "mock-feed"
    }
}

/// A fast market listing for an asset, matching the adapter's text rules.
pub fn fast_market(id: &str, asset: &str, probability: f64) -> MarketListing {
    MarketListing {
        id: id.to_string(),
        question: format!("Will {asset} rise in the next 5 minutes?"),
        current_probability: probability,
    }
}
