//! External price feeds.
//!
//! Defines the `PriceFeed` trait and provides the Binance spot ticker
//! implementation. Feeds are a soft dependency: a failed fetch degrades to
//! "no signal for this asset" at the adapter, it never aborts a scan.

pub mod binance;

use anyhow::Result;
use async_trait::async_trait;

/// Spot ticker snapshot for one asset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ticker {
    /// Last traded price in quote currency (USDT).
    pub last_price: f64,
    /// Trailing 24h change in percent, signed.
    pub percent_change_24h: f64,
}

/// Abstraction over external spot price sources.
#[async_trait]
pub trait PriceFeed: Send + Sync {
    /// Fetch the current ticker for an asset symbol (e.g. "BTC").
    ///
    /// Implementations enforce a short call-level timeout; a call that
    /// exceeds it returns an error rather than hanging the scan.
    async fn ticker(&self, asset: &str) -> Result<Ticker>;

    /// Feed name for logging and identification.
    fn name(&self) -> &str;
}
