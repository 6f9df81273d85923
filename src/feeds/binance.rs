//! Binance spot ticker feed.
//!
//! Uses the public 24hr ticker endpoint (no auth required):
//! `GET /api/v3/ticker/24hr?symbol=BTCUSDT`
//!
//! Numeric fields arrive as JSON strings and are parsed here. The client
//! carries a short timeout so a slow exchange never stalls a scan tick.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::{PriceFeed, Ticker};
use crate::types::VeloError;

const BINANCE_API_URL: &str = "https://api.binance.com";
const REQUEST_TIMEOUT_SECS: u64 = 3;

// ---------------------------------------------------------------------------
// API response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Ticker24h {
    last_price: String,
    price_change_percent: String,
}

impl Ticker24h {
    fn parse(&self) -> Result<Ticker> {
        let last_price = self
            .last_price
            .parse::<f64>()
            .context("Unparseable lastPrice in ticker response")?;
        let percent_change_24h = self
            .price_change_percent
            .parse::<f64>()
            .context("Unparseable priceChangePercent in ticker response")?;
        Ok(Ticker {
            last_price,
            percent_change_24h,
        })
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct BinanceFeed {
    http: Client,
    base_url: String,
}

impl BinanceFeed {
    pub fn new() -> Result<Self> {
        Self::with_base_url(BINANCE_API_URL)
    }

    /// Construct against a non-default base URL (used by tests).
    pub fn with_base_url(base_url: &str) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent("velo/0.1.0")
            .build()
            .context("Failed to build Binance HTTP client")?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Map an asset symbol to its USDT spot pair ("BTC" -> "BTCUSDT").
    pub fn spot_symbol(asset: &str) -> String {
        format!("{}USDT", asset.trim().to_uppercase())
    }
}

#[async_trait]
impl PriceFeed for BinanceFeed {
    async fn ticker(&self, asset: &str) -> Result<Ticker> {
        let symbol = Self::spot_symbol(asset);
        let url = format!("{}/api/v3/ticker/24hr", self.base_url);

        let resp = self
            .http
            .get(&url)
            .query(&[("symbol", symbol.as_str())])
            .send()
            .await
            .with_context(|| format!("Binance ticker request failed for {symbol}"))?;

        if !resp.status().is_success() {
            let status = resp.status();
            return Err(VeloError::Feed {
                source_name: "binance".to_string(),
                message: format!("{symbol}: {status}"),
            }
            .into());
        }

        let raw: Ticker24h = resp
            .json()
            .await
            .with_context(|| format!("Failed to parse ticker response for {symbol}"))?;

        let ticker = raw.parse()?;
        debug!(
            asset,
            last_price = ticker.last_price,
            change_24h = ticker.percent_change_24h,
            "Ticker fetched"
        );
        Ok(ticker)
    }

    fn name(&self) -> &str {
        "binance"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
