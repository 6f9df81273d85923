//! Signal normalization.
//!
//! Pairs each tracked asset's external spot ticker with a matching fast
//! market on the backend and emits at most one `Signal` per asset per
//! tick. A failed ticker fetch skips that asset only; a failed market
//! listing degrades the whole tick to zero signals. Either way the scan
//! cycle keeps running on partial data.

use chrono::Utc;
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::backend::{MarketFilter, MarketListing, TradingBackend};
use crate::feeds::PriceFeed;
use crate::types::{Signal, TimeHorizon};

// ---------------------------------------------------------------------------
// Market text matching
// ---------------------------------------------------------------------------

/// Keywords that identify an asset in a market question.
fn asset_keywords(asset: &str) -> Vec<String> {
    let sym = asset.trim().to_lowercase();
    let mut keywords = vec![sym.clone()];
    match sym.as_str() {
        "btc" => keywords.push("bitcoin".to_string()),
        "eth" => keywords.push("ethereum".to_string()),
        "sol" => keywords.push("solana".to_string()),
        "doge" => keywords.push("dogecoin".to_string()),
        "xrp" => keywords.push("ripple".to_string()),
        _ => {}
    }
    keywords
}

/// Whether a market question mentions the asset.
pub fn matches_asset(question: &str, asset: &str) -> bool {
    let q = question.to_lowercase();
    asset_keywords(asset).iter().any(|kw| q.contains(kw))
}

/// Settlement window named in the question, if any. Only 5/15-minute
/// markets qualify as fast markets.
pub fn horizon_of(question: &str) -> Option<TimeHorizon> {
    let q = question.to_lowercase();
    if q.contains("5 minute") || q.contains("5-minute") {
        Some(TimeHorizon::Short)
    } else if q.contains("15 minute") || q.contains("15-minute") {
        Some(TimeHorizon::Medium)
    } else {
        None
    }
}

/// First fast market matching the asset, with its horizon.
pub fn find_fast_market<'a>(
    markets: &'a [MarketListing],
    asset: &str,
) -> Option<(&'a MarketListing, TimeHorizon)> {
    markets.iter().find_map(|m| {
        if !matches_asset(&m.question, asset) {
            return None;
        }
        horizon_of(&m.question).map(|h| (m, h))
    })
}

// ---------------------------------------------------------------------------
// Adapter
// ---------------------------------------------------------------------------

/// Normalizes heterogeneous external data into `Signal` records.
pub struct SignalAdapter {
    feed: Arc<dyn PriceFeed>,
    backend: Arc<dyn TradingBackend>,
    assets: Vec<String>,
}

impl SignalAdapter {
    pub fn new(
        feed: Arc<dyn PriceFeed>,
        backend: Arc<dyn TradingBackend>,
        assets: Vec<String>,
    ) -> Self {
        Self {
            feed,
            backend,
            assets,
        }
    }

    pub fn assets(&self) -> &[String] {
        &self.assets
    }

    /// Produce this tick's signals: zero or one per tracked asset.
    pub async fn collect_signals(&self) -> Vec<Signal> {
        let markets = match self.backend.get_markets(&MarketFilter::default()).await {
            Ok(markets) => markets,
            Err(e) => {
                warn!(error = %e, "Market listing failed — no signals this tick");
                return Vec::new();
            }
        };

        // All tickers concurrently; each failure degrades to a skip.
        let tickers = join_all(self.assets.iter().map(|a| self.feed.ticker(a))).await;

        let mut signals = Vec::new();
        for (asset, ticker) in self.assets.iter().zip(tickers) {
            let ticker = match ticker {
                Ok(t) => t,
                Err(e) => {
                    warn!(asset = %asset, error = %e, "Ticker fetch failed — skipping asset");
                    continue;
                }
            };

            let Some((market, horizon)) = find_fast_market(&markets, asset) else {
                debug!(asset = %asset, "No matching fast market");
                continue;
            };

            // Degenerate implied probabilities would divide the divergence
            // metric by zero or produce meaningless direction.
            if market.current_probability <= 0.0 || market.current_probability >= 1.0 {
                debug!(
                    asset = %asset,
                    probability = market.current_probability,
                    "Market at degenerate probability — skipping"
                );
                continue;
            }

            let signal = Signal {
                asset: asset.clone(),
                reference_price: ticker.last_price,
                percent_change_24h: ticker.percent_change_24h,
                internal_price: market.current_probability,
                market_id: market.id.clone(),
                market_question: market.question.clone(),
                time_horizon: horizon,
                observed_at: Utc::now(),
            };
            debug!(signal = %signal, "Signal collected");
            signals.push(signal);
        }

        signals
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
