//! Simmer trading backend.
//!
//! REST client for the Simmer API (Polymarket execution layer). Market
//! data, portfolio, and trade submission all go through the one authed
//! HTTP client. Available balance is the portfolio's USDC balance minus
//! its open exposure.
//!
//! API base: `https://api.simmer.markets`

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use super::{MarketFilter, MarketListing, Position, TradeReceipt, TradingBackend};
use crate::types::{Side, VeloError};

const SIMMER_API_URL: &str = "https://api.simmer.markets";
const REQUEST_TIMEOUT_SECS: u64 = 10;

// ---------------------------------------------------------------------------
// API response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct PortfolioResponse {
    #[serde(default)]
    balance_usdc: f64,
    #[serde(default)]
    total_exposure: f64,
}

#[derive(Debug, Deserialize)]
struct ApiMarket {
    #[serde(default)]
    id: String,
    #[serde(default)]
    question: String,
    #[serde(default = "default_probability")]
    current_probability: f64,
}

fn default_probability() -> f64 {
    0.5
}

#[derive(Debug, Deserialize)]
struct ApiPosition {
    #[serde(default)]
    market_id: String,
    #[serde(default)]
    shares: f64,
    #[serde(default)]
    value: f64,
}

#[derive(Debug, Deserialize)]
struct TradeResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    trade_id: Option<String>,
    #[serde(default)]
    shares_bought: Option<f64>,
    #[serde(default)]
    error: Option<String>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct SimmerClient {
    http: Client,
    base_url: String,
    api_key: SecretString,
}

impl SimmerClient {
    pub fn new(api_key: SecretString) -> Result<Self> {
        Self::with_base_url(api_key, SIMMER_API_URL)
    }

    /// Construct against a non-default base URL (used by tests).
    pub fn with_base_url(api_key: SecretString, base_url: &str) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent("velo/0.1.0")
            .build()
            .context("Failed to build Simmer HTTP client")?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    async fn get_portfolio(&self) -> Result<PortfolioResponse> {
        let url = format!("{}/api/portfolio", self.base_url);
        let resp = self
            .http
            .get(&url)
            .bearer_auth(self.api_key.expose_secret())
            .send()
            .await
            .context("Simmer portfolio request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            return Err(VeloError::Backend(format!("portfolio: {status}")).into());
        }

        resp.json()
            .await
            .context("Failed to parse Simmer portfolio response")
    }

    /// Available balance from a portfolio snapshot.
    fn available_balance(portfolio: &PortfolioResponse) -> f64 {
        portfolio.balance_usdc - portfolio.total_exposure
    }
}

#[async_trait]
impl TradingBackend for SimmerClient {
    async fn get_balance(&self) -> Result<f64> {
        let portfolio = self.get_portfolio().await?;
        let available = Self::available_balance(&portfolio);
        debug!(
            balance = portfolio.balance_usdc,
            exposure = portfolio.total_exposure,
            available,
            "Portfolio fetched"
        );
        Ok(available)
    }

    async fn get_markets(&self, filter: &MarketFilter) -> Result<Vec<MarketListing>> {
        let url = format!("{}/api/markets", self.base_url);
        let resp = self
            .http
            .get(&url)
            .bearer_auth(self.api_key.expose_secret())
            .query(&[
                ("status", filter.status.as_str()),
                ("limit", &filter.limit.to_string()),
            ])
            .send()
            .await
            .context("Simmer markets request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            return Err(VeloError::Backend(format!("markets: {status}")).into());
        }

        let raw: Vec<ApiMarket> = resp
            .json()
            .await
            .context("Failed to parse Simmer markets response")?;

        let markets: Vec<MarketListing> = raw
            .into_iter()
            .filter(|m| !m.id.is_empty() && !m.question.is_empty())
            .map(|m| MarketListing {
                id: m.id,
                question: m.question,
                current_probability: m.current_probability,
            })
            .collect();

        debug!(count = markets.len(), "Markets fetched");
        Ok(markets)
    }

    async fn place_trade(
        &self,
        market_id: &str,
        side: Side,
        amount: f64,
        note: &str,
    ) -> Result<TradeReceipt> {
        let url = format!("{}/api/trade", self.base_url);
        let body = json!({
            "market_id": market_id,
            "side": side.as_str(),
            "amount": amount,
            "order_type": "GTC",
            "reasoning": note,
        });

        let resp = self
            .http
            .post(&url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .context("Simmer trade request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            return Err(VeloError::Backend(format!("trade: {status}")).into());
        }

        let result: TradeResponse = resp
            .json()
            .await
            .context("Failed to parse Simmer trade response")?;

        if !result.success {
            return Err(VeloError::Execution {
                market_id: market_id.to_string(),
                message: result.error.unwrap_or_else(|| "unknown error".to_string()),
            }
            .into());
        }

        let receipt = TradeReceipt {
            trade_id: result
                .trade_id
                .unwrap_or_else(|| format!("simmer-{}", uuid::Uuid::new_v4())),
            market_id: market_id.to_string(),
            side,
            amount,
            shares_bought: result.shares_bought.unwrap_or(0.0),
            timestamp: Utc::now(),
        };

        info!(trade = %receipt, "Trade accepted");
        Ok(receipt)
    }

    async fn get_positions(&self) -> Result<Vec<Position>> {
        let url = format!("{}/api/positions", self.base_url);
        let resp = self
            .http
            .get(&url)
            .bearer_auth(self.api_key.expose_secret())
            .send()
            .await
            .context("Simmer positions request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            return Err(VeloError::Backend(format!("positions: {status}")).into());
        }

        let raw: Vec<ApiPosition> = resp
            .json()
            .await
            .context("Failed to parse Simmer positions response")?;

        Ok(raw
            .into_iter()
            .map(|p| Position {
                market_id: p.market_id,
                shares: p.shares,
                value: p.value,
            })
            .collect())
    }

    fn name(&self) -> &str {
        "simmer"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
