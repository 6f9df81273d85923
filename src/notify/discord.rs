//! Discord webhook delivery.
//!
//! Posts rich embeds to a channel webhook. Discord answers 204 No Content
//! on success. Webhooks need no bot invitation, which keeps the sink a
//! single POST.

use anyhow::{Context, Result};
use chrono::Utc;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;

use crate::types::{CycleReport, Opportunity};

const REQUEST_TIMEOUT_SECS: u64 = 10;

const COLOR_GREEN: u32 = 0x00ff00;
const COLOR_RED: u32 = 0xff0000;
const COLOR_BLUE: u32 = 0x3498db;
const COLOR_ORANGE: u32 = 0xe67e22;

pub struct DiscordWebhook {
    http: Client,
    url: String,
}

impl DiscordWebhook {
    pub fn new(url: String) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to build Discord HTTP client")?;
        Ok(Self { http, url })
    }

    /// POST a message with optional embeds. Success is Discord's 204.
    pub async fn send_message(&self, content: &str, embeds: Vec<Value>) -> Result<()> {
        let mut body = json!({ "content": content });
        if !embeds.is_empty() {
            body["embeds"] = Value::Array(embeds);
        }

        let resp = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .context("Discord webhook request failed")?;

        let status = resp.status();
        if status != reqwest::StatusCode::NO_CONTENT && !status.is_success() {
            anyhow::bail!("Discord webhook error: {status}");
        }

        debug!("Webhook delivered");
        Ok(())
    }

    pub async fn send_trade_notification(
        &self,
        bot: &str,
        opp: &Opportunity,
        success: bool,
        reason: Option<&str>,
    ) -> Result<()> {
        let embed = trade_embed(bot, opp, success, reason);
        self.send_message("", vec![embed]).await
    }

    pub async fn send_balance_alert(&self, bot: &str, available: f64) -> Result<()> {
        let embed = json!({
            "title": "💰 Balance Alert",
            "color": if available > 0.0 { COLOR_GREEN } else { COLOR_RED },
            "timestamp": Utc::now().to_rfc3339(),
            "fields": [
                { "name": "Bot", "value": bot, "inline": true },
                { "name": "Available", "value": format!("${available:.2}"), "inline": true },
            ],
        });
        self.send_message("", vec![embed]).await
    }

    pub async fn send_cycle_summary(&self, report: &CycleReport) -> Result<()> {
        let embed = json!({
            "title": format!("📊 {} — cycle #{}", report.strategy, report.cycle),
            "color": COLOR_BLUE,
            "timestamp": report.timestamp.to_rfc3339(),
            "fields": [
                { "name": "Status", "value": report.status.to_string(), "inline": true },
                { "name": "Signals", "value": report.signals.to_string(), "inline": true },
                { "name": "Opportunities", "value": report.opportunities.to_string(), "inline": true },
                { "name": "Executed", "value": report.trades_executed.to_string(), "inline": true },
                { "name": "Failed", "value": report.trades_failed.to_string(), "inline": true },
                { "name": "Balance", "value": format!("${:.2}", report.balance_after), "inline": true },
            ],
        });
        self.send_message("", vec![embed]).await
    }

    pub async fn send_error_alert(&self, bot: &str, message: &str) -> Result<()> {
        let embed = json!({
            "title": "⚠️ Error Backoff",
            "color": COLOR_ORANGE,
            "timestamp": Utc::now().to_rfc3339(),
            "fields": [
                { "name": "Bot", "value": bot, "inline": true },
                { "name": "Error", "value": truncate(message, 1000), "inline": false },
            ],
        });
        self.send_message("", vec![embed]).await
    }

    pub async fn send_startup_message(&self, bots: &[String]) -> Result<()> {
        let embed = json!({
            "title": "🚀 VELO Trading Bot",
            "description": "Trading system online",
            "color": COLOR_BLUE,
            "timestamp": Utc::now().to_rfc3339(),
            "fields": [
                { "name": "Status", "value": "🟢 Online", "inline": true },
                { "name": "Bots", "value": bots.join(", "), "inline": true },
            ],
        });
        self.send_message("", vec![embed]).await
    }
}

/// Build the embed for a trade outcome. Market names are truncated to keep
/// Discord's field limits comfortable.
fn trade_embed(bot: &str, opp: &Opportunity, success: bool, reason: Option<&str>) -> Value {
    let mut fields = vec![
        json!({ "name": "Market", "value": truncate(&opp.market_name, 100), "inline": false }),
        json!({ "name": "Side", "value": opp.side.to_string(), "inline": true }),
        json!({ "name": "Amount", "value": format!("${:.2}", opp.amount), "inline": true }),
        json!({
            "name": "Outcome",
            "value": if success { "✅ Executed" } else { "❌ Failed" },
            "inline": true,
        }),
        json!({ "name": "Net profit", "value": format!("${:.2}", opp.net_profit), "inline": true }),
    ];

    if let Some(reason) = reason {
        fields.push(json!({ "name": "Reason", "value": truncate(reason, 500), "inline": false }));
    }

    json!({
        "title": format!("🤖 {bot}"),
        "color": if success { COLOR_GREEN } else { COLOR_RED },
        "timestamp": Utc::now().to_rfc3339(),
        "fields": fields,
    })
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        s.chars().take(max).collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
