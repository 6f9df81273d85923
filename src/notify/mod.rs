//! Notification sink.
//!
//! One-way, fire-and-forget status events. Delivery failures are logged
//! and swallowed; a dead webhook never affects a trading decision.

pub mod discord;

use tracing::{debug, warn};

use crate::types::{CycleReport, Opportunity};
use discord::DiscordWebhook;

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Status events emitted by the engine.
#[derive(Debug, Clone)]
pub enum NotifyEvent {
    TradeSuccess {
        bot: String,
        opportunity: Opportunity,
    },
    TradeFailure {
        bot: String,
        opportunity: Opportunity,
        reason: String,
    },
    BalanceLow {
        bot: String,
        available: f64,
    },
    CycleSummary(CycleReport),
    ErrorBackoff {
        bot: String,
        message: String,
    },
}

// ---------------------------------------------------------------------------
// Notifier
// ---------------------------------------------------------------------------

/// Facade over the configured sink. Constructed without a webhook it
/// degrades to log-only, which keeps dry-run and test setups quiet.
pub struct Notifier {
    webhook: Option<DiscordWebhook>,
}

impl Notifier {
    pub fn new(webhook: Option<DiscordWebhook>) -> Self {
        Self { webhook }
    }

    /// Log-only notifier.
    pub fn disabled() -> Self {
        Self { webhook: None }
    }

    /// Deliver an event. Never returns an error and never panics.
    pub async fn notify(&self, event: NotifyEvent) {
        debug!(event = ?event, "Notification event");

        let Some(webhook) = &self.webhook else {
            return;
        };

        let result = match &event {
            NotifyEvent::TradeSuccess { bot, opportunity } => {
                webhook
                    .send_trade_notification(bot, opportunity, true, None)
                    .await
            }
            NotifyEvent::TradeFailure {
                bot,
                opportunity,
                reason,
            } => {
                webhook
                    .send_trade_notification(bot, opportunity, false, Some(reason.as_str()))
                    .await
            }
            NotifyEvent::BalanceLow { bot, available } => {
                webhook.send_balance_alert(bot, *available).await
            }
            NotifyEvent::CycleSummary(report) => webhook.send_cycle_summary(report).await,
            NotifyEvent::ErrorBackoff { bot, message } => {
                webhook.send_error_alert(bot, message).await
            }
        };

        if let Err(e) = result {
            warn!(error = %e, "Notification delivery failed — continuing");
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CycleStatus, Side, TimeHorizon};
    use chrono::Utc;

    fn sample_opportunity() -> Opportunity {
        Opportunity {
            market_id: "mkt-1".to_string(),
            market_name: "Bitcoin up in the next 5 minutes?".to_string(),
            side: Side::Yes,
            entry_price: 0.50,
            target_price: 0.60,
            stop_loss_price: 0.47,
            amount: 2.0,
            gross_profit: 0.40,
            fees: 0.088,
            net_profit: 0.312,
            confidence: 0.8,
            speed_score: 0.9,
            time_horizon: TimeHorizon::Short,
        }
    }

    #[tokio::test]
    async fn test_disabled_notifier_swallows_everything() {
        let notifier = Notifier::disabled();
        notifier
            .notify(NotifyEvent::TradeSuccess {
                bot: "velocity".to_string(),
                opportunity: sample_opportunity(),
            })
            .await;
        notifier
            .notify(NotifyEvent::BalanceLow {
                bot: "velocity".to_string(),
                available: 0.25,
            })
            .await;
        notifier
            .notify(NotifyEvent::CycleSummary(CycleReport {
                cycle: 1,
                strategy: "velocity".to_string(),
                status: CycleStatus::Completed,
                signals: 1,
                opportunities: 1,
                trades_executed: 1,
                trades_failed: 0,
                balance_after: 8.0,
                elapsed_ms: 40,
                timestamp: Utc::now(),
            }))
            .await;
        // No webhook configured: nothing to assert beyond "did not panic".
    }
}
