//! Trade executor.
//!
//! Delegates accepted opportunities to the trading backend, interprets
//! the result, and updates the owning bot's counters. A failed trade is
//! counted, reported, and left alone — it is never re-attempted until a
//! later scan produces a fresh, re-validated candidate.

use std::sync::Arc;
use tracing::{error, info};

use crate::backend::TradingBackend;
use crate::notify::{Notifier, NotifyEvent};
use crate::types::{BotStats, Opportunity};

pub struct TradeExecutor {
    backend: Arc<dyn TradingBackend>,
    notifier: Arc<Notifier>,
    /// Log the would-be trade instead of submitting it.
    dry_run: bool,
}

impl TradeExecutor {
    pub fn new(backend: Arc<dyn TradingBackend>, notifier: Arc<Notifier>, dry_run: bool) -> Self {
        Self {
            backend,
            notifier,
            dry_run,
        }
    }

    /// Submit one accepted opportunity. Returns whether it executed.
    ///
    /// Stats are mutated through the caller's reference; the executor
    /// holds no counters of its own.
    pub async fn execute(
        &self,
        bot: &str,
        opportunity: &Opportunity,
        stats: &mut BotStats,
    ) -> bool {
        if self.dry_run {
            info!(
                bot,
                opportunity = %opportunity,
                "[DRY RUN] Would place trade"
            );
            stats.record_success();
            return true;
        }

        let note = opportunity.note(bot);
        let result = self
            .backend
            .place_trade(
                &opportunity.market_id,
                opportunity.side,
                opportunity.amount,
                &note,
            )
            .await;

        match result {
            Ok(receipt) => {
                stats.record_success();
                info!(bot, receipt = %receipt, "Trade executed");
                self.notifier
                    .notify(NotifyEvent::TradeSuccess {
                        bot: bot.to_string(),
                        opportunity: opportunity.clone(),
                    })
                    .await;
                true
            }
            Err(e) => {
                stats.record_failure();
                error!(
                    bot,
                    market_id = %opportunity.market_id,
                    error = %e,
                    "Trade failed"
                );
                self.notifier
                    .notify(NotifyEvent::TradeFailure {
                        bot: bot.to_string(),
                        opportunity: opportunity.clone(),
                        reason: e.to_string(),
                    })
                    .await;
                false
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{MarketFilter, MarketListing, Position, TradeReceipt};
    use crate::types::{Side, TimeHorizon};
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::Mutex;

    /// Backend that records trade submissions and answers with a fixed
    /// outcome.
    struct ScriptedBackend {
        succeed: bool,
        calls: Mutex<Vec<(String, Side, f64)>>,
    }

    impl ScriptedBackend {
        fn new(succeed: bool) -> Self {
            Self {
                succeed,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<(String, Side, f64)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TradingBackend for ScriptedBackend {
        async fn get_balance(&self) -> Result<f64> {
            Ok(10.0)
        }

        async fn get_markets(&self, _filter: &MarketFilter) -> Result<Vec<MarketListing>> {
            Ok(Vec::new())
        }

        async fn place_trade(
            &self,
            market_id: &str,
            side: Side,
            amount: f64,
            _note: &str,
        ) -> Result<TradeReceipt> {
            self.calls
                .lock()
                .unwrap()
                .push((market_id.to_string(), side, amount));
            if self.succeed {
                Ok(TradeReceipt {
                    trade_id: "t-1".to_string(),
                    market_id: market_id.to_string(),
                    side,
                    amount,
                    shares_bought: amount / 0.5,
                    timestamp: Utc::now(),
                })
            } else {
                Err(anyhow!("backend says no"))
            }
        }

        async fn get_positions(&self) -> Result<Vec<Position>> {
            Ok(Vec::new())
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    fn opportunity() -> Opportunity {
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
    async fn test_success_updates_stats_and_submits() {
        let backend = Arc::new(ScriptedBackend::new(true));
        let executor = TradeExecutor::new(backend.clone(), Arc::new(Notifier::disabled()), false);
        let mut stats = BotStats::default();

        let ok = executor.execute("velocity", &opportunity(), &mut stats).await;

        assert!(ok);
        assert_eq!(stats.trades_executed, 1);
        assert_eq!(stats.trades_failed, 0);
        assert!(stats.last_run_at.is_some());

        let calls = backend.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "mkt-1");
        assert_eq!(calls[0].1, Side::Yes);
        assert!((calls[0].2 - 2.0).abs() < 1e-10);
    }

    #[tokio::test]
    async fn test_failure_counts_and_reports_false() {
        let backend = Arc::new(ScriptedBackend::new(false));
        let executor = TradeExecutor::new(backend.clone(), Arc::new(Notifier::disabled()), false);
        let mut stats = BotStats::default();

        let ok = executor.execute("velocity", &opportunity(), &mut stats).await;

        assert!(!ok);
        assert_eq!(stats.trades_executed, 0);
        assert_eq!(stats.trades_failed, 1);
        // Exactly one submission — no retry within the cycle.
        assert_eq!(backend.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_dry_run_skips_backend() {
        let backend = Arc::new(ScriptedBackend::new(true));
        let executor = TradeExecutor::new(backend.clone(), Arc::new(Notifier::disabled()), true);
        let mut stats = BotStats::default();

        let ok = executor.execute("velocity", &opportunity(), &mut stats).await;

        assert!(ok);
        assert_eq!(stats.trades_executed, 1);
        assert!(backend.calls().is_empty());
    }
}
