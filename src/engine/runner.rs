//! Scheduler — the scan → gate → execute → cool loop.
//!
//! One runner per strategy variant, each owning its own counters. The
//! loop is interval-paced: a slow cycle shrinks the rest period but
//! never inverts it. Any error escaping the cycle body trips a longer
//! backoff sleep instead of killing the loop; only the external shutdown
//! signal terminates it. Balance is re-read at every gating and
//! execution step, never cached from cycle start.

use anyhow::Result;
use chrono::Utc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::{error, info, warn};

use super::executor::TradeExecutor;
use crate::backend::TradingBackend;
use crate::notify::{Notifier, NotifyEvent};
use crate::strategy::TradingStrategy;
use crate::types::{BotStats, CycleReport, CycleStatus};

pub struct BotRunner {
    strategy: Box<dyn TradingStrategy>,
    backend: Arc<dyn TradingBackend>,
    executor: TradeExecutor,
    notifier: Arc<Notifier>,
    scan_interval: Duration,
    error_backoff: Duration,
    stats: BotStats,
    cycle: u64,
}

impl BotRunner {
    pub fn new(
        strategy: Box<dyn TradingStrategy>,
        backend: Arc<dyn TradingBackend>,
        executor: TradeExecutor,
        notifier: Arc<Notifier>,
        scan_interval: Duration,
        error_backoff: Duration,
    ) -> Self {
        Self {
            strategy,
            backend,
            executor,
            notifier,
            scan_interval,
            error_backoff,
            stats: BotStats::default(),
            cycle: 0,
        }
    }

    pub fn stats(&self) -> &BotStats {
        &self.stats
    }

    /// Rest period for an interval-paced loop: the fixed interval minus
    /// the time the cycle consumed, floored at zero.
    pub fn rest_period(interval: Duration, elapsed: Duration) -> Duration {
        interval.saturating_sub(elapsed)
    }

    /// Run until the shutdown signal fires. The signal is observed at
    /// every sleep, so the loop exits within one polling interval.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> BotStats {
        info!(
            bot = self.strategy.name(),
            interval_secs = self.scan_interval.as_secs(),
            "Entering scan loop"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            let started = Instant::now();
            match self.run_cycle().await {
                Ok(report) => {
                    info!(bot = self.strategy.name(), report = %report, "Cycle complete");
                    self.notifier.notify(NotifyEvent::CycleSummary(report)).await;

                    let rest = Self::rest_period(self.scan_interval, started.elapsed());
                    if sleep_or_shutdown(&mut shutdown, rest).await {
                        break;
                    }
                }
                Err(e) => {
                    error!(
                        bot = self.strategy.name(),
                        error = %e,
                        backoff_secs = self.error_backoff.as_secs(),
                        "Cycle failed — backing off"
                    );
                    self.notifier
                        .notify(NotifyEvent::ErrorBackoff {
                            bot: self.strategy.name().to_string(),
                            message: e.to_string(),
                        })
                        .await;
                    if sleep_or_shutdown(&mut shutdown, self.error_backoff).await {
                        break;
                    }
                }
            }
        }

        info!(
            bot = self.strategy.name(),
            stats = %self.stats,
            "Scan loop stopped"
        );
        self.stats
    }

    /// One full cycle: fresh balance → scan → gate in ranked order →
    /// execute in order → report.
    pub async fn run_cycle(&mut self) -> Result<CycleReport> {
        self.cycle += 1;
        let started = Instant::now();
        let bot = self.strategy.name().to_string();
        info!(bot = %bot, cycle = self.cycle, "Starting cycle");

        // Balance gates the whole cycle: an empty account scans nothing.
        let balance = self.backend.get_balance().await?;
        if balance <= 0.0 {
            warn!(bot = %bot, balance, "No balance available");
            self.notifier
                .notify(NotifyEvent::BalanceLow {
                    bot: bot.clone(),
                    available: balance,
                })
                .await;
            return Ok(self.report(CycleStatus::NoBalance, 0, 0, 0, 0, balance, started));
        }

        let outcome = self.strategy.find_opportunities(balance).await?;
        let signals = outcome.signals;
        let found = outcome.opportunities.len();

        if outcome.opportunities.is_empty() {
            return Ok(self.report(CycleStatus::NoOpportunities, signals, 0, 0, 0, balance, started));
        }

        // Gate in ranked order. The balance is re-read per candidate so a
        // concurrent drawdown rejects here rather than at order time.
        let mut accepted = Vec::new();
        for opportunity in &outcome.opportunities {
            let fresh = match self.backend.get_balance().await {
                Ok(b) => b,
                Err(e) => {
                    warn!(bot = %bot, error = %e, "Balance re-read failed — gating stops");
                    break;
                }
            };
            if self
                .strategy
                .evaluate_opportunity(opportunity, fresh, accepted.len())
            {
                accepted.push(opportunity.clone());
            }
        }

        // Execute in ranked order; one bad trade never aborts the cycle.
        let mut executed = 0usize;
        let mut failed = 0usize;
        for opportunity in &accepted {
            let fresh = match self.backend.get_balance().await {
                Ok(b) => b,
                Err(e) => {
                    warn!(bot = %bot, error = %e, "Balance re-read failed — skipping trade");
                    continue;
                }
            };
            if fresh < opportunity.amount {
                warn!(
                    bot = %bot,
                    market_id = %opportunity.market_id,
                    needed = opportunity.amount,
                    available = fresh,
                    "Balance moved under us — skipping trade"
                );
                continue;
            }

            if self.executor.execute(&bot, opportunity, &mut self.stats).await {
                executed += 1;
            } else {
                failed += 1;
            }
        }

        let balance_after = self.backend.get_balance().await.unwrap_or(balance);
        Ok(self.report(
            CycleStatus::Completed,
            signals,
            found,
            executed,
            failed,
            balance_after,
            started,
        ))
    }

    #[allow(clippy::too_many_arguments)]
    fn report(
        &self,
        status: CycleStatus,
        signals: usize,
        opportunities: usize,
        executed: usize,
        failed: usize,
        balance_after: f64,
        started: Instant,
    ) -> CycleReport {
        CycleReport {
            cycle: self.cycle,
            strategy: self.strategy.name().to_string(),
            status,
            signals,
            opportunities,
            trades_executed: executed,
            trades_failed: failed,
            balance_after,
            elapsed_ms: started.elapsed().as_millis() as u64,
            timestamp: Utc::now(),
        }
    }
}

/// Sleep for `duration`, returning early with `true` if the shutdown
/// signal fires first.
async fn sleep_or_shutdown(shutdown: &mut watch::Receiver<bool>, duration: Duration) -> bool {
    if duration.is_zero() {
        return *shutdown.borrow();
    }
    tokio::select! {
        _ = tokio::time::sleep(duration) => false,
        // A change or a dropped sender both mean "stop".
        _ = shutdown.changed() => true,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rest_period_subtracts_elapsed() {
        let rest = BotRunner::rest_period(Duration::from_secs(30), Duration::from_secs(12));
        assert_eq!(rest, Duration::from_secs(18));
    }

    #[test]
    fn test_rest_period_never_inverts() {
        // A cycle slower than the interval rests zero, not negative.
        let rest = BotRunner::rest_period(Duration::from_secs(30), Duration::from_secs(45));
        assert_eq!(rest, Duration::ZERO);
    }

    #[tokio::test]
    async fn test_sleep_interrupted_by_shutdown() {
        let (tx, mut rx) = watch::channel(false);
        let handle = tokio::spawn(async move {
            sleep_or_shutdown(&mut rx, Duration::from_secs(3600)).await
        });
        tx.send(true).unwrap();
        let interrupted = handle.await.unwrap();
        assert!(interrupted);
    }

    #[tokio::test]
    async fn test_sleep_completes_without_shutdown() {
        let (_tx, mut rx) = watch::channel(false);
        let interrupted = sleep_or_shutdown(&mut rx, Duration::from_millis(5)).await;
        assert!(!interrupted);
    }

    #[tokio::test]
    async fn test_zero_sleep_checks_signal() {
        let (tx, mut rx) = watch::channel(false);
        assert!(!sleep_or_shutdown(&mut rx, Duration::ZERO).await);
        tx.send(true).unwrap();
        assert!(sleep_or_shutdown(&mut rx, Duration::ZERO).await);
    }
}
