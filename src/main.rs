//! VELO — High-velocity fee-aware prediction market trading bot
//!
//! Entry point. Loads configuration, initialises structured logging,
//! wires the feed/backend/notifier collaborators, and runs one scan
//! loop per configured strategy with graceful shutdown.

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{info, warn};

use velo::backend::simmer::SimmerClient;
use velo::backend::TradingBackend;
use velo::config::AppConfig;
use velo::engine::executor::TradeExecutor;
use velo::engine::runner::BotRunner;
use velo::feeds::binance::BinanceFeed;
use velo::feeds::PriceFeed;
use velo::notify::discord::DiscordWebhook;
use velo::notify::Notifier;
use velo::strategy::risk::RiskGate;
use velo::strategy::scanner::ScannerConfig;
use velo::strategy::{MomentumStrategy, TradingStrategy, VelocityStrategy};

const BANNER: &str = r#"
__     __  _____   _       ___
\ \   / / | ____| | |     / _ \
 \ \ / /  |  _|   | |    | | | |
  \ V /   | |___  | |___ | |_| |
   \_/    |_____| |_____| \___/

  Velocity Engine for Low-latency Opportunities
  v0.1.0
"#;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    // Load configuration from TOML
    let cfg = AppConfig::load("config.toml")?;

    init_logging();

    // Fatal before the loop: missing credentials or inconsistent limits
    // must never reach a live scan.
    cfg.validate()?;

    println!("{BANNER}");
    info!(
        bot_name = %cfg.bot.name,
        strategies = ?cfg.bot.strategies,
        scan_interval_secs = cfg.bot.scan_interval_secs,
        dry_run = cfg.bot.dry_run,
        fast_fee = cfg.fees.fast_market,
        standard_fee = cfg.fees.standard,
        profit_target = cfg.signals.profit_target,
        stop_loss = cfg.signals.stop_loss,
        "VELO starting up"
    );

    // -- Collaborators ----------------------------------------------------

    let feed: Arc<dyn PriceFeed> = Arc::new(BinanceFeed::new()?);
    let backend: Arc<dyn TradingBackend> = Arc::new(SimmerClient::new(cfg.resolve_api_key()?)?);

    let notifier = Arc::new(match cfg.resolve_webhook_url() {
        Some(url) => {
            let webhook = DiscordWebhook::new(url)?;
            if let Err(e) = webhook.send_startup_message(&cfg.bot.strategies).await {
                warn!(error = %e, "Startup notification failed — continuing");
            }
            Notifier::new(Some(webhook))
        }
        None => {
            info!("No webhook configured — notifications are log-only");
            Notifier::disabled()
        }
    });

    match backend.get_balance().await {
        Ok(balance) => info!(balance = format!("${balance:.2}"), "Initial balance"),
        Err(e) => warn!(error = %e, "Initial balance check failed"),
    }

    // -- Spawn one runner per strategy ------------------------------------

    let scanner_config = ScannerConfig {
        min_momentum: cfg.signals.min_momentum,
        min_divergence: cfg.signals.min_divergence,
        profit_target: cfg.signals.profit_target,
        stop_loss: cfg.signals.stop_loss,
        participation_fraction: cfg.trading.participation_fraction,
        max_position_usd: cfg.trading.max_position_usd,
        min_position_usd: cfg.trading.min_position_usd,
        fee_rate: cfg.fees.fast_market,
        min_profit_ratio: cfg.fees.min_profit_ratio,
        momentum_normalization: cfg.signals.momentum_normalization,
        divergence_normalization: cfg.signals.divergence_normalization,
        max_latency_budget: Duration::from_millis(cfg.signals.max_latency_budget_ms),
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut handles = Vec::new();

    for name in &cfg.bot.strategies {
        let strategy: Box<dyn TradingStrategy> = match name.as_str() {
            "momentum" => Box::new(MomentumStrategy::new(
                feed.clone(),
                backend.clone(),
                cfg.signals.assets.clone(),
                scanner_config.clone(),
                RiskGate::new(cfg.risk_limits(), cfg.signals.stale_speed_threshold),
            )),
            "velocity" => Box::new(VelocityStrategy::new(
                feed.clone(),
                backend.clone(),
                cfg.signals.assets.clone(),
                scanner_config.clone(),
                RiskGate::new(cfg.risk_limits(), cfg.signals.stale_speed_threshold),
            )),
            other => {
                // validate() already rejected unknown names
                warn!(strategy = other, "Skipping unknown strategy");
                continue;
            }
        };

        let runner = BotRunner::new(
            strategy,
            backend.clone(),
            TradeExecutor::new(backend.clone(), notifier.clone(), cfg.bot.dry_run),
            notifier.clone(),
            Duration::from_secs(cfg.bot.scan_interval_secs),
            Duration::from_secs(cfg.bot.error_backoff_secs),
        );

        handles.push(tokio::spawn(runner.run(shutdown_rx.clone())));
    }

    info!(bots = handles.len(), "All scan loops running. Press Ctrl+C to stop.");

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received.");
    let _ = shutdown_tx.send(true);

    for handle in handles {
        match handle.await {
            Ok(stats) => info!(stats = %stats, "Bot stopped"),
            Err(e) => warn!(error = %e, "Bot task panicked"),
        }
    }

    info!("VELO shut down cleanly.");
    Ok(())
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("velo=info"));

    let json_logging = std::env::var("VELO_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt().with_env_filter(env_filter).with_target(true).init();
    }
}
