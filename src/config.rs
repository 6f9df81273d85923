//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Secrets (API keys, webhook URLs) are referenced by env-var name in the
//! config and resolved at startup via `std::env::var`. Missing required
//! credentials are a fatal startup error; the scan loop never starts on
//! a half-configured process.

use anyhow::{Context, Result};
use secrecy::SecretString;
use serde::Deserialize;
use std::fs;

use crate::types::{RiskLimits, VeloError};

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub bot: BotConfig,
    pub trading: TradingConfig,
    pub fees: FeesConfig,
    pub signals: SignalsConfig,
    pub simmer: SimmerConfig,
    #[serde(default)]
    pub discord: DiscordConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BotConfig {
    pub name: String,
    /// Strategy variants to run, one independent loop each:
    /// "momentum" and/or "velocity".
    pub strategies: Vec<String>,
    pub scan_interval_secs: u64,
    /// Sleep after an uncaught cycle error. Must exceed the scan interval.
    pub error_backoff_secs: u64,
    #[serde(default)]
    pub dry_run: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TradingConfig {
    pub max_position_usd: f64,
    pub min_position_usd: f64,
    pub max_trades_per_cycle: usize,
    pub min_confidence: f64,
    pub daily_budget: f64,
    /// Fraction of the available balance committed per trade before the
    /// max-position cap.
    pub participation_fraction: f64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FeesConfig {
    /// Fee rate on fast-settling (5/15 minute) markets.
    pub fast_market: f64,
    /// Fee rate on standard markets.
    pub standard: f64,
    /// Minimum net return on notional for a candidate to survive.
    pub min_profit_ratio: f64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SignalsConfig {
    /// Assets tracked against the price feed, e.g. ["BTC", "ETH", "SOL"].
    pub assets: Vec<String>,
    /// Minimum |24h % change| for the momentum trigger.
    pub min_momentum: f64,
    /// Minimum divergence for the velocity trigger.
    pub min_divergence: f64,
    /// Target price shift from entry, in probability points.
    pub profit_target: f64,
    /// Stop-loss shift from entry, in probability points.
    pub stop_loss: f64,
    /// |momentum| at which confidence saturates to 1.0.
    pub momentum_normalization: f64,
    /// Divergence at which confidence saturates to 1.0.
    pub divergence_normalization: f64,
    /// Latency budget for one scan; speed score hits 0 when exhausted.
    pub max_latency_budget_ms: u64,
    /// Speed score at or below which a candidate is considered stale.
    pub stale_speed_threshold: f64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SimmerConfig {
    pub api_key_env: String,
    #[serde(default)]
    pub base_url: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct DiscordConfig {
    pub webhook_url_env: Option<String>,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        Self::from_toml(&contents).with_context(|| format!("Failed to parse config file: {path}"))
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        Ok(config)
    }

    /// Validate limits and resolve required credentials. Any failure here
    /// is fatal; the process must not enter the scan loop.
    pub fn validate(&self) -> Result<(), VeloError> {
        if self.bot.strategies.is_empty() {
            return Err(VeloError::Config("no strategies configured".to_string()));
        }
        for s in &self.bot.strategies {
            if s != "momentum" && s != "velocity" {
                return Err(VeloError::Config(format!("unknown strategy: {s}")));
            }
        }
        if self.bot.error_backoff_secs <= self.bot.scan_interval_secs {
            return Err(VeloError::Config(
                "error_backoff_secs must exceed scan_interval_secs".to_string(),
            ));
        }
        if self.trading.min_position_usd > self.trading.max_position_usd {
            return Err(VeloError::Config(
                "min_position_usd exceeds max_position_usd".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.trading.participation_fraction) {
            return Err(VeloError::Config(
                "participation_fraction must be in [0, 1]".to_string(),
            ));
        }
        if self.signals.assets.is_empty() {
            return Err(VeloError::Config("no assets configured".to_string()));
        }

        // Required credential — resolve now so a missing key fails startup,
        // not the first trade.
        self.resolve_api_key()?;
        Ok(())
    }

    /// Resolve the backend API key from the configured env var.
    pub fn resolve_api_key(&self) -> Result<SecretString, VeloError> {
        std::env::var(&self.simmer.api_key_env)
            .map(SecretString::new)
            .map_err(|_| {
                VeloError::Config(format!(
                    "environment variable not set: {}",
                    self.simmer.api_key_env
                ))
            })
    }

    /// Resolve the optional Discord webhook URL. Absent env var or config
    /// entry simply disables the sink.
    pub fn resolve_webhook_url(&self) -> Option<String> {
        self.discord
            .webhook_url_env
            .as_deref()
            .and_then(|env| std::env::var(env).ok())
            .filter(|url| !url.is_empty())
    }

    /// Risk limits consumed by the gate.
    pub fn risk_limits(&self) -> RiskLimits {
        RiskLimits {
            max_position_usd: self.trading.max_position_usd,
            min_position_usd: self.trading.min_position_usd,
            max_trades_per_cycle: self.trading.max_trades_per_cycle,
            min_confidence: self.trading.min_confidence,
            daily_budget: self.trading.daily_budget,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        [bot]
        name = "velo"
        strategies = ["momentum", "velocity"]
        scan_interval_secs = 30
        error_backoff_secs = 60
        dry_run = true

        [trading]
        max_position_usd = 2.0
        min_position_usd = 1.0
        max_trades_per_cycle = 3
        min_confidence = 0.5
        daily_budget = 10.0
        participation_fraction = 0.1

        [fees]
        fast_market = 0.10
        standard = 0.02
        min_profit_ratio = 0.01

        [signals]
        assets = ["BTC", "ETH", "SOL"]
        min_momentum = 0.30
        min_divergence = 0.005
        profit_target = 0.05
        stop_loss = 0.03
        momentum_normalization = 0.5
        divergence_normalization = 0.05
        max_latency_budget_ms = 15000
        stale_speed_threshold = 0.5

        [simmer]
        api_key_env = "VELO_TEST_SIMMER_KEY"

        [discord]
        webhook_url_env = "VELO_TEST_WEBHOOK"
    "#;

    #[test]
    fn test_parse_sample_config() {
        let cfg = AppConfig::from_toml(SAMPLE).unwrap();
        assert_eq!(cfg.bot.name, "velo");
        assert_eq!(cfg.bot.strategies.len(), 2);
        assert!(cfg.bot.dry_run);
        assert_eq!(cfg.signals.assets, vec!["BTC", "ETH", "SOL"]);
        assert!((cfg.fees.fast_market - 0.10).abs() < 1e-10);
        assert_eq!(cfg.trading.max_trades_per_cycle, 3);
    }

    #[test]
    fn test_discord_section_optional() {
        let trimmed = SAMPLE.replace("[discord]", "[discord_unused]").replace(
            "webhook_url_env = \"VELO_TEST_WEBHOOK\"",
            "x = \"\"",
        );
        let cfg = AppConfig::from_toml(&trimmed);
        // Unknown sections are tolerated; discord defaults to disabled.
        let cfg = cfg.unwrap();
        assert!(cfg.discord.webhook_url_env.is_none());
    }

    #[test]
    fn test_risk_limits_mapping() {
        let cfg = AppConfig::from_toml(SAMPLE).unwrap();
        let limits = cfg.risk_limits();
        assert_eq!(limits.max_trades_per_cycle, 3);
        assert!((limits.min_confidence - 0.5).abs() < 1e-10);
        assert!((limits.max_position_usd - 2.0).abs() < 1e-10);
    }

    #[test]
    fn test_validate_missing_api_key_is_fatal() {
        let cfg = AppConfig::from_toml(SAMPLE).unwrap();
        std::env::remove_var("VELO_TEST_SIMMER_KEY");
        let err = cfg.validate().unwrap_err();
        assert!(matches!(err, VeloError::Config(_)));
    }

    #[test]
    fn test_validate_passes_with_key_set() {
        let toml = SAMPLE.replace("VELO_TEST_SIMMER_KEY", "VELO_TEST_SIMMER_KEY_SET");
        let cfg = AppConfig::from_toml(&toml).unwrap();
        std::env::set_var("VELO_TEST_SIMMER_KEY_SET", "sk-test");
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_unknown_strategy() {
        let toml = SAMPLE.replace("\"momentum\", \"velocity\"", "\"martingale\"");
        let cfg = AppConfig::from_toml(&toml).unwrap();
        let err = cfg.validate().unwrap_err();
        assert!(format!("{err}").contains("martingale"));
    }

    #[test]
    fn test_validate_rejects_backoff_not_exceeding_interval() {
        let toml = SAMPLE.replace("error_backoff_secs = 60", "error_backoff_secs = 30");
        let cfg = AppConfig::from_toml(&toml).unwrap();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_inverted_position_bounds() {
        let toml = SAMPLE.replace("min_position_usd = 1.0", "min_position_usd = 5.0");
        let cfg = AppConfig::from_toml(&toml).unwrap();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_resolve_webhook_url_absent() {
        let cfg = AppConfig::from_toml(SAMPLE).unwrap();
        std::env::remove_var("VELO_TEST_WEBHOOK");
        assert!(cfg.resolve_webhook_url().is_none());
    }
}
