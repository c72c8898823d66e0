//! Configuration loading from TOML.
//!
//! All risk caps live in one `RiskConfig`, loaded once per run and immutable
//! afterwards. Internally inconsistent bounds are rejected here, at load
//! time, never mid-cycle.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Top-level engine configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct EngineConfig {
    pub bankroll: BankrollConfig,
    pub risk: RiskConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BankrollConfig {
    pub initial_bankroll: f64,
}

/// Process-wide risk caps and thresholds.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RiskConfig {
    /// Cap on any one stake, as a fraction of bankroll.
    pub max_single_bet_fraction: f64,
    /// Cap on total stakes admitted per decision cycle.
    pub max_daily_risk_fraction: f64,
    /// Minimum edge ratio versus the market-implied probability.
    pub min_edge: f64,
    /// Minimum estimator confidence to consider a candidate.
    pub min_confidence: f64,
    /// Candidates quoted above this price are never considered.
    pub max_odds: f64,
    /// Cap on the number of bets admitted per cycle.
    pub max_concurrent_bets: u32,
    /// Fractional-Kelly scaling (0.25 = quarter Kelly).
    pub kelly_multiplier: f64,
    /// Drawdown from peak that halts further betting.
    pub stop_loss_drawdown_fraction: f64,
    /// Balance floor, as a fraction of initial bankroll, that halts betting.
    pub emergency_stop_balance_fraction: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            max_single_bet_fraction: 0.05,
            max_daily_risk_fraction: 0.20,
            min_edge: 0.05,
            min_confidence: 0.60,
            max_odds: 8.0,
            max_concurrent_bets: 5,
            kelly_multiplier: 0.25,
            stop_loss_drawdown_fraction: 0.25,
            emergency_stop_balance_fraction: 0.50,
        }
    }
}

impl RiskConfig {
    /// Reject internally inconsistent bounds before any cycle runs.
    pub fn validate(&self) -> Result<()> {
        fn fraction(name: &str, value: f64) -> Result<()> {
            anyhow::ensure!(
                value.is_finite() && value > 0.0 && value <= 1.0,
                "{name} must be in (0, 1], got {value}"
            );
            Ok(())
        }

        fraction("max_single_bet_fraction", self.max_single_bet_fraction)?;
        fraction("max_daily_risk_fraction", self.max_daily_risk_fraction)?;
        fraction("min_confidence", self.min_confidence)?;
        fraction("kelly_multiplier", self.kelly_multiplier)?;
        fraction("stop_loss_drawdown_fraction", self.stop_loss_drawdown_fraction)?;

        anyhow::ensure!(
            self.max_single_bet_fraction <= self.max_daily_risk_fraction,
            "max_single_bet_fraction ({}) exceeds max_daily_risk_fraction ({})",
            self.max_single_bet_fraction,
            self.max_daily_risk_fraction,
        );
        anyhow::ensure!(
            self.min_edge.is_finite() && self.min_edge >= 0.0,
            "min_edge must be non-negative, got {}",
            self.min_edge
        );
        anyhow::ensure!(
            self.max_odds.is_finite() && self.max_odds > 1.0,
            "max_odds must exceed 1.0, got {}",
            self.max_odds
        );
        anyhow::ensure!(self.max_concurrent_bets >= 1, "max_concurrent_bets must be at least 1");
        anyhow::ensure!(
            self.emergency_stop_balance_fraction.is_finite()
                && (0.0..1.0).contains(&self.emergency_stop_balance_fraction),
            "emergency_stop_balance_fraction must be in [0, 1), got {}",
            self.emergency_stop_balance_fraction
        );
        Ok(())
    }
}

impl EngineConfig {
    /// Load and validate configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: EngineConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the whole configuration.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            self.bankroll.initial_bankroll.is_finite() && self.bankroll.initial_bankroll > 0.0,
            "initial_bankroll must be positive, got {}",
            self.bankroll.initial_bankroll
        );
        self.risk.validate()
    }
}
