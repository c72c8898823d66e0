//! Risk limiter.
//!
//! Enforces per-bet and aggregate daily caps over one decision cycle.
//! The limiter is OPEN until either the bet count or the daily risk budget is
//! exhausted, after which every further proposal is rejected regardless of
//! quality.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::bankroll::BankrollSnapshot;
use crate::config::RiskConfig;

/// Slack for floating-point cap comparisons.
const CAP_EPSILON: f64 = 1e-9;

/// Why a proposal was refused admission. Checks are evaluated in this order:
/// daily cap, single-bet cap, stop-loss, emergency stop — the first failing
/// check names the reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectionReason {
    DailyCapReached,
    SingleBetCapExceeded,
    StopLossActive,
    EmergencyStop,
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectionReason::DailyCapReached => write!(f, "daily risk cap reached"),
            RejectionReason::SingleBetCapExceeded => write!(f, "single-bet cap exceeded"),
            RejectionReason::StopLossActive => write!(f, "stop-loss active"),
            RejectionReason::EmergencyStop => write!(f, "emergency stop"),
        }
    }
}

/// Per-cycle admission gate. Construct one per decision cycle from the
/// cycle-start bankroll snapshot; admissions accumulate into it sequentially
/// (order-sensitive state — never share across threads).
pub struct RiskLimiter {
    config: RiskConfig,
    /// Cycle-start balance; all caps are computed against this, not against
    /// any intra-cycle balance movement.
    balance: f64,
    initial_balance: f64,
    drawdown: f64,
    exposure: f64,
    bet_count: u32,
    closed: bool,
}

impl RiskLimiter {
    pub fn new(config: RiskConfig, snapshot: &BankrollSnapshot) -> Self {
        Self {
            config,
            balance: snapshot.current_balance,
            initial_balance: snapshot.initial_balance,
            drawdown: snapshot.drawdown,
            exposure: snapshot.todays_risk_exposure,
            bet_count: snapshot.todays_bet_count,
            closed: false,
        }
    }

    /// Reasons that block the entire cycle before any proposal is examined.
    /// `Some` means no admission can succeed today.
    pub fn cycle_blocked(&self) -> Option<RejectionReason> {
        if self.drawdown > self.config.stop_loss_drawdown_fraction {
            return Some(RejectionReason::StopLossActive);
        }
        if self.balance < self.initial_balance * self.config.emergency_stop_balance_fraction {
            return Some(RejectionReason::EmergencyStop);
        }
        None
    }

    /// Whether the daily cap has been reached for this cycle.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Total stake admitted so far this cycle.
    pub fn exposure(&self) -> f64 {
        self.exposure
    }

    /// Number of bets admitted so far this cycle.
    pub fn bet_count(&self) -> u32 {
        self.bet_count
    }

    /// Admit or reject a proposed stake. On admission the exposure and bet
    /// count advance as one step.
    pub fn admit(&mut self, stake: f64) -> Result<(), RejectionReason> {
        let daily_cap = self.balance * self.config.max_daily_risk_fraction;

        if self.closed
            || self.bet_count >= self.config.max_concurrent_bets
            || self.exposure + stake > daily_cap + CAP_EPSILON
        {
            self.closed = true;
            return Err(RejectionReason::DailyCapReached);
        }

        if stake > self.balance * self.config.max_single_bet_fraction + CAP_EPSILON {
            return Err(RejectionReason::SingleBetCapExceeded);
        }

        if self.drawdown > self.config.stop_loss_drawdown_fraction {
            return Err(RejectionReason::StopLossActive);
        }

        if self.balance < self.initial_balance * self.config.emergency_stop_balance_fraction {
            return Err(RejectionReason::EmergencyStop);
        }

        self.exposure += stake;
        self.bet_count += 1;

        debug!(
            stake = format!("${:.2}", stake),
            exposure = format!("${:.2}", self.exposure),
            bets = self.bet_count,
            "Stake admitted"
        );

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
