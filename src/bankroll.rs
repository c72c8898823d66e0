//! Bankroll tracking — balance, peak, drawdown, and betting halts.
//!
//! One `BankrollTracker` owns one `BankrollState` for the whole run. All
//! mutation happens through `begin_cycle`, `record_admissions`, and `settle`;
//! the selection pipeline only ever sees an immutable snapshot.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, warn};

use crate::config::RiskConfig;
use crate::types::SelectedBet;

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Whether further risk-taking is permitted. Both stopped states are
/// terminal for the remainder of the run; recovery is an operator-triggered
/// restart with a fresh state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackerStatus {
    Active,
    StoppedDrawdown,
    StoppedEmergency,
}

impl fmt::Display for TrackerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackerStatus::Active => write!(f, "ACTIVE"),
            TrackerStatus::StoppedDrawdown => write!(f, "STOPPED (drawdown)"),
            TrackerStatus::StoppedEmergency => write!(f, "STOPPED (emergency)"),
        }
    }
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Mutable bankroll state, exclusively owned by `BankrollTracker`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankrollState {
    pub initial_balance: f64,
    pub current_balance: f64,
    /// Monotonic non-decreasing for the life of the run.
    pub peak_balance: f64,
    /// Stake admitted so far in the current decision cycle.
    pub todays_risk_exposure: f64,
    pub todays_bet_count: u32,
    pub bets_won: u64,
    pub bets_lost: u64,
    pub total_pnl: f64,
    pub status: TrackerStatus,
    /// Last observed decision-cycle identifier.
    pub last_cycle: Option<NaiveDate>,
}

impl BankrollState {
    /// Current drawdown from peak as a fraction (0.0 = at peak).
    pub fn drawdown(&self) -> f64 {
        if self.peak_balance <= 0.0 {
            0.0
        } else {
            (self.peak_balance - self.current_balance) / self.peak_balance
        }
    }

    /// Win rate over settled bets as a percentage. 0.0 if nothing settled.
    pub fn win_rate(&self) -> f64 {
        let settled = self.bets_won + self.bets_lost;
        if settled == 0 {
            0.0
        } else {
            (self.bets_won as f64 / settled as f64) * 100.0
        }
    }
}

impl fmt::Display for BankrollState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | balance=${:.2} | peak=${:.2} | drawdown={:.1}% | PnL=${:+.2} | bets W{}/L{} ({:.1}%)",
            self.status,
            self.current_balance,
            self.peak_balance,
            self.drawdown() * 100.0,
            self.total_pnl,
            self.bets_won,
            self.bets_lost,
            self.win_rate(),
        )
    }
}

/// Read-only view handed to the selection pipeline at cycle start.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BankrollSnapshot {
    pub initial_balance: f64,
    pub current_balance: f64,
    pub peak_balance: f64,
    pub drawdown: f64,
    pub todays_risk_exposure: f64,
    pub todays_bet_count: u32,
}

// ---------------------------------------------------------------------------
// Tracker
// ---------------------------------------------------------------------------

pub struct BankrollTracker {
    state: BankrollState,
    config: RiskConfig,
}

impl BankrollTracker {
    pub fn new(initial_bankroll: f64, config: RiskConfig) -> Self {
        Self {
            state: BankrollState {
                initial_balance: initial_bankroll,
                current_balance: initial_bankroll,
                peak_balance: initial_bankroll,
                todays_risk_exposure: 0.0,
                todays_bet_count: 0,
                bets_won: 0,
                bets_lost: 0,
                total_pnl: 0.0,
                status: TrackerStatus::Active,
                last_cycle: None,
            },
            config,
        }
    }

    pub fn state(&self) -> &BankrollState {
        &self.state
    }

    pub fn status(&self) -> TrackerStatus {
        self.state.status
    }

    pub fn is_active(&self) -> bool {
        self.state.status == TrackerStatus::Active
    }

    /// Immutable view for the selection pipeline.
    pub fn snapshot(&self) -> BankrollSnapshot {
        BankrollSnapshot {
            initial_balance: self.state.initial_balance,
            current_balance: self.state.current_balance,
            peak_balance: self.state.peak_balance,
            drawdown: self.state.drawdown(),
            todays_risk_exposure: self.state.todays_risk_exposure,
            todays_bet_count: self.state.todays_bet_count,
        }
    }

    /// Observe a decision-cycle identifier. A new date resets the daily
    /// exposure and bet count; the same date is a no-op, so the tracker can
    /// be consulted repeatedly within one cycle.
    pub fn begin_cycle(&mut self, cycle_id: NaiveDate) {
        if self.state.last_cycle != Some(cycle_id) {
            debug!(cycle = %cycle_id, "New decision cycle — daily counters reset");
            self.state.todays_risk_exposure = 0.0;
            self.state.todays_bet_count = 0;
            self.state.last_cycle = Some(cycle_id);
        }
    }

    /// Fold a cycle's admitted bets into the daily counters.
    pub fn record_admissions(&mut self, bets: &[SelectedBet]) {
        for bet in bets {
            self.state.todays_risk_exposure += bet.stake_amount;
            self.state.todays_bet_count += 1;
        }
    }

    /// Apply a settled outcome: `profit = stake*(price-1)` on a win,
    /// `-stake` on a loss. Updates peak and drawdown, then evaluates the
    /// stop-loss and emergency-stop transitions.
    ///
    /// Settling while already stopped is logged and ignored.
    pub fn settle(&mut self, bet: &SelectedBet, won: bool) {
        if !self.is_active() {
            warn!(
                fixture = %bet.opportunity.fixture,
                market = %bet.opportunity.market,
                status = %self.state.status,
                "Settlement ignored — tracker already stopped"
            );
            return;
        }

        let profit = if won {
            bet.stake_amount * (bet.opportunity.price - 1.0)
        } else {
            -bet.stake_amount
        };

        self.state.current_balance += profit;
        self.state.total_pnl += profit;
        if won {
            self.state.bets_won += 1;
        } else {
            self.state.bets_lost += 1;
        }
        if self.state.current_balance > self.state.peak_balance {
            self.state.peak_balance = self.state.current_balance;
        }

        debug!(
            fixture = %bet.opportunity.fixture,
            market = %bet.opportunity.market,
            won,
            profit = format!("${:+.2}", profit),
            balance = format!("${:.2}", self.state.current_balance),
            "Bet settled"
        );

        if self.state.drawdown() > self.config.stop_loss_drawdown_fraction {
            self.state.status = TrackerStatus::StoppedDrawdown;
            info!(
                drawdown = format!("{:.1}%", self.state.drawdown() * 100.0),
                threshold = format!("{:.1}%", self.config.stop_loss_drawdown_fraction * 100.0),
                "Stop-loss triggered — betting halted"
            );
        } else if self.state.current_balance
            < self.state.initial_balance * self.config.emergency_stop_balance_fraction
        {
            self.state.status = TrackerStatus::StoppedEmergency;
            info!(
                balance = format!("${:.2}", self.state.current_balance),
                floor = format!(
                    "${:.2}",
                    self.state.initial_balance * self.config.emergency_stop_balance_fraction
                ),
                "Emergency stop triggered — betting halted"
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
