//! Historical backtesting engine.
//!
//! Replays already-settled fixtures through selection and settlement, one
//! decision cycle per calendar day, and reports P&L, win rate, ROI, and max
//! drawdown. Outcomes are inputs; nothing here simulates or fabricates
//! results.

use chrono::NaiveDate;
use tracing::info;

use crate::bankroll::{BankrollTracker, TrackerStatus};
use crate::config::RiskConfig;
use crate::strategy::PortfolioSelector;
use crate::types::{Market, Opportunity};

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// A candidate whose outcome is already known — the unit of replay.
#[derive(Debug, Clone)]
pub struct ResolvedFixture {
    /// Decision cycle this candidate belonged to.
    pub date: NaiveDate,
    pub opportunity: Opportunity,
    /// Whether the market the opportunity backed actually came in.
    pub won: bool,
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// One settled bet in the replay.
#[derive(Debug, Clone)]
pub struct BacktestTrade {
    pub date: NaiveDate,
    pub fixture: String,
    pub market: Market,
    pub price: f64,
    pub stake: f64,
    pub won: bool,
    pub pnl: f64,
    pub balance_after: f64,
}

/// Complete backtest performance report.
#[derive(Debug, Clone)]
pub struct BacktestReport {
    pub initial_bankroll: f64,
    pub final_balance: f64,
    pub total_pnl: f64,
    pub roi_pct: f64,
    pub total_staked: f64,
    pub bets_placed: usize,
    pub wins: usize,
    pub losses: usize,
    pub win_rate_pct: f64,
    pub peak_balance: f64,
    pub max_drawdown_pct: f64,
    pub final_status: TrackerStatus,
    /// Balance at the end of each replayed day, for charting.
    pub balance_history: Vec<(NaiveDate, f64)>,
    pub trade_log: Vec<BacktestTrade>,
}

// ---------------------------------------------------------------------------
// Backtester
// ---------------------------------------------------------------------------

pub struct Backtester {
    selector: PortfolioSelector,
    config: RiskConfig,
}

impl Backtester {
    pub fn new(config: RiskConfig) -> Self {
        Self {
            selector: PortfolioSelector::new(config.clone()),
            config,
        }
    }

    /// Replay resolved fixtures in chronological order.
    ///
    /// Fixtures must be sorted by `date`; each distinct date becomes one
    /// decision cycle. The replay ends early if the tracker stops out.
    pub fn run(&self, fixtures: &[ResolvedFixture], initial_bankroll: f64) -> BacktestReport {
        let mut tracker = BankrollTracker::new(initial_bankroll, self.config.clone());
        let mut trade_log: Vec<BacktestTrade> = Vec::new();
        let mut balance_history: Vec<(NaiveDate, f64)> = Vec::new();
        let mut total_staked = 0.0;
        let mut max_drawdown = 0.0_f64;

        let mut index = 0;
        while index < fixtures.len() {
            let date = fixtures[index].date;
            let mut day_end = index;
            while day_end < fixtures.len() && fixtures[day_end].date == date {
                day_end += 1;
            }
            let day = &fixtures[index..day_end];
            index = day_end;

            if !tracker.is_active() {
                break;
            }

            tracker.begin_cycle(date);
            let snapshot = tracker.snapshot();
            let candidates: Vec<Opportunity> =
                day.iter().map(|f| f.opportunity.clone()).collect();
            let (selected, _decisions) = self.selector.select_bets(&candidates, &snapshot);
            tracker.record_admissions(&selected);

            for bet in &selected {
                let won = day
                    .iter()
                    .find(|f| {
                        f.opportunity.fixture == bet.opportunity.fixture
                            && f.opportunity.market == bet.opportunity.market
                    })
                    .map(|f| f.won)
                    .unwrap_or(false);

                let balance_before = tracker.state().current_balance;
                tracker.settle(bet, won);
                let balance_after = tracker.state().current_balance;

                total_staked += bet.stake_amount;
                trade_log.push(BacktestTrade {
                    date,
                    fixture: bet.opportunity.fixture.clone(),
                    market: bet.opportunity.market,
                    price: bet.opportunity.price,
                    stake: bet.stake_amount,
                    won,
                    pnl: balance_after - balance_before,
                    balance_after,
                });

                max_drawdown = max_drawdown.max(tracker.state().drawdown());
                if !tracker.is_active() {
                    break;
                }
            }

            balance_history.push((date, tracker.state().current_balance));
        }

        let state = tracker.state();
        let report = BacktestReport {
            initial_bankroll,
            final_balance: state.current_balance,
            total_pnl: state.total_pnl,
            roi_pct: (state.current_balance - initial_bankroll) / initial_bankroll * 100.0,
            total_staked,
            bets_placed: trade_log.len(),
            wins: state.bets_won as usize,
            losses: state.bets_lost as usize,
            win_rate_pct: state.win_rate(),
            peak_balance: state.peak_balance,
            max_drawdown_pct: max_drawdown * 100.0,
            final_status: state.status,
            balance_history,
            trade_log,
        };

        info!(
            days = report.balance_history.len(),
            bets = report.bets_placed,
            final_balance = format!("${:.2}", report.final_balance),
            roi = format!("{:+.1}%", report.roi_pct),
            win_rate = format!("{:.1}%", report.win_rate_pct),
            max_drawdown = format!("{:.1}%", report.max_drawdown_pct),
            status = %report.final_status,
            "Backtest complete"
        );

        report
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
