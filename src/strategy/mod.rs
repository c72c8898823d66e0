//! Strategy engine — edge assessment, Kelly sizing, and risk-capped
//! portfolio selection.

pub mod edge;
pub mod kelly;
pub mod risk;

use std::fmt;

use tracing::{debug, info, warn};

use crate::bankroll::BankrollSnapshot;
use crate::config::RiskConfig;
use crate::types::{Opportunity, SelectedBet, ValidationError};
use kelly::{KellyStakeSizer, SkipReason, StakeProposal};
use risk::{RejectionReason, RiskLimiter};

// ---------------------------------------------------------------------------
// Decision log
// ---------------------------------------------------------------------------

/// Record of every decision made (or declined) during one selection pass.
/// Kept for reporting and transparency — rejected candidates carry the
/// reason they were passed on.
#[derive(Debug, Clone)]
pub enum DecisionRecord {
    /// Admitted and emitted as a `SelectedBet`.
    Selected { bet: SelectedBet },
    /// Malformed candidate rejected before edge assessment.
    Invalid {
        opportunity: Opportunity,
        error: ValidationError,
    },
    /// Dropped during sizing (no edge, low confidence, odds cap, dust).
    Skipped {
        opportunity: Opportunity,
        reason: SkipReason,
    },
    /// Sized proposal refused by the risk limiter.
    RiskRejected {
        proposal: StakeProposal,
        reason: RejectionReason,
    },
    /// The whole cycle was blocked before any candidate was examined.
    CycleHalted { reason: RejectionReason },
}

/// Aggregate counts over a decision log, for the cycle summary line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RejectionTally {
    pub selected: usize,
    pub invalid: usize,
    pub low_edge: usize,
    pub low_confidence: usize,
    pub odds_above_cap: usize,
    pub non_positive_kelly: usize,
    pub dust_stake: usize,
    pub daily_cap: usize,
    pub single_bet_cap: usize,
    pub stop_loss: usize,
    pub emergency_stop: usize,
}

impl RejectionTally {
    pub fn from_decisions(decisions: &[DecisionRecord]) -> Self {
        let mut tally = Self::default();
        for decision in decisions {
            match decision {
                DecisionRecord::Selected { .. } => tally.selected += 1,
                DecisionRecord::Invalid { .. } => tally.invalid += 1,
                DecisionRecord::Skipped { reason, .. } => match reason {
                    SkipReason::LowEdge => tally.low_edge += 1,
                    SkipReason::LowConfidence => tally.low_confidence += 1,
                    SkipReason::OddsAboveCap => tally.odds_above_cap += 1,
                    SkipReason::NonPositiveKelly => tally.non_positive_kelly += 1,
                    SkipReason::DustStake => tally.dust_stake += 1,
                },
                DecisionRecord::RiskRejected { reason, .. }
                | DecisionRecord::CycleHalted { reason } => match reason {
                    RejectionReason::DailyCapReached => tally.daily_cap += 1,
                    RejectionReason::SingleBetCapExceeded => tally.single_bet_cap += 1,
                    RejectionReason::StopLossActive => tally.stop_loss += 1,
                    RejectionReason::EmergencyStop => tally.emergency_stop += 1,
                },
            }
        }
        tally
    }

    pub fn rejected(&self) -> usize {
        self.invalid
            + self.low_edge
            + self.low_confidence
            + self.odds_above_cap
            + self.non_positive_kelly
            + self.dust_stake
            + self.daily_cap
            + self.single_bet_cap
            + self.stop_loss
            + self.emergency_stop
    }
}

impl fmt::Display for RejectionTally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        for (count, label) in [
            (self.invalid, "invalid"),
            (self.low_edge, "low-edge"),
            (self.low_confidence, "low-confidence"),
            (self.odds_above_cap, "odds-cap"),
            (self.non_positive_kelly, "no-kelly"),
            (self.dust_stake, "dust"),
            (self.daily_cap, "daily-cap"),
            (self.single_bet_cap, "single-cap"),
            (self.stop_loss, "stop-loss"),
            (self.emergency_stop, "emergency"),
        ] {
            if count > 0 {
                parts.push(format!("{count} {label}"));
            }
        }
        if parts.is_empty() {
            write!(f, "no rejections")
        } else {
            write!(f, "{}", parts.join(", "))
        }
    }
}

// ---------------------------------------------------------------------------
// Portfolio selector
// ---------------------------------------------------------------------------

/// Selects a risk-capped subset of a day's candidates: validate → assess →
/// size → rank → admit sequentially. A bounded greedy allocation, not a
/// knapsack optimum — chosen for explainability and O(n log n) cost.
pub struct PortfolioSelector {
    config: RiskConfig,
    sizer: KellyStakeSizer,
}

impl PortfolioSelector {
    pub fn new(config: RiskConfig) -> Self {
        Self {
            sizer: KellyStakeSizer::new(config.clone()),
            config,
        }
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    /// Run one selection pass over a cycle's candidates.
    ///
    /// All stakes are computed against the cycle-start balance in `snapshot`;
    /// admission order cannot drift stakes. Output order is deterministic:
    /// expected value descending, ties broken by adjusted Kelly descending,
    /// then by price ascending (lower variance preferred on exact ties).
    ///
    /// An empty result is a valid, expected outcome on days without
    /// qualifying edges.
    pub fn select_bets(
        &self,
        candidates: &[Opportunity],
        snapshot: &BankrollSnapshot,
    ) -> (Vec<SelectedBet>, Vec<DecisionRecord>) {
        let mut decisions: Vec<DecisionRecord> = Vec::new();
        let mut limiter = RiskLimiter::new(self.config.clone(), snapshot);

        // A stop-lossed or emergency-stopped bankroll blocks the whole cycle
        // before any candidate is examined.
        if let Some(reason) = limiter.cycle_blocked() {
            warn!(
                reason = %reason,
                balance = format!("${:.2}", snapshot.current_balance),
                drawdown = format!("{:.1}%", snapshot.drawdown * 100.0),
                "Cycle halted — no candidates evaluated"
            );
            decisions.push(DecisionRecord::CycleHalted { reason });
            return (Vec::new(), decisions);
        }

        // Validate, assess and size each candidate.
        let mut proposals: Vec<StakeProposal> = Vec::new();
        for candidate in candidates {
            if let Err(error) = candidate.validate() {
                warn!(
                    fixture = %candidate.fixture,
                    market = %candidate.market,
                    %error,
                    "Malformed candidate rejected"
                );
                decisions.push(DecisionRecord::Invalid {
                    opportunity: candidate.clone(),
                    error,
                });
                continue;
            }

            let assessment = edge::assess(candidate);
            match self.sizer.evaluate(candidate, &assessment) {
                Ok(proposal) => proposals.push(proposal),
                Err(reason) => {
                    debug!(
                        fixture = %candidate.fixture,
                        market = %candidate.market,
                        reason = %reason,
                        "Candidate skipped"
                    );
                    decisions.push(DecisionRecord::Skipped {
                        opportunity: candidate.clone(),
                        reason,
                    });
                }
            }
        }

        // Rank: EV desc, adjusted Kelly desc, price asc. The tie-break is
        // explicit and stable because output ordering is a tested property.
        proposals.sort_by(|a, b| {
            b.assessment
                .expected_value
                .total_cmp(&a.assessment.expected_value)
                .then(b.kelly_fraction_adjusted.total_cmp(&a.kelly_fraction_adjusted))
                .then(a.opportunity.price.total_cmp(&b.opportunity.price))
        });

        // Admit in rank order. Stakes are fixed against the cycle-start
        // balance at admission time.
        let mut selected: Vec<SelectedBet> = Vec::new();
        for proposal in proposals {
            let stake = proposal.kelly_fraction_adjusted * snapshot.current_balance;
            match limiter.admit(stake) {
                Ok(()) => {
                    let bet = SelectedBet {
                        kelly_fraction: proposal.kelly_fraction_adjusted,
                        expected_value: proposal.assessment.expected_value,
                        stake_amount: stake,
                        opportunity: proposal.opportunity.clone(),
                    };
                    info!(
                        fixture = %bet.opportunity.fixture,
                        market = %bet.opportunity.market,
                        stake = format!("${:.2}", bet.stake_amount),
                        ev = format!("{:+.3}", bet.expected_value),
                        "Bet selected"
                    );
                    decisions.push(DecisionRecord::Selected { bet: bet.clone() });
                    selected.push(bet);
                }
                Err(reason) => {
                    debug!(
                        fixture = %proposal.opportunity.fixture,
                        market = %proposal.opportunity.market,
                        reason = %reason,
                        "Proposal rejected by risk limiter"
                    );
                    decisions.push(DecisionRecord::RiskRejected { proposal, reason });
                }
            }
        }

        let tally = RejectionTally::from_decisions(&decisions);
        info!(
            candidates = candidates.len(),
            selected = selected.len(),
            exposure = format!("${:.2}", limiter.exposure()),
            rejections = %tally,
            "Selection pass complete"
        );

        (selected, decisions)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
