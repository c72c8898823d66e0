//! Shared types for the staking engine.
//!
//! These types form the data model used across all modules. The market is a
//! closed tagged enum rather than free-text bet descriptions, so downstream
//! logic switches on the tag instead of substring-matching strings.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Markets
// ---------------------------------------------------------------------------

/// Which team a side-specific market refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TeamSide {
    Home,
    Away,
}

impl fmt::Display for TeamSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TeamSide::Home => write!(f, "Home"),
            TeamSide::Away => write!(f, "Away"),
        }
    }
}

/// The two-outcome combinations offered as double chance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChancePair {
    HomeOrDraw,
    DrawOrAway,
    HomeOrAway,
}

impl fmt::Display for ChancePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChancePair::HomeOrDraw => write!(f, "Home/Draw"),
            ChancePair::DrawOrAway => write!(f, "Draw/Away"),
            ChancePair::HomeOrAway => write!(f, "Home/Away"),
        }
    }
}

/// A bettable market on a fixture. Closed set — there is deliberately no
/// `Other(String)` escape hatch.
///
/// Goal/corner lines are the quoted half-lines (2.5, 9.5, ...).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Market {
    MatchHome,
    MatchDraw,
    MatchAway,
    TotalOver(f64),
    TotalUnder(f64),
    BttsYes,
    BttsNo,
    DoubleChance(ChancePair),
    TeamTotalOver(TeamSide, f64),
    TeamTotalUnder(TeamSide, f64),
    CornersOver(f64),
    CornersUnder(f64),
    HandicapPlusOne(TeamSide),
    HandicapMinusOne(TeamSide),
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Market::MatchHome => write!(f, "Home Win"),
            Market::MatchDraw => write!(f, "Draw"),
            Market::MatchAway => write!(f, "Away Win"),
            Market::TotalOver(line) => write!(f, "Over {line} Goals"),
            Market::TotalUnder(line) => write!(f, "Under {line} Goals"),
            Market::BttsYes => write!(f, "BTTS Yes"),
            Market::BttsNo => write!(f, "BTTS No"),
            Market::DoubleChance(pair) => write!(f, "Double Chance {pair}"),
            Market::TeamTotalOver(side, line) => write!(f, "{side} Team Over {line} Goals"),
            Market::TeamTotalUnder(side, line) => write!(f, "{side} Team Under {line} Goals"),
            Market::CornersOver(line) => write!(f, "Over {line} Corners"),
            Market::CornersUnder(line) => write!(f, "Under {line} Corners"),
            Market::HandicapPlusOne(side) => write!(f, "{side} +1 Handicap"),
            Market::HandicapMinusOne(side) => write!(f, "{side} -1 Handicap"),
        }
    }
}

// ---------------------------------------------------------------------------
// Opportunity
// ---------------------------------------------------------------------------

/// A candidate wager produced by the probability estimator: one market on one
/// fixture, with its quoted price and the model's calibrated estimate.
/// Immutable once scored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Opportunity {
    /// Fixture label, e.g. "Arsenal vs Chelsea".
    pub fixture: String,
    pub market: Market,
    /// Decimal odds. Must be > 1.0.
    pub price: f64,
    /// Model-estimated win probability, strictly inside (0, 1).
    pub probability: f64,
    /// Estimator's self-reported reliability in [0, 1].
    pub confidence: f64,
}

impl Opportunity {
    /// Probability implied by the quoted price.
    pub fn implied_probability(&self) -> f64 {
        1.0 / self.price
    }

    /// Check the invariants the rest of the engine assumes. Callers must
    /// reject malformed candidates before edge assessment; nothing downstream
    /// re-validates.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.price.is_finite() || self.price <= 1.0 {
            return Err(ValidationError::PriceOutOfRange { price: self.price });
        }
        if !self.probability.is_finite() || self.probability <= 0.0 || self.probability >= 1.0 {
            return Err(ValidationError::ProbabilityOutOfRange {
                probability: self.probability,
            });
        }
        if !self.confidence.is_finite() || self.confidence < 0.0 || self.confidence > 1.0 {
            return Err(ValidationError::ConfidenceOutOfRange {
                confidence: self.confidence,
            });
        }
        Ok(())
    }
}

impl fmt::Display for Opportunity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} — {} @ {:.2} (p={:.0}%, conf={:.0}%)",
            self.fixture,
            self.market,
            self.price,
            self.probability * 100.0,
            self.confidence * 100.0,
        )
    }
}

/// A malformed candidate. Raised by `Opportunity::validate`, never silently
/// coerced.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("price {price} outside (1.0, ∞)")]
    PriceOutOfRange { price: f64 },

    #[error("probability {probability} outside (0.0, 1.0)")]
    ProbabilityOutOfRange { probability: f64 },

    #[error("confidence {confidence} outside [0.0, 1.0]")]
    ConfidenceOutOfRange { confidence: f64 },
}

// ---------------------------------------------------------------------------
// Selected bet
// ---------------------------------------------------------------------------

/// A finalized stake, ready for the report sink. Read-only once emitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectedBet {
    pub opportunity: Opportunity,
    /// Adjusted Kelly fraction the stake was derived from.
    pub kelly_fraction: f64,
    /// Expected profit per unit staked.
    pub expected_value: f64,
    /// Stake in currency units, fixed against the cycle-start balance.
    pub stake_amount: f64,
}

impl fmt::Display for SelectedBet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} — {} @ {:.2}: stake ${:.2} (kelly {:.2}%, EV {:+.3})",
            self.opportunity.fixture,
            self.opportunity.market,
            self.opportunity.price,
            self.stake_amount,
            self.kelly_fraction * 100.0,
            self.expected_value,
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
