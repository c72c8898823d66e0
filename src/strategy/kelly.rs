//! Kelly criterion stake sizing.
//!
//! Converts (probability, price, confidence) into a capped fractional-Kelly
//! stake proposal. Absence of a viable stake is a normal outcome, never an
//! error.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use super::edge::EdgeAssessment;
use crate::config::RiskConfig;
use crate::types::Opportunity;

/// Proposals whose adjusted fraction falls below this share of bankroll are
/// dropped as dust.
pub const MIN_STAKE_FRACTION: f64 = 0.005;

// ---------------------------------------------------------------------------
// Stake proposal
// ---------------------------------------------------------------------------

/// A sized candidate, recomputed every decision cycle and never persisted
/// independently of the cycle that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StakeProposal {
    pub opportunity: Opportunity,
    pub assessment: EdgeAssessment,
    /// `(p*price - 1) / (price - 1)` — full Kelly.
    pub kelly_fraction_raw: f64,
    /// Raw Kelly after multiplier and confidence scaling, clamped to
    /// `[0, max_single_bet_fraction]`.
    pub kelly_fraction_adjusted: f64,
}

/// Why a candidate was skipped before reaching the risk limiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    LowEdge,
    LowConfidence,
    OddsAboveCap,
    NonPositiveKelly,
    DustStake,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::LowEdge => write!(f, "edge below minimum"),
            SkipReason::LowConfidence => write!(f, "confidence below minimum"),
            SkipReason::OddsAboveCap => write!(f, "odds above cap"),
            SkipReason::NonPositiveKelly => write!(f, "non-positive Kelly fraction"),
            SkipReason::DustStake => write!(f, "stake below dust threshold"),
        }
    }
}

// ---------------------------------------------------------------------------
// Sizer
// ---------------------------------------------------------------------------

/// The single sizing implementation shared by every call site.
pub struct KellyStakeSizer {
    config: RiskConfig,
}

impl KellyStakeSizer {
    pub fn new(config: RiskConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    /// Size an assessed opportunity, reporting why it was skipped if it was.
    ///
    /// Kelly formula: f* = (bp - q) / b with b = price - 1, q = 1 - p.
    pub fn evaluate(
        &self,
        opportunity: &Opportunity,
        assessment: &EdgeAssessment,
    ) -> Result<StakeProposal, SkipReason> {
        if assessment.edge < self.config.min_edge {
            debug!(
                fixture = %opportunity.fixture,
                market = %opportunity.market,
                edge = format!("{:.1}%", assessment.edge * 100.0),
                min = format!("{:.1}%", self.config.min_edge * 100.0),
                "Edge below minimum"
            );
            return Err(SkipReason::LowEdge);
        }

        if opportunity.confidence < self.config.min_confidence {
            return Err(SkipReason::LowConfidence);
        }

        if opportunity.price > self.config.max_odds {
            return Err(SkipReason::OddsAboveCap);
        }

        let kelly_raw = (opportunity.probability * opportunity.price - 1.0)
            / (opportunity.price - 1.0);

        // Guards against edge/probability rounding inconsistencies: the edge
        // ratio can clear the bar while raw Kelly is still non-positive.
        if kelly_raw <= 0.0 {
            debug!(
                fixture = %opportunity.fixture,
                market = %opportunity.market,
                kelly_raw,
                "Non-positive Kelly — no stake"
            );
            return Err(SkipReason::NonPositiveKelly);
        }

        // Proposals near the confidence floor are sized down, not admitted
        // at full size.
        let confidence_scaling = (opportunity.confidence / self.config.min_confidence).min(1.0);

        let adjusted = (kelly_raw * self.config.kelly_multiplier * confidence_scaling)
            .clamp(0.0, self.config.max_single_bet_fraction);

        if adjusted < MIN_STAKE_FRACTION {
            return Err(SkipReason::DustStake);
        }

        debug!(
            fixture = %opportunity.fixture,
            market = %opportunity.market,
            kelly_raw = format!("{:.2}%", kelly_raw * 100.0),
            adjusted = format!("{:.2}%", adjusted * 100.0),
            ev = format!("{:+.3}", assessment.expected_value),
            "Stake sized"
        );

        Ok(StakeProposal {
            opportunity: opportunity.clone(),
            assessment: *assessment,
            kelly_fraction_raw: kelly_raw,
            kelly_fraction_adjusted: adjusted,
        })
    }

    /// Size an assessed opportunity. `None` means no viable stake.
    pub fn size(
        &self,
        opportunity: &Opportunity,
        assessment: &EdgeAssessment,
    ) -> Option<StakeProposal> {
        self.evaluate(opportunity, assessment).ok()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
