//! Edge assessment.
//!
//! Quantifies the statistical edge of a model probability versus the
//! market-implied probability derived from the quoted price.

use serde::{Deserialize, Serialize};

use crate::types::Opportunity;

/// Edge and expected value derived from one opportunity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EdgeAssessment {
    /// `(probability - implied) / implied` — the fractional amount by which
    /// the model beats the market.
    pub edge: f64,
    /// Expected profit per unit staked: `p*(price-1) - (1-p)`.
    pub expected_value: f64,
}

/// Assess an opportunity's edge versus the market.
///
/// Pure function. Assumes the caller has already validated the opportunity
/// (`price > 1`, `0 < probability < 1`); malformed input is the caller's
/// error, not this function's.
pub fn assess(opportunity: &Opportunity) -> EdgeAssessment {
    let implied = opportunity.implied_probability();
    let edge = (opportunity.probability - implied) / implied;
    let expected_value =
        opportunity.probability * (opportunity.price - 1.0) - (1.0 - opportunity.probability);

    EdgeAssessment {
        edge,
        expected_value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Market;

    fn opp(price: f64, probability: f64) -> Opportunity {
        Opportunity {
            fixture: "Test vs Test".to_string(),
            market: Market::MatchHome,
            price,
            probability,
            confidence: 0.7,
        }
    }

    #[test]
    fn test_positive_edge() {
        // Market implies 50%, model says 55% → 10% edge ratio
        let a = assess(&opp(2.0, 0.55));
        assert!((a.edge - 0.10).abs() < 1e-12);
        assert!((a.expected_value - 0.10).abs() < 1e-12);
    }

    #[test]
    fn test_negative_edge() {
        // Market implies 50%, model says 45%
        let a = assess(&opp(2.0, 0.45));
        assert!((a.edge + 0.10).abs() < 1e-12);
        assert!(a.expected_value < 0.0);
    }

    #[test]
    fn test_short_priced_favourite_below_bar() {
        // Implied ≈ 0.769 vs model 0.80 → edge ≈ 4%
        let a = assess(&opp(1.3, 0.80));
        assert!((a.edge - 0.04).abs() < 1e-3);
        assert!(a.edge < 0.05);
    }

    #[test]
    fn test_edge_sign_matches_probability_comparison() {
        for (price, probability) in [
            (2.0, 0.55),
            (2.0, 0.45),
            (1.5, 0.70),
            (4.0, 0.20),
            (6.0, 0.30),
            (1.1, 0.95),
        ] {
            let o = opp(price, probability);
            let a = assess(&o);
            let implied = 1.0 / price;
            if probability > implied {
                assert!(a.edge > 0.0, "price {price} p {probability}");
            } else if probability < implied {
                assert!(a.edge < 0.0, "price {price} p {probability}");
            }
        }
    }

    #[test]
    fn test_zero_edge_at_fair_price() {
        let a = assess(&opp(4.0, 0.25));
        assert!(a.edge.abs() < 1e-12);
        assert!(a.expected_value.abs() < 1e-12);
    }

    #[test]
    fn test_assess_is_idempotent() {
        let o = opp(2.4, 0.48);
        assert_eq!(assess(&o), assess(&o));
    }
}
