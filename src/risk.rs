//! Risk tier mapping
//!
//! Two policies are supported and configured per classifier domain:
//! a six-tier percentage ladder (URL trust) and a binary split
//! (transaction fraud, text spam).

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Discrete risk tier on the six-tier ladder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskTier {
    #[serde(rename = "Very Safe", alias = "very_safe")]
    VerySafe,
    #[serde(rename = "Mostly Safe", alias = "mostly_safe")]
    MostlySafe,
    #[serde(rename = "Suspicious", alias = "suspicious")]
    Suspicious,
    #[serde(rename = "High Risk", alias = "high_risk")]
    HighRisk,
    #[serde(rename = "Dangerous", alias = "dangerous")]
    Dangerous,
    #[serde(rename = "Critical Fraud", alias = "critical_fraud")]
    CriticalFraud,
}

impl RiskTier {
    pub fn label(&self) -> &'static str {
        match self {
            RiskTier::VerySafe => "Very Safe",
            RiskTier::MostlySafe => "Mostly Safe",
            RiskTier::Suspicious => "Suspicious",
            RiskTier::HighRisk => "High Risk",
            RiskTier::Dangerous => "Dangerous",
            RiskTier::CriticalFraud => "Critical Fraud",
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One band of a tier ladder: scores at or above `min_score` (0-100)
/// fall in this band unless a higher band matched first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierBand {
    pub min_score: f64,
    pub tier: RiskTier,
    pub action: String,
}

impl TierBand {
    pub fn new(min_score: f64, tier: RiskTier, action: &str) -> Self {
        Self {
            min_score,
            tier,
            action: action.to_string(),
        }
    }
}

/// Reasons a configured ladder is rejected at startup
#[derive(Debug, Error, PartialEq)]
pub enum LadderError {
    #[error("tier ladder has no bands")]
    Empty,
    #[error("band bound {0} is not within [0, 100]")]
    OutOfRange(f64),
    #[error("duplicate band bound {0}")]
    DuplicateBound(f64),
    #[error("lowest band starts at {0}, must start at 0 to cover every score")]
    NotExhaustive(f64),
}

/// Result of mapping a probability onto a tier ladder
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskAssessment {
    /// Probability the ladder was evaluated on, clamped to [0, 1]
    pub probability: f64,
    /// Integer score on the 0-100 scale, floored
    pub score: u8,
    pub tier: RiskTier,
    pub action: String,
}

/// Ordered, exhaustive threshold ladder
#[derive(Debug, Clone)]
pub struct TierLadder {
    /// Sorted by `min_score`, highest first
    bands: Vec<TierBand>,
}

impl TierLadder {
    /// Build a ladder, validating that bands cover [0, 100] without overlap.
    pub fn new(mut bands: Vec<TierBand>) -> Result<Self, LadderError> {
        if bands.is_empty() {
            return Err(LadderError::Empty);
        }

        for band in &bands {
            if !band.min_score.is_finite() || !(0.0..=100.0).contains(&band.min_score) {
                return Err(LadderError::OutOfRange(band.min_score));
            }
        }

        bands.sort_by(|a, b| b.min_score.total_cmp(&a.min_score));

        for pair in bands.windows(2) {
            if pair[0].min_score == pair[1].min_score {
                return Err(LadderError::DuplicateBound(pair[0].min_score));
            }
        }

        let lowest = bands[bands.len() - 1].min_score;
        if lowest != 0.0 {
            return Err(LadderError::NotExhaustive(lowest));
        }

        Ok(Self { bands })
    }

    pub fn bands(&self) -> &[TierBand] {
        &self.bands
    }

    /// Map a probability to a tier: highest band first, first `>=` match wins.
    ///
    /// The probability is clamped to [0, 1] and rescaled to a 0-100
    /// percentage with two decimals, which is what the bands are compared
    /// against. The reported integer score is that percentage floored, so it
    /// never lies above the matched band. A NaN probability is treated as 0.
    pub fn map_tier(&self, probability: f64) -> RiskAssessment {
        let probability = if probability.is_nan() {
            0.0
        } else {
            probability.clamp(0.0, 1.0)
        };
        let percent = (probability * 10_000.0).round() / 100.0;
        let score = percent.floor() as u8;

        let band = self
            .bands
            .iter()
            .find(|band| percent >= band.min_score)
            .unwrap_or(&self.bands[self.bands.len() - 1]);

        RiskAssessment {
            probability,
            score,
            tier: band.tier,
            action: band.action.clone(),
        }
    }
}

impl Default for TierLadder {
    fn default() -> Self {
        Self {
            bands: default_trust_bands(),
        }
    }
}

/// The six-tier trust ladder
pub fn default_trust_bands() -> Vec<TierBand> {
    vec![
        TierBand::new(90.0, RiskTier::VerySafe, "Trusted & legitimate. No action needed."),
        TierBand::new(75.0, RiskTier::MostlySafe, "Likely legitimate. Review if necessary."),
        TierBand::new(50.0, RiskTier::Suspicious, "Potential risk detected. Monitor closely."),
        TierBand::new(30.0, RiskTier::HighRisk, "Likely fraudulent. Manual review advised."),
        TierBand::new(
            10.0,
            RiskTier::Dangerous,
            "Strong fraud indicators. Block or investigate immediately.",
        ),
        TierBand::new(
            0.0,
            RiskTier::CriticalFraud,
            "Confirmed scam/phishing. Immediate action required.",
        ),
    ]
}

/// Binary split: positive when the probability is strictly above the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BinaryThreshold {
    pub threshold: f64,
}

impl BinaryThreshold {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn is_positive(&self, probability: f64) -> bool {
        probability > self.threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_and_critical_scores() {
        let ladder = TierLadder::default();

        let safe = ladder.map_tier(0.92);
        assert_eq!(safe.score, 92);
        assert_eq!(safe.tier, RiskTier::VerySafe);
        assert_eq!(safe.action, "Trusted & legitimate. No action needed.");

        let critical = ladder.map_tier(0.08);
        assert_eq!(critical.score, 8);
        assert_eq!(critical.tier, RiskTier::CriticalFraud);
        assert_eq!(critical.action, "Confirmed scam/phishing. Immediate action required.");
    }

    #[test]
    fn test_boundaries_are_inclusive() {
        let ladder = TierLadder::default();
        assert_eq!(ladder.map_tier(0.90).tier, RiskTier::VerySafe);
        assert_eq!(ladder.map_tier(0.89).tier, RiskTier::MostlySafe);
        assert_eq!(ladder.map_tier(0.75).tier, RiskTier::MostlySafe);
        assert_eq!(ladder.map_tier(0.50).tier, RiskTier::Suspicious);
        assert_eq!(ladder.map_tier(0.30).tier, RiskTier::HighRisk);
        assert_eq!(ladder.map_tier(0.10).tier, RiskTier::Dangerous);
        assert_eq!(ladder.map_tier(0.09).tier, RiskTier::CriticalFraud);
        assert_eq!(ladder.map_tier(0.0).tier, RiskTier::CriticalFraud);
        assert_eq!(ladder.map_tier(1.0).tier, RiskTier::VerySafe);

        // fractional scores below a bound stay in the lower band
        let almost_safe = ladder.map_tier(0.897);
        assert_eq!(almost_safe.tier, RiskTier::MostlySafe);
        assert_eq!(almost_safe.score, 89);
        assert_eq!(ladder.map_tier(0.8999).tier, RiskTier::MostlySafe);
        let almost_dangerous = ladder.map_tier(0.0951);
        assert_eq!(almost_dangerous.tier, RiskTier::CriticalFraud);
        assert_eq!(almost_dangerous.score, 9);
        assert_eq!(ladder.map_tier(0.2999).tier, RiskTier::Dangerous);
    }

    #[test]
    fn test_score_never_exceeds_band() {
        let ladder = TierLadder::default();
        assert_eq!(ladder.map_tier(0.29).score, 29);
        assert_eq!(ladder.map_tier(0.57).score, 57);
        for step in 0..=10_000 {
            let assessment = ladder.map_tier(step as f64 / 10_000.0);
            let band = ladder
                .bands()
                .iter()
                .find(|band| band.tier == assessment.tier)
                .unwrap();
            assert!(f64::from(assessment.score) >= band.min_score.floor());
            assert_eq!(ladder.map_tier(f64::from(assessment.score) / 100.0).tier, assessment.tier);
        }
    }

    #[test]
    fn test_ladder_is_total_and_monotonic() {
        let ladder = TierLadder::default();
        let order = |tier: RiskTier| match tier {
            RiskTier::CriticalFraud => 0,
            RiskTier::Dangerous => 1,
            RiskTier::HighRisk => 2,
            RiskTier::Suspicious => 3,
            RiskTier::MostlySafe => 4,
            RiskTier::VerySafe => 5,
        };

        let mut previous = 0;
        for step in 0..=10_000 {
            let p = step as f64 / 10_000.0;
            let assessment = ladder.map_tier(p);
            let rank = order(assessment.tier);
            assert!(rank >= previous, "tier decreased at p={p}");
            assert!(assessment.score <= 100);
            previous = rank;
        }
        assert_eq!(previous, 5);
    }

    #[test]
    fn test_out_of_range_probabilities_are_clamped() {
        let ladder = TierLadder::default();
        assert_eq!(ladder.map_tier(1.7).score, 100);
        assert_eq!(ladder.map_tier(-0.2).score, 0);
        assert_eq!(ladder.map_tier(f64::NAN).tier, RiskTier::CriticalFraud);
    }

    #[test]
    fn test_bands_are_sorted_on_construction() {
        let mut bands = default_trust_bands();
        bands.reverse();
        let ladder = TierLadder::new(bands).unwrap();
        assert_eq!(ladder.bands()[0].tier, RiskTier::VerySafe);
        assert_eq!(ladder.map_tier(0.6).tier, RiskTier::Suspicious);
    }

    #[test]
    fn test_invalid_ladders_rejected() {
        assert_eq!(TierLadder::new(vec![]).unwrap_err(), LadderError::Empty);

        let gap = vec![TierBand::new(50.0, RiskTier::VerySafe, "ok")];
        assert_eq!(TierLadder::new(gap).unwrap_err(), LadderError::NotExhaustive(50.0));

        let duplicate = vec![
            TierBand::new(0.0, RiskTier::CriticalFraud, "a"),
            TierBand::new(0.0, RiskTier::Dangerous, "b"),
        ];
        assert_eq!(
            TierLadder::new(duplicate).unwrap_err(),
            LadderError::DuplicateBound(0.0)
        );

        let out_of_range = vec![TierBand::new(120.0, RiskTier::VerySafe, "a")];
        assert_eq!(
            TierLadder::new(out_of_range).unwrap_err(),
            LadderError::OutOfRange(120.0)
        );
    }

    #[test]
    fn test_binary_threshold_is_strict() {
        let split = BinaryThreshold::new(0.35);
        assert!(!split.is_positive(0.35));
        assert!(split.is_positive(0.3501));
        assert!(split.is_positive(17.5 * 0.1));
    }

    #[test]
    fn test_tier_deserializes_from_config_names() {
        let band: TierBand = serde_json::from_str(
            r#"{"min_score": 75.0, "tier": "mostly_safe", "action": "Review"}"#,
        )
        .unwrap();
        assert_eq!(band.tier, RiskTier::MostlySafe);
        assert_eq!(serde_json::to_string(&band.tier).unwrap(), "\"Mostly Safe\"");
    }
}
