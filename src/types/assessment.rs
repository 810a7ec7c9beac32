//! Result records returned by the risk engine

use crate::diagnostics::Diagnostic;
use crate::risk::{RiskAssessment, RiskTier};
use serde::Serialize;

/// URL trust result: `{trust_score, risk_level, action}`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UrlAssessment {
    /// Trust score (0 - 100, higher = safer)
    pub trust_score: u8,
    pub risk_level: RiskTier,
    pub action: String,
    /// Classifier probability before rescaling
    #[serde(skip)]
    pub probability: f64,
    #[serde(skip)]
    pub diagnostics: Vec<Diagnostic>,
}

impl UrlAssessment {
    pub fn from_tier(assessment: RiskAssessment, diagnostics: Vec<Diagnostic>) -> Self {
        Self {
            trust_score: assessment.score,
            risk_level: assessment.tier,
            action: assessment.action,
            probability: assessment.probability,
            diagnostics,
        }
    }
}

/// Transaction fraud verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TransactionStatus {
    Fraudulent,
    Legitimate,
}

/// Transaction result: `{status}`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionAssessment {
    pub status: TransactionStatus,
    /// Raw classifier probability
    #[serde(skip)]
    pub model_probability: f64,
    /// Currency x device interaction multiplier applied before thresholding
    #[serde(skip)]
    pub risk_multiplier: f64,
    /// Scaled probability that was compared with the threshold (may exceed 1.0)
    #[serde(skip)]
    pub fraud_score: f64,
    #[serde(skip)]
    pub diagnostics: Vec<Diagnostic>,
}

/// Text scam verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TextVerdict {
    Spam,
    #[serde(rename = "Not Spam")]
    NotSpam,
}

/// Text result: `{result}`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextAssessment {
    pub result: TextVerdict,
    #[serde(skip)]
    pub probability: f64,
    #[serde(skip)]
    pub diagnostics: Vec<Diagnostic>,
}

/// Any of the three result records
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Assessment {
    Url(UrlAssessment),
    Transaction(TransactionAssessment),
    Text(TextAssessment),
}

impl Assessment {
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            Assessment::Url(a) => &a.diagnostics,
            Assessment::Transaction(a) => &a.diagnostics,
            Assessment::Text(a) => &a.diagnostics,
        }
    }

    /// Probability on the [0, 1] scale, for metrics bucketing
    pub fn probability(&self) -> f64 {
        match self {
            Assessment::Url(a) => a.probability,
            Assessment::Transaction(a) => a.model_probability,
            Assessment::Text(a) => a.probability,
        }
    }

    /// Verdict label (tier name, status or spam result)
    pub fn label(&self) -> &'static str {
        match self {
            Assessment::Url(a) => a.risk_level.label(),
            Assessment::Transaction(a) => match a.status {
                TransactionStatus::Fraudulent => "Fraudulent",
                TransactionStatus::Legitimate => "Legitimate",
            },
            Assessment::Text(a) => match a.result {
                TextVerdict::Spam => "Spam",
                TextVerdict::NotSpam => "Not Spam",
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::risk::TierLadder;

    #[test]
    fn test_url_assessment_serialization() {
        let assessment = UrlAssessment::from_tier(TierLadder::default().map_tier(0.92), vec![]);
        let json = serde_json::to_value(Assessment::Url(assessment)).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "trust_score": 92,
                "risk_level": "Very Safe",
                "action": "Trusted & legitimate. No action needed."
            })
        );
    }

    #[test]
    fn test_transaction_and_text_serialization() {
        let tx = TransactionAssessment {
            status: TransactionStatus::Fraudulent,
            model_probability: 0.1,
            risk_multiplier: 17.5,
            fraud_score: 1.75,
            diagnostics: vec![],
        };
        assert_eq!(
            serde_json::to_string(&tx).unwrap(),
            r#"{"status":"Fraudulent"}"#
        );

        let text = TextAssessment {
            result: TextVerdict::NotSpam,
            probability: 0.2,
            diagnostics: vec![],
        };
        assert_eq!(
            serde_json::to_string(&Assessment::Text(text)).unwrap(),
            r#"{"result":"Not Spam"}"#
        );
    }
}
