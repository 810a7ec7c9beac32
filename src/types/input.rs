//! Raw inputs accepted by the risk engine

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Scalar value of a transaction field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Bool(bool),
    Text(String),
    Null,
}

impl FieldValue {
    /// Textual form used for categorical lookups.
    pub fn as_category(&self) -> Option<String> {
        match self {
            FieldValue::Text(s) => Some(s.clone()),
            FieldValue::Number(n) => Some(format_number(*n)),
            FieldValue::Bool(b) => Some(b.to_string()),
            FieldValue::Null => None,
        }
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

/// Integral floats print without a fraction so `3.0` looks up as `3`.
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.is_finite() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// A transaction as a mapping from field name to scalar value.
pub type TransactionRecord = BTreeMap<String, FieldValue>;

/// Which classifier domain an input belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssessmentDomain {
    Url,
    Transaction,
    Text,
}

impl AssessmentDomain {
    pub const ALL: [AssessmentDomain; 3] = [
        AssessmentDomain::Url,
        AssessmentDomain::Transaction,
        AssessmentDomain::Text,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AssessmentDomain::Url => "url",
            AssessmentDomain::Transaction => "transaction",
            AssessmentDomain::Text => "text",
        }
    }
}

impl fmt::Display for AssessmentDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw input to be scored
#[derive(Debug, Clone, PartialEq)]
pub enum RawInput {
    Transaction(TransactionRecord),
    Url(String),
    TextMessage(String),
}

#[derive(Debug, Deserialize)]
struct UrlRequest {
    url: String,
}

#[derive(Debug, Deserialize)]
struct TextRequest {
    #[serde(alias = "email_text", alias = "message")]
    text: String,
}

impl RawInput {
    pub fn domain(&self) -> AssessmentDomain {
        match self {
            RawInput::Transaction(_) => AssessmentDomain::Transaction,
            RawInput::Url(_) => AssessmentDomain::Url,
            RawInput::TextMessage(_) => AssessmentDomain::Text,
        }
    }

    /// Decode a JSON request body for the given domain.
    pub fn from_json(domain: AssessmentDomain, payload: &[u8]) -> Result<Self> {
        match domain {
            AssessmentDomain::Url => {
                let request: UrlRequest =
                    serde_json::from_slice(payload).context("Invalid URL request")?;
                Ok(RawInput::Url(request.url))
            }
            AssessmentDomain::Transaction => {
                let record: TransactionRecord =
                    serde_json::from_slice(payload).context("Invalid transaction request")?;
                Ok(RawInput::Transaction(record))
            }
            AssessmentDomain::Text => {
                let request: TextRequest =
                    serde_json::from_slice(payload).context("Invalid text request")?;
                Ok(RawInput::TextMessage(request.text))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_record_deserialization() {
        let json = r#"{
            "Transaction_Amount": 200.0,
            "Account_Type": "Savings",
            "Is_International": true,
            "Merchant_ID": null
        }"#;

        let input = RawInput::from_json(AssessmentDomain::Transaction, json.as_bytes()).unwrap();
        let RawInput::Transaction(record) = input else {
            panic!("expected transaction");
        };

        assert_eq!(record["Transaction_Amount"], FieldValue::Number(200.0));
        assert_eq!(record["Account_Type"], FieldValue::Text("Savings".to_string()));
        assert_eq!(record["Is_International"], FieldValue::Bool(true));
        assert_eq!(record["Merchant_ID"], FieldValue::Null);
    }

    #[test]
    fn test_text_request_aliases() {
        let input =
            RawInput::from_json(AssessmentDomain::Text, br#"{"email_text": "hello"}"#).unwrap();
        assert_eq!(input, RawInput::TextMessage("hello".to_string()));
        assert_eq!(input.domain(), AssessmentDomain::Text);
    }

    #[test]
    fn test_malformed_url_request() {
        assert!(RawInput::from_json(AssessmentDomain::Url, b"{\"link\": 1}").is_err());
    }

    #[test]
    fn test_category_text_of_numbers() {
        assert_eq!(FieldValue::Number(3.0).as_category().as_deref(), Some("3"));
        assert_eq!(FieldValue::Number(2.5).as_category().as_deref(), Some("2.5"));
        assert_eq!(FieldValue::Null.as_category(), None);
    }
}
