//! Categorical encoding with training-time label encoders

use crate::diagnostics::Diagnostic;
use crate::features::{FeatureMap, FeatureValue};
use crate::types::FieldValue;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};

/// Code assigned to any category not seen at training time.
pub const UNKNOWN_CODE: i64 = -1;

/// Outcome of a single lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoded {
    Known(i64),
    Unseen,
    MissingColumn,
}

impl Encoded {
    pub fn code(self) -> i64 {
        match self {
            Encoded::Known(code) => code,
            Encoded::Unseen | Encoded::MissingColumn => UNKNOWN_CODE,
        }
    }
}

/// Per-column category → code tables, fit once during training.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EncoderTable {
    columns: BTreeMap<String, HashMap<String, i64>>,
}

impl EncoderTable {
    /// Build from the class list of each encoded column; a class's code is
    /// its index in the sorted list.
    pub fn from_classes(classes: BTreeMap<String, Vec<String>>) -> Self {
        let columns = classes
            .into_iter()
            .map(|(column, mut values)| {
                values.sort();
                values.dedup();
                let codes = values
                    .into_iter()
                    .enumerate()
                    .map(|(code, value)| (value, code as i64))
                    .collect();
                (column, codes)
            })
            .collect();
        Self { columns }
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Names of all encoded columns
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.contains_key(column)
    }

    /// Look up `value` in `column`. Total: never fails.
    pub fn encode(&self, column: &str, value: Option<&str>) -> Encoded {
        let Some(value) = value else {
            return Encoded::MissingColumn;
        };
        match self.columns.get(column).and_then(|codes| codes.get(value)) {
            Some(&code) => Encoded::Known(code),
            None => Encoded::Unseen,
        }
    }

    /// Replace every encoded column of `features` with its code.
    ///
    /// Columns absent from the input are inserted with [`UNKNOWN_CODE`].
    pub fn apply(&self, features: &mut FeatureMap) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();

        for column in self.columns.keys() {
            let raw = match features.get(column) {
                None => None,
                Some(FeatureValue::Missing) => Some(None),
                Some(FeatureValue::Categorical(s)) => Some(Some(s.clone())),
                Some(FeatureValue::Numeric(n)) => FieldValue::Number(*n).as_category().map(Some),
            };

            let code = match raw {
                None => {
                    diagnostics.push(Diagnostic::MissingCategory {
                        column: column.clone(),
                    });
                    UNKNOWN_CODE
                }
                Some(value) => {
                    let encoded = self.encode(column, value.as_deref());
                    if !matches!(encoded, Encoded::Known(_)) {
                        diagnostics.push(Diagnostic::UnseenCategory {
                            column: column.clone(),
                            value: value.unwrap_or_else(|| "null".to_string()),
                        });
                    }
                    encoded.code()
                }
            };

            features.insert(column.clone(), FeatureValue::Numeric(code as f64));
        }

        diagnostics
    }
}

impl<'de> Deserialize<'de> for EncoderTable {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let classes = BTreeMap::<String, Vec<String>>::deserialize(deserializer)?;
        Ok(EncoderTable::from_classes(classes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> EncoderTable {
        let mut classes = BTreeMap::new();
        classes.insert(
            "Account_Type".to_string(),
            vec!["Business".to_string(), "Checking".to_string(), "Savings".to_string()],
        );
        classes.insert(
            "Device_Type".to_string(),
            vec!["Android App".to_string(), "iOS App".to_string()],
        );
        EncoderTable::from_classes(classes)
    }

    #[test]
    fn test_known_values_use_trained_codes() {
        let table = table();
        assert_eq!(table.encode("Account_Type", Some("Checking")), Encoded::Known(1));
        assert_eq!(table.encode("Device_Type", Some("iOS App")), Encoded::Known(1));
    }

    #[test]
    fn test_unseen_values_use_sentinel() {
        let table = table();
        for value in ["Crypto Wallet", "", "savings", "Checking "] {
            let encoded = table.encode("Account_Type", Some(value));
            assert_eq!(encoded, Encoded::Unseen);
            assert_eq!(encoded.code(), UNKNOWN_CODE);
        }
        assert_eq!(table.encode("No_Such_Column", Some("x")).code(), UNKNOWN_CODE);
        assert_eq!(table.encode("Account_Type", None), Encoded::MissingColumn);
    }

    #[test]
    fn test_apply_fills_missing_and_reports() {
        let table = table();
        let mut features = FeatureMap::new();
        features.insert(
            "Account_Type".to_string(),
            FeatureValue::Categorical("Savings".to_string()),
        );
        features.insert("Transaction_Amount".to_string(), FeatureValue::Numeric(200.0));

        let diagnostics = table.apply(&mut features);

        assert_eq!(features["Account_Type"], FeatureValue::Numeric(2.0));
        assert_eq!(features["Device_Type"], FeatureValue::Numeric(-1.0));
        assert_eq!(features["Transaction_Amount"], FeatureValue::Numeric(200.0));
        assert_eq!(
            diagnostics,
            vec![Diagnostic::MissingCategory {
                column: "Device_Type".to_string()
            }]
        );
    }

    #[test]
    fn test_apply_reports_unseen_and_null() {
        let table = table();
        let mut features = FeatureMap::new();
        features.insert(
            "Account_Type".to_string(),
            FeatureValue::Categorical("Offshore".to_string()),
        );
        features.insert("Device_Type".to_string(), FeatureValue::Missing);

        let diagnostics = table.apply(&mut features);

        assert_eq!(features["Account_Type"], FeatureValue::Numeric(-1.0));
        assert_eq!(features["Device_Type"], FeatureValue::Numeric(-1.0));
        assert_eq!(diagnostics.len(), 2);
        assert!(diagnostics.iter().all(|d| d.kind() == "unseen_category"));
    }

    #[test]
    fn test_deserializes_from_class_lists() {
        let table: EncoderTable =
            serde_json::from_str(r#"{"Merchant_Category": ["Cryptocurrency", "Grocery"]}"#).unwrap();
        assert_eq!(table.encode("Merchant_Category", Some("Grocery")), Encoded::Known(1));
        assert!(table.has_column("Merchant_Category"));
    }
}
