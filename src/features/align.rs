//! Column alignment against the frozen training schema

use super::{FeatureMap, FeatureSchema, FeatureValue, FeatureVector};
use crate::diagnostics::Diagnostic;

/// Default for an expected column the extractor did not produce.
pub const MISSING_COLUMN_DEFAULT: f32 = 0.0;

/// Reorder `features` into the schema's column order.
///
/// Expected columns absent from the map are filled with
/// [`MISSING_COLUMN_DEFAULT`] and reported; columns the schema does not
/// know are dropped.
pub fn align(features: &FeatureMap, schema: &FeatureSchema) -> (FeatureVector, Vec<Diagnostic>) {
    let mut vector = FeatureVector::zeroed(schema);
    let mut diagnostics = Vec::new();

    for (slot, column) in vector.values_mut().iter_mut().zip(schema.columns()) {
        *slot = match features.get(column) {
            Some(FeatureValue::Numeric(value)) => *value as f32,
            Some(FeatureValue::Categorical(text)) => match text.trim().parse::<f64>() {
                Ok(value) => value as f32,
                Err(_) => {
                    diagnostics.push(Diagnostic::FieldUnparseable {
                        field: column.clone(),
                        value: text.clone(),
                    });
                    MISSING_COLUMN_DEFAULT
                }
            },
            Some(FeatureValue::Missing) | None => {
                diagnostics.push(Diagnostic::MissingColumn {
                    column: column.clone(),
                });
                MISSING_COLUMN_DEFAULT
            }
        };
    }

    (vector, diagnostics)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> FeatureSchema {
        FeatureSchema::new([
            "Transaction_Amount",
            "Account_Balance",
            "Transaction_Time",
            "Account_Type",
        ])
    }

    #[test]
    fn test_reorders_to_schema() {
        let mut features = FeatureMap::new();
        features.insert("Account_Type".to_string(), FeatureValue::Numeric(2.0));
        features.insert("Transaction_Time".to_string(), FeatureValue::Numeric(14.0));
        features.insert("Account_Balance".to_string(), FeatureValue::Numeric(5000.0));
        features.insert("Transaction_Amount".to_string(), FeatureValue::Numeric(200.0));

        let (vector, diagnostics) = align(&features, &schema());

        assert_eq!(vector.values(), &[200.0, 5000.0, 14.0, 2.0]);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_missing_columns_default_to_zero() {
        let mut features = FeatureMap::new();
        features.insert("Transaction_Amount".to_string(), FeatureValue::Numeric(9500.0));
        features.insert("Account_Type".to_string(), FeatureValue::Numeric(-1.0));

        let (vector, diagnostics) = align(&features, &schema());

        assert_eq!(vector.len(), 4);
        assert_eq!(vector.values(), &[9500.0, 0.0, 0.0, -1.0]);
        assert_eq!(
            diagnostics,
            vec![
                Diagnostic::MissingColumn {
                    column: "Account_Balance".to_string()
                },
                Diagnostic::MissingColumn {
                    column: "Transaction_Time".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_unknown_columns_dropped_silently() {
        let mut features = FeatureMap::new();
        for column in schema().columns() {
            features.insert(column.clone(), FeatureValue::Numeric(1.0));
        }
        features.insert("Customer_Email".to_string(), FeatureValue::Numeric(7.0));

        let (vector, diagnostics) = align(&features, &schema());

        assert_eq!(vector.values(), &[1.0, 1.0, 1.0, 1.0]);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_textual_numbers_are_parsed() {
        let mut features = FeatureMap::new();
        features.insert(
            "Transaction_Amount".to_string(),
            FeatureValue::Categorical(" 250.5 ".to_string()),
        );
        features.insert(
            "Account_Balance".to_string(),
            FeatureValue::Categorical("lots".to_string()),
        );

        let (vector, diagnostics) = align(&features, &schema());

        assert_eq!(vector.get("Transaction_Amount"), Some(250.5));
        assert_eq!(vector.get("Account_Balance"), Some(0.0));
        assert!(diagnostics.contains(&Diagnostic::FieldUnparseable {
            field: "Account_Balance".to_string(),
            value: "lots".to_string(),
        }));
    }
}
