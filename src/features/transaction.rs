//! Transaction fraud feature extraction
//!
//! Mirrors the preprocessing the fraud classifier was trained with:
//! day-of-week from the transaction date, identifying fields removed,
//! currency and device risk multipliers and their interaction.

use super::{FeatureMap, FeatureValue};
use crate::diagnostics::Diagnostic;
use crate::types::{FieldValue, TransactionRecord};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const CURRENCY_FIELD: &str = "Transaction_Currency";
pub const DEVICE_FIELD: &str = "Device_Type";
pub const DATE_FIELD: &str = "Transaction_Date";
pub const DAY_FEATURE: &str = "Transaction_Day";
pub const CURRENCY_RISK_FEATURE: &str = "Currency_Risk";
pub const DEVICE_RISK_FEATURE: &str = "Device_Risk";
pub const INTERACTION_FEATURE: &str = "Currency_Device_Interaction";
pub const CURRENCY_ENCODED_FEATURE: &str = "Transaction_Currency_Encoded";
pub const DEVICE_ENCODED_FEATURE: &str = "Device_Type_Encoded";

/// Multiplier for currencies and devices missing from the tables
pub const DEFAULT_MULTIPLIER: f64 = 1.0;

/// Fields that identify a customer or location and never reach the model
pub const DEFAULT_EXCLUDED_FIELDS: &[&str] = &[
    "Transaction_ID",
    "Customer_ID",
    "Transaction_Date",
    "City",
    "Bank_Branch",
    "Customer_Name",
    "Customer_Contact",
    "Customer_Email",
    "Transaction_Location",
    "State",
    "Age",
    "Gender",
];

/// Day-first formats accepted for `Transaction_Date`
const DATE_FORMATS: &[&str] = &["%d-%m-%Y", "%d/%m/%Y", "%Y-%m-%d", "%d.%m.%Y"];
const DATETIME_FORMATS: &[&str] = &[
    "%d-%m-%Y %H:%M:%S",
    "%d-%m-%Y %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
];

/// One row of a risk multiplier table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskEntry {
    pub key: String,
    pub multiplier: f64,
}

impl RiskEntry {
    pub fn new(key: &str, multiplier: f64) -> Self {
        Self {
            key: key.to_string(),
            multiplier,
        }
    }
}

/// Static currency and device risk multipliers
#[derive(Debug, Clone, PartialEq)]
pub struct RiskTables {
    currency: HashMap<String, f64>,
    device: HashMap<String, f64>,
}

impl RiskTables {
    pub fn new(currency: &[RiskEntry], device: &[RiskEntry]) -> Self {
        let table = |entries: &[RiskEntry]| {
            entries
                .iter()
                .map(|e| (e.key.clone(), e.multiplier))
                .collect::<HashMap<_, _>>()
        };
        Self {
            currency: table(currency),
            device: table(device),
        }
    }

    pub fn currency_risk(&self, currency: Option<&str>) -> f64 {
        currency
            .and_then(|c| self.currency.get(c))
            .copied()
            .unwrap_or(DEFAULT_MULTIPLIER)
    }

    pub fn device_risk(&self, device: Option<&str>) -> f64 {
        device
            .and_then(|d| self.device.get(d))
            .copied()
            .unwrap_or(DEFAULT_MULTIPLIER)
    }
}

impl Default for RiskTables {
    fn default() -> Self {
        Self::new(&default_currency_risk(), &default_device_risk())
    }
}

pub fn default_currency_risk() -> Vec<RiskEntry> {
    vec![
        RiskEntry::new("Bitcoin", 5.0),
        RiskEntry::new("USD", 1.0),
        RiskEntry::new("EUR", 1.5),
        RiskEntry::new("INR", 0.8),
        RiskEntry::new("GBP", 1.7),
        RiskEntry::new("JPY", 1.8),
    ]
}

pub fn default_device_risk() -> Vec<RiskEntry> {
    vec![
        RiskEntry::new("Unregistered", 3.5),
        RiskEntry::new("Unknown", 3.0),
        RiskEntry::new("Web Browser", 1.5),
        RiskEntry::new("Android App", 1.2),
        RiskEntry::new("iOS App", 1.0),
    ]
}

/// Parse a transaction timestamp and return its weekday, Monday = 0.
pub fn day_of_week(value: &FieldValue) -> Option<u32> {
    let weekday = match value {
        FieldValue::Number(secs) if secs.is_finite() => {
            DateTime::from_timestamp(*secs as i64, 0)?.weekday()
        }
        FieldValue::Text(text) => parse_date(text.trim())?,
        _ => return None,
    };
    Some(weekday.num_days_from_monday())
}

fn parse_date(text: &str) -> Option<Weekday> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.weekday());
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt.weekday());
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return Some(date.weekday());
        }
    }
    None
}

/// Features extracted from one transaction
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionFeatures {
    pub features: FeatureMap,
    /// Currency x device interaction, applied to the model probability
    pub risk_multiplier: f64,
    pub diagnostics: Vec<Diagnostic>,
}

/// Extracts transaction fraud features
#[derive(Debug, Clone)]
pub struct TransactionFeatureExtractor {
    tables: RiskTables,
    excluded_fields: Vec<String>,
}

impl TransactionFeatureExtractor {
    pub fn new(tables: RiskTables, excluded_fields: Vec<String>) -> Self {
        Self {
            tables,
            excluded_fields,
        }
    }

    pub fn tables(&self) -> &RiskTables {
        &self.tables
    }

    pub fn extract(&self, record: &TransactionRecord) -> TransactionFeatures {
        let mut diagnostics = Vec::new();
        let mut features = FeatureMap::new();

        for (name, value) in record {
            if self.excluded_fields.iter().any(|f| f == name) {
                continue;
            }
            let value = match value {
                FieldValue::Number(n) => FeatureValue::Numeric(*n),
                FieldValue::Bool(b) => FeatureValue::Numeric(if *b { 1.0 } else { 0.0 }),
                FieldValue::Text(s) => FeatureValue::Categorical(s.clone()),
                FieldValue::Null => FeatureValue::Missing,
            };
            features.insert(name.clone(), value);
        }

        match record.get(DATE_FIELD) {
            None | Some(FieldValue::Null) => {}
            Some(value) => match day_of_week(value) {
                Some(day) => {
                    features.insert(DAY_FEATURE.to_string(), FeatureValue::Numeric(day as f64));
                }
                None => diagnostics.push(Diagnostic::FieldUnparseable {
                    field: DATE_FIELD.to_string(),
                    value: value.as_category().unwrap_or_default(),
                }),
            },
        }

        let currency = text_field(record, CURRENCY_FIELD);
        let device = text_field(record, DEVICE_FIELD);
        let currency_risk = self.tables.currency_risk(currency.as_deref());
        let device_risk = self.tables.device_risk(device.as_deref());
        let risk_multiplier = currency_risk * device_risk;

        features.insert(
            CURRENCY_RISK_FEATURE.to_string(),
            FeatureValue::Numeric(currency_risk),
        );
        features.insert(
            DEVICE_RISK_FEATURE.to_string(),
            FeatureValue::Numeric(device_risk),
        );
        features.insert(
            INTERACTION_FEATURE.to_string(),
            FeatureValue::Numeric(risk_multiplier),
        );

        // Label-encoded copies of the raw strings
        if let Some(currency) = currency {
            features.insert(
                CURRENCY_ENCODED_FEATURE.to_string(),
                FeatureValue::Categorical(currency),
            );
        }
        if let Some(device) = device {
            features.insert(
                DEVICE_ENCODED_FEATURE.to_string(),
                FeatureValue::Categorical(device),
            );
        }

        TransactionFeatures {
            features,
            risk_multiplier,
            diagnostics,
        }
    }
}

impl Default for TransactionFeatureExtractor {
    fn default() -> Self {
        Self::new(
            RiskTables::default(),
            DEFAULT_EXCLUDED_FIELDS.iter().map(|s| s.to_string()).collect(),
        )
    }
}

fn text_field(record: &TransactionRecord, name: &str) -> Option<String> {
    record.get(name).and_then(FieldValue::as_category)
}
