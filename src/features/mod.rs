//! Feature extraction, schema and alignment
//!
//! Extractors turn a raw input into a named [`FeatureMap`]. The map is then
//! label-encoded and aligned against the frozen training [`FeatureSchema`]
//! to produce the [`FeatureVector`] a classifier consumes.

pub mod align;
pub mod probe;
pub mod text;
pub mod transaction;
pub mod url;

use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;

pub use align::align;
pub use probe::{HttpProbes, ProbeBackend, ProbeError, ProbeKind, ProbeRunner};
pub use text::{clean_text, TfidfVectorizer};
pub use transaction::{RiskTables, TransactionFeatureExtractor};
pub use url::{UrlFeatureExtractor, URL_FEATURE_LAYOUT};

/// Value of one extracted feature before encoding.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureValue {
    Numeric(f64),
    Categorical(String),
    /// Present in the input but null
    Missing,
}

/// Named features produced by an extractor.
pub type FeatureMap = BTreeMap<String, FeatureValue>;

/// Ordered column names a classifier was trained on.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSchema {
    columns: Arc<[String]>,
}

impl FeatureSchema {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
}

impl<'de> Deserialize<'de> for FeatureSchema {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let columns = Vec::<String>::deserialize(deserializer)?;
        Ok(FeatureSchema::new(columns))
    }
}

/// Fixed-order numeric input for a classifier.
///
/// Always produced from a [`FeatureSchema`], so its length and order match
/// the training columns.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    schema: FeatureSchema,
    values: Vec<f32>,
}

impl FeatureVector {
    /// Zeroed vector for a schema
    pub fn zeroed(schema: &FeatureSchema) -> Self {
        Self {
            schema: schema.clone(),
            values: vec![0.0; schema.len()],
        }
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut [f32] {
        &mut self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value of a named column, if the schema has it
    pub fn get(&self, name: &str) -> Option<f32> {
        self.schema.position(name).map(|i| self.values[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zeroed_vector_matches_schema() {
        let schema = FeatureSchema::new(["a", "b", "c"]);
        let vector = FeatureVector::zeroed(&schema);

        assert_eq!(vector.len(), 3);
        assert_eq!(vector.get("b"), Some(0.0));
        assert_eq!(vector.get("z"), None);
    }

    #[test]
    fn test_schema_deserializes_from_list() {
        let schema: FeatureSchema = serde_json::from_str(r#"["x", "y"]"#).unwrap();
        assert_eq!(schema.columns(), &["x".to_string(), "y".to_string()]);
        assert_eq!(schema.position("y"), Some(1));
    }
}
