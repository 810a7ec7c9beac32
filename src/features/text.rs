//! Text cleaning and TF-IDF vectorization for scam messages

use super::{FeatureSchema, FeatureVector};
use anyhow::{bail, Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

static DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("valid digit pattern"));
static TOKENS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w\w+\b").expect("valid token pattern"));

/// Lower-case, drop digit runs and ASCII punctuation, trim whitespace.
pub fn clean_text(text: &str) -> String {
    let lowered = text.to_lowercase();
    let without_digits = DIGITS.replace_all(&lowered, "");
    let without_punct: String = without_digits
        .chars()
        .filter(|c| !c.is_ascii_punctuation())
        .collect();
    without_punct.trim().to_string()
}

/// Vector normalization applied after weighting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Norm {
    #[default]
    L2,
    L1,
    None,
}

#[derive(Debug, Deserialize)]
struct VectorizerArtifact {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
    #[serde(default)]
    norm: Norm,
    #[serde(default)]
    sublinear_tf: bool,
}

/// Fitted TF-IDF vectorizer: vocabulary, IDF weights and normalization.
#[derive(Debug, Clone)]
pub struct TfidfVectorizer {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
    norm: Norm,
    sublinear_tf: bool,
    schema: FeatureSchema,
}

impl TfidfVectorizer {
    pub fn new(vocabulary: HashMap<String, usize>, idf: Vec<f64>, norm: Norm) -> Result<Self> {
        if vocabulary.len() != idf.len() {
            bail!(
                "Vocabulary has {} terms but {} idf weights",
                vocabulary.len(),
                idf.len()
            );
        }

        let mut terms = vec![String::new(); idf.len()];
        for (term, &index) in &vocabulary {
            let slot = terms
                .get_mut(index)
                .with_context(|| format!("Term {term:?} has out-of-range index {index}"))?;
            if !slot.is_empty() {
                bail!("Vocabulary index {index} is assigned twice");
            }
            *slot = term.clone();
        }

        Ok(Self {
            vocabulary,
            idf,
            norm,
            sublinear_tf: false,
            schema: FeatureSchema::new(terms),
        })
    }

    /// Load a vectorizer exported as JSON
    /// (`{"vocabulary": {term: index}, "idf": [...], "norm": "l2"}`).
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read vectorizer from {}", path.display()))?;
        let artifact: VectorizerArtifact = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse vectorizer {}", path.display()))?;

        let mut vectorizer = Self::new(artifact.vocabulary, artifact.idf, artifact.norm)?;
        vectorizer.sublinear_tf = artifact.sublinear_tf;
        Ok(vectorizer)
    }

    pub fn vocabulary_size(&self) -> usize {
        self.idf.len()
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// Vectorize already-cleaned text. Out-of-vocabulary tokens are ignored.
    pub fn transform(&self, cleaned: &str) -> FeatureVector {
        let mut counts: HashMap<usize, f64> = HashMap::new();
        for token in TOKENS.find_iter(cleaned) {
            if let Some(&index) = self.vocabulary.get(token.as_str()) {
                *counts.entry(index).or_insert(0.0) += 1.0;
            }
        }

        let mut weights: Vec<(usize, f64)> = counts
            .into_iter()
            .map(|(index, tf)| {
                let tf = if self.sublinear_tf { 1.0 + tf.ln() } else { tf };
                (index, tf * self.idf[index])
            })
            .collect();

        let norm = match self.norm {
            Norm::L2 => weights.iter().map(|(_, w)| w * w).sum::<f64>().sqrt(),
            Norm::L1 => weights.iter().map(|(_, w)| w.abs()).sum::<f64>(),
            Norm::None => 1.0,
        };
        if norm > 0.0 {
            for (_, w) in &mut weights {
                *w /= norm;
            }
        }

        let mut vector = FeatureVector::zeroed(&self.schema);
        let values = vector.values_mut();
        for (index, weight) in weights {
            values[index] = weight as f32;
        }
        vector
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn vectorizer() -> TfidfVectorizer {
        let vocabulary = HashMap::from([
            ("win".to_string(), 0),
            ("now".to_string(), 1),
            ("call".to_string(), 2),
            ("prize".to_string(), 3),
        ]);
        TfidfVectorizer::new(vocabulary, vec![2.0, 1.0, 1.0, 3.0], Norm::L2).unwrap()
    }

    #[test]
    fn test_clean_text() {
        assert_eq!(clean_text("WIN $$$ NOW!!! Call 12345"), "win  now call");
        assert_eq!(clean_text("  Hello, World 2024  "), "hello world");
        assert_eq!(clean_text("12345"), "");
    }

    #[test]
    fn test_transform_weights_and_normalizes() {
        let vector = vectorizer().transform("win  now call");
        let values = vector.values();

        // raw weights 2, 1, 1, 0 -> l2 norm sqrt(6)
        let norm = 6.0_f32.sqrt();
        assert!((values[0] - 2.0 / norm).abs() < 1e-6);
        assert!((values[1] - 1.0 / norm).abs() < 1e-6);
        assert!((values[2] - 1.0 / norm).abs() < 1e-6);
        assert_eq!(values[3], 0.0);
    }

    #[test]
    fn test_out_of_vocabulary_text_is_zero() {
        let vector = vectorizer().transform("hello there a");
        assert!(vector.values().iter().all(|&v| v == 0.0));
        assert_eq!(vector.len(), 4);
    }

    #[test]
    fn test_schema_lists_terms_in_index_order() {
        let v = vectorizer();
        assert_eq!(v.schema().columns()[3], "prize");
        assert_eq!(v.vocabulary_size(), 4);
    }

    #[test]
    fn test_rejects_inconsistent_vocabulary() {
        let vocabulary = HashMap::from([("a".to_string(), 0), ("b".to_string(), 5)]);
        assert!(TfidfVectorizer::new(vocabulary, vec![1.0, 1.0], Norm::L2).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"vocabulary": {{"free": 0, "prize": 1}}, "idf": [1.5, 2.5], "norm": "l1"}}"#
        )
        .unwrap();

        let v = TfidfVectorizer::from_file(file.path()).unwrap();
        let vector = v.transform("free prize prize");

        // 1.5 and 5.0 normalized by their sum
        assert!((vector.values()[0] - 1.5 / 6.5).abs() < 1e-6);
        assert!((vector.values()[1] - 5.0 / 6.5).abs() < 1e-6);
    }
}
