//! Model artifact loader
//!
//! Every classifier, schema and vectorizer is loaded once at startup.
//! A missing or inconsistent artifact is fatal.

use super::{NaiveBayesClassifier, OnnxClassifier, ProbabilityModel};
use crate::config::ModelsConfig;
use crate::encoding::EncoderTable;
use crate::features::{FeatureSchema, TfidfVectorizer, URL_FEATURE_LAYOUT};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Structural problems with the artifacts on disk
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("artifact not found: {}", .0.display())]
    Missing(PathBuf),

    #[error("{artifact} expects {expected} features but {source_name} provides {actual}")]
    WidthMismatch {
        artifact: String,
        source_name: String,
        expected: usize,
        actual: usize,
    },
}

/// Frozen training columns plus the label encoders fitted on them
#[derive(Debug, Clone, Deserialize)]
pub struct TrainedSchema {
    #[serde(rename = "columns")]
    pub schema: FeatureSchema,
    #[serde(default)]
    pub encoders: EncoderTable,
}

impl TrainedSchema {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read schema from {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse schema {}", path.display()))
    }

    /// Built-in 30-column URL layout, no categorical columns
    pub fn url_layout() -> Self {
        Self {
            schema: FeatureSchema::new(URL_FEATURE_LAYOUT.iter().copied()),
            encoders: EncoderTable::default(),
        }
    }
}

/// A tabular classifier with its training schema
#[derive(Clone)]
pub struct DomainModel {
    pub model: Arc<dyn ProbabilityModel>,
    pub schema: FeatureSchema,
    pub encoders: EncoderTable,
}

impl DomainModel {
    pub fn new(model: Arc<dyn ProbabilityModel>, trained: TrainedSchema) -> Self {
        Self {
            model,
            schema: trained.schema,
            encoders: trained.encoders,
        }
    }
}

/// Everything the engine needs to score all three domains
#[derive(Clone)]
pub struct ModelSet {
    pub url: DomainModel,
    pub transaction: DomainModel,
    pub text_vectorizer: TfidfVectorizer,
    pub text_model: Arc<dyn ProbabilityModel>,
}

/// Loader for ONNX and JSON model artifacts
pub struct ModelLoader {
    /// Number of threads for ONNX inference
    onnx_threads: usize,
}

impl ModelLoader {
    /// Create a new model loader with the given ONNX thread count
    pub fn with_threads(onnx_threads: usize) -> Result<Self> {
        ort::init().commit()?;
        info!(onnx_threads = onnx_threads, "ONNX Runtime initialized");
        Ok(Self { onnx_threads })
    }

    /// Load all artifacts named by the configuration
    pub fn load_models(&self, config: &ModelsConfig) -> Result<ModelSet> {
        let models_dir = Path::new(&config.models_dir);

        let url_schema = match &config.url_schema {
            Some(file) => TrainedSchema::from_file(existing(models_dir, file)?)?,
            None => TrainedSchema::url_layout(),
        };
        let url_model = OnnxClassifier::load(
            existing(models_dir, &config.url_model)?,
            "url_trust",
            self.onnx_threads,
        )?;

        let transaction_schema =
            TrainedSchema::from_file(existing(models_dir, &config.transaction_schema)?)?;
        let transaction_model = OnnxClassifier::load(
            existing(models_dir, &config.transaction_model)?,
            "transaction_fraud",
            self.onnx_threads,
        )?;

        let text_vectorizer =
            TfidfVectorizer::from_file(existing(models_dir, &config.text_vectorizer)?)?;
        let text_model = NaiveBayesClassifier::from_file(
            existing(models_dir, &config.text_model)?,
            "text_spam",
        )?;
        if text_model.feature_count() != text_vectorizer.vocabulary_size() {
            return Err(ArtifactError::WidthMismatch {
                artifact: config.text_model.clone(),
                source_name: config.text_vectorizer.clone(),
                expected: text_model.feature_count(),
                actual: text_vectorizer.vocabulary_size(),
            }
            .into());
        }

        info!(
            url_columns = url_schema.schema.len(),
            transaction_columns = transaction_schema.schema.len(),
            transaction_encoders = transaction_schema.encoders.column_names().count(),
            vocabulary = text_vectorizer.vocabulary_size(),
            "Loaded models from {}",
            models_dir.display()
        );

        Ok(ModelSet {
            url: DomainModel::new(Arc::new(url_model), url_schema),
            transaction: DomainModel::new(Arc::new(transaction_model), transaction_schema),
            text_vectorizer,
            text_model: Arc::new(text_model),
        })
    }
}

impl Default for ModelLoader {
    fn default() -> Self {
        Self { onnx_threads: 1 }
    }
}

fn existing(dir: &Path, file: &str) -> Result<PathBuf, ArtifactError> {
    let path = dir.join(file);
    if path.exists() {
        Ok(path)
    } else {
        Err(ArtifactError::Missing(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_schema_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"columns": ["Transaction_Amount", "Account_Type", "Currency_Risk"],
                "encoders": {{"Account_Type": ["Savings", "Checking"]}}}}"#
        )
        .unwrap();

        let trained = TrainedSchema::from_file(file.path()).unwrap();
        assert_eq!(trained.schema.len(), 3);
        assert_eq!(trained.schema.position("Currency_Risk"), Some(2));
        // classes are sorted: Checking=0, Savings=1
        assert_eq!(
            trained.encoders.encode("Account_Type", Some("Savings")).code(),
            1
        );
    }

    #[test]
    fn test_schema_without_encoders() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"columns": ["a", "b"]}}"#).unwrap();

        let trained = TrainedSchema::from_file(file.path()).unwrap();
        assert!(trained.encoders.is_empty());
    }

    #[test]
    fn test_url_layout() {
        let trained = TrainedSchema::url_layout();
        assert_eq!(trained.schema.len(), 30);
        assert!(trained.encoders.is_empty());
    }

    #[test]
    fn test_missing_artifact_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let config = ModelsConfig {
            models_dir: dir.path().to_string_lossy().into_owned(),
            ..ModelsConfig::default()
        };

        let err = match ModelLoader::default().load_models(&config) {
            Ok(_) => panic!("loading from an empty directory should fail"),
            Err(e) => e,
        };
        assert!(matches!(
            err.downcast_ref::<ArtifactError>(),
            Some(ArtifactError::Missing(_))
        ));
    }
}
