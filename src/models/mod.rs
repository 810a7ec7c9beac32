//! Classifier adapters and model loading

pub mod loader;
pub mod naive_bayes;
pub mod onnx;

use crate::features::FeatureVector;
use anyhow::Result;

pub use loader::{ArtifactError, DomainModel, ModelLoader, ModelSet, TrainedSchema};
pub use naive_bayes::NaiveBayesClassifier;
pub use onnx::OnnxClassifier;

/// Uniform contract over every trained classifier.
///
/// Implementations are immutable after loading; the returned probability
/// is the positive-class probability in [0, 1].
pub trait ProbabilityModel: Send + Sync {
    fn name(&self) -> &str;

    fn predict_probability(&self, features: &FeatureVector) -> Result<f64>;
}

/// Reject non-finite outputs and clamp the rest into [0, 1].
pub(crate) fn checked_probability(model: &str, probability: f64) -> Result<f64> {
    if !probability.is_finite() {
        anyhow::bail!("Model {} produced non-finite probability {}", model, probability);
    }
    Ok(probability.clamp(0.0, 1.0))
}
