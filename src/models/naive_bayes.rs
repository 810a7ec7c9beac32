//! Multinomial naive Bayes text classifier

use super::{checked_probability, ProbabilityModel};
use crate::features::FeatureVector;
use anyhow::{bail, ensure, Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct NaiveBayesArtifact {
    class_log_prior: Vec<f64>,
    feature_log_prob: Vec<Vec<f64>>,
    #[serde(default = "default_positive_class")]
    positive_class: usize,
}

fn default_positive_class() -> usize {
    1
}

/// Fitted multinomial naive Bayes: per-class log priors and per-class
/// feature log probabilities.
#[derive(Debug, Clone)]
pub struct NaiveBayesClassifier {
    name: String,
    class_log_prior: Vec<f64>,
    feature_log_prob: Vec<Vec<f64>>,
    positive_class: usize,
}

impl NaiveBayesClassifier {
    pub fn new(
        name: &str,
        class_log_prior: Vec<f64>,
        feature_log_prob: Vec<Vec<f64>>,
        positive_class: usize,
    ) -> Result<Self> {
        ensure!(
            class_log_prior.len() >= 2,
            "Naive Bayes model needs at least two classes"
        );
        ensure!(
            class_log_prior.len() == feature_log_prob.len(),
            "{} class priors but {} feature rows",
            class_log_prior.len(),
            feature_log_prob.len()
        );
        ensure!(
            positive_class < class_log_prior.len(),
            "Positive class {} out of range",
            positive_class
        );
        let width = feature_log_prob[0].len();
        if feature_log_prob.iter().any(|row| row.len() != width) {
            bail!("Feature log probability rows differ in length");
        }

        Ok(Self {
            name: name.to_string(),
            class_log_prior,
            feature_log_prob,
            positive_class,
        })
    }

    pub fn from_file<P: AsRef<Path>>(path: P, name: &str) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read text model from {}", path.display()))?;
        let artifact: NaiveBayesArtifact = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse text model {}", path.display()))?;

        Self::new(
            name,
            artifact.class_log_prior,
            artifact.feature_log_prob,
            artifact.positive_class,
        )
    }

    /// Number of features the model was fitted on
    pub fn feature_count(&self) -> usize {
        self.feature_log_prob[0].len()
    }
}

impl ProbabilityModel for NaiveBayesClassifier {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict_probability(&self, features: &FeatureVector) -> Result<f64> {
        ensure!(
            features.len() == self.feature_count(),
            "Model {} expects {} features, got {}",
            self.name,
            self.feature_count(),
            features.len()
        );

        let joint: Vec<f64> = self
            .class_log_prior
            .iter()
            .zip(&self.feature_log_prob)
            .map(|(prior, log_probs)| {
                prior
                    + features
                        .values()
                        .iter()
                        .zip(log_probs)
                        .map(|(&x, &lp)| x as f64 * lp)
                        .sum::<f64>()
            })
            .collect();

        // log-sum-exp for a stable posterior
        let max = joint.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let log_norm = max + joint.iter().map(|j| (j - max).exp()).sum::<f64>().ln();
        let probability = (joint[self.positive_class] - log_norm).exp();

        checked_probability(&self.name, probability)
    }
}
