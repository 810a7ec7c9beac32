//! ONNX Runtime adapter for gradient-boosted classifiers

use super::{checked_probability, ProbabilityModel};
use crate::features::FeatureVector;
use anyhow::{Context, Result};
use ort::memory::Allocator;
use ort::session::{builder::GraphOptimizationLevel, Session, SessionOutputs};
use ort::value::{DowncastableTarget, DynMapValueType, DynSequenceValueType, DynValue, Tensor};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info};

/// A loaded ONNX classifier exported from XGBoost or LightGBM
pub struct OnnxClassifier {
    name: String,
    /// The runtime needs exclusive access to run a session
    session: Mutex<Session>,
    input_name: String,
    output_name: String,
}

impl OnnxClassifier {
    /// Load a model from file
    pub fn load<P: AsRef<Path>>(path: P, name: &str, threads: usize) -> Result<Self> {
        let path = path.as_ref();

        info!(model = %name, path = %path.display(), threads, "Loading ONNX model");

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(threads)?
            .commit_from_file(path)
            .with_context(|| format!("Failed to load model from {:?}", path))?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .unwrap_or_else(|| "float_input".to_string());

        let output_name = session
            .outputs
            .iter()
            .find(|o| o.name.contains("prob"))
            .or_else(|| session.outputs.last())
            .map(|o| o.name.clone())
            .unwrap_or_else(|| "probabilities".to_string());

        info!(
            model = %name,
            input = %input_name,
            output = %output_name,
            "Model loaded successfully"
        );

        Ok(Self {
            name: name.to_string(),
            session: Mutex::new(session),
            input_name,
            output_name,
        })
    }

    /// Pull the positive-class probability out of the session outputs.
    ///
    /// XGBoost exports a `[batch, classes]` tensor; LightGBM exports
    /// `seq(map(int64, float))`. The configured output is tried first, then
    /// every non-label output.
    fn extract_probability(&self, outputs: &SessionOutputs) -> Result<f64> {
        if let Some(output) = outputs.get(self.output_name.as_str()) {
            if let Some(prob) = self.probability_from_value(&output) {
                return Ok(prob);
            }
        }

        for (name, output) in outputs.iter() {
            if name.contains("label") {
                continue;
            }
            if let Some(prob) = self.probability_from_value(&output) {
                debug!(model = %self.name, output = %name, "Extracted probability from fallback output");
                return Ok(prob);
            }
        }

        anyhow::bail!("Model {} produced no probability output", self.name)
    }

    fn probability_from_value(&self, output: &DynValue) -> Option<f64> {
        if let Ok((shape, data)) = output.try_extract_tensor::<f32>() {
            let dims: Vec<i64> = shape.iter().copied().collect();
            return positive_class_probability(&dims, data);
        }

        if DynSequenceValueType::can_downcast(&output.dtype()) {
            return self.probability_from_sequence_map(output).ok();
        }

        None
    }

    fn probability_from_sequence_map(&self, output: &DynValue) -> Result<f64> {
        let allocator = Allocator::default();

        let sequence = output
            .downcast_ref::<DynSequenceValueType>()
            .map_err(|e| anyhow::anyhow!("Failed to downcast to sequence: {}", e))?;
        let maps = sequence.try_extract_sequence::<DynMapValueType>(&allocator)?;
        let first = maps
            .first()
            .ok_or_else(|| anyhow::anyhow!("Empty probability sequence"))?;
        let class_probs = first.try_extract_key_values::<i64, f32>()?;

        if let Some((_, prob)) = class_probs.iter().find(|(class, _)| *class == 1) {
            return Ok(*prob as f64);
        }
        if let Some((_, prob)) = class_probs.iter().find(|(class, _)| *class == 0) {
            return Ok(1.0 - *prob as f64);
        }
        anyhow::bail!("No class probability in map output")
    }
}

impl ProbabilityModel for OnnxClassifier {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict_probability(&self, features: &FeatureVector) -> Result<f64> {
        // shape [1, num_features]
        let shape = vec![1_i64, features.len() as i64];
        let input_tensor = Tensor::from_array((shape, features.values().to_vec()))
            .context("Failed to create input tensor")?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| anyhow::anyhow!("Lock error: {}", e))?;
        let outputs = session.run(ort::inputs![&self.input_name => input_tensor])?;

        let probability = self.extract_probability(&outputs)?;
        debug!(model = %self.name, probability, "ONNX inference complete");
        checked_probability(&self.name, probability)
    }
}

/// Positive-class probability from a flat tensor with the given dims.
///
/// `[batch, 2]` or `[2]` yields index 1; a single column is taken as the
/// probability itself.
pub fn positive_class_probability(dims: &[i64], data: &[f32]) -> Option<f64> {
    let classes = match dims {
        [_, classes] | [classes] => *classes,
        _ => return data.last().map(|&v| v as f64),
    };
    match classes {
        c if c >= 2 => data.get(1).map(|&v| v as f64),
        1 => data.first().map(|&v| v as f64),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_class_tensor() {
        assert_eq!(positive_class_probability(&[1, 2], &[0.25, 0.75]), Some(0.75));
        assert_eq!(positive_class_probability(&[2], &[0.9, 0.1]), Some(0.10000000149011612));
    }

    #[test]
    fn test_single_column_tensor() {
        assert_eq!(positive_class_probability(&[1, 1], &[0.5]), Some(0.5));
    }

    #[test]
    fn test_empty_tensor() {
        assert_eq!(positive_class_probability(&[1, 2], &[]), None);
        assert_eq!(positive_class_probability(&[1, 0], &[]), None);
    }

    #[test]
    fn test_missing_model_file_is_an_error() {
        let result = OnnxClassifier::load("/nonexistent/url_trust.onnx", "url_trust", 1);
        assert!(result.is_err());
    }
}
