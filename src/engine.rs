//! Risk engine: extraction, encoding, alignment, scoring and tier mapping
//! for all three assessment domains.

use crate::config::AppConfig;
use crate::diagnostics::Diagnostic;
use crate::features::{
    align, clean_text, FeatureVector, HttpProbes, ProbeBackend, ProbeRunner, RiskTables,
    TransactionFeatureExtractor, UrlFeatureExtractor,
};
use crate::models::{ModelLoader, ModelSet, ProbabilityModel};
use crate::risk::{BinaryThreshold, TierLadder};
use crate::types::{
    Assessment, AssessmentDomain, RawInput, TextAssessment, TextVerdict, TransactionAssessment,
    TransactionRecord, TransactionStatus, UrlAssessment,
};
use anyhow::{Context, Result};
use std::time::Duration;
use tracing::{debug, info};

/// Owns the immutable scoring state; shared across workers behind an `Arc`.
pub struct RiskEngine<P> {
    url_extractor: UrlFeatureExtractor<P>,
    transaction_extractor: TransactionFeatureExtractor,
    models: ModelSet,
    url_ladder: TierLadder,
    transaction_split: BinaryThreshold,
    text_split: BinaryThreshold,
}

impl RiskEngine<HttpProbes> {
    /// Load every model artifact and build the network probes.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let loader = ModelLoader::with_threads(config.models.onnx_threads)?;
        let models = loader
            .load_models(&config.models)
            .context("Failed to load model artifacts")?;

        let backend = HttpProbes::new(&config.probes)?;
        let probes = if config.probes.enabled {
            ProbeRunner::new(backend, Duration::from_millis(config.probes.timeout_ms))
        } else {
            ProbeRunner::disabled(backend)
        };

        Self::new(config, probes, models)
    }
}

impl<P: ProbeBackend> RiskEngine<P> {
    /// Build an engine from already loaded parts. Fails if the configured
    /// URL ladder is invalid.
    pub fn new(config: &AppConfig, probes: ProbeRunner<P>, models: ModelSet) -> Result<Self> {
        let url_ladder = TierLadder::new(config.risk.url_ladder.clone())
            .context("Invalid URL risk ladder")?;
        let tables = RiskTables::new(&config.risk_tables.currency, &config.risk_tables.device);
        let transaction_extractor =
            TransactionFeatureExtractor::new(tables, config.transaction.excluded_fields.clone());

        info!(
            probes_enabled = probes.is_enabled(),
            transaction_threshold = config.risk.transaction_threshold,
            text_threshold = config.risk.text_threshold,
            "Risk engine initialized"
        );

        Ok(Self {
            url_extractor: UrlFeatureExtractor::new(probes),
            transaction_extractor,
            models,
            url_ladder,
            transaction_split: BinaryThreshold::new(config.risk.transaction_threshold),
            text_split: BinaryThreshold::new(config.risk.text_threshold),
        })
    }

    /// Score a URL on the six-tier trust ladder.
    pub async fn assess_url(&self, url: &str) -> Result<UrlAssessment> {
        let (mut features, mut diagnostics) = self.url_extractor.extract(url).await;
        let domain_model = &self.models.url;

        diagnostics.extend(domain_model.encoders.apply(&mut features));
        let (vector, align_diagnostics) = align(&features, &domain_model.schema);
        diagnostics.extend(align_diagnostics);

        let probability = predict(domain_model.model.as_ref(), &vector)?;
        let assessment = self.url_ladder.map_tier(probability);

        debug!(
            url,
            probability,
            trust_score = assessment.score,
            risk_level = %assessment.tier,
            "URL assessed"
        );
        emit_all(AssessmentDomain::Url, &diagnostics);

        Ok(UrlAssessment::from_tier(assessment, diagnostics))
    }

    /// Classify a transaction. The model probability is scaled by the
    /// currency x device multiplier before the binary split.
    pub fn assess_transaction(&self, record: &TransactionRecord) -> Result<TransactionAssessment> {
        let extracted = self.transaction_extractor.extract(record);
        let mut features = extracted.features;
        let mut diagnostics = extracted.diagnostics;
        let domain_model = &self.models.transaction;

        diagnostics.extend(domain_model.encoders.apply(&mut features));
        let (vector, align_diagnostics) = align(&features, &domain_model.schema);
        diagnostics.extend(align_diagnostics);

        let model_probability = predict(domain_model.model.as_ref(), &vector)?;
        let fraud_score = model_probability * extracted.risk_multiplier;
        let status = if self.transaction_split.is_positive(fraud_score) {
            TransactionStatus::Fraudulent
        } else {
            TransactionStatus::Legitimate
        };

        debug!(
            model_probability,
            risk_multiplier = extracted.risk_multiplier,
            fraud_score,
            status = ?status,
            "Transaction assessed"
        );
        emit_all(AssessmentDomain::Transaction, &diagnostics);

        Ok(TransactionAssessment {
            status,
            model_probability,
            risk_multiplier: extracted.risk_multiplier,
            fraud_score,
            diagnostics,
        })
    }

    /// Classify a text message as spam or not.
    pub fn assess_text(&self, text: &str) -> Result<TextAssessment> {
        let cleaned = clean_text(text);
        let vector = self.models.text_vectorizer.transform(&cleaned);

        let probability = predict(self.models.text_model.as_ref(), &vector)?;
        let result = if self.text_split.is_positive(probability) {
            TextVerdict::Spam
        } else {
            TextVerdict::NotSpam
        };

        debug!(probability, result = ?result, "Text assessed");

        Ok(TextAssessment {
            result,
            probability,
            diagnostics: Vec::new(),
        })
    }

    /// Dispatch a raw input to its domain.
    pub async fn assess(&self, input: RawInput) -> Result<Assessment> {
        match input {
            RawInput::Url(url) => self.assess_url(&url).await.map(Assessment::Url),
            RawInput::Transaction(record) => {
                self.assess_transaction(&record).map(Assessment::Transaction)
            }
            RawInput::TextMessage(text) => self.assess_text(&text).map(Assessment::Text),
        }
    }
}

fn predict(model: &dyn ProbabilityModel, vector: &FeatureVector) -> Result<f64> {
    model
        .predict_probability(vector)
        .with_context(|| format!("Inference failed for model {}", model.name()))
}

fn emit_all(domain: AssessmentDomain, diagnostics: &[Diagnostic]) {
    for diagnostic in diagnostics {
        diagnostic.emit(domain.as_str());
    }
}
