//! Configuration management for the risk scoring service

use crate::features::transaction::{
    default_currency_risk, default_device_risk, RiskEntry, DEFAULT_EXCLUDED_FIELDS,
};
use crate::risk::{default_trust_bands, TierBand};
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub nats: NatsConfig,
    pub models: ModelsConfig,
    #[serde(default)]
    pub probes: ProbeConfig,
    #[serde(default)]
    pub risk: RiskConfig,
    #[serde(default)]
    pub risk_tables: RiskTablesConfig,
    #[serde(default)]
    pub transaction: TransactionConfig,
    pub pipeline: PipelineConfig,
    pub logging: LoggingConfig,
}

/// NATS connection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct NatsConfig {
    /// NATS server URL
    pub url: String,
    /// Request subject for URL assessments
    pub url_subject: String,
    /// Request subject for transaction assessments
    pub transaction_subject: String,
    /// Request subject for text assessments
    pub text_subject: String,
}

/// Model artifact locations, relative to `models_dir`
#[derive(Debug, Clone, Deserialize)]
pub struct ModelsConfig {
    pub models_dir: String,
    /// Number of threads for ONNX inference per model (default: 1)
    #[serde(default = "default_onnx_threads")]
    pub onnx_threads: usize,
    pub url_model: String,
    /// Without a schema file the built-in URL layout is used
    #[serde(default)]
    pub url_schema: Option<String>,
    pub transaction_model: String,
    pub transaction_schema: String,
    pub text_vectorizer: String,
    pub text_model: String,
}

fn default_onnx_threads() -> usize {
    1
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            models_dir: "models".to_string(),
            onnx_threads: 1,
            url_model: "url_trust.onnx".to_string(),
            url_schema: None,
            transaction_model: "transaction_fraud.onnx".to_string(),
            transaction_schema: "transaction_schema.json".to_string(),
            text_vectorizer: "text_vectorizer.json".to_string(),
            text_model: "text_spam.json".to_string(),
        }
    }
}

/// Network probes used by URL feature extraction
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// When false every probe takes its fail-closed value
    pub enabled: bool,
    /// Per-probe timeout
    pub timeout_ms: u64,
    pub user_agent: String,
    /// Search query URL, `{url}` in a query value is replaced by the
    /// percent-encoded assessed URL
    pub search_url: String,
    /// Traffic rank URL, `{domain}` in a query value is replaced by the domain
    pub traffic_url: String,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_ms: 3000,
            user_agent: "fraudlens-risk/0.1".to_string(),
            search_url: "https://www.google.com/search?q=info:{url}".to_string(),
            traffic_url: "https://data.alexa.com/data?cli=10&dat=s&url={domain}".to_string(),
        }
    }
}

/// Tier policies per domain
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    /// Six-tier ladder for URL trust
    pub url_ladder: Vec<TierBand>,
    /// Scaled fraud score above this is fraudulent
    pub transaction_threshold: f64,
    /// Spam probability above this is spam
    pub text_threshold: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            url_ladder: default_trust_bands(),
            transaction_threshold: 0.35,
            text_threshold: 0.5,
        }
    }
}

/// Currency and device risk multipliers.
///
/// Stored as entry lists; table keys such as `Bitcoin` would not survive
/// the key normalization of the config loader.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RiskTablesConfig {
    pub currency: Vec<RiskEntry>,
    pub device: Vec<RiskEntry>,
}

impl Default for RiskTablesConfig {
    fn default() -> Self {
        Self {
            currency: default_currency_risk(),
            device: default_device_risk(),
        }
    }
}

/// Transaction preprocessing
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TransactionConfig {
    /// Identifying fields dropped before scoring
    pub excluded_fields: Vec<String>,
}

impl Default for TransactionConfig {
    fn default() -> Self {
        Self {
            excluded_fields: DEFAULT_EXCLUDED_FIELDS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Pipeline configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Maximum requests processed concurrently
    pub workers: usize,
    /// Seconds between metrics summaries
    #[serde(default = "default_metrics_interval")]
    pub metrics_interval_secs: u64,
}

fn default_metrics_interval() -> u64 {
    30
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl AppConfig {
    /// Load configuration from file
    pub fn load() -> Result<Self> {
        Self::load_from_path("config/config.toml")
    }

    /// Load configuration from a specific path, then apply
    /// `FRAUDLENS__SECTION__KEY` environment overrides
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(Environment::with_prefix("FRAUDLENS").separator("__"))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            nats: NatsConfig {
                url: "nats://localhost:4222".to_string(),
                url_subject: "fraudlens.assess.url".to_string(),
                transaction_subject: "fraudlens.assess.transaction".to_string(),
                text_subject: "fraudlens.assess.text".to_string(),
            },
            models: ModelsConfig::default(),
            probes: ProbeConfig::default(),
            risk: RiskConfig::default(),
            risk_tables: RiskTablesConfig::default(),
            transaction: TransactionConfig::default(),
            pipeline: PipelineConfig {
                workers: 4,
                metrics_interval_secs: 30,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "json".to_string(),
            },
        }
    }
}
