//! FraudLens risk scoring library
//!
//! Scores URLs, payment transactions and text messages with pre-trained
//! classifiers and maps each probability to a risk verdict.

pub mod config;
pub mod consumer;
pub mod diagnostics;
pub mod encoding;
pub mod engine;
pub mod features;
pub mod metrics;
pub mod models;
pub mod producer;
pub mod risk;
pub mod types;

pub use config::AppConfig;
pub use consumer::RequestConsumer;
pub use diagnostics::Diagnostic;
pub use engine::RiskEngine;
pub use producer::ReplyProducer;
pub use risk::{RiskAssessment, RiskTier, TierLadder};
pub use types::{Assessment, RawInput, TextAssessment, TransactionAssessment, UrlAssessment};
