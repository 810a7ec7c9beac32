//! FraudLens Risk Scoring Service - Main Entry Point
//!
//! Answers URL, transaction and text assessment requests over NATS.
//! Requests are processed in parallel, bounded by the configured worker count.

use anyhow::{Context, Result};
use fraudlens_risk::{
    config::{AppConfig, LoggingConfig},
    consumer::{DomainRequest, RequestConsumer},
    engine::RiskEngine,
    features::HttpProbes,
    metrics::{MetricsReporter, PipelineMetrics},
    producer::ReplyProducer,
    types::RawInput,
};
use futures::StreamExt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = AppConfig::load()?;

    init_logging(&config.logging)?;
    info!("Starting FraudLens risk scoring service");
    info!(
        transaction_threshold = config.risk.transaction_threshold,
        text_threshold = config.risk.text_threshold,
        probes_enabled = config.probes.enabled,
        "Configuration loaded successfully"
    );

    // Initialize metrics
    let metrics = Arc::new(PipelineMetrics::new());

    // Load every model; a missing artifact stops the service here
    let engine = Arc::new(RiskEngine::from_config(&config)?);

    // Connect to NATS
    let client = async_nats::connect(&config.nats.url)
        .await
        .with_context(|| format!("Failed to connect to NATS at {}", config.nats.url))?;
    info!("Connected to NATS at {}", config.nats.url);

    // Initialize consumer and producer
    let consumer = RequestConsumer::new(client.clone(), &config.nats);
    let producer = Arc::new(ReplyProducer::new(client.clone()));

    let num_workers = config.pipeline.workers.max(1);
    info!(
        "Starting request processing loop with {} parallel workers",
        num_workers
    );

    // Semaphore to limit concurrent processing
    let semaphore = Arc::new(Semaphore::new(num_workers));
    let processed_count = Arc::new(AtomicU64::new(0));

    // Start metrics reporter
    let reporter = MetricsReporter::new(metrics.clone(), config.pipeline.metrics_interval_secs);
    tokio::spawn(reporter.start());

    let mut requests = consumer.subscribe().await?;

    while let Some(DomainRequest { domain, message }) = requests.next().await {
        // Acquire permit (limits concurrent tasks)
        let permit = semaphore
            .clone()
            .acquire_owned()
            .await
            .context("Worker semaphore closed")?;

        let engine: Arc<RiskEngine<HttpProbes>> = engine.clone();
        let producer = producer.clone();
        let metrics = metrics.clone();
        let processed_count = processed_count.clone();

        tokio::spawn(async move {
            let request_id = Uuid::new_v4();
            let start_time = Instant::now();

            let result = match RawInput::from_json(domain, &message.payload) {
                Ok(input) => engine.assess(input).await,
                Err(e) => {
                    warn!(request_id = %request_id, domain = %domain, error = %e, "Malformed request");
                    Err(e)
                }
            };
            let processing_time = start_time.elapsed();

            match &result {
                Ok(assessment) => {
                    metrics.record_assessment(domain, processing_time, assessment);
                    debug!(
                        request_id = %request_id,
                        domain = %domain,
                        verdict = assessment.label(),
                        diagnostics = assessment.diagnostics().len(),
                        processing_time_us = processing_time.as_micros() as u64,
                        "Request assessed"
                    );
                }
                Err(e) => {
                    metrics.record_failure();
                    error!(request_id = %request_id, domain = %domain, error = %e, "Assessment failed");
                }
            }

            if let Err(e) = producer.reply(message.reply, &result).await {
                error!(request_id = %request_id, error = %e, "Failed to publish reply");
            }

            let count = processed_count.fetch_add(1, Ordering::Relaxed) + 1;

            // Log progress every 100 requests
            if count % 100 == 0 {
                let stats = metrics.get_processing_stats(domain);
                info!(
                    processed = count,
                    throughput = format!("{:.1} req/s", metrics.get_throughput()),
                    domain = %domain,
                    avg_latency_us = stats.mean_us,
                    "Processing milestone"
                );
            }

            // Release permit when done
            drop(permit);
        });
    }

    info!("Service shutting down...");
    metrics.print_summary();

    Ok(())
}

fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| {
        EnvFilter::try_new(format!("fraudlens_risk={}", logging.level))
    })?;

    if logging.format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    }
    Ok(())
}
