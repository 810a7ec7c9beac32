//! Performance metrics and statistics tracking for the risk scoring service.

use crate::types::{Assessment, AssessmentDomain};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::info;

const MAX_SAMPLES: usize = 10000;

/// Characters between the borders of the summary box
const BOX_WIDTH: usize = 62;

/// One summary line, padded or cut to the box width
fn box_row(content: &str) -> String {
    let mut row: String = content.chars().take(BOX_WIDTH).collect();
    let len = row.chars().count();
    row.extend(std::iter::repeat(' ').take(BOX_WIDTH - len));
    format!("║{}║", row)
}

/// Metrics collector for the scoring pipeline
pub struct PipelineMetrics {
    /// Assessments completed, per domain
    url_assessed: AtomicU64,
    transactions_assessed: AtomicU64,
    texts_assessed: AtomicU64,
    /// Requests rejected as malformed or failed during inference
    pub requests_failed: AtomicU64,
    /// Verdicts by label (tier name, fraud status, spam result)
    verdicts: RwLock<HashMap<&'static str, u64>>,
    /// Diagnostics by kind
    diagnostics: RwLock<HashMap<&'static str, u64>>,
    /// Processing times per domain (in microseconds)
    processing_times: RwLock<HashMap<AssessmentDomain, Vec<u64>>>,
    /// Model probability distribution buckets
    score_buckets: RwLock<[u64; 10]>,
    /// Start time for rate calculation
    start_time: Instant,
}

impl PipelineMetrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            url_assessed: AtomicU64::new(0),
            transactions_assessed: AtomicU64::new(0),
            texts_assessed: AtomicU64::new(0),
            requests_failed: AtomicU64::new(0),
            verdicts: RwLock::new(HashMap::new()),
            diagnostics: RwLock::new(HashMap::new()),
            processing_times: RwLock::new(HashMap::new()),
            score_buckets: RwLock::new([0; 10]),
            start_time: Instant::now(),
        }
    }

    fn counter(&self, domain: AssessmentDomain) -> &AtomicU64 {
        match domain {
            AssessmentDomain::Url => &self.url_assessed,
            AssessmentDomain::Transaction => &self.transactions_assessed,
            AssessmentDomain::Text => &self.texts_assessed,
        }
    }

    /// Record a completed assessment
    pub fn record_assessment(
        &self,
        domain: AssessmentDomain,
        processing_time: Duration,
        assessment: &Assessment,
    ) {
        self.counter(domain).fetch_add(1, Ordering::Relaxed);

        if let Ok(mut times) = self.processing_times.write() {
            let times = times.entry(domain).or_default();
            times.push(processing_time.as_micros() as u64);
            if times.len() > MAX_SAMPLES {
                times.drain(0..MAX_SAMPLES / 2);
            }
        }

        let bucket = (assessment.probability().clamp(0.0, 1.0) * 10.0).min(9.0) as usize;
        if let Ok(mut buckets) = self.score_buckets.write() {
            buckets[bucket] += 1;
        }

        if let Ok(mut verdicts) = self.verdicts.write() {
            *verdicts.entry(assessment.label()).or_insert(0) += 1;
        }

        if let Ok(mut kinds) = self.diagnostics.write() {
            for diagnostic in assessment.diagnostics() {
                *kinds.entry(diagnostic.kind()).or_insert(0) += 1;
            }
        }
    }

    /// Record a request that produced an error reply
    pub fn record_failure(&self) {
        self.requests_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Assessments completed for one domain
    pub fn assessed(&self, domain: AssessmentDomain) -> u64 {
        self.counter(domain).load(Ordering::Relaxed)
    }

    /// Assessments completed across all domains
    pub fn total_assessed(&self) -> u64 {
        AssessmentDomain::ALL
            .iter()
            .map(|&domain| self.assessed(domain))
            .sum()
    }

    /// Get processing time statistics for one domain
    pub fn get_processing_stats(&self, domain: AssessmentDomain) -> ProcessingStats {
        let times = match self.processing_times.read() {
            Ok(times) => times.get(&domain).cloned().unwrap_or_default(),
            Err(_) => return ProcessingStats::default(),
        };
        ProcessingStats::from_samples(times)
    }

    /// Get current throughput (assessments per second)
    pub fn get_throughput(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.total_assessed() as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Get probability distribution
    pub fn get_score_distribution(&self) -> [u64; 10] {
        self.score_buckets.read().map(|b| *b).unwrap_or_default()
    }

    /// Get verdict counts by label
    pub fn get_verdicts(&self) -> HashMap<&'static str, u64> {
        self.verdicts.read().map(|v| v.clone()).unwrap_or_default()
    }

    /// Get diagnostic counts by kind
    pub fn get_diagnostics(&self) -> HashMap<&'static str, u64> {
        self.diagnostics.read().map(|d| d.clone()).unwrap_or_default()
    }

    /// Print summary statistics
    pub fn print_summary(&self) {
        let total = self.total_assessed();
        let failed = self.requests_failed.load(Ordering::Relaxed);
        let throughput = self.get_throughput();
        let mut verdicts: Vec<_> = self.get_verdicts().into_iter().collect();
        verdicts.sort();
        let mut diagnostics: Vec<_> = self.get_diagnostics().into_iter().collect();
        diagnostics.sort();
        let score_dist = self.get_score_distribution();

        info!("╔══════════════════════════════════════════════════════════════╗");
        info!("║             FRAUDLENS RISK SCORING - METRICS SUMMARY         ║");
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!(
            "{}",
            box_row(&format!(
                " Assessments: {:>8}  │  Throughput: {:>6.1}/s  │  Failed: {:>4}",
                total, throughput, failed
            ))
        );
        info!("╠══════════════════════════════════════════════════════════════╣");
        for domain in AssessmentDomain::ALL {
            let stats = self.get_processing_stats(domain);
            info!(
                "{}",
                box_row(&format!(
                    " {:<11} n={:>6} mean={:>6}μs p50={:>6}μs p99={:>6}μs",
                    domain.as_str(),
                    self.assessed(domain),
                    stats.mean_us,
                    stats.p50_us,
                    stats.p99_us
                ))
            );
        }
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!("{}", box_row(" Verdicts:"));
        for (label, count) in &verdicts {
            let pct = if total > 0 {
                (*count as f64 / total as f64) * 100.0
            } else {
                0.0
            };
            info!(
                "{}",
                box_row(&format!("   {:14}: {:>6} ({:>5.1}%)", label, count, pct))
            );
        }
        if !diagnostics.is_empty() {
            info!("╠══════════════════════════════════════════════════════════════╣");
            info!("{}", box_row(" Diagnostics:"));
            for (kind, count) in &diagnostics {
                info!("{}", box_row(&format!("   {:18}: {:>8}", kind, count)));
            }
        }
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!("{}", box_row(" Probability Distribution:"));
        let bucket_total: u64 = score_dist.iter().sum();
        for (i, &count) in score_dist.iter().enumerate() {
            let pct = if bucket_total > 0 {
                (count as f64 / bucket_total as f64) * 100.0
            } else {
                0.0
            };
            let bar_len = (pct / 2.0) as usize;
            let bar: String = "█".repeat(bar_len.min(20));
            info!(
                "{}",
                box_row(&format!(
                    "   {:.1}-{:.1}: {:>6} ({:>5.1}%) {}",
                    i as f64 / 10.0,
                    (i + 1) as f64 / 10.0,
                    count,
                    pct,
                    bar
                ))
            );
        }
        info!("╚══════════════════════════════════════════════════════════════╝");
    }
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Processing time statistics
#[derive(Debug, Default, PartialEq)]
pub struct ProcessingStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

impl ProcessingStats {
    fn from_samples(mut samples: Vec<u64>) -> Self {
        if samples.is_empty() {
            return Self::default();
        }
        samples.sort_unstable();

        let count = samples.len();
        let sum: u64 = samples.iter().sum();
        let percentile = |p: f64| samples[((count as f64 * p) as usize).min(count - 1)];

        Self {
            count: count as u64,
            mean_us: sum / count as u64,
            p50_us: samples[count / 2],
            p95_us: percentile(0.95),
            p99_us: percentile(0.99),
            max_us: samples[count - 1],
        }
    }
}

/// Real-time metrics reporter that prints periodic summaries
pub struct MetricsReporter {
    metrics: Arc<PipelineMetrics>,
    interval_secs: u64,
}

impl MetricsReporter {
    pub fn new(metrics: Arc<PipelineMetrics>, interval_secs: u64) -> Self {
        Self {
            metrics,
            interval_secs,
        }
    }

    /// Start the periodic reporting task
    pub async fn start(self) {
        let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs.max(1)));
        loop {
            interval.tick().await;
            self.metrics.print_summary();
        }
    }
}
