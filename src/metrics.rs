//! Performance and decision metrics for the fraud-scoring pipeline.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::info;

/// Metrics collector for pipeline behavior.
pub struct PipelineMetrics {
    /// Accepted requests fully processed (record persisted)
    pub transactions_processed: AtomicU64,
    /// Transactions classified fraud
    pub fraud_flagged: AtomicU64,
    /// Requests rejected at validation
    pub rejections: AtomicU64,
    /// Scoring-boundary failures recovered via the fail-open fallback.
    /// Tracked separately from genuine low scores so the fail-open default
    /// stays auditable.
    pub scoring_fallbacks: AtomicU64,
    /// Processing times (in microseconds)
    processing_times: RwLock<Vec<u64>>,
    /// Fraud score distribution buckets
    score_buckets: RwLock<[u64; 10]>,
    /// Start time for rate calculation
    start_time: Instant,
}

impl PipelineMetrics {
    pub fn new() -> Self {
        Self {
            transactions_processed: AtomicU64::new(0),
            fraud_flagged: AtomicU64::new(0),
            rejections: AtomicU64::new(0),
            scoring_fallbacks: AtomicU64::new(0),
            processing_times: RwLock::new(Vec::with_capacity(1000)),
            score_buckets: RwLock::new([0; 10]),
            start_time: Instant::now(),
        }
    }

    /// Record a fully processed transaction.
    pub fn record_transaction(&self, processing_time: Duration, fraud_score: f64, is_fraud: bool) {
        self.transactions_processed.fetch_add(1, Ordering::Relaxed);
        if is_fraud {
            self.fraud_flagged.fetch_add(1, Ordering::Relaxed);
        }

        if let Ok(mut times) = self.processing_times.write() {
            times.push(processing_time.as_micros() as u64);
            // Keep only the recent window for memory efficiency
            if times.len() > 10000 {
                times.drain(0..5000);
            }
        }

        let bucket = (fraud_score * 10.0).min(9.0) as usize;
        if let Ok(mut buckets) = self.score_buckets.write() {
            buckets[bucket] += 1;
        }
    }

    /// Record a validation rejection.
    pub fn record_rejection(&self) {
        self.rejections.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a fail-open fallback score.
    pub fn record_fallback(&self) {
        self.scoring_fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    /// Get processing time statistics.
    pub fn get_processing_stats(&self) -> ProcessingStats {
        let times = self.processing_times.read().unwrap();
        if times.is_empty() {
            return ProcessingStats::default();
        }

        let mut sorted: Vec<u64> = times.clone();
        sorted.sort();

        let sum: u64 = sorted.iter().sum();
        let count = sorted.len();

        ProcessingStats {
            count: count as u64,
            mean_us: sum / count as u64,
            p50_us: sorted[count / 2],
            p95_us: sorted[(count as f64 * 0.95) as usize],
            p99_us: sorted[(count as f64 * 0.99) as usize],
            max_us: *sorted.last().unwrap_or(&0),
        }
    }

    /// Get current throughput (transactions per second).
    pub fn get_throughput(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.transactions_processed.load(Ordering::Relaxed) as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Get the fraud score distribution.
    pub fn get_score_distribution(&self) -> [u64; 10] {
        *self.score_buckets.read().unwrap()
    }

    /// Print summary statistics.
    pub fn print_summary(&self) {
        let processed = self.transactions_processed.load(Ordering::Relaxed);
        let flagged = self.fraud_flagged.load(Ordering::Relaxed);
        let rejected = self.rejections.load(Ordering::Relaxed);
        let fallbacks = self.scoring_fallbacks.load(Ordering::Relaxed);
        let fraud_rate = if processed > 0 {
            (flagged as f64 / processed as f64) * 100.0
        } else {
            0.0
        };

        let stats = self.get_processing_stats();
        let throughput = self.get_throughput();

        info!("=== fraud-scoring pipeline metrics ===");
        info!(
            processed,
            flagged,
            rejected,
            fraud_rate = format!("{:.1}%", fraud_rate),
            throughput = format!("{:.1} tx/s", throughput),
            "Totals"
        );
        info!(
            fallbacks,
            "Fail-open fallback scores served (scoring boundary failures)"
        );
        info!(
            mean_us = stats.mean_us,
            p50_us = stats.p50_us,
            p95_us = stats.p95_us,
            p99_us = stats.p99_us,
            max_us = stats.max_us,
            "Processing time"
        );

        let distribution = self.get_score_distribution();
        let total: u64 = distribution.iter().sum();
        if total > 0 {
            for (i, &count) in distribution.iter().enumerate() {
                let pct = (count as f64 / total as f64) * 100.0;
                info!(
                    "score {:.1}-{:.1}: {:>6} ({:>5.1}%)",
                    i as f64 / 10.0,
                    (i + 1) as f64 / 10.0,
                    count,
                    pct
                );
            }
        }
    }
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Processing time statistics
#[derive(Debug, Default)]
pub struct ProcessingStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

/// Periodic metrics reporter.
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

    /// Start the periodic reporting loop.
    pub async fn start(self) {
        let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs));
        loop {
            interval.tick().await;
            self.metrics.print_summary();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_recording() {
        let metrics = PipelineMetrics::new();

        metrics.record_transaction(Duration::from_micros(100), 0.2, false);
        metrics.record_transaction(Duration::from_micros(200), 0.8, true);
        metrics.record_rejection();
        metrics.record_fallback();

        assert_eq!(metrics.transactions_processed.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.fraud_flagged.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.rejections.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.scoring_fallbacks.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_score_distribution_buckets() {
        let metrics = PipelineMetrics::new();
        metrics.record_transaction(Duration::from_micros(100), 0.05, false);
        metrics.record_transaction(Duration::from_micros(100), 0.95, true);
        metrics.record_transaction(Duration::from_micros(100), 1.0, true);

        let distribution = metrics.get_score_distribution();
        assert_eq!(distribution[0], 1);
        assert_eq!(distribution[9], 2);
    }
}
