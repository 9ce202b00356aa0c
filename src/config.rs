//! Configuration management for the fraud-scoring pipeline

use anyhow::{Context, Result};
use config::{Config, File};
use serde::Deserialize;
use std::path::Path;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub nats: NatsConfig,
    pub scoring: ScoringConfig,
    pub history: HistoryConfig,
    pub pipeline: PipelineConfig,
    pub logging: LoggingConfig,
}

/// NATS connection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct NatsConfig {
    /// NATS server URL
    pub url: String,
    /// Subject for incoming transaction requests
    pub request_subject: String,
    /// Subject fraud alerts are mirrored to
    pub alert_subject: String,
}

/// Scoring boundary configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ScoringConfig {
    /// Request/reply subject of the external scoring service
    pub subject: String,
    /// Fraud probability above which a transaction is classified fraud
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    /// Hard timeout for the single scoring attempt, in milliseconds
    #[serde(default = "default_scoring_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_threshold() -> f64 {
    0.5
}

fn default_scoring_timeout_ms() -> u64 {
    1000
}

/// History window configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryConfig {
    /// Maximum number of prior transactions considered per request
    #[serde(default = "default_history_window")]
    pub window: usize,
}

fn default_history_window() -> usize {
    5
}

/// Pipeline configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Number of concurrently processed requests
    pub workers: usize,
    /// Per-subscriber alert channel capacity
    #[serde(default = "default_alert_buffer")]
    pub alert_buffer: usize,
}

fn default_alert_buffer() -> usize {
    64
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl AppConfig {
    /// Load configuration from file
    pub fn load() -> Result<Self> {
        Self::load_from_path("config/config.toml")
    }

    /// Load configuration from a specific path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
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
                request_subject: "transactions.request".to_string(),
                alert_subject: "fraud.alerts".to_string(),
            },
            scoring: ScoringConfig {
                subject: "fraud.score".to_string(),
                threshold: default_threshold(),
                timeout_ms: default_scoring_timeout_ms(),
            },
            history: HistoryConfig {
                window: default_history_window(),
            },
            pipeline: PipelineConfig {
                workers: 4,
                alert_buffer: default_alert_buffer(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.nats.url, "nats://localhost:4222");
        assert_eq!(config.scoring.threshold, 0.5);
        assert_eq!(config.history.window, 5);
        assert_eq!(config.scoring.timeout_ms, 1000);
    }
}
