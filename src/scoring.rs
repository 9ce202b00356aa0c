//! Scoring boundary client.
//!
//! The classifier is an opaque external service reached through the
//! [`Scorer`] capability trait, so the transport (NATS request/reply here,
//! an in-process model or a subprocess elsewhere) is swappable without
//! touching the coordinator.

use std::sync::Arc;
use std::time::Duration;

use async_nats::Client;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ScoringError;
use crate::features::FeatureVector;

/// Fixed fallback probability used whenever the scoring boundary fails.
///
/// Fail-open by design: a scoring outage must not block legitimate money
/// movement, so failures classify as non-fraud at this fixed low score.
/// Every fallback occurrence is logged and counted so the default stays
/// auditable.
pub const FALLBACK_SCORE: f64 = 0.1;

/// Wire response from the scoring service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreResponse {
    pub fraud_probability: f64,
}

/// Capability interface to the external classifier.
#[async_trait]
pub trait Scorer: Send + Sync {
    /// Classify a feature vector into a fraud probability in [0, 1].
    async fn classify(&self, features: &FeatureVector) -> Result<f64, ScoringError>;
}

/// Outcome of one scoring attempt, after fallback handling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreOutcome {
    pub probability: f64,
    /// True when the probability is the fail-open fallback, not a genuine
    /// classifier output.
    pub fallback: bool,
}

/// Applies the single-attempt, bounded-timeout, fail-open policy around a
/// [`Scorer`].
pub struct ScoringClient {
    scorer: Arc<dyn Scorer>,
    timeout: Duration,
}

impl ScoringClient {
    pub fn new(scorer: Arc<dyn Scorer>, timeout: Duration) -> Self {
        Self { scorer, timeout }
    }

    /// Score a feature vector. Never fails: exactly one attempt is made, and
    /// any timeout, transport error, or malformed response yields the
    /// fallback outcome.
    pub async fn score(&self, features: &FeatureVector) -> ScoreOutcome {
        let attempt = tokio::time::timeout(self.timeout, self.scorer.classify(features)).await;

        match attempt {
            Ok(Ok(probability)) if (0.0..=1.0).contains(&probability) => {
                debug!(probability, "Scoring boundary returned");
                ScoreOutcome {
                    probability,
                    fallback: false,
                }
            }
            Ok(Ok(probability)) => {
                warn!(
                    probability,
                    fallback_score = FALLBACK_SCORE,
                    "Scoring boundary returned out-of-range probability; using fail-open fallback"
                );
                ScoreOutcome {
                    probability: FALLBACK_SCORE,
                    fallback: true,
                }
            }
            Ok(Err(e)) => {
                warn!(
                    error = %e,
                    fallback_score = FALLBACK_SCORE,
                    "Scoring boundary unavailable; using fail-open fallback"
                );
                ScoreOutcome {
                    probability: FALLBACK_SCORE,
                    fallback: true,
                }
            }
            Err(_) => {
                warn!(
                    timeout_ms = self.timeout.as_millis() as u64,
                    fallback_score = FALLBACK_SCORE,
                    "Scoring request timed out; using fail-open fallback"
                );
                ScoreOutcome {
                    probability: FALLBACK_SCORE,
                    fallback: true,
                }
            }
        }
    }
}

/// Scorer that calls the external classifier over NATS request/reply.
pub struct NatsScorer {
    client: Client,
    subject: String,
}

impl NatsScorer {
    pub fn new(client: Client, subject: &str) -> Self {
        Self {
            client,
            subject: subject.to_string(),
        }
    }
}

#[async_trait]
impl Scorer for NatsScorer {
    async fn classify(&self, features: &FeatureVector) -> Result<f64, ScoringError> {
        let payload =
            serde_json::to_vec(features).map_err(|e| ScoringError::Transport(e.to_string()))?;

        let reply = self
            .client
            .request(self.subject.clone(), payload.into())
            .await
            .map_err(|e| ScoringError::Transport(e.to_string()))?;

        let response: ScoreResponse = serde_json::from_slice(&reply.payload)
            .map_err(|e| ScoringError::MalformedResponse(e.to_string()))?;

        if !(0.0..=1.0).contains(&response.fraud_probability) {
            return Err(ScoringError::OutOfRange(response.fraud_probability));
        }

        Ok(response.fraud_probability)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Channel, TransactionKind, TransactionRequest};
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    struct FixedScorer(f64);

    #[async_trait]
    impl Scorer for FixedScorer {
        async fn classify(&self, _features: &FeatureVector) -> Result<f64, ScoringError> {
            Ok(self.0)
        }
    }

    struct FailingScorer;

    #[async_trait]
    impl Scorer for FailingScorer {
        async fn classify(&self, _features: &FeatureVector) -> Result<f64, ScoringError> {
            Err(ScoringError::Transport("no responders".into()))
        }
    }

    struct SlowScorer;

    #[async_trait]
    impl Scorer for SlowScorer {
        async fn classify(&self, _features: &FeatureVector) -> Result<f64, ScoringError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(0.9)
        }
    }

    fn features() -> FeatureVector {
        let request = TransactionRequest {
            account_id: Uuid::new_v4(),
            amount: dec!(100),
            kind: TransactionKind::Deposit,
            category: "Groceries".into(),
            channel: Channel::Pos,
            city: "Local".into(),
            state: "Town".into(),
            timestamp: Utc::now(),
        };
        crate::features::FeatureBuilder::new().build(&request, dec!(1000), &[])
    }

    #[tokio::test]
    async fn test_genuine_score_passes_through() {
        let client = ScoringClient::new(Arc::new(FixedScorer(0.73)), Duration::from_secs(1));
        let outcome = client.score(&features()).await;
        assert_eq!(outcome.probability, 0.73);
        assert!(!outcome.fallback);
    }

    #[tokio::test]
    async fn test_transport_failure_falls_back() {
        let client = ScoringClient::new(Arc::new(FailingScorer), Duration::from_secs(1));
        let outcome = client.score(&features()).await;
        assert_eq!(outcome.probability, FALLBACK_SCORE);
        assert!(outcome.fallback);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_falls_back() {
        let client = ScoringClient::new(Arc::new(SlowScorer), Duration::from_millis(500));
        let outcome = client.score(&features()).await;
        assert_eq!(outcome.probability, FALLBACK_SCORE);
        assert!(outcome.fallback);
    }

    #[tokio::test]
    async fn test_out_of_range_probability_falls_back() {
        let client = ScoringClient::new(Arc::new(FixedScorer(1.7)), Duration::from_secs(1));
        let outcome = client.score(&features()).await;
        assert_eq!(outcome.probability, FALLBACK_SCORE);
        assert!(outcome.fallback);
    }
}
