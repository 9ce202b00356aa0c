//! NATS ingress: subscribes to the transaction request subject, runs each
//! request through the coordinator on a bounded worker pool, and replies
//! with the outcome or a structured rejection.

use std::sync::Arc;

use anyhow::Result;
use async_nats::Client;
use futures::StreamExt;
use serde::Serialize;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

use crate::coordinator::{TransactionCoordinator, TransactionOutcome};
use crate::error::{PipelineError, RejectReason};
use crate::types::TransactionRequest;

/// Wire reply to a transaction request.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ApiReply {
    Ok(TransactionOutcome),
    Rejected { reason: RejectReason },
    Failed { error: String },
}

impl From<Result<TransactionOutcome, PipelineError>> for ApiReply {
    fn from(result: Result<TransactionOutcome, PipelineError>) -> Self {
        match result {
            Ok(outcome) => ApiReply::Ok(outcome),
            Err(PipelineError::Rejected(reason)) => ApiReply::Rejected { reason },
            Err(PipelineError::Persistence(e)) => ApiReply::Failed {
                error: e.to_string(),
            },
        }
    }
}

/// Request-processing loop over a NATS subscription.
pub struct PipelineServer {
    client: Client,
    subject: String,
    coordinator: Arc<TransactionCoordinator>,
    workers: usize,
}

impl PipelineServer {
    pub fn new(
        client: Client,
        subject: &str,
        coordinator: Arc<TransactionCoordinator>,
        workers: usize,
    ) -> Self {
        Self {
            client,
            subject: subject.to_string(),
            coordinator,
            workers,
        }
    }

    /// Subscribe and process requests until the subscription ends.
    pub async fn run(&self) -> Result<()> {
        let mut subscription = self.client.subscribe(self.subject.clone()).await?;
        info!(subject = %self.subject, workers = self.workers, "Listening for transaction requests");

        let semaphore = Arc::new(Semaphore::new(self.workers));

        while let Some(message) = subscription.next().await {
            let permit = semaphore.clone().acquire_owned().await?;
            let coordinator = self.coordinator.clone();
            let client = self.client.clone();

            tokio::spawn(async move {
                let _permit = permit;

                let reply = match serde_json::from_slice::<TransactionRequest>(&message.payload) {
                    Ok(request) => {
                        let account_id = request.account_id;
                        let result = coordinator.process(request).await;
                        if let Err(e) = &result {
                            warn!(account_id = %account_id, error = %e, "Transaction not applied");
                        }
                        ApiReply::from(result)
                    }
                    Err(e) => {
                        warn!(error = %e, "Failed to deserialize transaction request");
                        ApiReply::Failed {
                            error: format!("malformed request: {e}"),
                        }
                    }
                };

                if let Some(reply_subject) = message.reply {
                    match serde_json::to_vec(&reply) {
                        Ok(payload) => {
                            if let Err(e) = client.publish(reply_subject, payload.into()).await {
                                error!(error = %e, "Failed to send reply");
                            }
                        }
                        Err(e) => error!(error = %e, "Failed to serialize reply"),
                    }
                }
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StorageError;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    #[test]
    fn test_reply_serialization() {
        let ok = ApiReply::Ok(TransactionOutcome {
            transaction_id: Uuid::new_v4(),
            fraud_score: 0.2,
            is_fraud: false,
            new_balance: dec!(700),
        });
        let json = serde_json::to_string(&ok).unwrap();
        assert!(json.contains("\"status\":\"ok\""));
        assert!(json.contains("\"is_fraud\":false"));

        let rejected = ApiReply::Rejected {
            reason: RejectReason::InsufficientBalance,
        };
        let json = serde_json::to_string(&rejected).unwrap();
        assert!(json.contains("\"status\":\"rejected\""));
        assert!(json.contains("insufficient_balance"));
    }

    #[test]
    fn test_reply_from_pipeline_result() {
        let err: Result<TransactionOutcome, PipelineError> =
            Err(PipelineError::Persistence(StorageError::Unavailable(
                "db down".into(),
            )));
        match ApiReply::from(err) {
            ApiReply::Failed { error } => assert!(error.contains("db down")),
            _ => panic!("expected Failed"),
        }
    }
}
