//! NATS publisher mirroring fraud events to an alert subject.
//!
//! Registered as one subscriber among others: it owns a registry channel and
//! forwards every received event onto NATS, so remote admin monitors see the
//! same alerts as in-process subscribers.

use anyhow::Result;
use async_nats::Client;
use tokio::sync::mpsc;
use tracing::{debug, error};

use crate::types::FraudEvent;

/// Publisher forwarding fraud events to a NATS subject.
#[derive(Clone)]
pub struct AlertPublisher {
    client: Client,
    subject: String,
}

impl AlertPublisher {
    pub fn new(client: Client, subject: &str) -> Self {
        Self {
            client,
            subject: subject.to_string(),
        }
    }

    /// Publish a single fraud event.
    pub async fn publish(&self, event: &FraudEvent) -> Result<()> {
        let payload = serde_json::to_vec(event)?;

        self.client
            .publish(self.subject.clone(), payload.into())
            .await?;

        debug!(
            alert_id = %event.alert_id,
            transaction_id = %event.transaction_id,
            fraud_score = event.fraud_score,
            "Published fraud alert"
        );

        Ok(())
    }

    /// Drain a subscriber channel, publishing each event. Runs until the
    /// sending side (the registry entry) is dropped. Publish failures are
    /// logged and skipped; alert delivery is best-effort.
    pub async fn forward(self, mut events: mpsc::Receiver<FraudEvent>) {
        while let Some(event) = events.recv().await {
            if let Err(e) = self.publish(&event).await {
                error!(
                    alert_id = %event.alert_id,
                    error = %e,
                    "Failed to publish fraud alert"
                );
            }
        }
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }
}
