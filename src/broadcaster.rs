//! Fraud alert fan-out to live subscribers.
//!
//! The registry is an explicitly-owned object constructed once at process
//! start and shared by handle: the connection-lifecycle layer registers and
//! deregisters subscribers, the broadcaster reads a snapshot per event.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::types::FraudEvent;

/// Handle identifying a registered subscriber.
pub type SubscriberId = Uuid;

/// Process-wide registry of live alert subscribers.
///
/// Register/deregister may interleave freely with broadcasts. A broadcast
/// snapshots the current membership under the read lock; a subscriber that
/// fully deregistered before the snapshot never receives the event, one that
/// registers mid-broadcast may or may not.
pub struct SubscriberRegistry {
    subscribers: RwLock<HashMap<SubscriberId, mpsc::Sender<FraudEvent>>>,
    channel_capacity: usize,
}

impl SubscriberRegistry {
    pub fn new(channel_capacity: usize) -> Self {
        Self {
            subscribers: RwLock::new(HashMap::new()),
            channel_capacity,
        }
    }

    /// Register a new subscriber; returns its handle and the receiving end
    /// of its alert channel.
    pub fn register(&self) -> (SubscriberId, mpsc::Receiver<FraudEvent>) {
        let (tx, rx) = mpsc::channel(self.channel_capacity);
        let id = Uuid::new_v4();
        self.subscribers.write().unwrap().insert(id, tx);
        debug!(subscriber = %id, "Alert subscriber registered");
        (id, rx)
    }

    /// Remove a subscriber. Subsequent broadcasts will not deliver to it.
    pub fn deregister(&self, id: SubscriberId) {
        if self.subscribers.write().unwrap().remove(&id).is_some() {
            debug!(subscriber = %id, "Alert subscriber deregistered");
        }
    }

    pub fn len(&self) -> usize {
        self.subscribers.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn snapshot(&self) -> Vec<(SubscriberId, mpsc::Sender<FraudEvent>)> {
        self.subscribers
            .read()
            .unwrap()
            .iter()
            .map(|(id, tx)| (*id, tx.clone()))
            .collect()
    }
}

/// Best-effort fan-out of fraud events over a [`SubscriberRegistry`].
pub struct AlertBroadcaster {
    registry: Arc<SubscriberRegistry>,
}

impl AlertBroadcaster {
    pub fn new(registry: Arc<SubscriberRegistry>) -> Self {
        Self { registry }
    }

    /// Deliver `event` to every subscriber in the current snapshot. Returns
    /// the number of successful deliveries.
    ///
    /// Delivery is non-blocking per subscriber: a slow subscriber with a
    /// full channel drops this event rather than stalling the others or the
    /// originating transaction. Subscribers whose receiving end is gone are
    /// pruned.
    pub fn broadcast(&self, event: &FraudEvent) -> usize {
        let targets = self.registry.snapshot();
        let mut delivered = 0;
        let mut closed = Vec::new();

        for (id, tx) in targets {
            match tx.try_send(event.clone()) {
                Ok(()) => delivered += 1,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    warn!(
                        subscriber = %id,
                        alert_id = %event.alert_id,
                        "Subscriber channel full; dropping fraud alert for this subscriber"
                    );
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    closed.push(id);
                }
            }
        }

        for id in closed {
            self.registry.deregister(id);
        }

        debug!(
            alert_id = %event.alert_id,
            delivered,
            "Fraud alert broadcast"
        );
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Channel, TransactionRecord};
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn event() -> FraudEvent {
        FraudEvent::from_record(&TransactionRecord {
            id: Uuid::new_v4(),
            account_id: Uuid::new_v4(),
            amount: dec!(-300),
            merchant: "Transfer to bob".into(),
            category: "Electronics".into(),
            channel: Channel::Online,
            location: "Remote, Unknown".into(),
            balance_at: dec!(1000),
            timestamp: Utc::now(),
            is_fraud: true,
            fraud_score: 0.8,
        })
    }

    #[tokio::test]
    async fn test_broadcast_reaches_all_registered() {
        let registry = Arc::new(SubscriberRegistry::new(8));
        let (_id_a, mut rx_a) = registry.register();
        let (_id_b, mut rx_b) = registry.register();

        let delivered = AlertBroadcaster::new(registry).broadcast(&event());
        assert_eq!(delivered, 2);
        assert!(rx_a.try_recv().is_ok());
        assert!(rx_b.try_recv().is_ok());
    }

    #[tokio::test]
    async fn test_deregistered_subscriber_not_delivered() {
        let registry = Arc::new(SubscriberRegistry::new(8));
        let (id_a, mut rx_a) = registry.register();
        let (_id_b, mut rx_b) = registry.register();

        registry.deregister(id_a);

        let delivered = AlertBroadcaster::new(registry).broadcast(&event());
        assert_eq!(delivered, 1);
        assert!(rx_a.try_recv().is_err());
        assert!(rx_b.try_recv().is_ok());
    }

    #[tokio::test]
    async fn test_full_channel_does_not_block_others() {
        let registry = Arc::new(SubscriberRegistry::new(1));
        let broadcaster = AlertBroadcaster::new(registry.clone());

        let (_slow, _rx_slow) = registry.register();
        // Fill the slow subscriber's single-slot channel.
        broadcaster.broadcast(&event());

        let (_fast, mut rx_fast) = registry.register();

        let delivered = broadcaster.broadcast(&event());
        // Slow subscriber dropped, fast one still served.
        assert_eq!(delivered, 1);
        assert!(rx_fast.try_recv().is_ok());
    }

    #[tokio::test]
    async fn test_closed_receiver_is_pruned() {
        let registry = Arc::new(SubscriberRegistry::new(8));
        let (_id, rx) = registry.register();
        drop(rx);

        let delivered = AlertBroadcaster::new(registry.clone()).broadcast(&event());
        assert_eq!(delivered, 0);
        assert!(registry.is_empty());
    }
}
