//! Fraud event payloads broadcast to live subscribers.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::account::AccountId;
use crate::types::transaction::TransactionRecord;

/// Notification payload describing a transaction classified as fraudulent.
///
/// Derived from the persisted record, delivered best-effort to every
/// registered subscriber, then discarded. No independent lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FraudEvent {
    /// Unique alert identifier.
    pub alert_id: Uuid,

    /// The persisted transaction this alert describes.
    pub transaction_id: Uuid,

    pub account_id: AccountId,

    /// Amount magnitude of the flagged transaction.
    pub amount: Decimal,

    pub merchant: String,
    pub location: String,

    /// Fraud probability that triggered the classification.
    pub fraud_score: f64,

    /// Alert generation timestamp.
    pub timestamp: DateTime<Utc>,
}

impl FraudEvent {
    /// Build an alert payload from a fraud-classified record.
    pub fn from_record(record: &TransactionRecord) -> Self {
        Self {
            alert_id: Uuid::new_v4(),
            transaction_id: record.id,
            account_id: record.account_id,
            amount: record.amount.abs(),
            merchant: record.merchant.clone(),
            location: record.location.clone(),
            fraud_score: record.fraud_score,
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::transaction::Channel;
    use rust_decimal_macros::dec;

    #[test]
    fn test_event_from_record_uses_amount_magnitude() {
        let record = TransactionRecord {
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
        };

        let event = FraudEvent::from_record(&record);
        assert_eq!(event.transaction_id, record.id);
        assert_eq!(event.amount, dec!(300));
        assert_eq!(event.fraud_score, 0.8);
    }
}
