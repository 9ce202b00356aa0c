//! Feature derivation for the scoring boundary.
//!
//! Builds the fixed-shape vector the external classifier expects from a
//! candidate transaction plus its history window.

use chrono::{DateTime, Duration, Timelike, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{Channel, HistoryEntry, TransactionRequest};

/// Fixed-shape feature vector sent to the scoring boundary.
///
/// Ephemeral: built per request, serialized onto the wire, discarded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub transaction_amount: f64,
    pub account_balance: f64,
    pub merchant_category: String,
    pub channel: Channel,
    /// Hour of day (0-23) of the candidate's timestamp, UTC.
    pub transaction_hour: u32,
    pub transaction_location: String,

    /// Mean magnitude of historical amounts; 0 when no history.
    pub avg_amount: f64,
    /// Fraction of historical records flagged fraud; 0 when no history.
    pub fraud_ratio: f64,
    /// Historical records within the trailing 24 hours of wall-clock now.
    pub tx_frequency_24h: u32,
}

/// Builds feature vectors from candidate transactions and history windows.
pub struct FeatureBuilder;

impl FeatureBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Derive the feature vector for a candidate against its history window.
    pub fn build(
        &self,
        candidate: &TransactionRequest,
        balance: Decimal,
        history: &[HistoryEntry],
    ) -> FeatureVector {
        self.build_at(candidate, balance, history, Utc::now())
    }

    /// Like [`build`](Self::build), with an explicit "now".
    ///
    /// The 24h frequency feature is measured against call-time now rather
    /// than the candidate's own timestamp: it gauges current burst activity,
    /// not activity around the transaction instant. Tests pin `now` to keep
    /// that quirk observable.
    pub fn build_at(
        &self,
        candidate: &TransactionRequest,
        balance: Decimal,
        history: &[HistoryEntry],
        now: DateTime<Utc>,
    ) -> FeatureVector {
        let (avg_amount, fraud_ratio, tx_frequency_24h) = if history.is_empty() {
            (0.0, 0.0, 0)
        } else {
            let total: Decimal = history.iter().map(|h| h.amount).sum();
            let avg = (total / Decimal::from(history.len()))
                .to_f64()
                .unwrap_or(0.0);

            let fraud_count = history.iter().filter(|h| h.is_fraud).count();
            let ratio = fraud_count as f64 / history.len() as f64;

            let cutoff = now - Duration::hours(24);
            let frequency = history.iter().filter(|h| h.timestamp > cutoff).count() as u32;

            (avg, ratio, frequency)
        };

        FeatureVector {
            transaction_amount: candidate.amount.to_f64().unwrap_or(0.0),
            account_balance: balance.to_f64().unwrap_or(0.0),
            merchant_category: candidate.category.clone(),
            channel: candidate.channel,
            transaction_hour: candidate.timestamp.hour(),
            transaction_location: candidate.location(),
            avg_amount,
            fraud_ratio,
            tx_frequency_24h,
        }
    }
}

impl Default for FeatureBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TransactionKind;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn candidate(at: DateTime<Utc>) -> TransactionRequest {
        TransactionRequest {
            account_id: Uuid::new_v4(),
            amount: dec!(100),
            kind: TransactionKind::Payment {
                merchant_id: "m_42".into(),
            },
            category: "Electronics".into(),
            channel: Channel::Online,
            city: "Remote".into(),
            state: "Unknown".into(),
            timestamp: at,
        }
    }

    fn entry(amount: Decimal, age_hours: i64, is_fraud: bool, now: DateTime<Utc>) -> HistoryEntry {
        HistoryEntry {
            amount,
            category: "Electronics".into(),
            timestamp: now - Duration::hours(age_hours),
            is_fraud,
        }
    }

    #[test]
    fn test_empty_history_yields_zero_aggregates() {
        let now = Utc::now();
        let features = FeatureBuilder::new().build_at(&candidate(now), dec!(1000), &[], now);

        assert_eq!(features.avg_amount, 0.0);
        assert_eq!(features.fraud_ratio, 0.0);
        assert_eq!(features.tx_frequency_24h, 0);
        assert_eq!(features.transaction_amount, 100.0);
        assert_eq!(features.account_balance, 1000.0);
    }

    #[test]
    fn test_aggregates_over_history() {
        let now = Utc::now();
        let history = vec![
            entry(dec!(100), 1, false, now),
            entry(dec!(200), 2, true, now),
            entry(dec!(300), 3, false, now),
            entry(dec!(400), 4, true, now),
        ];

        let features = FeatureBuilder::new().build_at(&candidate(now), dec!(1000), &history, now);

        assert_eq!(features.avg_amount, 250.0);
        assert_eq!(features.fraud_ratio, 0.5);
        assert_eq!(features.tx_frequency_24h, 4);
    }

    // The frequency feature is relative to wall-clock now, not the candidate
    // timestamp. A record 30h old sits inside the history window but outside
    // the 24h burst window.
    #[test]
    fn test_frequency_measured_against_now_not_candidate() {
        let now = Utc::now();
        let history = vec![
            entry(dec!(100), 2, false, now),
            entry(dec!(100), 30, false, now),
            entry(dec!(100), 48, false, now),
        ];

        // Candidate timestamped in the past; frequency must still count
        // against now.
        let past_candidate = candidate(now - Duration::hours(40));
        let features =
            FeatureBuilder::new().build_at(&past_candidate, dec!(1000), &history, now);

        assert_eq!(features.tx_frequency_24h, 1);
        assert_eq!(features.avg_amount, 100.0);
    }

    #[test]
    fn test_hour_derived_from_candidate_timestamp() {
        let at = Utc.with_ymd_and_hms(2026, 3, 14, 22, 15, 0).unwrap();
        let features = FeatureBuilder::new().build_at(&candidate(at), dec!(1000), &[], at);
        assert_eq!(features.transaction_hour, 22);
    }
}
