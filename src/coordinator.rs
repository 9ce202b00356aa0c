//! Transaction coordinator: the state machine that turns a candidate
//! transaction into a persisted, classified, and (possibly) applied
//! monetary movement.
//!
//! Per request, strictly in order: Validate → Score → Persist → Apply →
//! Notify → Respond. The persist and apply steps go to storage as one atomic
//! unit, so a balance never moves without its record and cancellation before
//! that commit point leaves no trace.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::broadcaster::AlertBroadcaster;
use crate::error::{PipelineError, PipelineResult, RejectReason};
use crate::features::FeatureBuilder;
use crate::history::HistoryReader;
use crate::metrics::PipelineMetrics;
use crate::policy::DecisionPolicy;
use crate::scoring::ScoringClient;
use crate::storage::{AccountStore, NewTransaction, TransactionStore};
use crate::types::{AccountId, FraudEvent, TransactionRequest};

/// Caller-facing result of an accepted transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionOutcome {
    pub transaction_id: Uuid,
    pub fraud_score: f64,
    pub is_fraud: bool,
    /// Post-transaction balance; unchanged when classified fraud.
    pub new_balance: Decimal,
}

/// Orchestrates the fraud-scoring pipeline for each transaction request.
pub struct TransactionCoordinator {
    accounts: Arc<dyn AccountStore>,
    store: Arc<dyn TransactionStore>,
    history: HistoryReader,
    features: FeatureBuilder,
    scoring: ScoringClient,
    policy: DecisionPolicy,
    broadcaster: AlertBroadcaster,
    metrics: Arc<PipelineMetrics>,
    /// Per-account locks serializing the validate→persist sequence, so two
    /// concurrent requests cannot both pass the balance check against a
    /// stale balance.
    account_locks: Mutex<HashMap<AccountId, Arc<tokio::sync::Mutex<()>>>>,
}

impl TransactionCoordinator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        accounts: Arc<dyn AccountStore>,
        store: Arc<dyn TransactionStore>,
        history: HistoryReader,
        scoring: ScoringClient,
        policy: DecisionPolicy,
        broadcaster: AlertBroadcaster,
        metrics: Arc<PipelineMetrics>,
    ) -> Self {
        Self {
            accounts,
            store,
            history,
            features: FeatureBuilder::new(),
            scoring,
            policy,
            broadcaster,
            metrics,
            account_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Process one transaction request end to end.
    ///
    /// Validation failures reject with no side effects. Scoring and history
    /// failures degrade rather than fail. A failed storage write fails the
    /// whole request with no balance mutation.
    pub async fn process(&self, request: TransactionRequest) -> PipelineResult<TransactionOutcome> {
        let started = Instant::now();
        let lock = self.lock_for(request.account_id);
        let _guard = lock.lock().await;

        // 1. Validate
        if request.amount <= Decimal::ZERO {
            self.metrics.record_rejection();
            return Err(PipelineError::Rejected(RejectReason::InvalidAmount));
        }

        let account = self
            .accounts
            .find_account(request.account_id)
            .await?
            .ok_or_else(|| {
                self.metrics.record_rejection();
                PipelineError::Rejected(RejectReason::UnknownAccount)
            })?;

        if request.kind.is_outgoing() && request.amount > account.balance {
            self.metrics.record_rejection();
            return Err(PipelineError::Rejected(RejectReason::InsufficientBalance));
        }

        // 2. Score
        let history = self.history.recent(request.account_id, request.timestamp).await;
        let features = self.features.build(&request, account.balance, &history);
        let outcome = self.scoring.score(&features).await;
        if outcome.fallback {
            self.metrics.record_fallback();
        }
        let classification = self.policy.classify(outcome.probability);

        debug!(
            account_id = %request.account_id,
            history_len = history.len(),
            probability = outcome.probability,
            fallback = outcome.fallback,
            is_fraud = classification.is_fraud,
            "Transaction scored"
        );

        // 3 + 4. Persist the record and, iff non-fraud, the balance change,
        // as one atomic storage operation.
        let signed_amount = if request.kind.is_outgoing() {
            -request.amount
        } else {
            request.amount
        };
        let new_balance = if classification.is_fraud {
            None
        } else {
            Some(account.balance + signed_amount)
        };

        let record = self
            .store
            .persist_outcome(
                NewTransaction {
                    account_id: request.account_id,
                    amount: signed_amount,
                    merchant: request.kind.merchant(),
                    category: request.category.clone(),
                    channel: request.channel,
                    location: request.location(),
                    balance_at: account.balance,
                    timestamp: request.timestamp,
                    is_fraud: classification.is_fraud,
                    fraud_score: classification.score,
                },
                new_balance,
            )
            .await?;

        let balance = new_balance.unwrap_or(account.balance);

        // 5. Notify
        if record.is_fraud {
            let event = FraudEvent::from_record(&record);
            let delivered = self.broadcaster.broadcast(&event);
            info!(
                transaction_id = %record.id,
                account_id = %record.account_id,
                fraud_score = record.fraud_score,
                delivered,
                "Fraudulent transaction flagged; alert broadcast"
            );
        }

        self.metrics
            .record_transaction(started.elapsed(), record.fraud_score, record.is_fraud);

        // 6. Respond
        Ok(TransactionOutcome {
            transaction_id: record.id,
            fraud_score: record.fraud_score,
            is_fraud: record.is_fraud,
            new_balance: balance,
        })
    }

    fn lock_for(&self, account_id: AccountId) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.account_locks.lock().unwrap();
        locks.entry(account_id).or_default().clone()
    }
}
