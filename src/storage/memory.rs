//! In-memory store backing the reference binary and the test suite.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::StorageError;
use crate::storage::{AccountStore, NewTransaction, TransactionStore};
use crate::types::{Account, AccountId, HistoryEntry, TransactionRecord};

#[derive(Default)]
struct Inner {
    accounts: HashMap<AccountId, Account>,
    transactions: Vec<TransactionRecord>,
}

/// Thread-safe in-memory store.
///
/// A single mutex over all state makes `persist_outcome` trivially atomic:
/// the record insert and the balance update happen under one critical
/// section. The failure toggles let tests exercise the degraded-history and
/// failed-write paths.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    fail_history: AtomicBool,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an account and return it.
    pub fn add_account(&self, username: &str, balance: Decimal) -> Account {
        let account = Account::new(username, balance);
        let mut inner = self.inner.lock().unwrap();
        inner.accounts.insert(account.id, account.clone());
        account
    }

    /// Current balance, if the account exists.
    pub fn balance_of(&self, id: AccountId) -> Option<Decimal> {
        let inner = self.inner.lock().unwrap();
        inner.accounts.get(&id).map(|a| a.balance)
    }

    /// Number of persisted records.
    pub fn record_count(&self) -> usize {
        self.inner.lock().unwrap().transactions.len()
    }

    /// Make subsequent history reads fail.
    pub fn fail_history(&self, fail: bool) {
        self.fail_history.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent writes fail.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn find_account(&self, id: AccountId) -> Result<Option<Account>, StorageError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.accounts.get(&id).cloned())
    }
}

#[async_trait]
impl TransactionStore for MemoryStore {
    async fn find_recent(
        &self,
        account_id: AccountId,
        before: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<HistoryEntry>, StorageError> {
        if self.fail_history.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("history reads disabled".into()));
        }

        let inner = self.inner.lock().unwrap();
        let mut prior: Vec<&TransactionRecord> = inner
            .transactions
            .iter()
            .filter(|t| t.account_id == account_id && t.timestamp < before)
            .collect();
        prior.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        Ok(prior
            .into_iter()
            .take(limit)
            .map(|t| HistoryEntry {
                amount: t.amount.abs(),
                category: t.category.clone(),
                timestamp: t.timestamp,
                is_fraud: t.is_fraud,
            })
            .collect())
    }

    async fn persist_outcome(
        &self,
        tx: NewTransaction,
        new_balance: Option<Decimal>,
    ) -> Result<TransactionRecord, StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("writes disabled".into()));
        }

        let mut inner = self.inner.lock().unwrap();

        let record = TransactionRecord {
            id: Uuid::new_v4(),
            account_id: tx.account_id,
            amount: tx.amount,
            merchant: tx.merchant,
            category: tx.category,
            channel: tx.channel,
            location: tx.location,
            balance_at: tx.balance_at,
            timestamp: tx.timestamp,
            is_fraud: tx.is_fraud,
            fraud_score: tx.fraud_score,
        };
        inner.transactions.push(record.clone());

        if let Some(balance) = new_balance {
            let account = inner
                .accounts
                .get_mut(&tx.account_id)
                .ok_or_else(|| StorageError::Query(format!("no account {}", tx.account_id)))?;
            account.balance = balance;
        }

        Ok(record)
    }

    async fn find_fraudulent(&self) -> Result<Vec<TransactionRecord>, StorageError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .transactions
            .iter()
            .filter(|t| t.is_fraud)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Channel;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn new_tx(account_id: AccountId, amount: Decimal, at: DateTime<Utc>) -> NewTransaction {
        NewTransaction {
            account_id,
            amount,
            merchant: "Cash Deposit".into(),
            category: "Groceries".into(),
            channel: Channel::Pos,
            location: "Local, Town".into(),
            balance_at: dec!(1000),
            timestamp: at,
            is_fraud: false,
            fraud_score: 0.1,
        }
    }

    #[tokio::test]
    async fn test_find_recent_orders_newest_first_and_bounds() {
        let store = MemoryStore::new();
        let account = store.add_account("alice", dec!(1000));
        let now = Utc::now();

        for i in 1..=8 {
            store
                .persist_outcome(
                    new_tx(account.id, dec!(10), now - Duration::hours(i)),
                    None,
                )
                .await
                .unwrap();
        }
        // One record at the reference instant: must be excluded (strictly older).
        store
            .persist_outcome(new_tx(account.id, dec!(10), now), None)
            .await
            .unwrap();

        let history = store.find_recent(account.id, now, 5).await.unwrap();
        assert_eq!(history.len(), 5);
        assert!(history.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));
        assert!(history.iter().all(|h| h.timestamp < now));
    }

    #[tokio::test]
    async fn test_persist_outcome_updates_balance_atomically() {
        let store = MemoryStore::new();
        let account = store.add_account("alice", dec!(1000));

        let record = store
            .persist_outcome(
                new_tx(account.id, dec!(-300), Utc::now()),
                Some(dec!(700)),
            )
            .await
            .unwrap();

        assert_eq!(record.amount, dec!(-300));
        assert_eq!(store.balance_of(account.id), Some(dec!(700)));
        assert_eq!(store.record_count(), 1);
    }

    #[tokio::test]
    async fn test_history_projection_uses_magnitudes() {
        let store = MemoryStore::new();
        let account = store.add_account("alice", dec!(1000));
        let now = Utc::now();

        store
            .persist_outcome(
                new_tx(account.id, dec!(-250), now - Duration::hours(1)),
                None,
            )
            .await
            .unwrap();

        let history = store.find_recent(account.id, now, 5).await.unwrap();
        assert_eq!(history[0].amount, dec!(250));
    }

    #[tokio::test]
    async fn test_failure_toggles() {
        let store = MemoryStore::new();
        let account = store.add_account("alice", dec!(1000));

        store.fail_history(true);
        assert!(store.find_recent(account.id, Utc::now(), 5).await.is_err());
        store.fail_history(false);

        store.fail_writes(true);
        let err = store
            .persist_outcome(new_tx(account.id, dec!(10), Utc::now()), Some(dec!(990)))
            .await;
        assert!(err.is_err());
        // Nothing written, balance untouched.
        assert_eq!(store.record_count(), 0);
        assert_eq!(store.balance_of(account.id), Some(dec!(1000)));
    }
}
