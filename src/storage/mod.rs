//! Storage ports consumed by the pipeline.
//!
//! The relational store itself is an external collaborator; the pipeline
//! only sees these traits. The in-memory implementation in [`memory`] backs
//! the reference binary and the test suite.

pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::error::StorageError;
use crate::types::{Account, AccountId, Channel, HistoryEntry, TransactionRecord};

pub use memory::MemoryStore;

/// Fields of a transaction record about to be persisted.
///
/// Classification fields are always populated before this struct is built;
/// a partial record cannot exist.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub account_id: AccountId,
    /// Signed amount: negative for outgoing, positive for deposits.
    pub amount: Decimal,
    pub merchant: String,
    pub category: String,
    pub channel: Channel,
    pub location: String,
    pub balance_at: Decimal,
    pub timestamp: DateTime<Utc>,
    pub is_fraud: bool,
    pub fraud_score: f64,
}

/// Read access to account state.
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn find_account(&self, id: AccountId) -> Result<Option<Account>, StorageError>;
}

/// Transaction record persistence and history queries.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Up to `limit` records for `account_id` strictly older than `before`,
    /// newest first, projected down to the fields needed for features.
    async fn find_recent(
        &self,
        account_id: AccountId,
        before: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<HistoryEntry>, StorageError>;

    /// Persist the record and, when `new_balance` is set, the account
    /// balance, as a single atomic unit. Either both happen or neither.
    async fn persist_outcome(
        &self,
        tx: NewTransaction,
        new_balance: Option<Decimal>,
    ) -> Result<TransactionRecord, StorageError>;

    /// All records classified as fraud, for the admin monitor.
    async fn find_fraudulent(&self) -> Result<Vec<TransactionRecord>, StorageError>;
}
