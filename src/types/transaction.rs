//! Transaction data structures: incoming requests, persisted records, and
//! the history projection used for feature derivation.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::account::AccountId;

/// Channel through which the transaction was initiated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Online,
    Pos,
    Atm,
}

/// The kind of monetary movement being requested.
///
/// Transfers and payments are outgoing (debit); deposits are incoming
/// (credit). All three run through the same scoring pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransactionKind {
    Transfer { recipient: String },
    Payment { merchant_id: String },
    Deposit,
}

impl TransactionKind {
    /// Whether this movement debits the account balance.
    pub fn is_outgoing(&self) -> bool {
        !matches!(self, TransactionKind::Deposit)
    }

    /// Human-readable counterparty string stored on the record.
    pub fn merchant(&self) -> String {
        match self {
            TransactionKind::Transfer { recipient } => format!("Transfer to {recipient}"),
            TransactionKind::Payment { merchant_id } => format!("Payment to {merchant_id}"),
            TransactionKind::Deposit => "Cash Deposit".to_string(),
        }
    }
}

/// A proposed monetary movement, submitted for scoring before it is
/// committed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRequest {
    pub account_id: AccountId,

    /// Requested amount (magnitude; direction comes from `kind`).
    pub amount: Decimal,

    #[serde(flatten)]
    pub kind: TransactionKind,

    /// Merchant category, e.g. "Electronics" or "Groceries".
    pub category: String,

    pub channel: Channel,

    pub city: String,
    pub state: String,

    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl TransactionRequest {
    /// Free-text location stored on the record.
    pub fn location(&self) -> String {
        format!("{}, {}", self.city.trim(), self.state.trim())
    }
}

/// A persisted transaction. Immutable once written: the classification and
/// score are produced before persistence and never retroactively altered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: Uuid,
    pub account_id: AccountId,

    /// Signed amount: negative for transfers/payments, positive for deposits.
    pub amount: Decimal,

    pub merchant: String,
    pub category: String,
    pub channel: Channel,
    pub location: String,

    /// Account balance at the time the transaction was scored (before any
    /// mutation from this transaction).
    pub balance_at: Decimal,

    pub timestamp: DateTime<Utc>,

    pub is_fraud: bool,

    /// Fraud probability in [0.0, 1.0].
    pub fraud_score: f64,
}

/// Fixed projection of a prior transaction, read by the history reader for
/// feature derivation only.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    /// Amount magnitude (unsigned).
    pub amount: Decimal,
    pub category: String,
    pub timestamp: DateTime<Utc>,
    pub is_fraud: bool,
}
