//! Core data types for the fraud-scoring pipeline.

pub mod account;
pub mod event;
pub mod transaction;

pub use account::{Account, AccountId, Role};
pub use event::FraudEvent;
pub use transaction::{
    Channel, HistoryEntry, TransactionKind, TransactionRecord, TransactionRequest,
};
