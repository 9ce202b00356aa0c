//! Transaction Fraud-Scoring Pipeline
//!
//! Accepts proposed monetary movements, derives risk features from recent
//! account history, obtains a fraud classification from an external scoring
//! boundary, and applies the decision to account state: a balance moves iff
//! the transaction is classified non-fraud, and fraud alerts fan out to all
//! registered live subscribers.

pub mod broadcaster;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod features;
pub mod history;
pub mod metrics;
pub mod policy;
pub mod producer;
pub mod scoring;
pub mod server;
pub mod storage;
pub mod types;

pub use broadcaster::{AlertBroadcaster, SubscriberRegistry};
pub use config::AppConfig;
pub use coordinator::{TransactionCoordinator, TransactionOutcome};
pub use error::{PipelineError, RejectReason};
pub use features::{FeatureBuilder, FeatureVector};
pub use history::HistoryReader;
pub use scoring::{Scorer, ScoringClient, FALLBACK_SCORE};
pub use storage::{AccountStore, MemoryStore, TransactionStore};
pub use types::{Account, FraudEvent, TransactionRecord, TransactionRequest};
