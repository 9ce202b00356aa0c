//! Error types for the fraud-scoring pipeline.
//!
//! The taxonomy follows the failure policy of the pipeline:
//!
//! - [`RejectReason`] — validation failures, surfaced to the caller with no
//!   side effects.
//! - [`ScoringError`] — failures of the external scoring boundary; recovered
//!   locally via the fail-open fallback score and never surfaced.
//! - [`StorageError`] — storage collaborator failures; a failed history read
//!   degrades to an empty window, a failed write is fatal for the request.
//! - [`PipelineError`] — the coordinator's caller-facing error type.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reason a transaction request was rejected during validation.
///
/// A rejected request produces no transaction record, no balance change, and
/// no alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    #[error("account not found")]
    UnknownAccount,

    #[error("insufficient balance")]
    InsufficientBalance,

    #[error("amount must be a positive number")]
    InvalidAmount,
}

/// Failures of the external scoring boundary.
///
/// None of these reach the caller: the scoring client converts every variant
/// into the fixed fallback score.
#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("scoring request timed out after {0}ms")]
    Timeout(u64),

    #[error("scoring transport error: {0}")]
    Transport(String),

    #[error("malformed scoring response: {0}")]
    MalformedResponse(String),

    #[error("fraud probability out of range: {0}")]
    OutOfRange(f64),
}

/// Storage collaborator errors.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("query failed: {0}")]
    Query(String),
}

/// Top-level error returned by the transaction coordinator.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The request failed validation. Terminal, no side effects.
    #[error("request rejected: {0}")]
    Rejected(RejectReason),

    /// The outcome could not be persisted. Guaranteed: no balance mutation
    /// occurred for this request.
    #[error("persistence failure: {0}")]
    Persistence(#[from] StorageError),
}

/// Result type for coordinator operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_converts_to_pipeline_error() {
        let err: PipelineError = StorageError::Query("write failed".into()).into();
        assert!(err.to_string().contains("write failed"));
    }

    #[test]
    fn test_reject_reason_serializes_as_snake_case() {
        let json = serde_json::to_string(&RejectReason::InsufficientBalance).unwrap();
        assert_eq!(json, "\"insufficient_balance\"");
    }
}
