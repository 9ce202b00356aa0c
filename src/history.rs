//! Bounded recent-history reads for feature derivation.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::storage::TransactionStore;
use crate::types::{AccountId, HistoryEntry};

/// Default number of prior transactions considered per request.
pub const DEFAULT_HISTORY_WINDOW: usize = 5;

/// Reads the bounded window of prior transactions for an account.
///
/// A storage failure here degrades to an empty window instead of propagating:
/// absence of history must never block a transaction attempt. The trade-off
/// is reduced feature quality for that one request, which is why the failure
/// is logged rather than silently swallowed.
pub struct HistoryReader {
    store: Arc<dyn TransactionStore>,
    window: usize,
}

impl HistoryReader {
    pub fn new(store: Arc<dyn TransactionStore>, window: usize) -> Self {
        Self { store, window }
    }

    /// Up to `window` records strictly older than `before`, newest first.
    pub async fn recent(&self, account_id: AccountId, before: DateTime<Utc>) -> Vec<HistoryEntry> {
        match self.store.find_recent(account_id, before, self.window).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(
                    account_id = %account_id,
                    error = %e,
                    "History fetch failed; scoring with empty window (reduced feature quality)"
                );
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_storage_failure_degrades_to_empty_window() {
        let store = Arc::new(MemoryStore::new());
        let account = store.add_account("alice", dec!(1000));
        store.fail_history(true);

        let reader = HistoryReader::new(store.clone(), DEFAULT_HISTORY_WINDOW);
        let history = reader.recent(account.id, Utc::now()).await;
        assert!(history.is_empty());
    }
}
