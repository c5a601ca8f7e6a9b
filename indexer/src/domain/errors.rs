use thiserror::Error;

use crate::infrastructure::persistence::error::StoreError;
use crate::infrastructure::tzkt::error::TzktError;

/// Error type for a sync cycle
#[derive(Debug, Error)]
pub enum SyncError {
    /// Upstream call failed; the cycle aborts and the next tick retries
    #[error("upstream {operation} failed: {source}")]
    Upstream {
        operation: String,
        #[source]
        source: TzktError,
    },

    /// Store call failed; the cycle aborts and the next tick retries
    #[error("store {operation} failed: {source}")]
    Store {
        operation: String,
        #[source]
        source: StoreError,
    },

    /// The cycle was cancelled at a suspension point
    #[error("sync cycle cancelled")]
    Cancelled,
}

impl SyncError {
    pub fn upstream(operation: impl Into<String>, source: TzktError) -> Self {
        SyncError::Upstream {
            operation: operation.into(),
            source,
        }
    }

    pub fn store(operation: impl Into<String>, source: StoreError) -> Self {
        SyncError::Store {
            operation: operation.into(),
            source,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, SyncError::Cancelled)
    }
}
