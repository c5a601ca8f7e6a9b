use async_trait::async_trait;

use crate::domain::models::{Account, Delegation, DelegationPage, ListQuery};
use crate::infrastructure::persistence::error::StoreError;

/// Durable, idempotent storage of delegations keyed by upstream id.
///
/// Implementations must treat re-insertion of an existing `upstream_id` as a
/// no-op, including across concurrent `save_delegations` calls.
#[async_trait]
pub trait DelegationStore: Send + Sync {
    /// Short tag used to label telemetry
    fn implementation(&self) -> &'static str;

    async fn ping(&self) -> Result<(), StoreError>;

    /// Inserts the batch in one transaction, ignoring known upstream ids.
    /// Returns the number of rows actually inserted.
    async fn save_delegations(&self, batch: &[Delegation]) -> Result<u64, StoreError>;

    /// Inserts accounts, ignoring known addresses
    async fn save_accounts(&self, batch: &[Account]) -> Result<u64, StoreError>;

    /// Highest stored block level, 0 when empty
    async fn highest_block_level(&self) -> Result<u64, StoreError>;

    /// Newest-first page plus the total matching the year filter
    async fn list_delegations(&self, query: &ListQuery) -> Result<DelegationPage, StoreError>;

    async fn count_delegations(&self, year: Option<i32>) -> Result<u64, StoreError>;

    /// Releases resources. Calling it again is a no-op.
    async fn close(&self) -> Result<(), StoreError>;
}
