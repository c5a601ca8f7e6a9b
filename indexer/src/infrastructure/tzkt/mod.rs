//! Access to the TzKT public indexer API

pub mod client;
pub mod error;
pub mod mock;
pub mod types;

pub use client::TzktClient;
pub use error::TzktError;
pub use mock::{MockRequest, MockTzktSource};
pub use types::{TzktAlias, TzktDelegation};

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{TzktApiConfig, UpstreamImpl};

/// Largest page the upstream accepts
pub const MAX_PAGE_LIMIT: u32 = 10_000;

/// Read access to upstream delegation operations.
///
/// Both calls return records in ascending upstream id order. Cancellation is
/// dropping the returned future, which aborts any in-flight request.
#[async_trait]
pub trait DelegationSource: Send + Sync {
    /// Short tag used to label telemetry
    fn implementation(&self) -> &'static str;

    /// Offset page of delegations. An empty page signals end of data.
    async fn fetch_page(&self, limit: u32, offset: u64) -> Result<Vec<TzktDelegation>, TzktError>;

    /// Delegations strictly above `level`, capped at `limit`
    async fn fetch_above_level(
        &self,
        level: u64,
        limit: u32,
    ) -> Result<Vec<TzktDelegation>, TzktError>;
}

pub(crate) fn check_limit(limit: u32) -> Result<(), TzktError> {
    if limit == 0 || limit > MAX_PAGE_LIMIT {
        return Err(TzktError::InvalidRequest(format!(
            "limit must be within [1, {MAX_PAGE_LIMIT}], got {limit}"
        )));
    }
    Ok(())
}

/// Builds the source selected by `tzktapi.impl`
pub fn build_source(config: &TzktApiConfig) -> Result<Arc<dyn DelegationSource>, TzktError> {
    match config.implementation {
        UpstreamImpl::Api => Ok(Arc::new(TzktClient::new(&config.api)?)),
        UpstreamImpl::Mock => Ok(Arc::new(MockTzktSource::with_sample_data())),
    }
}
