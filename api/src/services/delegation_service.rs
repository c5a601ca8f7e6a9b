use std::sync::Arc;

use tezos_indexer::infrastructure::persistence::DelegationStore;

use crate::error::ApiResult;
use crate::models::{DelegationData, DelegationsResponse, ListParams, PaginationMeta};

/// Read-side use cases over stored delegations
#[derive(Clone)]
pub struct DelegationService {
    store: Arc<dyn DelegationStore>,
}

impl DelegationService {
    pub fn new(store: Arc<dyn DelegationStore>) -> Self {
        Self { store }
    }

    /// Newest-first page of delegations with pagination metadata
    pub async fn list(&self, params: ListParams) -> ApiResult<DelegationsResponse> {
        let page = self.store.list_delegations(&params.to_query()).await?;

        Ok(DelegationsResponse {
            data: page.items.into_iter().map(DelegationData::from).collect(),
            pagination: PaginationMeta::new(params.page, params.limit, page.total),
        })
    }
}
