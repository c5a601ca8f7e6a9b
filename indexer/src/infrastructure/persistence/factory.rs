use std::sync::Arc;

use tracing::info;

use crate::config::{DatabaseConfig, DatabaseImpl};
use crate::infrastructure::persistence::connection::DbPool;
use crate::infrastructure::persistence::error::StoreError;
use crate::infrastructure::persistence::memory::MemoryStore;
use crate::infrastructure::persistence::repositories::PostgresStore;
use crate::infrastructure::persistence::store::DelegationStore;

/// Builds the store selected by `database.impl`
pub async fn build_store(config: &DatabaseConfig) -> Result<Arc<dyn DelegationStore>, StoreError> {
    match config.implementation {
        DatabaseImpl::Psql => {
            let pool = DbPool::new(config).await?;
            let store = PostgresStore::new(pool.into_connection());
            store.ping().await?;
            Ok(Arc::new(store))
        }
        DatabaseImpl::Memory => {
            info!("Using in-memory store; data is lost on exit");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}
