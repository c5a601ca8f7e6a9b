pub mod account_repository;
pub mod delegation_repository;

pub use account_repository::AccountRepository;
pub use delegation_repository::DelegationRepository;

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use sea_orm::DatabaseConnection;
use tracing::info;

use crate::domain::models::{Account, Delegation, DelegationPage, ListQuery};
use crate::infrastructure::persistence::error::StoreError;
use crate::infrastructure::persistence::store::DelegationStore;

/// Postgres-backed store over the shared connection pool
pub struct PostgresStore {
    conn: DatabaseConnection,
    delegations: DelegationRepository,
    accounts: AccountRepository,
    closed: AtomicBool,
}

impl PostgresStore {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self {
            delegations: DelegationRepository::new(conn.clone()),
            accounts: AccountRepository::new(conn.clone()),
            conn,
            closed: AtomicBool::new(false),
        }
    }

    fn ensure_open(&self) -> Result<(), StoreError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(StoreError::Closed);
        }
        Ok(())
    }
}

#[async_trait]
impl DelegationStore for PostgresStore {
    fn implementation(&self) -> &'static str {
        "psql"
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.ensure_open()?;
        Ok(self.conn.ping().await?)
    }

    async fn save_delegations(&self, batch: &[Delegation]) -> Result<u64, StoreError> {
        self.ensure_open()?;
        self.delegations.save_batch(batch).await
    }

    async fn save_accounts(&self, batch: &[Account]) -> Result<u64, StoreError> {
        self.ensure_open()?;
        self.accounts.save_batch(batch).await
    }

    async fn highest_block_level(&self) -> Result<u64, StoreError> {
        self.ensure_open()?;
        self.delegations.highest_level().await
    }

    async fn list_delegations(&self, query: &ListQuery) -> Result<DelegationPage, StoreError> {
        self.ensure_open()?;
        self.delegations.find_page(query).await
    }

    async fn count_delegations(&self, year: Option<i32>) -> Result<u64, StoreError> {
        self.ensure_open()?;
        self.delegations.count(year).await
    }

    async fn close(&self) -> Result<(), StoreError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        info!("Closing database connection pool");
        Ok(self.conn.clone().close().await?)
    }
}
