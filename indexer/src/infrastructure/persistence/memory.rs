//! Process-local store honoring the same contract as the Postgres one

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::models::{
    year_window, Account, Delegation, DelegationPage, ListQuery, StoredDelegation,
};
use crate::infrastructure::persistence::error::StoreError;
use crate::infrastructure::persistence::store::DelegationStore;

#[derive(Default)]
struct Tables {
    delegations: BTreeMap<u64, StoredDelegation>,
    accounts: BTreeMap<String, Account>,
    next_id: i64,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    unavailable: AtomicBool,
    closed: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call, including `ping`, fail until reset
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Stored delegations ordered by upstream id
    pub fn delegations(&self) -> Vec<StoredDelegation> {
        self.lock().delegations.values().cloned().collect()
    }

    pub fn accounts(&self) -> Vec<Account> {
        self.lock().accounts.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().delegations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(StoreError::Closed);
        }
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable);
        }
        Ok(())
    }

    fn matching(tables: &Tables, year: Option<i32>) -> Vec<&StoredDelegation> {
        let window = year.map(year_window);
        tables
            .delegations
            .values()
            .filter(|row| match window {
                None => true,
                Some(None) => false,
                Some(Some((start, end))) => {
                    let ts = row.delegation.timestamp.timestamp();
                    ts >= start && ts < end
                }
            })
            .collect()
    }
}

#[async_trait]
impl DelegationStore for MemoryStore {
    fn implementation(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.check()
    }

    async fn save_delegations(&self, batch: &[Delegation]) -> Result<u64, StoreError> {
        self.check()?;
        let now = Utc::now();
        let mut tables = self.lock();

        // Validate up front so a bad row leaves the table untouched
        for delegation in batch {
            if i64::try_from(delegation.upstream_id).is_err() {
                return Err(StoreError::InvalidData(format!(
                    "upstream_id {} exceeds BIGINT",
                    delegation.upstream_id
                )));
            }
        }

        let mut inserted = 0;
        for delegation in batch {
            if tables.delegations.contains_key(&delegation.upstream_id) {
                continue;
            }
            tables.next_id += 1;
            let id = tables.next_id;
            tables.delegations.insert(
                delegation.upstream_id,
                StoredDelegation {
                    id,
                    delegation: delegation.clone(),
                    created_at: now,
                },
            );
            inserted += 1;
        }
        Ok(inserted)
    }

    async fn save_accounts(&self, batch: &[Account]) -> Result<u64, StoreError> {
        self.check()?;
        let mut tables = self.lock();
        let mut inserted = 0;
        for account in batch {
            if !tables.accounts.contains_key(&account.address) {
                tables
                    .accounts
                    .insert(account.address.clone(), account.clone());
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    async fn highest_block_level(&self) -> Result<u64, StoreError> {
        self.check()?;
        Ok(self
            .lock()
            .delegations
            .values()
            .map(|row| row.delegation.block_level)
            .max()
            .unwrap_or(0))
    }

    async fn list_delegations(&self, query: &ListQuery) -> Result<DelegationPage, StoreError> {
        self.check()?;
        let tables = self.lock();
        let mut rows = Self::matching(&tables, query.year);
        rows.sort_by(|a, b| {
            sort_key(b.delegation.timestamp, b.delegation.upstream_id)
                .cmp(&sort_key(a.delegation.timestamp, a.delegation.upstream_id))
        });

        let total = rows.len() as u64;
        let items = rows
            .into_iter()
            .skip(query.offset() as usize)
            .take(query.limit as usize)
            .cloned()
            .collect();

        Ok(DelegationPage { items, total })
    }

    async fn count_delegations(&self, year: Option<i32>) -> Result<u64, StoreError> {
        self.check()?;
        Ok(Self::matching(&self.lock(), year).len() as u64)
    }

    async fn close(&self) -> Result<(), StoreError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

fn sort_key(timestamp: DateTime<Utc>, upstream_id: u64) -> (i64, u64) {
    (timestamp.timestamp(), upstream_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal::Decimal;

    fn delegation(id: u64, level: u64, year: i32) -> Delegation {
        Delegation {
            upstream_id: id,
            delegator: format!("tz1{id:0>33}"),
            delegate: "tz3WXYtyDUNL91qfiCJtVUX746QpNv5i5ve5".to_string(),
            amount_tez: Decimal::ONE,
            block_level: level,
            timestamp: Utc.with_ymd_and_hms(year, 6, 1, 0, 0, id as u32).unwrap(),
        }
    }

    #[tokio::test]
    async fn duplicate_batch_is_a_no_op() {
        let store = MemoryStore::new();
        let batch = vec![delegation(1, 10, 2023), delegation(2, 11, 2023)];
        assert_eq!(store.save_delegations(&batch).await.unwrap(), 2);
        assert_eq!(store.save_delegations(&batch).await.unwrap(), 0);
        assert_eq!(store.count_delegations(None).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn highest_level_is_zero_when_empty() {
        let store = MemoryStore::new();
        assert_eq!(store.highest_block_level().await.unwrap(), 0);
        store
            .save_delegations(&[delegation(5, 40, 2022), delegation(6, 41, 2022)])
            .await
            .unwrap();
        assert_eq!(store.highest_block_level().await.unwrap(), 41);
    }

    #[tokio::test]
    async fn lists_newest_first_within_year() {
        let store = MemoryStore::new();
        store
            .save_delegations(&[
                delegation(1, 10, 2022),
                delegation(2, 11, 2023),
                delegation(3, 12, 2023),
            ])
            .await
            .unwrap();

        let page = store
            .list_delegations(&ListQuery::new(1, 10, Some(2023)))
            .await
            .unwrap();
        assert_eq!(page.total, 2);
        let ids: Vec<u64> = page.items.iter().map(|r| r.delegation.upstream_id).collect();
        assert_eq!(ids, vec![3, 2]);

        let second = store
            .list_delegations(&ListQuery::new(2, 2, None))
            .await
            .unwrap();
        assert_eq!(second.total, 3);
        assert_eq!(second.items.len(), 1);
        assert_eq!(second.items[0].delegation.upstream_id, 1);

        assert_eq!(store.count_delegations(Some(1999)).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn unavailable_store_fails_ping_and_writes() {
        let store = MemoryStore::new();
        store.set_unavailable(true);
        assert!(store.ping().await.is_err());
        assert!(store.save_delegations(&[delegation(1, 1, 2023)]).await.is_err());
        store.set_unavailable(false);
        store.ping().await.unwrap();
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn close_is_idempotent() {
        let store = MemoryStore::new();
        store.close().await.unwrap();
        store.close().await.unwrap();
        assert!(matches!(store.ping().await, Err(StoreError::Closed)));
    }
}
