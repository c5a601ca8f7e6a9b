//! In-process upstream used by `tzktapi.impl: mock` and by tests

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::infrastructure::tzkt::error::TzktError;
use crate::infrastructure::tzkt::types::{TzktAlias, TzktDelegation};
use crate::infrastructure::tzkt::{check_limit, DelegationSource};

/// A request served by [`MockTzktSource`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockRequest {
    Page { limit: u32, offset: u64 },
    AboveLevel { level: u64, limit: u32 },
}

/// Serves a fixed, id-ordered dataset with the upstream paging semantics
#[derive(Default)]
pub struct MockTzktSource {
    operations: Mutex<Vec<TzktDelegation>>,
    requests: Mutex<Vec<MockRequest>>,
    unavailable: AtomicBool,
    latency: Mutex<Option<Duration>>,
}

impl MockTzktSource {
    pub fn new(operations: Vec<TzktDelegation>) -> Self {
        let source = Self::default();
        source.extend(operations);
        source
    }

    /// Deterministic dataset for demo deployments: 2 500 operations over
    /// 500 levels, every tenth one failed
    pub fn with_sample_data() -> Self {
        const BAKERS: [&str; 3] = [
            "tz3RDC3Jdn4j15J7bBHZd29EUee9gVB1CxD9",
            "tz3bvNMQ95vfAYtG8193ymshqjSvmxiCUuR5",
            "tz3WXYtyDUNL91qfiCJtVUX746QpNv5i5ve5",
        ];
        // 2021-01-01T00:00:00Z
        const GENESIS: i64 = 1_609_459_200;

        let operations = (1..=2_500u64)
            .map(|id| {
                let level = 1_000 + id / 5;
                let status = if id % 10 == 0 { "failed" } else { "applied" };
                let baker = BAKERS[(id % 3) as usize];
                let timestamp =
                    DateTime::from_timestamp(GENESIS + level as i64 * 30, 0).unwrap_or_default();
                sample_operation(id, level, timestamp, baker, id * 1_250_000, status)
            })
            .collect();

        Self::new(operations)
    }

    /// Append operations, keeping the set ordered by id
    pub fn extend(&self, operations: impl IntoIterator<Item = TzktDelegation>) {
        let mut ops = self.lock_operations();
        ops.extend(operations);
        ops.sort_by_key(|op| op.id);
        ops.dedup_by_key(|op| op.id);
    }

    /// Make every subsequent call fail with a 503
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Delay every answer by `latency`
    pub fn set_latency(&self, latency: Option<Duration>) {
        *self.latency.lock().unwrap_or_else(|e| e.into_inner()) = latency;
    }

    /// Requests served so far, in order
    pub fn requests(&self) -> Vec<MockRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn len(&self) -> usize {
        self.lock_operations().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock_operations(&self) -> std::sync::MutexGuard<'_, Vec<TzktDelegation>> {
        self.operations.lock().unwrap_or_else(|e| e.into_inner())
    }

    async fn serve(&self, request: MockRequest) -> Result<(), TzktError> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request);

        let latency = *self.latency.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        if self.unavailable.load(Ordering::SeqCst) {
            return Err(TzktError::Status {
                url: "mock://tzkt/v1/operations/delegations".to_string(),
                status: 503,
                body: "upstream unavailable".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl DelegationSource for MockTzktSource {
    fn implementation(&self) -> &'static str {
        "mock"
    }

    async fn fetch_page(&self, limit: u32, offset: u64) -> Result<Vec<TzktDelegation>, TzktError> {
        check_limit(limit)?;
        self.serve(MockRequest::Page { limit, offset }).await?;

        let ops = self.lock_operations();
        Ok(ops
            .iter()
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn fetch_above_level(
        &self,
        level: u64,
        limit: u32,
    ) -> Result<Vec<TzktDelegation>, TzktError> {
        check_limit(limit)?;
        self.serve(MockRequest::AboveLevel { level, limit }).await?;

        let ops = self.lock_operations();
        Ok(ops
            .iter()
            .filter(|op| op.level > level)
            .take(limit as usize)
            .cloned()
            .collect())
    }
}

/// Builds an upstream record with a synthetic sender derived from `id`
pub fn sample_operation(
    id: u64,
    level: u64,
    timestamp: DateTime<Utc>,
    delegate: &str,
    amount: u64,
    status: &str,
) -> TzktDelegation {
    TzktDelegation {
        kind: "delegation".to_string(),
        id,
        level,
        timestamp,
        hash: format!("oo{id:0>49}"),
        sender: TzktAlias {
            address: format!("tz1{id:0>33}"),
            alias: None,
        },
        new_delegate: Some(TzktAlias {
            address: delegate.to_string(),
            alias: None,
        }),
        amount,
        status: status.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn dataset() -> MockTzktSource {
        let ts = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        MockTzktSource::new(
            (1..=5)
                .map(|id| sample_operation(id, 10 + id / 2, ts, "tz1baker", 1, "applied"))
                .collect(),
        )
    }

    #[tokio::test]
    async fn pages_by_offset() {
        let source = dataset();
        let page = source.fetch_page(2, 2).await.unwrap();
        let ids: Vec<u64> = page.iter().map(|op| op.id).collect();
        assert_eq!(ids, vec![3, 4]);
        assert!(source.fetch_page(2, 6).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn filters_strictly_above_level() {
        let source = dataset();
        // levels: 10, 11, 11, 12, 12
        let page = source.fetch_above_level(11, 10).await.unwrap();
        let ids: Vec<u64> = page.iter().map(|op| op.id).collect();
        assert_eq!(ids, vec![4, 5]);
        assert_eq!(source.fetch_above_level(10, 1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn records_requests_and_fails_when_unavailable() {
        let source = dataset();
        source.set_unavailable(true);
        let err = source.fetch_page(10, 0).await.unwrap_err();
        assert!(matches!(err, TzktError::Status { status: 503, .. }));
        assert_eq!(
            source.requests(),
            vec![MockRequest::Page { limit: 10, offset: 0 }]
        );
    }

    #[test]
    fn sample_data_uses_valid_sender_addresses() {
        let source = MockTzktSource::with_sample_data();
        assert_eq!(source.len(), 2_500);
        let ops = source.lock_operations();
        assert!(ops
            .iter()
            .all(|op| crate::domain::models::WalletAddress::is_valid(&op.sender.address)));
    }
}
