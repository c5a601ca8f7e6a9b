//! Pass-through decorators timing every call on the source and store

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::time::Instant;

use crate::domain::models::{Account, Delegation, DelegationPage, ListQuery};
use crate::infrastructure::persistence::{DelegationStore, StoreError};
use crate::infrastructure::telemetry::recorder::{MetricsRecorder, Outcome};
use crate::infrastructure::tzkt::{DelegationSource, TzktDelegation, TzktError};

/// Records one observation per call; a call dropped before completion
/// (cancelled by the sync engine) is recorded as a failure
struct CallTimer<'a> {
    recorder: &'a Arc<dyn MetricsRecorder>,
    operation: &'static str,
    implementation: &'static str,
    started: Instant,
    finished: bool,
}

impl<'a> CallTimer<'a> {
    fn start(
        recorder: &'a Arc<dyn MetricsRecorder>,
        operation: &'static str,
        implementation: &'static str,
    ) -> Self {
        Self {
            recorder,
            operation,
            implementation,
            started: Instant::now(),
            finished: false,
        }
    }

    fn finish(mut self, outcome: Outcome) {
        self.finished = true;
        self.observe(outcome);
    }

    fn observe(&self, outcome: Outcome) {
        self.recorder.observe_call(
            self.operation,
            self.implementation,
            outcome,
            self.started.elapsed(),
        );
    }
}

impl Drop for CallTimer<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.observe(Outcome::Failure);
        }
    }
}

async fn timed<T, E, F>(
    recorder: Option<&Arc<dyn MetricsRecorder>>,
    operation: &'static str,
    implementation: &'static str,
    call: F,
) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
{
    let Some(recorder) = recorder else {
        return call.await;
    };
    let timer = CallTimer::start(recorder, operation, implementation);
    let result = call.await;
    timer.finish(Outcome::of(&result));
    result
}

pub struct InstrumentedSource {
    inner: Arc<dyn DelegationSource>,
    recorder: Option<Arc<dyn MetricsRecorder>>,
}

impl InstrumentedSource {
    pub fn new(inner: Arc<dyn DelegationSource>, recorder: Option<Arc<dyn MetricsRecorder>>) -> Self {
        Self { inner, recorder }
    }
}

#[async_trait]
impl DelegationSource for InstrumentedSource {
    fn implementation(&self) -> &'static str {
        self.inner.implementation()
    }

    async fn fetch_page(&self, limit: u32, offset: u64) -> Result<Vec<TzktDelegation>, TzktError> {
        timed(
            self.recorder.as_ref(),
            "fetch_page",
            self.inner.implementation(),
            self.inner.fetch_page(limit, offset),
        )
        .await
    }

    async fn fetch_above_level(
        &self,
        level: u64,
        limit: u32,
    ) -> Result<Vec<TzktDelegation>, TzktError> {
        timed(
            self.recorder.as_ref(),
            "fetch_above_level",
            self.inner.implementation(),
            self.inner.fetch_above_level(level, limit),
        )
        .await
    }
}

pub struct InstrumentedStore {
    inner: Arc<dyn DelegationStore>,
    recorder: Option<Arc<dyn MetricsRecorder>>,
}

impl InstrumentedStore {
    pub fn new(inner: Arc<dyn DelegationStore>, recorder: Option<Arc<dyn MetricsRecorder>>) -> Self {
        Self { inner, recorder }
    }
}

#[async_trait]
impl DelegationStore for InstrumentedStore {
    fn implementation(&self) -> &'static str {
        self.inner.implementation()
    }

    async fn ping(&self) -> Result<(), StoreError> {
        timed(
            self.recorder.as_ref(),
            "ping",
            self.inner.implementation(),
            self.inner.ping(),
        )
        .await
    }

    async fn save_delegations(&self, batch: &[Delegation]) -> Result<u64, StoreError> {
        let inserted = timed(
            self.recorder.as_ref(),
            "save_delegations",
            self.inner.implementation(),
            self.inner.save_delegations(batch),
        )
        .await?;

        if let Some(recorder) = &self.recorder {
            let tez: Decimal = batch.iter().map(|d| d.amount_tez).sum();
            recorder.record_saved(batch.len() as u64, tez);
        }
        Ok(inserted)
    }

    async fn save_accounts(&self, batch: &[Account]) -> Result<u64, StoreError> {
        timed(
            self.recorder.as_ref(),
            "save_accounts",
            self.inner.implementation(),
            self.inner.save_accounts(batch),
        )
        .await
    }

    async fn highest_block_level(&self) -> Result<u64, StoreError> {
        let level = timed(
            self.recorder.as_ref(),
            "highest_block_level",
            self.inner.implementation(),
            self.inner.highest_block_level(),
        )
        .await?;

        if let Some(recorder) = &self.recorder {
            recorder.set_highest_level(level);
        }
        Ok(level)
    }

    async fn list_delegations(&self, query: &ListQuery) -> Result<DelegationPage, StoreError> {
        timed(
            self.recorder.as_ref(),
            "list_delegations",
            self.inner.implementation(),
            self.inner.list_delegations(query),
        )
        .await
    }

    async fn count_delegations(&self, year: Option<i32>) -> Result<u64, StoreError> {
        timed(
            self.recorder.as_ref(),
            "count_delegations",
            self.inner.implementation(),
            self.inner.count_delegations(year),
        )
        .await
    }

    async fn close(&self) -> Result<(), StoreError> {
        timed(
            self.recorder.as_ref(),
            "close",
            self.inner.implementation(),
            self.inner.close(),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::persistence::MemoryStore;
    use crate::infrastructure::telemetry::MemoryRecorder;
    use crate::infrastructure::tzkt::MockTzktSource;
    use chrono::Utc;

    fn delegation(id: u64, amount_mutez: u64) -> Delegation {
        Delegation {
            upstream_id: id,
            delegator: format!("tz1{id:0>33}"),
            delegate: String::new(),
            amount_tez: Delegation::tez_from_mutez(amount_mutez),
            block_level: 10 + id,
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn records_business_counter_on_successful_save() {
        let recorder = Arc::new(MemoryRecorder::new());
        let memory = Arc::new(MemoryStore::new());
        let store = InstrumentedStore::new(memory.clone(), Some(recorder.clone()));

        store
            .save_delegations(&[delegation(1, 1_000_000), delegation(2, 500_000)])
            .await
            .unwrap();
        assert_eq!(recorder.saved_rows(), 2);
        assert_eq!(recorder.saved_tez(), Decimal::new(15, 1));
        assert_eq!(recorder.calls("save_delegations", Outcome::Success), 1);

        memory.set_unavailable(true);
        assert!(store.save_delegations(&[delegation(3, 1)]).await.is_err());
        assert_eq!(recorder.saved_rows(), 2);
        assert_eq!(recorder.calls("save_delegations", Outcome::Failure), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_call_is_recorded_as_failure() {
        let recorder = Arc::new(MemoryRecorder::new());
        let mock = Arc::new(MockTzktSource::new(Vec::new()));
        mock.set_latency(Some(std::time::Duration::from_secs(5)));
        let source = InstrumentedSource::new(mock, Some(recorder.clone()));

        let fetch = source.fetch_page(10, 0);
        assert!(tokio::time::timeout(std::time::Duration::from_millis(10), fetch)
            .await
            .is_err());
        assert_eq!(recorder.calls("fetch_page", Outcome::Failure), 1);
        assert_eq!(recorder.calls("fetch_page", Outcome::Success), 0);
    }

    #[tokio::test]
    async fn passes_through_without_recorder() {
        let source = InstrumentedSource::new(Arc::new(MockTzktSource::new(Vec::new())), None);
        assert_eq!(source.implementation(), "mock");
        assert!(source.fetch_page(10, 0).await.unwrap().is_empty());

        let store = InstrumentedStore::new(Arc::new(MemoryStore::new()), None);
        store.save_delegations(&[delegation(1, 1)]).await.unwrap();
        assert_eq!(store.highest_block_level().await.unwrap(), 11);
    }
}
