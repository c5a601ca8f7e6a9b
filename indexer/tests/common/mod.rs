#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};

use tezos_indexer::application::{DelegationSyncer, SyncSettings};
use tezos_indexer::infrastructure::persistence::MemoryStore;
use tezos_indexer::infrastructure::telemetry::{InstrumentedStore, MemoryRecorder};
use tezos_indexer::infrastructure::tzkt::mock::sample_operation;
use tezos_indexer::infrastructure::tzkt::{MockTzktSource, TzktDelegation};

pub const BAKER: &str = "tz3WXYtyDUNL91qfiCJtVUX746QpNv5i5ve5";

pub fn at(level: u64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2023, 3, 1, 0, 0, 0).unwrap() + chrono::Duration::seconds(level as i64 * 30)
}

pub fn applied(id: u64, level: u64, amount: u64) -> TzktDelegation {
    sample_operation(id, level, at(level), BAKER, amount, "applied")
}

pub fn failed(id: u64, level: u64, amount: u64) -> TzktDelegation {
    sample_operation(id, level, at(level), BAKER, amount, "failed")
}

/// `count` applied operations starting at `first_id`, one per level
pub fn applied_range(first_id: u64, count: u64, first_level: u64) -> Vec<TzktDelegation> {
    (0..count)
        .map(|i| applied(first_id + i, first_level + i, 1_000_000))
        .collect()
}

pub struct Harness {
    pub source: Arc<MockTzktSource>,
    pub memory: Arc<MemoryStore>,
    pub recorder: Arc<MemoryRecorder>,
    pub syncer: DelegationSyncer,
}

pub fn settings() -> SyncSettings {
    SyncSettings::default()
}

pub fn fast_settings() -> SyncSettings {
    SyncSettings {
        page_pause: Duration::ZERO,
        batch_pause: Duration::ZERO,
        ..SyncSettings::default()
    }
}

pub fn harness(operations: Vec<TzktDelegation>, settings: SyncSettings) -> Harness {
    let source = Arc::new(MockTzktSource::new(operations));
    let memory = Arc::new(MemoryStore::new());
    let recorder = Arc::new(MemoryRecorder::new());
    let store = Arc::new(InstrumentedStore::new(memory.clone(), Some(recorder.clone())));
    let syncer = DelegationSyncer::new(source.clone(), store, settings);
    Harness {
        source,
        memory,
        recorder,
        syncer,
    }
}
