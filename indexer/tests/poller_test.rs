mod common;

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use common::*;
use tezos_indexer::application::{DelegationSyncer, Poller};
use tezos_indexer::domain::services::DelegationTransformer;
use tezos_indexer::infrastructure::persistence::DelegationStore;
use tezos_indexer::infrastructure::telemetry::MetricsRecorder;
use tezos_indexer::infrastructure::tzkt::MockRequest;

fn poller(h: Harness, interval: Duration) -> Poller {
    let recorder: Arc<dyn MetricsRecorder> = h.recorder.clone();
    Poller::new(h.syncer, interval).with_recorder(recorder)
}

#[tokio::test(start_paused = true)]
async fn bootstrap_backfills_an_empty_store() {
    let h = harness(applied_range(1, 5, 1), settings());
    let (source, memory) = (h.source.clone(), h.memory.clone());
    let poller = poller(h, Duration::from_secs(30));

    poller.bootstrap(&CancellationToken::new()).await.unwrap();

    assert_eq!(memory.len(), 5);
    assert_eq!(
        source.requests(),
        vec![MockRequest::Page {
            limit: 1_000,
            offset: 0
        }]
    );
}

#[tokio::test(start_paused = true)]
async fn ticks_tail_incrementally_after_bootstrap() {
    let h = harness(applied_range(1, 5, 1), settings());
    let (source, memory) = (h.source.clone(), h.memory.clone());
    let cancel = CancellationToken::new();
    let handle = tokio::spawn(poller(h, Duration::from_secs(1)).run(cancel.clone()));

    tokio::time::sleep(Duration::from_millis(1_500)).await;
    source.extend(applied_range(6, 2, 6));
    tokio::time::sleep(Duration::from_secs(1)).await;

    cancel.cancel();
    handle.await.unwrap();

    assert_eq!(memory.len(), 7);
    let requests = source.requests();
    assert!(matches!(requests[0], MockRequest::Page { offset: 0, .. }));
    assert!(requests
        .iter()
        .skip(1)
        .all(|r| matches!(r, MockRequest::AboveLevel { .. })));
    assert!(requests.contains(&MockRequest::AboveLevel {
        level: 5,
        limit: 150
    }));
}

#[tokio::test(start_paused = true)]
async fn populated_store_skips_the_initial_backfill() {
    let h = harness(applied_range(1, 3, 1), settings());
    h.memory
        .save_delegations(&[DelegationTransformer::transform(&applied(1, 1, 1_000_000))])
        .await
        .unwrap();
    let source = h.source.clone();
    let poller = poller(h, Duration::from_secs(1));

    poller.bootstrap(&CancellationToken::new()).await.unwrap();
    assert!(source.requests().is_empty());

    let cancel = CancellationToken::new();
    let handle = tokio::spawn(poller.run(cancel.clone()));
    tokio::time::sleep(Duration::from_millis(1_500)).await;
    cancel.cancel();
    handle.await.unwrap();

    assert_eq!(
        source.requests().first(),
        Some(&MockRequest::AboveLevel {
            level: 1,
            limit: 150
        })
    );
}

#[tokio::test(start_paused = true)]
async fn overlapping_ticks_are_dropped() {
    let h = harness(applied_range(1, 3, 1), settings());
    h.memory
        .save_delegations(&[DelegationTransformer::transform(&applied(1, 1, 1_000_000))])
        .await
        .unwrap();
    h.source.set_latency(Some(Duration::from_secs(5)));
    let (source, recorder) = (h.source.clone(), h.recorder.clone());
    let cancel = CancellationToken::new();
    let handle = tokio::spawn(poller(h, Duration::from_secs(1)).run(cancel.clone()));

    // Cycle starts at 1s and blocks on the slow upstream; ticks at 2s and 3s
    // find it still running
    tokio::time::sleep(Duration::from_millis(3_500)).await;
    assert_eq!(source.requests().len(), 1);
    assert!(recorder.dropped_ticks() >= 2);

    cancel.cancel();
    tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .expect("poller stops promptly")
        .unwrap();
}

#[tokio::test(start_paused = true)]
async fn cancellation_during_bootstrap_stops_the_poller() {
    let h = harness(applied_range(1, 3, 1), settings());
    h.source.set_latency(Some(Duration::from_secs(10)));
    let memory = h.memory.clone();
    let syncer: DelegationSyncer = h.syncer;
    let cancel = CancellationToken::new();
    let handle = tokio::spawn(Poller::new(syncer, Duration::from_secs(1)).run(cancel.clone()));

    tokio::time::sleep(Duration::from_secs(1)).await;
    cancel.cancel();
    tokio::time::timeout(Duration::from_millis(200), handle)
        .await
        .expect("poller stops promptly")
        .unwrap();
    assert!(memory.is_empty());
}
