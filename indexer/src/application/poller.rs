//! Periodic driver for the sync engine

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::application::sync::{DelegationSyncer, SyncReport};
use crate::domain::errors::SyncError;
use crate::infrastructure::telemetry::MetricsRecorder;

/// Runs a sync cycle every `interval`, never more than one at a time.
///
/// A tick that arrives while a cycle is still running is dropped.
pub struct Poller {
    syncer: Arc<Mutex<DelegationSyncer>>,
    interval: Duration,
    recorder: Option<Arc<dyn MetricsRecorder>>,
}

impl Poller {
    pub fn new(syncer: DelegationSyncer, interval: Duration) -> Self {
        Self {
            syncer: Arc::new(Mutex::new(syncer)),
            interval,
            recorder: None,
        }
    }

    pub fn with_recorder(mut self, recorder: Arc<dyn MetricsRecorder>) -> Self {
        self.recorder = Some(recorder);
        self
    }

    /// Boot-time sync: backfills synchronously when the store is empty,
    /// otherwise declares the backfill done so ticks tail incrementally
    pub async fn bootstrap(&self, cancel: &CancellationToken) -> Result<(), SyncError> {
        let mut syncer = self.syncer.lock().await;
        let highest_level = syncer.highest_level(cancel).await?;

        if highest_level > 0 {
            info!(highest_level, "Store already populated, starting in incremental mode");
            syncer.mark_historical_sync_done();
            return Ok(());
        }

        info!("Store is empty, running initial historical sync");
        let report = syncer.run_cycle(cancel).await;
        log_cycle(&report);
        report.map(|_| ())
    }

    /// Bootstraps, then ticks until `cancel` fires. Waits for the in-flight
    /// cycle to unwind before returning.
    pub async fn run(self, cancel: CancellationToken) {
        // Failures are already logged; the ticker retries them
        if let Err(SyncError::Cancelled) = self.bootstrap(&cancel).await {
            info!("Poller stopped during bootstrap");
            return;
        }

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first tick completes immediately
        ticker.tick().await;

        let mut in_flight: Option<JoinHandle<()>> = None;
        info!(interval = ?self.interval, "Poller started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    match self.syncer.clone().try_lock_owned() {
                        Ok(mut syncer) => {
                            let cycle_cancel = cancel.child_token();
                            in_flight = Some(tokio::spawn(async move {
                                let report = syncer.run_cycle(&cycle_cancel).await;
                                log_cycle(&report);
                            }));
                        }
                        Err(_) => {
                            warn!("Sync cycle still running, dropping tick");
                            if let Some(recorder) = &self.recorder {
                                recorder.record_dropped_tick();
                            }
                        }
                    }
                }
            }
        }

        if let Some(handle) = in_flight {
            if let Err(e) = handle.await {
                error!(error = %e, "Sync cycle task failed");
            }
        }
        info!("Poller stopped");
    }
}

fn log_cycle(report: &Result<SyncReport, SyncError>) {
    match report {
        Ok(report) => info!(
            mode = %report.mode,
            pages = report.pages,
            fetched = report.fetched,
            admitted = report.admitted,
            saved = report.saved,
            last_level = ?report.last_level,
            "Sync cycle finished"
        ),
        Err(SyncError::Cancelled) => info!("Sync cycle cancelled"),
        Err(e) => error!(error = %e, "Sync cycle failed"),
    }
}
