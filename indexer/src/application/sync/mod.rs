//! Dual-mode synchronization of upstream delegations into the store.
//!
//! A cycle reads the highest stored level and picks a mode. An empty store,
//! or a syncer that has not completed a backfill, walks the whole upstream
//! history by offset pages. Otherwise the cycle tails operations strictly
//! above the stored level, and a full incremental page sends the next cycle
//! back to the offset walk.

mod batch_writer;
mod historical;
mod incremental;
pub mod pacing;

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::SyncConfig;
use crate::domain::errors::SyncError;
use crate::infrastructure::persistence::DelegationStore;
use crate::infrastructure::tzkt::DelegationSource;

use self::pacing::cancellable;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    Historical,
    Incremental,
}

impl SyncMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncMode::Historical => "historical",
            SyncMode::Incremental => "incremental",
        }
    }
}

impl std::fmt::Display for SyncMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Page sizes and pauses used by the syncer
#[derive(Debug, Clone)]
pub struct SyncSettings {
    pub historical_page_size: u32,
    pub incremental_page_size: u32,
    /// Rows per store transaction
    pub db_batch_size: usize,
    /// Wait between historical pages
    pub page_pause: Duration,
    /// Wait between sub-batches of one page
    pub batch_pause: Duration,
    pub derive_accounts: bool,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self::from(&SyncConfig::default())
    }
}

impl From<&SyncConfig> for SyncSettings {
    fn from(config: &SyncConfig) -> Self {
        Self {
            historical_page_size: config.historical_page_size,
            incremental_page_size: config.incremental_page_size,
            db_batch_size: config.db_batch_size.max(1),
            page_pause: config.page_pause,
            batch_pause: config.batch_pause,
            derive_accounts: config.derive_accounts,
        }
    }
}

/// Outcome of one cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub mode: SyncMode,
    /// Upstream pages that returned data
    pub pages: u64,
    /// Upstream records received
    pub fetched: u64,
    /// Records with status `applied`
    pub admitted: u64,
    /// Rows actually inserted; re-submitted ids are not counted
    pub saved: u64,
    /// Highest block level among admitted records
    pub last_level: Option<u64>,
}

impl SyncReport {
    fn new(mode: SyncMode) -> Self {
        Self {
            mode,
            pages: 0,
            fetched: 0,
            admitted: 0,
            saved: 0,
            last_level: None,
        }
    }

    fn observe_level(&mut self, level: u64) {
        self.last_level = Some(self.last_level.map_or(level, |last| last.max(level)));
    }
}

/// The sync state machine. Owns the process-local backfill flag; one cycle
/// runs at a time, which the poller enforces.
pub struct DelegationSyncer {
    source: Arc<dyn DelegationSource>,
    store: Arc<dyn DelegationStore>,
    settings: SyncSettings,
    historical_sync_done: bool,
}

impl DelegationSyncer {
    pub fn new(
        source: Arc<dyn DelegationSource>,
        store: Arc<dyn DelegationStore>,
        settings: SyncSettings,
    ) -> Self {
        Self {
            source,
            store,
            settings,
            historical_sync_done: false,
        }
    }

    pub fn settings(&self) -> &SyncSettings {
        &self.settings
    }

    pub fn is_historical_sync_done(&self) -> bool {
        self.historical_sync_done
    }

    /// Declares the backfill complete, e.g. at boot on a non-empty store
    pub fn mark_historical_sync_done(&mut self) {
        self.historical_sync_done = true;
    }

    /// Mode a cycle takes given the stored watermark
    pub fn mode_for(&self, highest_level: u64) -> SyncMode {
        if highest_level == 0 || !self.historical_sync_done {
            SyncMode::Historical
        } else {
            SyncMode::Incremental
        }
    }

    /// Highest stored level. A failed read is treated as an empty store so
    /// the cycle takes the backfill path.
    pub async fn highest_level(&self, cancel: &CancellationToken) -> Result<u64, SyncError> {
        match cancellable(cancel, self.store.highest_block_level()).await? {
            Ok(level) => Ok(level),
            Err(e) => {
                warn!(error = %e, "Failed to read highest block level, assuming empty store");
                Ok(0)
            }
        }
    }

    /// One cycle: read the watermark, pick a mode, sync
    pub async fn run_cycle(&mut self, cancel: &CancellationToken) -> Result<SyncReport, SyncError> {
        if cancel.is_cancelled() {
            return Err(SyncError::Cancelled);
        }

        let highest_level = self.highest_level(cancel).await?;
        let mode = self.mode_for(highest_level);
        debug!(highest_level, %mode, "Starting sync cycle");

        match mode {
            SyncMode::Historical => self.sync_historical(cancel).await,
            SyncMode::Incremental => self.sync_incremental(highest_level, cancel).await,
        }
    }
}
