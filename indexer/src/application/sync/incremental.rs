use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::application::sync::pacing::cancellable;
use crate::application::sync::{DelegationSyncer, SyncMode, SyncReport};
use crate::domain::errors::SyncError;

impl DelegationSyncer {
    /// Fetches one page strictly above `highest_level`. A full page means the
    /// gap may be wider than one page, so the next cycle backfills instead.
    pub(super) async fn sync_incremental(
        &mut self,
        highest_level: u64,
        cancel: &CancellationToken,
    ) -> Result<SyncReport, SyncError> {
        let limit = self.settings.incremental_page_size;
        let mut report = SyncReport::new(SyncMode::Incremental);

        let page = match cancellable(cancel, self.source.fetch_above_level(highest_level, limit))
            .await?
        {
            Ok(page) => page,
            Err(e) if e.is_end_of_data() => Vec::new(),
            Err(e) => {
                return Err(SyncError::upstream(
                    format!("fetch_above_level(level={highest_level}, limit={limit})"),
                    e,
                ))
            }
        };

        if page.is_empty() {
            debug!(highest_level, "No new delegations");
            return Ok(report);
        }

        self.process_page(&page, &mut report, cancel).await?;
        report.pages = 1;

        if page.len() == limit as usize {
            self.historical_sync_done = false;
            info!(
                highest_level,
                page_size = limit,
                "Incremental page was full, falling back to historical sync"
            );
        }

        Ok(report)
    }
}
