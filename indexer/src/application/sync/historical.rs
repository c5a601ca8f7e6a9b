use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::application::sync::pacing::{cancellable, pause};
use crate::application::sync::{DelegationSyncer, SyncMode, SyncReport};
use crate::domain::errors::SyncError;

impl DelegationSyncer {
    /// Walks the upstream from offset 0 until an empty page, a short page or
    /// end of data, then marks the backfill done
    pub(super) async fn sync_historical(
        &mut self,
        cancel: &CancellationToken,
    ) -> Result<SyncReport, SyncError> {
        let limit = self.settings.historical_page_size;
        let mut report = SyncReport::new(SyncMode::Historical);
        let mut offset: u64 = 0;

        info!(page_size = limit, "Starting historical sync");

        loop {
            let page = match cancellable(cancel, self.source.fetch_page(limit, offset)).await? {
                Ok(page) => page,
                Err(e) if e.is_end_of_data() => {
                    debug!(offset, "Upstream reported end of data");
                    break;
                }
                Err(e) => {
                    return Err(SyncError::upstream(
                        format!("fetch_page(limit={limit}, offset={offset})"),
                        e,
                    ))
                }
            };

            if page.is_empty() {
                break;
            }

            let short_page = page.len() < limit as usize;
            self.process_page(&page, &mut report, cancel).await?;
            report.pages += 1;
            offset += u64::from(limit);

            debug!(
                offset,
                fetched = report.fetched,
                saved = report.saved,
                "Historical page processed"
            );

            if short_page {
                break;
            }
            pause(cancel, self.settings.page_pause).await?;
        }

        self.historical_sync_done = true;
        info!(
            pages = report.pages,
            fetched = report.fetched,
            saved = report.saved,
            last_level = ?report.last_level,
            "Historical sync complete"
        );

        Ok(report)
    }
}
