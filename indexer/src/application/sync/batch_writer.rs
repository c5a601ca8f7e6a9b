use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::application::sync::pacing::{cancellable, pause};
use crate::application::sync::{DelegationSyncer, SyncReport};
use crate::domain::errors::SyncError;
use crate::domain::services::{AccountDeriver, DelegationTransformer};
use crate::infrastructure::tzkt::TzktDelegation;

impl DelegationSyncer {
    /// Filters, converts and stores one upstream page in sub-batches.
    ///
    /// The first failed sub-batch aborts the page. Account derivation runs
    /// afterwards when enabled; its failures are logged and swallowed.
    pub(super) async fn process_page(
        &self,
        page: &[TzktDelegation],
        report: &mut SyncReport,
        cancel: &CancellationToken,
    ) -> Result<(), SyncError> {
        report.fetched += page.len() as u64;

        let delegations = DelegationTransformer::transform_page(page);
        report.admitted += delegations.len() as u64;

        let dropped = page.len() - delegations.len();
        if dropped > 0 {
            debug!(dropped, "Skipped non-applied operations");
        }

        for (index, chunk) in delegations.chunks(self.settings.db_batch_size).enumerate() {
            if index > 0 {
                pause(cancel, self.settings.batch_pause).await?;
            }

            let saved = cancellable(cancel, self.store.save_delegations(chunk))
                .await?
                .map_err(|e| {
                    let first = chunk.first().map(|d| d.upstream_id).unwrap_or_default();
                    SyncError::store(
                        format!(
                            "save_delegations(rows={}, first_upstream_id={first})",
                            chunk.len()
                        ),
                        e,
                    )
                })?;

            report.saved += saved;
            for delegation in chunk {
                report.observe_level(delegation.block_level);
            }
        }

        if self.settings.derive_accounts {
            self.save_accounts(page, cancel).await?;
        }

        Ok(())
    }

    /// Only cancellation escapes; store failures are warnings
    async fn save_accounts(
        &self,
        page: &[TzktDelegation],
        cancel: &CancellationToken,
    ) -> Result<(), SyncError> {
        let accounts = AccountDeriver::derive(page);

        for (index, chunk) in accounts.chunks(self.settings.db_batch_size).enumerate() {
            if index > 0 {
                pause(cancel, self.settings.batch_pause).await?;
            }

            if let Err(e) = cancellable(cancel, self.store.save_accounts(chunk)).await? {
                warn!(error = %e, rows = chunk.len(), "Failed to save derived accounts");
            }
        }

        Ok(())
    }
}
