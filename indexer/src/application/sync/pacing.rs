//! Cancellation-aware waiting

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::domain::errors::SyncError;

/// Runs `fut` unless `cancel` fires first, in which case `fut` is dropped
pub async fn cancellable<F: Future>(
    cancel: &CancellationToken,
    fut: F,
) -> Result<F::Output, SyncError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(SyncError::Cancelled),
        output = fut => Ok(output),
    }
}

/// Sleeps for `duration` or until `cancel` fires
pub async fn pause(cancel: &CancellationToken, duration: Duration) -> Result<(), SyncError> {
    if duration.is_zero() {
        if cancel.is_cancelled() {
            return Err(SyncError::Cancelled);
        }
        return Ok(());
    }
    cancellable(cancel, tokio::time::sleep(duration)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn pause_completes_when_not_cancelled() {
        let started = Instant::now();
        pause(&CancellationToken::new(), Duration::from_millis(100))
            .await
            .unwrap();
        assert!(started.elapsed() >= Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn pause_returns_promptly_on_cancel() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            trigger.cancel();
        });

        let started = Instant::now();
        let err = pause(&cancel, Duration::from_secs(60)).await.unwrap_err();
        assert!(err.is_cancelled());
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn cancelled_token_wins_over_ready_future() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        assert!(cancellable(&cancel, async { 1 }).await.is_err());
        assert!(pause(&cancel, Duration::ZERO).await.is_err());
    }
}
