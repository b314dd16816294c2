//! Background polling of the search rate-limit bucket.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::github::{GitHubClient, GitHubError};
use crate::model::RateLimitState;
use crate::retry::CancelToken;

/// Poll `GET /rate_limit` every `interval` until `cancel` fires.
///
/// The first poll happens immediately. Failed polls are logged and leave the
/// last published state in place. The task also stops once every receiver
/// has been dropped.
pub fn spawn_poller(
    client: GitHubClient,
    interval: Duration,
    cancel: CancelToken,
) -> (watch::Receiver<Option<RateLimitState>>, JoinHandle<()>) {
    let (tx, rx) = watch::channel(None);

    let handle = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            match client.get_rate_limit(&cancel).await {
                Ok(state) => {
                    debug!(
                        remaining = state.remaining,
                        limit = state.limit,
                        "Rate limit refreshed"
                    );
                    if tx.send(Some(state)).is_err() {
                        break;
                    }
                }
                Err(GitHubError::Cancelled) => break,
                Err(e) => warn!(error = %e, code = e.code(), "Rate limit poll failed"),
            }
        }
        debug!("Rate limit poller stopped");
    });

    (rx, handle)
}
