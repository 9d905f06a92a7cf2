//! Periodic purge of long-idle conversations.

use std::{sync::Arc, time::Duration};

use upwire_config::ConversationsConfig;

use crate::state::CallbackState;

/// Spawn the background sweep that deletes conversations idle beyond the
/// purge window. Runs for the life of the process.
pub fn spawn_purge_task(state: Arc<CallbackState>, config: &ConversationsConfig) {
    let interval_secs = config.sweep_interval_secs.max(1);
    let threshold = chrono::Duration::hours(config.purge_after_hours);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
        loop {
            interval.tick().await;
            let purged = state.tracker().purge_idle(threshold);
            if purged > 0 {
                tracing::info!(purged, "sweep removed idle conversations");
            }
        }
    });
}
