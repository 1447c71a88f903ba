//! Stream Token Sweep Task
//!
//! Background task that periodically removes expired stream tokens,
//! independent of request traffic.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::stream::StreamTokenStore;

// == Sweep Task ==
/// Spawns a background task that sweeps expired stream tokens.
///
/// The task sleeps for `interval_secs` between runs and holds the write lock
/// only for the sweep itself. Only already-expired tokens are removed, so a
/// sweep never invalidates a token a client could still resolve.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
///
/// # Example
/// ```ignore
/// let streams = Arc::new(RwLock::new(StreamTokenStore::new(45)));
/// let sweep_handle = spawn_sweep_task(streams.clone(), 60);
/// // Later, during shutdown:
/// sweep_handle.abort();
/// ```
pub fn spawn_sweep_task(
    streams: Arc<RwLock<StreamTokenStore>>,
    interval_secs: u64,
) -> JoinHandle<()> {
    let interval = Duration::from_secs(interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting stream token sweep with interval of {} seconds",
            interval.as_secs()
        );

        loop {
            tokio::time::sleep(interval).await;

            let (removed, remaining) = {
                let mut guard = streams.write().await;
                let removed = guard.sweep();
                (removed, guard.len())
            };

            if removed > 0 {
                info!(
                    "Stream sweep: removed {} expired tokens, {} active",
                    removed, remaining
                );
            } else {
                debug!("Stream sweep: no expired tokens ({} active)", remaining);
            }
        }
    })
}
