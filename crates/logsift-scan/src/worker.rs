//! Worker pool applying the matcher to queued lines.

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::trace;

use logsift_core::MatchRecord;

use crate::matcher::LineMatcher;

/// Spawn one worker pulling lines from the shared queue.
///
/// The worker exits when the queue closes, when the scan is cancelled, or
/// when the result channel is gone. Cancellation wins over pending work, so
/// a stopped scan does not drain lines that are still queued.
pub(crate) fn spawn_worker<M>(
    id: usize,
    queue: Arc<Mutex<mpsc::Receiver<Vec<u8>>>>,
    matcher: Arc<M>,
    results: mpsc::Sender<MatchRecord>,
    cancel: CancellationToken,
) -> JoinHandle<()>
where
    M: LineMatcher + 'static,
{
    tokio::spawn(async move {
        loop {
            let line = {
                let mut rx = queue.lock().await;
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    next = rx.recv() => match next {
                        Some(line) => line,
                        None => break,
                    },
                }
            };

            let Some(record) = matcher.match_line(&line) else {
                continue;
            };

            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                sent = results.send(record) => {
                    if sent.is_err() {
                        break;
                    }
                }
            }
        }
        trace!(worker = id, "worker finished");
    })
}

/// Spawn the whole pool sharing a single queue receiver.
///
/// The result channel closes once every worker has terminated; the callers'
/// sender clone is dropped here so workers alone keep it open.
pub(crate) fn spawn_workers<M>(
    count: usize,
    queue: mpsc::Receiver<Vec<u8>>,
    matcher: Arc<M>,
    results: mpsc::Sender<MatchRecord>,
    cancel: CancellationToken,
) -> Vec<JoinHandle<()>>
where
    M: LineMatcher + 'static,
{
    let queue = Arc::new(Mutex::new(queue));
    (0..count)
        .map(|id| {
            spawn_worker(
                id,
                Arc::clone(&queue),
                Arc::clone(&matcher),
                results.clone(),
                cancel.clone(),
            )
        })
        .collect()
}
