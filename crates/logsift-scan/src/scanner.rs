//! Scan orchestration: producer and worker lifecycle, results, completion.

use std::sync::Arc;

use tokio::io::AsyncRead;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use logsift_core::{MatchRecord, ScanConfig, ScanError, ScanSummary};

use crate::matcher::LineMatcher;
use crate::producer::LineProducer;
use crate::worker::spawn_workers;
use crate::RESULT_CHANNEL_SIZE;

/// Parallel line scanner over a single byte stream.
///
/// A scanner is constructed per input stream, started once, and discarded
/// after the final summary has been read; it is not reused across streams.
pub struct LineScanner<R, M> {
    reader: R,
    matcher: M,
    config: ScanConfig,
}

impl<R, M> LineScanner<R, M>
where
    R: AsyncRead + Unpin + Send + Sync + 'static,
    M: LineMatcher + 'static,
{
    /// Create a scanner with the default configuration.
    pub fn new(reader: R, matcher: M) -> Self {
        Self::with_config(reader, matcher, ScanConfig::default())
    }

    /// Create a scanner with an explicit configuration.
    pub fn with_config(reader: R, matcher: M, config: ScanConfig) -> Self {
        Self {
            reader,
            matcher,
            config,
        }
    }

    /// Start the scan: one producer task splitting the stream into lines,
    /// and a pool of workers applying the matcher to them.
    ///
    /// The returned handle yields match records as they are found and, after
    /// every task has finished, the final byte accounting.
    pub fn start(self, cancel: CancellationToken) -> ScanHandle {
        let worker_count = resolve_workers(self.config.workers);
        let (line_tx, line_rx) = mpsc::channel(self.config.queue_capacity);
        let (result_tx, result_rx) = mpsc::channel(RESULT_CHANNEL_SIZE);

        debug!(
            workers = worker_count,
            queue_capacity = self.config.queue_capacity,
            max_line_bytes = self.config.max_line_bytes,
            "starting scan"
        );

        let producer = LineProducer::new(
            self.reader,
            line_tx,
            cancel.clone(),
            self.config.max_line_bytes,
        );
        let producer = tokio::spawn(producer.run());
        let workers = spawn_workers(
            worker_count,
            line_rx,
            Arc::new(self.matcher),
            result_tx,
            cancel,
        );

        ScanHandle {
            results: result_rx,
            producer,
            workers,
        }
    }
}

fn resolve_workers(configured: usize) -> usize {
    if configured == 0 {
        num_cpus::get()
    } else {
        configured
    }
}

/// Handle to a running scan.
///
/// Results arrive in no particular order across workers; with a single
/// worker they follow input line order. An order-preserving multi-worker
/// mode is deliberately not offered.
pub struct ScanHandle {
    results: mpsc::Receiver<MatchRecord>,
    producer: JoinHandle<Result<ScanSummary, ScanError>>,
    workers: Vec<JoinHandle<()>>,
}

impl ScanHandle {
    /// Receive the next match record. `None` means every worker has finished
    /// and no further results will arrive.
    pub async fn recv(&mut self) -> Option<MatchRecord> {
        self.results.recv().await
    }

    /// Wait for the whole scan to finish and return its final accounting.
    ///
    /// This resolves only after the producer has handed off its byte count
    /// and every worker has terminated; the consumed byte count is never
    /// readable while it could still move. Unconsumed results are discarded
    /// and their workers unblocked, but the scan itself still runs to its
    /// natural end unless the cancellation token fires.
    pub async fn finish(self) -> Result<ScanSummary, ScanError> {
        // Unblock any worker still delivering results.
        drop(self.results);

        for handle in self.workers {
            handle.await.map_err(|err| ScanError::TaskFailed {
                message: err.to_string(),
            })?;
        }
        match self.producer.await {
            Ok(report) => report,
            Err(err) => Err(ScanError::TaskFailed {
                message: err.to_string(),
            }),
        }
    }
}
