//! Line producer: stream reading, line splitting, and byte accounting.

use std::io::Write;

use memchr::memchr;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use logsift_core::{ScanError, ScanStatus, ScanSummary};

use crate::counter::CountingSink;

/// Read granularity; the scan buffer grows beyond this only while a single
/// line is still incomplete.
const READ_CHUNK: usize = 64 * 1024;

/// Reads the input stream, splits it into owned lines, and delivers them to
/// the bounded work queue.
///
/// Byte accounting discipline: `delivered` advances by `line + terminator`
/// only after a successful enqueue, so it never includes read-ahead bytes
/// still sitting in the scan buffer. The raw tee total in `raw` is kept for
/// diagnostics only.
pub(crate) struct LineProducer<R> {
    reader: R,
    queue: mpsc::Sender<Vec<u8>>,
    cancel: CancellationToken,
    max_line_bytes: usize,
    buf: Vec<u8>,
    raw: CountingSink,
    delivered: u64,
    lines: u64,
}

impl<R> LineProducer<R>
where
    R: AsyncRead + Unpin,
{
    pub(crate) fn new(
        reader: R,
        queue: mpsc::Sender<Vec<u8>>,
        cancel: CancellationToken,
        max_line_bytes: usize,
    ) -> Self {
        Self {
            reader,
            queue,
            cancel,
            max_line_bytes,
            buf: Vec::new(),
            raw: CountingSink::new(),
            delivered: 0,
            lines: 0,
        }
    }

    /// Run until end-of-stream, cancellation, or a terminal scan error.
    ///
    /// The queue sender is dropped on return, closing the queue exactly once
    /// on every exit path.
    pub(crate) async fn run(mut self) -> Result<ScanSummary, ScanError> {
        loop {
            // Hand off every complete line currently buffered.
            let mut start = 0;
            while let Some(nl) = memchr(b'\n', &self.buf[start..]) {
                let end = start + nl;
                let line = copy_line(&self.buf[start..end]);
                if line.len() > self.max_line_bytes {
                    return Err(ScanError::LineTooLong {
                        limit: self.max_line_bytes,
                        offset: self.delivered,
                    });
                }
                if !self.enqueue(line).await {
                    return Ok(self.report(ScanStatus::Cancelled));
                }
                self.delivered += (end + 1 - start) as u64;
                self.lines += 1;
                start = end + 1;
            }
            if start > 0 {
                self.buf.drain(..start);
            }

            // An unterminated run longer than the limit can never become an
            // acceptable line; fail now instead of buffering without bound.
            if self.buf.len() > self.max_line_bytes {
                return Err(ScanError::LineTooLong {
                    limit: self.max_line_bytes,
                    offset: self.delivered,
                });
            }

            self.buf.reserve(READ_CHUNK);
            let filled = self.buf.len();
            let n = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    return Ok(self.report(ScanStatus::Cancelled));
                }
                read = self.reader.read_buf(&mut self.buf) => {
                    read.map_err(|err| ScanError::read(self.delivered, err))?
                }
            };
            if n == 0 {
                break;
            }
            // Tee the raw chunk through the counting sink.
            self.raw
                .write_all(&self.buf[filled..])
                .map_err(|err| ScanError::read(self.delivered, err))?;
        }

        // A final line without a terminator is emitted like any other; its
        // byte count simply has no terminator to include.
        if !self.buf.is_empty() {
            let line = copy_line(&self.buf);
            let len = self.buf.len() as u64;
            if !self.enqueue(line).await {
                return Ok(self.report(ScanStatus::Cancelled));
            }
            self.delivered += len;
            self.lines += 1;
            self.buf.clear();
        }

        Ok(self.report(ScanStatus::Completed))
    }

    /// Deliver one line, suspending while the queue is full. Returns false
    /// when the scan was cancelled (or the workers are gone) instead.
    async fn enqueue(&self, line: Vec<u8>) -> bool {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => false,
            sent = self.queue.send(line) => sent.is_ok(),
        }
    }

    fn report(&self, status: ScanStatus) -> ScanSummary {
        let summary = ScanSummary {
            status,
            bytes_consumed: self.delivered,
            bytes_read: self.raw.total(),
            lines_delivered: self.lines,
        };
        debug!(
            ?status,
            bytes_consumed = summary.bytes_consumed,
            bytes_read = summary.bytes_read,
            lines = summary.lines_delivered,
            "producer finished"
        );
        summary
    }
}

/// Copy a line out of the scan buffer, dropping a trailing carriage return.
/// The copy owns its storage, so later reads can't clobber it.
fn copy_line(raw: &[u8]) -> Vec<u8> {
    let line = match raw.last() {
        Some(b'\r') => &raw[..raw.len() - 1],
        _ => raw,
    };
    line.to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use std::time::Duration;

    use tokio::io::ReadBuf;
    use tokio::time::timeout;

    /// Reader that never yields data and never reaches end-of-stream.
    struct NeverReady;

    impl AsyncRead for NeverReady {
        fn poll_read(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &mut ReadBuf<'_>,
        ) -> Poll<std::io::Result<()>> {
            Poll::Pending
        }
    }

    /// Reader that fails on its first poll.
    struct BrokenStream;

    impl AsyncRead for BrokenStream {
        fn poll_read(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &mut ReadBuf<'_>,
        ) -> Poll<std::io::Result<()>> {
            Poll::Ready(Err(std::io::Error::other("broken stream")))
        }
    }

    fn producer<R: AsyncRead + Unpin>(
        reader: R,
        capacity: usize,
        max_line_bytes: usize,
    ) -> (LineProducer<R>, mpsc::Receiver<Vec<u8>>, CancellationToken) {
        let (tx, rx) = mpsc::channel(capacity);
        let cancel = CancellationToken::new();
        let producer = LineProducer::new(reader, tx, cancel.clone(), max_line_bytes);
        (producer, rx, cancel)
    }

    fn drain(rx: &mut mpsc::Receiver<Vec<u8>>) -> Vec<Vec<u8>> {
        let mut lines = Vec::new();
        while let Ok(line) = rx.try_recv() {
            lines.push(line);
        }
        lines
    }

    #[tokio::test]
    async fn test_splits_lines_and_counts_delivered_bytes() {
        let (producer, mut rx, _cancel) = producer(Cursor::new(b"foo\nBAD\nbar\n".to_vec()), 10, 1024);

        let summary = producer.run().await.unwrap();

        assert_eq!(drain(&mut rx), vec![b"foo".to_vec(), b"BAD".to_vec(), b"bar".to_vec()]);
        assert_eq!(summary.status, ScanStatus::Completed);
        assert_eq!(summary.bytes_consumed, 12);
        assert_eq!(summary.bytes_read, 12);
        assert_eq!(summary.lines_delivered, 3);
    }

    #[tokio::test]
    async fn test_final_line_without_terminator_is_emitted() {
        let (producer, mut rx, _cancel) = producer(Cursor::new(b"a\nb".to_vec()), 10, 1024);

        let summary = producer.run().await.unwrap();

        assert_eq!(drain(&mut rx), vec![b"a".to_vec(), b"b".to_vec()]);
        assert_eq!(summary.bytes_consumed, 3);
        assert_eq!(summary.lines_delivered, 2);
    }

    #[tokio::test]
    async fn test_crlf_terminators_are_stripped_but_counted() {
        let (producer, mut rx, _cancel) = producer(Cursor::new(b"a\r\nb\r\n".to_vec()), 10, 1024);

        let summary = producer.run().await.unwrap();

        assert_eq!(drain(&mut rx), vec![b"a".to_vec(), b"b".to_vec()]);
        assert_eq!(summary.bytes_consumed, 6);
    }

    #[tokio::test]
    async fn test_line_at_exact_limit_is_accepted() {
        let (producer, mut rx, _cancel) = producer(Cursor::new(b"abc\n".to_vec()), 10, 3);

        let summary = producer.run().await.unwrap();

        assert_eq!(drain(&mut rx), vec![b"abc".to_vec()]);
        assert_eq!(summary.bytes_consumed, 4);
    }

    #[tokio::test]
    async fn test_line_one_byte_over_limit_fails() {
        let (producer, _rx, _cancel) = producer(Cursor::new(b"abcd\n".to_vec()), 10, 3);

        let err = producer.run().await.unwrap_err();
        assert!(matches!(err, ScanError::LineTooLong { limit: 3, offset: 0 }));
    }

    #[tokio::test]
    async fn test_unterminated_overlong_run_fails() {
        // No newline ever arrives; the producer must not buffer forever.
        let (producer, _rx, _cancel) = producer(Cursor::new(b"ab\nabcdef".to_vec()), 10, 3);

        let err = producer.run().await.unwrap_err();
        assert!(matches!(err, ScanError::LineTooLong { limit: 3, offset: 3 }));
    }

    #[tokio::test]
    async fn test_cancel_before_first_read_delivers_nothing() {
        let (producer, mut rx, cancel) = producer(Cursor::new(b"a\nb\nc\n".to_vec()), 10, 1024);
        cancel.cancel();

        let summary = producer.run().await.unwrap();

        assert_eq!(summary.status, ScanStatus::Cancelled);
        assert_eq!(summary.bytes_consumed, 0);
        assert_eq!(summary.lines_delivered, 0);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_cancel_while_read_pending_counts_only_delivered_lines() {
        let reader = Cursor::new(b"aa\nbb\n".to_vec()).chain(NeverReady);
        let (producer, mut rx, cancel) = producer(reader, 10, 1024);

        let task = tokio::spawn(producer.run());

        // Both complete lines must come through before anything else happens.
        assert_eq!(rx.recv().await.unwrap(), b"aa".to_vec());
        assert_eq!(rx.recv().await.unwrap(), b"bb".to_vec());

        cancel.cancel();
        let summary = timeout(Duration::from_secs(5), task).await.unwrap().unwrap().unwrap();

        assert_eq!(summary.status, ScanStatus::Cancelled);
        assert_eq!(summary.bytes_consumed, 6);
        assert_eq!(summary.lines_delivered, 2);
    }

    #[tokio::test]
    async fn test_cancel_while_enqueue_blocked_excludes_undelivered_lines() {
        // Queue capacity 1 and no consumer: the first line is delivered, the
        // second enqueue suspends until cancellation.
        let (producer, rx, cancel) = producer(Cursor::new(b"aa\nbb\ncc\n".to_vec()), 1, 1024);

        let task = tokio::spawn(producer.run());

        while rx.len() < 1 {
            tokio::task::yield_now().await;
        }
        cancel.cancel();

        let summary = timeout(Duration::from_secs(5), task).await.unwrap().unwrap().unwrap();

        assert_eq!(summary.status, ScanStatus::Cancelled);
        // Only the offset after line 1's terminator, even though all nine
        // bytes were already read into the scan buffer.
        assert_eq!(summary.bytes_consumed, 3);
        assert_eq!(summary.bytes_read, 9);
    }

    #[tokio::test]
    async fn test_read_failure_is_terminal_and_typed() {
        let reader = Cursor::new(b"ok\n".to_vec()).chain(BrokenStream);
        let (producer, mut rx, _cancel) = producer(reader, 10, 1024);

        let err = producer.run().await.unwrap_err();

        assert!(matches!(err, ScanError::Read { offset: 3, .. }));
        // The line before the failure was still delivered.
        assert_eq!(drain(&mut rx), vec![b"ok".to_vec()]);
    }

    #[tokio::test]
    async fn test_empty_input_completes_with_zero_bytes() {
        let (producer, mut rx, _cancel) = producer(Cursor::new(Vec::new()), 10, 1024);

        let summary = producer.run().await.unwrap();

        assert_eq!(summary.status, ScanStatus::Completed);
        assert_eq!(summary.bytes_consumed, 0);
        assert_eq!(summary.lines_delivered, 0);
        assert!(rx.try_recv().is_err());
    }
}
