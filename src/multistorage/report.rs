//! Read stream reporting its outcome to the collector
//!
//! The outcome is reported exactly once: success on a clean end of stream or
//! when the reader is dropped, failure on the first read error.

use crate::domain::ports::ObjectReader;
use crate::stats::{CollectorRef, OperationWeight};
use std::fmt;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, ReadBuf};

struct Reporter {
    collector: CollectorRef,
    storage: String,
}

/// [`AsyncRead`] decorator counting bytes and reporting the read result
pub struct ReportReader {
    inner: ObjectReader,
    reporter: Option<Reporter>,
    read_bytes: u64,
}

impl ReportReader {
    pub fn new(inner: ObjectReader, collector: CollectorRef, storage: impl Into<String>) -> Self {
        Self {
            inner,
            reporter: Some(Reporter {
                collector,
                storage: storage.into(),
            }),
            read_bytes: 0,
        }
    }

    /// Bytes read so far
    pub fn read_bytes(&self) -> u64 {
        self.read_bytes
    }

    fn report(&mut self, success: bool) {
        if let Some(reporter) = self.reporter.take() {
            reporter.collector.report_operation_result(
                &reporter.storage,
                OperationWeight::read(self.read_bytes),
                success,
            );
        }
    }
}

impl AsyncRead for ReportReader {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        let wanted = buf.remaining() > 0;
        let before = buf.filled().len();

        match Pin::new(&mut this.inner).poll_read(cx, buf) {
            Poll::Ready(Ok(())) => {
                let read = buf.filled().len() - before;
                this.read_bytes += read as u64;
                if read == 0 && wanted {
                    this.report(true);
                }
                Poll::Ready(Ok(()))
            }
            Poll::Ready(Err(err)) => {
                this.report(false);
                Poll::Ready(Err(err))
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl Drop for ReportReader {
    fn drop(&mut self) {
        self.report(true);
    }
}

impl fmt::Debug for ReportReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReportReader")
            .field("storage", &self.reporter.as_ref().map(|r| r.storage.as_str()))
            .field("read_bytes", &self.read_bytes)
            .finish()
    }
}
