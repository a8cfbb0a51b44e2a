//! Verbose stream instrumentation.
//!
//! [`VerboseStream`] wraps any `AsyncRead + AsyncWrite` and reports every
//! successful read and write to a [`StreamObserver`] without touching the
//! bytes. The default observer, [`LogObserver`], emits `tracing` events.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tracing::debug;

use crate::defaults::HEX_PREVIEW_LEN;
use crate::role::Role;

/// Receives traffic notifications from a [`VerboseStream`].
pub trait StreamObserver: Send + Sync {
    /// Called once per read that produced data, with exactly the bytes read.
    fn on_read(&self, role: Role, data: &[u8]);
    /// Called once per completed write with the number of bytes accepted,
    /// zero when the write failed.
    fn on_write(&self, role: Role, written: usize);
}

/// Observer that logs byte counts and a hex preview.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogObserver;

impl StreamObserver for LogObserver {
    fn on_read(&self, role: Role, data: &[u8]) {
        debug!(role = %role, bytes = data.len(), hex = %hex_preview(data), "received");
    }

    fn on_write(&self, role: Role, written: usize) {
        debug!(role = %role, bytes = written, "sent");
    }
}

/// Hex encoding of at most the first [`HEX_PREVIEW_LEN`] bytes of `data`.
pub fn hex_preview(data: &[u8]) -> String {
    hex::encode(&data[..data.len().min(HEX_PREVIEW_LEN)])
}

/// Pass-through stream that reports traffic to an observer.
pub struct VerboseStream<S, O = LogObserver> {
    inner: S,
    role: Role,
    observer: O,
}

impl<S> VerboseStream<S> {
    /// Wrap `inner`, logging through [`LogObserver`].
    pub fn new(inner: S, role: Role) -> Self {
        Self::with_observer(inner, role, LogObserver)
    }
}

impl<S, O> VerboseStream<S, O> {
    pub fn with_observer(inner: S, role: Role, observer: O) -> Self {
        Self {
            inner,
            role,
            observer,
        }
    }
}

impl<S, O> AsyncRead for VerboseStream<S, O>
where
    S: AsyncRead + Unpin,
    O: StreamObserver + Unpin,
{
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = &mut *self;
        let before = buf.filled().len();
        ready!(Pin::new(&mut this.inner).poll_read(cx, buf))?;
        let data = &buf.filled()[before..];
        if !data.is_empty() {
            this.observer.on_read(this.role, data);
        }
        Poll::Ready(Ok(()))
    }
}

impl<S, O> AsyncWrite for VerboseStream<S, O>
where
    S: AsyncWrite + Unpin,
    O: StreamObserver + Unpin,
{
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        data: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = &mut *self;
        let result = ready!(Pin::new(&mut this.inner).poll_write(cx, data));
        let written = match &result {
            Ok(n) => *n,
            Err(_) => 0,
        };
        this.observer.on_write(this.role, written);
        Poll::Ready(result)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_shutdown(cx)
    }
}
