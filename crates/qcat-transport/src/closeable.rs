//! Cancellation-aware stream wrapper used by every session.

use std::future::Future;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio_util::sync::{CancellationToken, WaitForCancellationFutureOwned};

/// Stream whose pending and future I/O fails once its token is cancelled.
///
/// Reads and writes keep separate wait futures so each direction's task
/// registers its own waker.
pub(crate) struct Closeable<S> {
    inner: S,
    token: CancellationToken,
    read_closed: Pin<Box<WaitForCancellationFutureOwned>>,
    write_closed: Pin<Box<WaitForCancellationFutureOwned>>,
}

impl<S> Closeable<S> {
    pub(crate) fn new(inner: S, token: CancellationToken) -> Self {
        Self {
            read_closed: Box::pin(token.clone().cancelled_owned()),
            write_closed: Box::pin(token.clone().cancelled_owned()),
            inner,
            token,
        }
    }
}

fn aborted() -> io::Error {
    io::Error::new(io::ErrorKind::ConnectionAborted, "session closed")
}

fn poll_closed(
    token: &CancellationToken,
    closed: &mut Pin<Box<WaitForCancellationFutureOwned>>,
    cx: &mut Context<'_>,
) -> bool {
    token.is_cancelled() || closed.as_mut().poll(cx).is_ready()
}

impl<S: AsyncRead + Unpin> AsyncRead for Closeable<S> {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = &mut *self;
        if poll_closed(&this.token, &mut this.read_closed, cx) {
            return Poll::Ready(Err(aborted()));
        }
        Pin::new(&mut this.inner).poll_read(cx, buf)
    }
}

impl<S: AsyncWrite + Unpin> AsyncWrite for Closeable<S> {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        data: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = &mut *self;
        if poll_closed(&this.token, &mut this.write_closed, cx) {
            return Poll::Ready(Err(aborted()));
        }
        Pin::new(&mut this.inner).poll_write(cx, data)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = &mut *self;
        if poll_closed(&this.token, &mut this.write_closed, cx) {
            return Poll::Ready(Err(aborted()));
        }
        Pin::new(&mut this.inner).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        if self.token.is_cancelled() {
            return Poll::Ready(Ok(()));
        }
        Pin::new(&mut self.inner).poll_shutdown(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt, duplex};

    #[tokio::test]
    async fn passes_data_through_until_closed() {
        let (inner, mut peer) = duplex(64);
        let token = CancellationToken::new();
        let mut stream = Closeable::new(inner, token.clone());

        stream.write_all(b"abc").await.unwrap();
        let mut buf = [0u8; 3];
        peer.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"abc");

        token.cancel();
        let err = stream.write_all(b"x").await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::ConnectionAborted);
        stream.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn cancel_wakes_blocked_writer() {
        let (inner, _peer) = duplex(4);
        let token = CancellationToken::new();
        let mut stream = Closeable::new(inner, token.clone());

        let writer = tokio::spawn(async move { stream.write_all(&[0u8; 64]).await });
        tokio::time::sleep(Duration::from_millis(20)).await;
        token.cancel();

        let result = tokio::time::timeout(Duration::from_secs(5), writer)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::ConnectionAborted);
    }
}
