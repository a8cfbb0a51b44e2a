//! UDP adapted to the session stream interface.
//!
//! Each read returns exactly one datagram (truncated to the buffer) and each
//! write sends exactly one. A connected socket talks to a fixed peer; an
//! unconnected one answers whoever sent the most recent datagram.

use std::io;
use std::net::SocketAddr;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::UdpSocket;
use tracing::{debug, info};

use crate::error::TransportError;
use crate::resolve::{resolve_one, unspecified_for};
use crate::{BoxFuture, CloseHandle, Session, TransportConnector, TransportListener};

/// A write was attempted before any datagram revealed who to send to.
///
/// Surfaced as an [`io::Error`] of kind [`io::ErrorKind::NotConnected`].
#[derive(Debug, Error)]
#[error("no peer address known yet")]
pub struct NoPeerError;

#[derive(Debug, Clone, Copy)]
enum PeerState {
    /// Socket is connected; the kernel filters and addresses datagrams.
    Connected(SocketAddr),
    /// Peer is whoever sent the last datagram.
    Learned(Option<SocketAddr>),
}

pub struct UdpStream {
    socket: UdpSocket,
    peer: PeerState,
    echo: bool,
}

impl UdpStream {
    /// Wrap a socket already connected to `peer`.
    pub fn connected(socket: UdpSocket, peer: SocketAddr) -> Self {
        Self {
            socket,
            peer: PeerState::Connected(peer),
            echo: false,
        }
    }

    /// Wrap an unconnected socket; the peer is learned from incoming datagrams.
    pub fn unconnected(socket: UdpSocket) -> Self {
        Self {
            socket,
            peer: PeerState::Learned(None),
            echo: false,
        }
    }

    pub fn with_initial_peer(mut self, peer: SocketAddr) -> Self {
        if let PeerState::Learned(_) = self.peer {
            self.peer = PeerState::Learned(Some(peer));
        }
        self
    }

    /// Send every received datagram back to its sender.
    pub fn with_echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    pub fn peer_addr(&self) -> Option<SocketAddr> {
        match self.peer {
            PeerState::Connected(peer) => Some(peer),
            PeerState::Learned(peer) => peer,
        }
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }
}

impl AsyncRead for UdpStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        if buf.remaining() == 0 {
            return Poll::Ready(Ok(()));
        }
        let this = &mut *self;
        loop {
            let before = buf.filled().len();
            let from = match this.peer {
                PeerState::Connected(peer) => {
                    ready!(this.socket.poll_recv(cx, buf))?;
                    peer
                }
                PeerState::Learned(_) => {
                    let from = ready!(this.socket.poll_recv_from(cx, buf))?;
                    this.peer = PeerState::Learned(Some(from));
                    from
                }
            };

            let data = &buf.filled()[before..];
            // An empty read would look like end-of-stream.
            if data.is_empty() {
                continue;
            }
            if this.echo {
                match this.socket.try_send_to(data, from) {
                    Ok(n) => debug!(peer = %from, bytes = n, "echoed datagram"),
                    Err(e) => debug!(peer = %from, error = %e, "echo failed"),
                }
            }
            return Poll::Ready(Ok(()));
        }
    }
}

impl AsyncWrite for UdpStream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        data: &[u8],
    ) -> Poll<io::Result<usize>> {
        match self.peer {
            PeerState::Connected(_) => self.socket.poll_send(cx, data),
            PeerState::Learned(Some(peer)) => self.socket.poll_send_to(cx, data, peer),
            PeerState::Learned(None) => Poll::Ready(Err(io::Error::new(
                io::ErrorKind::NotConnected,
                NoPeerError,
            ))),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

/// "Connects" a UDP socket: no packets are exchanged.
#[derive(Debug, Clone, Default)]
pub struct UdpConnector;

impl UdpConnector {
    pub fn new() -> Self {
        Self
    }
}

impl TransportConnector for UdpConnector {
    fn connect<'a>(&'a self, addr: &'a str) -> BoxFuture<'a, Result<Session, TransportError>> {
        Box::pin(async move {
            let remote = resolve_one(addr).await?;
            let socket = UdpSocket::bind(unspecified_for(&remote))
                .await
                .map_err(|e| TransportError::connect(addr, e))?;
            socket
                .connect(remote)
                .await
                .map_err(|e| TransportError::connect(addr, e))?;
            info!(peer = %remote, local = ?socket.local_addr().ok(), "connected");
            Ok(Session::new(
                UdpStream::connected(socket, remote),
                CloseHandle::new(),
                Some(remote),
            ))
        })
    }
}

/// A bound UDP socket. The session starts with the first datagram.
pub struct UdpListener {
    socket: UdpSocket,
}

impl UdpListener {
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let local = resolve_one(addr).await?;
        let socket = UdpSocket::bind(local)
            .await
            .map_err(|e| TransportError::listen(addr, e))?;
        info!(transport = "udp", addr = %local, "listening");
        Ok(Self { socket })
    }
}

impl TransportListener for UdpListener {
    fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    fn accept(self: Box<Self>) -> BoxFuture<'static, Result<Session, TransportError>> {
        Box::pin(async move {
            // Leaves the datagram queued for the first read.
            let peer = self
                .socket
                .peek_sender()
                .await
                .map_err(|e| TransportError::Accept(e.to_string()))?;
            info!(peer = %peer, "connected");
            let stream = UdpStream::unconnected(self.socket)
                .with_initial_peer(peer)
                .with_echo(true);
            Ok(Session::new(stream, CloseHandle::new(), Some(peer)))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    async fn loopback() -> UdpSocket {
        UdpSocket::bind("127.0.0.1:0").await.unwrap()
    }

    #[tokio::test]
    async fn write_before_read_has_no_peer() {
        let mut server = UdpStream::unconnected(loopback().await);
        let err = server.write(b"early").await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotConnected);
        assert!(
            err.get_ref()
                .and_then(|e| e.downcast_ref::<NoPeerError>())
                .is_some()
        );
    }

    #[tokio::test]
    async fn write_after_read_goes_to_observed_sender() {
        let mut server = UdpStream::unconnected(loopback().await);
        let server_addr = server.local_addr().unwrap();
        let client = loopback().await;

        client.send_to(b"hello", server_addr).await.unwrap();
        let mut buf = [0u8; 64];
        let n = server.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"hello");
        assert_eq!(server.peer_addr(), Some(client.local_addr().unwrap()));

        server.write_all(b"reply").await.unwrap();
        let (n, from) = client.recv_from(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"reply");
        assert_eq!(from, server_addr);
    }

    #[tokio::test]
    async fn echo_returns_each_datagram() {
        let mut server = UdpStream::unconnected(loopback().await).with_echo(true);
        let server_addr = server.local_addr().unwrap();
        let client = loopback().await;

        client.send_to(b"ping", server_addr).await.unwrap();
        let mut buf = [0u8; 16];
        let n = server.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"ping");

        let (n, _) = client.recv_from(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"ping");
    }

    #[tokio::test]
    async fn empty_datagrams_are_skipped() {
        let mut server = UdpStream::unconnected(loopback().await);
        let server_addr = server.local_addr().unwrap();
        let client = loopback().await;

        client.send_to(b"", server_addr).await.unwrap();
        client.send_to(b"data", server_addr).await.unwrap();
        let mut buf = [0u8; 16];
        let n = server.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"data");
    }

    #[tokio::test]
    async fn oversized_datagram_is_truncated() {
        let mut server = UdpStream::unconnected(loopback().await);
        let server_addr = server.local_addr().unwrap();
        let client = loopback().await;

        client.send_to(b"0123456789", server_addr).await.unwrap();
        client.send_to(b"next", server_addr).await.unwrap();

        let mut buf = [0u8; 4];
        let n = server.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"0123");
        // The tail of the first datagram is gone.
        let n = server.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"next");
    }

    #[tokio::test]
    async fn one_read_is_one_datagram() {
        let mut server = UdpStream::unconnected(loopback().await);
        let server_addr = server.local_addr().unwrap();
        let client = loopback().await;

        client.send_to(b"first", server_addr).await.unwrap();
        client.send_to(b"second", server_addr).await.unwrap();
        let mut buf = [0u8; 64];
        let n = server.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"first");
        let n = server.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"second");
    }

    #[tokio::test]
    async fn listener_session_starts_with_first_datagram() {
        let listener = UdpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(Box::new(listener).accept());

        let client = UdpConnector::new().connect(&addr.to_string()).await.unwrap();
        let (mut client_stream, _) = client.into_parts();
        client_stream.write_all(b"hello").await.unwrap();

        let session = server.await.unwrap().unwrap();
        let (mut server_stream, _) = session.into_parts();
        let mut buf = [0u8; 16];
        let n = server_stream.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"hello");

        // Echo first, then an explicit reply.
        let n = client_stream.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"hello");
        server_stream.write_all(b"back").await.unwrap();
        let n = client_stream.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"back");
    }
}
