//! Plain TCP transport.

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use qcat_core::defaults::DEFAULT_CONNECT_TIMEOUT_SECS;
use tokio::net::TcpStream;
use tracing::{debug, info};

use crate::error::TransportError;
use crate::resolve::{resolve, resolve_one};
use crate::{BoxFuture, CloseHandle, Session, TransportConnector, TransportListener};

/// Connects directly, trying each resolved address in turn.
#[derive(Debug, Clone, Default)]
pub struct TcpConnector;

impl TcpConnector {
    pub fn new() -> Self {
        Self
    }
}

impl TransportConnector for TcpConnector {
    fn connect<'a>(&'a self, addr: &'a str) -> BoxFuture<'a, Result<Session, TransportError>> {
        Box::pin(async move {
            let timeout = Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS);
            let mut last_err = None;
            for remote in resolve(addr).await? {
                debug!(transport = "tcp", remote = %remote, "dialing");
                match tokio::time::timeout(timeout, TcpStream::connect(remote)).await {
                    Ok(Ok(tcp)) => {
                        tcp.set_nodelay(true)?;
                        info!(peer = %remote, "connected");
                        return Ok(Session::new(tcp, CloseHandle::new(), Some(remote)));
                    }
                    Ok(Err(e)) => last_err = Some(e.to_string()),
                    Err(_) => last_err = Some("connect timed out".into()),
                }
            }
            Err(TransportError::connect(
                addr,
                last_err.unwrap_or_else(|| "no addresses to try".into()),
            ))
        })
    }
}

/// A bound TCP listener. Dropped after the first accept, so later
/// connection attempts are refused.
pub struct TcpListener {
    inner: tokio::net::TcpListener,
}

impl TcpListener {
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let local = resolve_one(addr).await?;
        let inner = tokio::net::TcpListener::bind(local)
            .await
            .map_err(|e| TransportError::listen(addr, e))?;
        info!(transport = "tcp", addr = %local, "listening");
        Ok(Self { inner })
    }
}

impl TransportListener for TcpListener {
    fn local_addr(&self) -> io::Result<SocketAddr> {
        self.inner.local_addr()
    }

    fn accept(self: Box<Self>) -> BoxFuture<'static, Result<Session, TransportError>> {
        Box::pin(async move {
            let (tcp, peer) = self
                .inner
                .accept()
                .await
                .map_err(|e| TransportError::Accept(e.to_string()))?;
            tcp.set_nodelay(true)?;
            info!(peer = %peer, "connected");
            Ok(Session::new(tcp, CloseHandle::new(), Some(peer)))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    #[tokio::test]
    async fn exchanges_bytes_and_refuses_second_connection() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(Box::new(listener).accept());

        let client = TcpConnector::new().connect(&addr.to_string()).await.unwrap();
        let (mut client_stream, _client_closer) = client.into_parts();
        let session = server.await.unwrap().unwrap();
        assert!(session.peer_addr().is_some());
        let (mut server_stream, _server_closer) = session.into_parts();

        client_stream.write_all(b"hi").await.unwrap();
        let mut buf = [0u8; 2];
        server_stream.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"hi");

        server_stream.write_all(b"yo").await.unwrap();
        client_stream.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"yo");

        let second = TcpConnector::new().connect(&addr.to_string()).await;
        assert!(matches!(second, Err(TransportError::Connect { .. })));
    }

    #[tokio::test]
    async fn refused_connection_is_connect_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = TcpConnector::new()
            .connect(&addr.to_string())
            .await
            .err()
            .unwrap();
        assert_eq!(err.error_type(), qcat_core::errors::ERROR_CONNECT);
    }

    #[tokio::test]
    async fn close_handle_unblocks_read() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(Box::new(listener).accept());

        let client = TcpConnector::new().connect(&addr.to_string()).await.unwrap();
        let _server = server.await.unwrap().unwrap();
        let (mut stream, closer) = client.into_parts();

        let reader = tokio::spawn(async move {
            let mut buf = [0u8; 16];
            stream.read(&mut buf).await
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        closer.close();

        let result = tokio::time::timeout(Duration::from_secs(5), reader)
            .await
            .unwrap()
            .unwrap();
        assert!(result.is_err());
    }
}
