//! QUIC transport: one bidirectional stream per session.

use std::io;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use qcat_config::TlsConfig;
use qcat_core::defaults::DEFAULT_CONNECT_TIMEOUT_SECS;
use quinn::crypto::rustls::{QuicClientConfig, QuicServerConfig};
use quinn::{Endpoint, RecvStream, SendStream};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tracing::{debug, info};

use crate::error::TransportError;
use crate::resolve::{resolve_one, unspecified_for};
use crate::tls;
use crate::{BoxFuture, CloseHandle, Session, TransportConnector, TransportListener};

/// The send and receive halves of one QUIC bidirectional stream.
pub struct QuicStream {
    send: SendStream,
    recv: RecvStream,
}

impl QuicStream {
    pub fn new(send: SendStream, recv: RecvStream) -> Self {
        Self { send, recv }
    }

    pub fn id(&self) -> quinn::StreamId {
        self.send.id()
    }
}

impl AsyncRead for QuicStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        AsyncRead::poll_read(Pin::new(&mut self.recv), cx, buf)
    }
}

impl AsyncWrite for QuicStream {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        data: &[u8],
    ) -> Poll<io::Result<usize>> {
        AsyncWrite::poll_write(Pin::new(&mut self.send), cx, data)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        AsyncWrite::poll_flush(Pin::new(&mut self.send), cx)
    }

    /// Finishes the send side; the peer reads end-of-stream.
    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        AsyncWrite::poll_shutdown(Pin::new(&mut self.send), cx)
    }
}

/// Outbound QUIC sessions. Server certificates are not verified.
#[derive(Clone)]
pub struct QuicConnector {
    client_config: quinn::ClientConfig,
}

impl QuicConnector {
    pub fn new_insecure() -> Result<Self, TransportError> {
        let crypto = tls::insecure_client_crypto()?;
        let crypto =
            QuicClientConfig::try_from(crypto).map_err(|e| TransportError::Config(e.to_string()))?;
        Ok(Self {
            client_config: quinn::ClientConfig::new(Arc::new(crypto)),
        })
    }
}

impl TransportConnector for QuicConnector {
    fn connect<'a>(&'a self, addr: &'a str) -> BoxFuture<'a, Result<Session, TransportError>> {
        Box::pin(async move {
            let remote = resolve_one(addr).await?;
            debug!(transport = "quic", addr, remote = %remote, "resolved");

            let mut endpoint = Endpoint::client(unspecified_for(&remote))
                .map_err(|e| TransportError::connect(addr, e))?;
            endpoint.set_default_client_config(self.client_config.clone());

            let connecting = endpoint
                .connect(remote, &extract_host(addr))
                .map_err(|e| TransportError::connect(addr, e))?;
            let connection =
                tokio::time::timeout(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS), connecting)
                    .await
                    .map_err(|_| TransportError::connect(addr, "handshake timed out"))?
                    .map_err(|e| TransportError::connect(addr, e))?;

            let (send, recv) = connection
                .open_bi()
                .await
                .map_err(|e| TransportError::connect(addr, e))?;
            let stream = QuicStream::new(send, recv);
            info!(peer = %remote, stream_id = %stream.id(), "connected");

            let closer = CloseHandle::quic(connection, endpoint);
            Ok(Session::new(stream, closer, Some(remote)))
        })
    }
}

/// A bound QUIC endpoint waiting for its single session.
pub struct QuicListener {
    endpoint: Endpoint,
}

impl QuicListener {
    pub async fn bind(
        addr: &str,
        server_config: quinn::ServerConfig,
    ) -> Result<Self, TransportError> {
        let local = resolve_one(addr).await?;
        let endpoint =
            Endpoint::server(server_config, local).map_err(|e| TransportError::listen(addr, e))?;
        info!(transport = "quic", addr = %local, "listening");
        Ok(Self { endpoint })
    }
}

impl TransportListener for QuicListener {
    fn local_addr(&self) -> io::Result<SocketAddr> {
        self.endpoint.local_addr()
    }

    fn accept(self: Box<Self>) -> BoxFuture<'static, Result<Session, TransportError>> {
        let endpoint = self.endpoint;
        Box::pin(async move {
            let incoming = endpoint
                .accept()
                .await
                .ok_or_else(|| TransportError::Accept("endpoint closed".into()))?;
            let connection = incoming
                .await
                .map_err(|e| TransportError::Accept(e.to_string()))?;
            // One session per invocation: refuse anything that arrives later.
            endpoint.set_server_config(None);

            let peer = connection.remote_address();
            debug!(peer = %peer, "connection accepted, waiting for stream");
            let (send, recv) = connection
                .accept_bi()
                .await
                .map_err(|e| TransportError::Accept(e.to_string()))?;
            let stream = QuicStream::new(send, recv);
            info!(peer = %peer, stream_id = %stream.id(), "connected");

            let closer = CloseHandle::quic(connection, endpoint);
            Ok(Session::new(stream, closer, Some(peer)))
        })
    }
}

/// QUIC server config: TLS from files or self-signed, optional idle timeout.
pub fn build_quic_server_config(
    tls_config: Option<&TlsConfig>,
    idle_timeout: Option<Duration>,
) -> Result<quinn::ServerConfig, TransportError> {
    let crypto = tls::server_crypto(tls_config)?;
    let crypto =
        QuicServerConfig::try_from(crypto).map_err(|e| TransportError::Config(e.to_string()))?;
    let mut config = quinn::ServerConfig::with_crypto(Arc::new(crypto));

    if let Some(idle) = idle_timeout {
        let idle = quinn::IdleTimeout::try_from(idle)
            .map_err(|e| TransportError::Config(format!("idle timeout out of range: {e}")))?;
        let mut transport = quinn::TransportConfig::default();
        transport.max_idle_timeout(Some(idle));
        config.transport_config(Arc::new(transport));
    }
    Ok(config)
}

/// Server name sent in the handshake, taken from `host:port`.
fn extract_host(remote: &str) -> String {
    if let Some(stripped) = remote.strip_prefix('[')
        && let Some(end) = stripped.find(']')
    {
        return stripped[..end].to_string();
    }

    if remote.chars().filter(|&c| c == ':').count() == 1 {
        return remote
            .rsplit_once(':')
            .map(|(h, _)| h.to_string())
            .unwrap_or_else(|| remote.to_string());
    }

    remote.to_string()
}
