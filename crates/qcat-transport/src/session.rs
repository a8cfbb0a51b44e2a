//! The established session and its close handle.

use std::net::SocketAddr;
use std::time::Duration;

use qcat_core::defaults::{DEFAULT_CLOSE_DRAIN_TIMEOUT_SECS, QUIC_CLOSE_CODE};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::closeable::Closeable;
use crate::{BoxedStream, DuplexStream};

/// An established session: one duplex stream and the means to close it.
pub struct Session {
    stream: BoxedStream,
    closer: CloseHandle,
    peer: Option<SocketAddr>,
}

impl Session {
    /// Wrap `stream` so that closing `closer` fails its pending I/O.
    pub fn new<S: DuplexStream>(stream: S, closer: CloseHandle, peer: Option<SocketAddr>) -> Self {
        let stream = Closeable::new(stream, closer.token.clone());
        Self {
            stream: Box::new(stream),
            closer,
            peer,
        }
    }

    /// Remote address, when the transport knows it.
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer
    }

    pub fn close_handle(&self) -> CloseHandle {
        self.closer.clone()
    }

    /// Replace the stream with a decorated version of itself.
    pub fn map_stream(self, f: impl FnOnce(BoxedStream) -> BoxedStream) -> Self {
        Self {
            stream: f(self.stream),
            ..self
        }
    }

    pub fn into_parts(self) -> (BoxedStream, CloseHandle) {
        (self.stream, self.closer)
    }
}

/// Closes a session from any task. Cloneable; closing twice is a no-op.
#[derive(Clone, Default)]
pub struct CloseHandle {
    token: CancellationToken,
    quic: Option<QuicHandle>,
}

#[derive(Clone)]
struct QuicHandle {
    connection: quinn::Connection,
    endpoint: quinn::Endpoint,
}

impl CloseHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn quic(connection: quinn::Connection, endpoint: quinn::Endpoint) -> Self {
        Self {
            token: CancellationToken::new(),
            quic: Some(QuicHandle {
                connection,
                endpoint,
            }),
        }
    }

    /// Close the session. Pending reads and writes fail promptly.
    pub fn close(&self) {
        if let Some(quic) = &self.quic {
            quic.connection
                .close(quinn::VarInt::from_u32(QUIC_CLOSE_CODE), b"session closed");
        }
        self.token.cancel();
    }

    /// Resolves once [`close`](Self::close) has been called.
    pub async fn closed(&self) {
        self.token.cancelled().await
    }

    /// Close and give the transport a bounded chance to tell the peer.
    pub async fn finish(&self) {
        self.close();
        if let Some(quic) = &self.quic {
            let drain = Duration::from_secs(DEFAULT_CLOSE_DRAIN_TIMEOUT_SECS);
            if tokio::time::timeout(drain, quic.endpoint.wait_idle())
                .await
                .is_err()
            {
                debug!("QUIC endpoint did not drain before timeout");
            }
        }
    }
}
