//! Session transports for qcat.
//!
//! Every transport produces the same thing: a [`Session`] holding a boxed
//! [`DuplexStream`] plus a [`CloseHandle`] that can force the session shut
//! from another task. The pump and the verbose wrapper are written once
//! against that abstraction.
//!
//! # Transports
//!
//! - [`quic`]: one bidirectional stream over a QUIC connection (ALPN `qcat`).
//! - [`tcp`]: a plain TCP connection.
//! - [`udp`]: a UDP socket adapted to a byte stream, one datagram per read.

pub mod error;
pub mod quic;
pub mod resolve;
pub mod tcp;
pub mod tls;
pub mod udp;

mod closeable;
mod session;

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::pin::Pin;

use tokio::io::{AsyncRead, AsyncWrite};

pub use error::TransportError;
pub use session::{CloseHandle, Session};
pub use udp::NoPeerError;

/// Read, write and close: what every transport adapter provides.
pub trait DuplexStream: AsyncRead + AsyncWrite + Unpin + Send + 'static {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send + 'static> DuplexStream for T {}

/// Type-erased session stream.
pub type BoxedStream = Box<dyn DuplexStream>;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Establishes an outbound session.
pub trait TransportConnector: Send + Sync {
    /// Connect to the given `host:port` address.
    fn connect<'a>(&'a self, addr: &'a str) -> BoxFuture<'a, Result<Session, TransportError>>;
}

/// A bound listener that hands out exactly one session.
pub trait TransportListener: Send {
    fn local_addr(&self) -> io::Result<SocketAddr>;

    /// Wait for the single inbound session. Consumes the listener so a second
    /// session can never be accepted.
    fn accept(self: Box<Self>) -> BoxFuture<'static, Result<Session, TransportError>>;
}
