//! Duplex pump between a session stream and the process's stdio.
//!
//! Each direction is an independent copy loop: stdin → stream runs on a
//! spawned task, stream → stdout runs on the caller. Either side may block
//! for an unbounded time waiting on its source, so they never share a loop.
//!
//! The session is over when the stream → output direction ends (peer closed,
//! reset, or an I/O error). The input direction is fire-and-forget: it is
//! aborted at that point so the stream can be released.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

use crate::defaults::DEFAULT_PUMP_BUFFER_SIZE;
use crate::errors::io_error_type;
use crate::role::Role;

/// Byte counts observed by a finished pump.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PumpSummary {
    /// Bytes copied from input into the stream before the session ended.
    pub sent: u64,
    /// Bytes copied from the stream into output.
    pub received: u64,
}

/// Pump `stream` against the process's stdin and stdout.
pub async fn pump<S>(stream: S, role: Role) -> PumpSummary
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    pump_with(stream, tokio::io::stdin(), tokio::io::stdout(), role).await
}

/// Pump `stream` against arbitrary input and output handles.
///
/// Returns once the stream → `output` direction has finished. Errors in
/// either direction are logged at debug level and end only that direction.
pub async fn pump_with<S, I, O>(stream: S, mut input: I, mut output: O, role: Role) -> PumpSummary
where
    S: AsyncRead + AsyncWrite + Send + 'static,
    I: AsyncRead + Unpin + Send + 'static,
    O: AsyncWrite + Unpin,
{
    let (mut reader, mut writer) = tokio::io::split(stream);

    let sent = Arc::new(AtomicU64::new(0));
    let sent_counter = sent.clone();
    let outbound = tokio::spawn(async move {
        let mut buf = vec![0u8; DEFAULT_PUMP_BUFFER_SIZE];
        match copy_direction(&mut input, &mut writer, &mut buf, &sent_counter).await {
            Ok(()) => debug!(role = %role, "input closed, write side shut down"),
            Err(e) => debug!(
                role = %role,
                error = %e,
                error_type = io_error_type(&e),
                "error writing to connection"
            ),
        }
    });

    let received = AtomicU64::new(0);
    let mut buf = vec![0u8; DEFAULT_PUMP_BUFFER_SIZE];
    match copy_direction(&mut reader, &mut output, &mut buf, &received).await {
        Ok(()) => debug!(role = %role, "connection closed by peer"),
        Err(e) => debug!(
            role = %role,
            error = %e,
            error_type = io_error_type(&e),
            "error reading from connection"
        ),
    }

    outbound.abort();

    PumpSummary {
        sent: sent.load(Ordering::Relaxed),
        received: received.load(Ordering::Relaxed),
    }
}

/// One-directional copy: read → write → flush, shutting the writer down on EOF.
async fn copy_direction<R, W>(
    reader: &mut R,
    writer: &mut W,
    buf: &mut [u8],
    counter: &AtomicU64,
) -> io::Result<()>
where
    R: AsyncRead + Unpin + ?Sized,
    W: AsyncWrite + Unpin + ?Sized,
{
    loop {
        let n = reader.read(buf).await?;
        if n == 0 {
            writer.shutdown().await?;
            return Ok(());
        }
        writer.write_all(&buf[..n]).await?;
        writer.flush().await?;
        counter.fetch_add(n as u64, Ordering::Relaxed);
    }
}
