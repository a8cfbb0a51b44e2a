//! Binding, accepting and serving the single inbound session.

use qcat_config::{Config, Protocol, validate_config};
use qcat_core::Role;
use qcat_core::io::{PumpSummary, VerboseStream, pump_with};
use qcat_transport::quic::{QuicListener, build_quic_server_config};
use qcat_transport::tcp::TcpListener;
use qcat_transport::udp::UdpListener;
use qcat_transport::{BoxedStream, Session, TransportListener};
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::info;

use crate::error::ServerError;

/// Validate `config` and bind the listener for its transport.
///
/// Nothing touches the network until validation has passed.
pub async fn bind(config: &Config) -> Result<Box<dyn TransportListener>, ServerError> {
    validate_config(config, Role::Server)?;
    let addr = config.bind_address();

    let listener: Box<dyn TransportListener> = match config.protocol {
        Protocol::Quic => {
            let server_config =
                build_quic_server_config(config.tls.as_ref(), config.effective_idle_timeout())?;
            Box::new(QuicListener::bind(&addr, server_config).await?)
        }
        Protocol::Tcp => Box::new(TcpListener::bind(&addr).await?),
        Protocol::Udp => Box::new(UdpListener::bind(&addr).await?),
    };
    Ok(listener)
}

/// Wait for the single session, wrapping it for verbose logging if asked.
pub async fn accept(
    listener: Box<dyn TransportListener>,
    config: &Config,
) -> Result<Session, ServerError> {
    let session = listener.accept().await?;
    if config.verbose {
        Ok(session.map_stream(|s| -> BoxedStream { Box::new(VerboseStream::new(s, Role::Server)) }))
    } else {
        Ok(session)
    }
}

/// Accept on an already bound listener and relay `input`/`output` over the
/// session until the peer is done.
pub async fn serve_on<I, O>(
    listener: Box<dyn TransportListener>,
    config: &Config,
    input: I,
    output: O,
) -> Result<PumpSummary, ServerError>
where
    I: AsyncRead + Unpin + Send + 'static,
    O: AsyncWrite + Unpin,
{
    let session = accept(listener, config).await?;
    let peer = session.peer_addr();
    let (stream, closer) = session.into_parts();

    let summary = pump_with(stream, input, output, Role::Server).await;
    closer.finish().await;

    info!(
        peer = ?peer,
        sent = summary.sent,
        received = summary.received,
        "session finished"
    );
    Ok(summary)
}

/// Bind, accept one session and relay `input`/`output` over it.
pub async fn serve_with<I, O>(
    config: &Config,
    input: I,
    output: O,
) -> Result<PumpSummary, ServerError>
where
    I: AsyncRead + Unpin + Send + 'static,
    O: AsyncWrite + Unpin,
{
    let listener = bind(config).await?;
    serve_on(listener, config, input, output).await
}

/// Bind, accept one session and relay stdin/stdout over it.
pub async fn serve(config: &Config) -> Result<PumpSummary, ServerError> {
    serve_with(config, tokio::io::stdin(), tokio::io::stdout()).await
}
