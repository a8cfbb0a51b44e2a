//! Outbound session establishment and cancellation.

use qcat_config::{Config, Protocol, validate_config};
use qcat_core::Role;
use qcat_core::io::VerboseStream;
use qcat_transport::quic::QuicConnector;
use qcat_transport::tcp::TcpConnector;
use qcat_transport::udp::UdpConnector;
use qcat_transport::{BoxedStream, CloseHandle, Session, TransportConnector, TransportError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::ClientError;

/// Connector for the configured transport.
pub fn connector_for(protocol: Protocol) -> Result<Box<dyn TransportConnector>, ClientError> {
    let connector: Box<dyn TransportConnector> = match protocol {
        Protocol::Quic => Box::new(QuicConnector::new_insecure()?),
        Protocol::Tcp => Box::new(TcpConnector::new()),
        Protocol::Udp => Box::new(UdpConnector::new()),
    };
    Ok(connector)
}

/// Establish the client session.
///
/// `shutdown` aborts establishment while it is in progress; afterwards a
/// watcher task closes the session when it fires, so pending reads and
/// writes fail instead of hanging.
pub async fn connect(config: &Config, shutdown: CancellationToken) -> Result<Session, ClientError> {
    validate_config(config, Role::Client)?;
    let connector = connector_for(config.protocol)?;
    info!(transport = %config.protocol, addr = %config.address, "connecting");

    let session = tokio::select! {
        biased;
        _ = shutdown.cancelled() => {
            return Err(TransportError::connect(&config.address, "cancelled").into());
        }
        result = connector.connect(&config.address) => result?,
    };

    tokio::spawn(watch_cancellation(shutdown, session.close_handle()));

    if config.verbose {
        Ok(session.map_stream(|s| -> BoxedStream { Box::new(VerboseStream::new(s, Role::Client)) }))
    } else {
        Ok(session)
    }
}

async fn watch_cancellation(shutdown: CancellationToken, closer: CloseHandle) {
    tokio::select! {
        _ = shutdown.cancelled() => {
            debug!("cancellation requested, closing session");
            closer.close();
        }
        _ = closer.closed() => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::io::AsyncReadExt;

    #[tokio::test]
    async fn client_idle_timeout_is_rejected_before_dialing() {
        // Nothing listens here; validation must fail first.
        let config =
            Config::new(Protocol::Quic, "127.0.0.1:9").with_idle_timeout(Duration::from_secs(120));
        let err = connect(&config, CancellationToken::new()).await.err().unwrap();
        assert!(matches!(err, ClientError::Config(_)));
    }

    #[tokio::test]
    async fn cancelled_before_connect_is_connect_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = CancellationToken::new();
        shutdown.cancel();

        let config = Config::new(Protocol::Tcp, addr.to_string());
        let err = connect(&config, shutdown).await.err().unwrap();
        assert_eq!(err.error_type(), qcat_core::errors::ERROR_CONNECT);
    }

    #[tokio::test]
    async fn cancellation_fails_pending_read() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let accept = tokio::spawn(async move { listener.accept().await });

        let shutdown = CancellationToken::new();
        let config = Config::new(Protocol::Tcp, addr.to_string());
        let session = connect(&config, shutdown.clone()).await.unwrap();
        let _peer = accept.await.unwrap().unwrap();
        let (mut stream, _closer) = session.into_parts();

        let reader = tokio::spawn(async move {
            let mut buf = [0u8; 8];
            stream.read(&mut buf).await
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        shutdown.cancel();

        let result = tokio::time::timeout(Duration::from_secs(5), reader)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            result.unwrap_err().kind(),
            std::io::ErrorKind::ConnectionAborted
        );
    }
}
