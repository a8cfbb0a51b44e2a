//! qcat connect role.
//!
//! Dials the configured peer over QUIC, TCP or UDP and relays the process's
//! stdin and stdout over the single session until the peer closes it or the
//! shutdown token fires.

mod connector;
mod error;

pub use connector::{connect, connector_for};
pub use error::ClientError;

use qcat_config::Config;
use qcat_core::Role;
use qcat_core::io::{PumpSummary, pump_with};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Run a client session against stdin and stdout.
pub async fn run(config: &Config, shutdown: CancellationToken) -> Result<PumpSummary, ClientError> {
    run_with(config, shutdown, tokio::io::stdin(), tokio::io::stdout()).await
}

/// Run a client session against the given input and output.
pub async fn run_with<I, O>(
    config: &Config,
    shutdown: CancellationToken,
    input: I,
    output: O,
) -> Result<PumpSummary, ClientError>
where
    I: AsyncRead + Unpin + Send + 'static,
    O: AsyncWrite + Unpin,
{
    let session = connect(config, shutdown).await?;
    let peer = session.peer_addr();
    let (stream, closer) = session.into_parts();

    let summary = pump_with(stream, input, output, Role::Client).await;
    closer.finish().await;

    info!(
        peer = ?peer,
        sent = summary.sent,
        received = summary.received,
        "session finished"
    );
    Ok(summary)
}
