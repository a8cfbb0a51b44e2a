//! # qcat
//!
//! A netcat-style relay: one process listens, another connects, and the
//! bytes on stdin/stdout flow over a single QUIC, TCP or UDP session.
//!
//! ## Crates
//!
//! - [`qcat_core`] - Defaults, roles, the duplex pump and verbose wrapper
//! - [`qcat_config`] - Configuration types, validation and TOML loading
//! - [`qcat_transport`] - QUIC, TCP and UDP session adapters
//! - [`qcat_client`] - Connect role
//! - [`qcat_server`] - Listen role

pub mod cli;

pub use qcat_client as client;
pub use qcat_config as config;
pub use qcat_core as core;
pub use qcat_server as server;
pub use qcat_transport as transport;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use qcat_config::{Config, Protocol, Role, load_config, validate_config};
    pub use qcat_transport::{CloseHandle, Session, TransportConnector, TransportListener};
    pub use tokio_util::sync::CancellationToken;
}
