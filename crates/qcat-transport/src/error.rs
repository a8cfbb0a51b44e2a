//! Error types for the transport crate.

use qcat_core::errors::{
    ERROR_ACCEPT, ERROR_CONFIG, ERROR_CONNECT, ERROR_IO, ERROR_LISTEN, ERROR_RESOLVE, ERROR_TLS,
};
use thiserror::Error;

/// Errors that can occur while establishing a session.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TLS error: {0}")]
    Tls(#[from] rustls::Error),

    #[error("config error: {0}")]
    Config(String),

    #[error("certificate generation failed: {0}")]
    CertGeneration(String),

    #[error("failed to resolve {addr}: {reason}")]
    Resolve { addr: String, reason: String },

    #[error("failed to connect to {addr}: {reason}")]
    Connect { addr: String, reason: String },

    #[error("failed to listen on {addr}: {reason}")]
    Listen { addr: String, reason: String },

    #[error("failed to accept connection: {0}")]
    Accept(String),
}

impl TransportError {
    pub fn connect(addr: &str, reason: impl ToString) -> Self {
        Self::Connect {
            addr: addr.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn listen(addr: &str, reason: impl ToString) -> Self {
        Self::Listen {
            addr: addr.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Get the error type string for logging.
    pub fn error_type(&self) -> &'static str {
        match self {
            TransportError::Io(_) => ERROR_IO,
            TransportError::Tls(_) | TransportError::CertGeneration(_) => ERROR_TLS,
            TransportError::Config(_) => ERROR_CONFIG,
            TransportError::Resolve { .. } => ERROR_RESOLVE,
            TransportError::Connect { .. } => ERROR_CONNECT,
            TransportError::Listen { .. } => ERROR_LISTEN,
            TransportError::Accept(_) => ERROR_ACCEPT,
        }
    }
}
