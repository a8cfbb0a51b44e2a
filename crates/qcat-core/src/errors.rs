//! Error type constants for logging.
//!
//! These constants provide consistent error classification across all crates.

/// Invalid or incompatible option combination.
pub const ERROR_CONFIG: &str = "config";
/// DNS/address resolution error.
pub const ERROR_RESOLVE: &str = "resolve";
/// Outbound connection or handshake failure.
pub const ERROR_CONNECT: &str = "connect";
/// Bind failure.
pub const ERROR_LISTEN: &str = "listen";
/// Inbound connection or stream accept failure.
pub const ERROR_ACCEPT: &str = "accept";
/// Datagram write before any peer was seen.
pub const ERROR_NO_PEER: &str = "no_peer";
/// TLS configuration error.
pub const ERROR_TLS: &str = "tls";
/// I/O error on an established session.
pub const ERROR_IO: &str = "io";

/// Classify an I/O error raised on an established session.
pub fn io_error_type(err: &std::io::Error) -> &'static str {
    match err.kind() {
        std::io::ErrorKind::NotConnected => ERROR_NO_PEER,
        _ => ERROR_IO,
    }
}
