//! Default configuration values.
//!
//! Centralized default constants for use across all crates.

// ============================================================================
// Address Defaults
// ============================================================================

/// Default listen address (all IPv4 interfaces).
pub const DEFAULT_LISTEN_ADDR: &str = ":8000";
/// Default connect address.
pub const DEFAULT_CONNECT_ADDR: &str = "localhost:8000";
/// Host substituted when a listen address omits it (`:8000`).
pub const DEFAULT_LISTEN_HOST: &str = "0.0.0.0";

// ============================================================================
// Timeout Defaults
// ============================================================================

/// Timeout for establishing an outbound TCP connection or QUIC handshake.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
/// How long a closing QUIC endpoint may spend draining before we give up.
pub const DEFAULT_CLOSE_DRAIN_TIMEOUT_SECS: u64 = 3;

// ============================================================================
// Buffer/Size Defaults
// ============================================================================

/// Pump buffer size per direction (32 KiB).
pub const DEFAULT_PUMP_BUFFER_SIZE: usize = 32768;
/// Maximum number of bytes shown in a verbose hex preview.
pub const HEX_PREVIEW_LEN: usize = 32;

// ============================================================================
// QUIC / TLS
// ============================================================================

/// ALPN identifier shared by the QUIC client and server.
pub const QUIC_ALPN: &[u8] = b"qcat";
/// Subject name placed in the auto-generated server certificate.
pub const SELF_SIGNED_SUBJECT: &str = "localhost";
/// Application error code sent when a session closes normally.
pub const QUIC_CLOSE_CODE: u32 = 0;

// ============================================================================
// Logging
// ============================================================================

/// Log level used when neither `--verbose` nor `--log-level` is given.
pub const DEFAULT_LOG_LEVEL: &str = "warn";
/// Log level enabled by `--verbose`.
pub const VERBOSE_LOG_LEVEL: &str = "debug";
/// Targets held at the default level under `--verbose`.
pub const VERBOSE_QUIET_TARGETS: &[&str] = &["quinn", "quinn_proto", "rustls"];
