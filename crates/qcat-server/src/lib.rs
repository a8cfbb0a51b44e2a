//! qcat listen role.
//!
//! Binds a QUIC, TCP or UDP listener, accepts exactly one session and relays
//! the process's stdin and stdout over it. A second peer is never served.

mod error;
mod listener;

pub use error::ServerError;
pub use listener::{accept, bind, serve, serve_on, serve_with};
