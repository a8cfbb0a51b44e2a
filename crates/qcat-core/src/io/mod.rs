//! I/O utilities for the stdio pump and stream instrumentation.
//!
//! This module provides shared I/O primitives used by both qcat-client and
//! qcat-server.

mod pump;
mod verbose;

pub use pump::{PumpSummary, pump, pump_with};
pub use verbose::{LogObserver, StreamObserver, VerboseStream, hex_preview};
