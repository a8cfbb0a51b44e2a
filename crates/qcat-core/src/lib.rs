//! Core types and stream plumbing shared across qcat crates.
//!
//! This crate provides:
//! - Default configuration values
//! - Error classification constants for logging
//! - The session [`Role`] tag
//! - The duplex pump and the verbose stream wrapper ([`io`])

pub mod defaults;
pub mod errors;
pub mod io;
mod role;

// Re-export commonly used items at crate root
pub use defaults::*;
pub use errors::*;
pub use role::Role;
