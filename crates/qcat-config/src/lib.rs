//! Configuration types, validation and loading.
//!
//! A [`Config`] is built once (from the command line, optionally layered over
//! a TOML file), checked with [`validate_config`] for the chosen [`Role`], and
//! then shared read-only by the connector or listener.

mod duration;
mod loader;
mod types;
mod validate;

pub use duration::{format_duration, parse_duration};
pub use loader::{ConfigError, load_config};
pub use qcat_core::Role;
pub use types::{Config, LoggingConfig, Protocol, TlsConfig};
pub use validate::validate_config;
