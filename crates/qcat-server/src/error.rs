//! Server error types.

use qcat_config::ConfigError;
use qcat_core::errors::ERROR_CONFIG;
use qcat_transport::TransportError;

/// Server error type.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl ServerError {
    /// Get the error type string for logging.
    pub fn error_type(&self) -> &'static str {
        match self {
            ServerError::Config(_) => ERROR_CONFIG,
            ServerError::Transport(e) => e.error_type(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_type_follows_source() {
        let config = ServerError::from(ConfigError::Validation("missing port".into()));
        assert_eq!(config.error_type(), ERROR_CONFIG);
        assert_eq!(config.to_string(), "invalid configuration: validation: missing port");

        let taken = ServerError::from(TransportError::listen("0.0.0.0:9000", "address in use"));
        assert_eq!(taken.error_type(), "listen");
    }
}
