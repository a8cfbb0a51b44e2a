//! Client error types.

use qcat_config::ConfigError;
use qcat_core::errors::ERROR_CONFIG;
use qcat_transport::TransportError;

/// Errors that can end a client invocation.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl ClientError {
    /// Get the error type string for logging.
    pub fn error_type(&self) -> &'static str {
        match self {
            ClientError::Config(_) => ERROR_CONFIG,
            ClientError::Transport(e) => e.error_type(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_type_follows_source() {
        let config = ClientError::from(ConfigError::Validation("no peer address".into()));
        assert_eq!(config.error_type(), ERROR_CONFIG);

        let refused = ClientError::from(TransportError::connect("127.0.0.1:1", "refused"));
        assert_eq!(refused.error_type(), "connect");
        assert_eq!(
            refused.to_string(),
            "failed to connect to 127.0.0.1:1: refused"
        );
    }
}
