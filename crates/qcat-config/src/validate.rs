//! Configuration validation logic.
//!
//! Runs before any network activity; an invalid combination never reaches
//! the connector or listener.

use qcat_core::Role;

use crate::loader::ConfigError;
use crate::types::{Config, Protocol};

const LOG_FORMATS: [&str; 3] = ["pretty", "compact", "json"];

pub fn validate_config(config: &Config, role: Role) -> Result<(), ConfigError> {
    validate_address(&config.address, role)?;

    if config.idle_timeout.is_some() {
        if role != Role::Server {
            return Err(ConfigError::Validation(
                "idle timeout is only supported in listen mode".into(),
            ));
        }
        if config.protocol != Protocol::Quic {
            return Err(ConfigError::Validation(format!(
                "idle timeout is only supported with quic (got {})",
                config.protocol
            )));
        }
    }

    if let Some(tls) = &config.tls {
        if role != Role::Server || config.protocol != Protocol::Quic {
            return Err(ConfigError::Validation(
                "tls certificate files are only used by the quic listener".into(),
            ));
        }
        if tls.cert.trim().is_empty() {
            return Err(ConfigError::Validation("tls.cert is empty".into()));
        }
        if tls.key.trim().is_empty() {
            return Err(ConfigError::Validation("tls.key is empty".into()));
        }
    }

    if let Some(format) = config.logging.format.as_deref()
        && !LOG_FORMATS.contains(&format)
    {
        return Err(ConfigError::Validation(format!(
            "logging.format must be one of: {:?}",
            LOG_FORMATS
        )));
    }

    Ok(())
}

/// `host:port` for clients; `[host]:port` (host optional) for servers.
fn validate_address(address: &str, role: Role) -> Result<(), ConfigError> {
    let address = address.trim();
    if address.is_empty() {
        return Err(ConfigError::Validation("address is empty".into()));
    }

    let Some((host, port)) = address.rsplit_once(':') else {
        return Err(ConfigError::Validation(format!(
            "address {address} is missing a port"
        )));
    };
    if port.parse::<u16>().is_err() {
        return Err(ConfigError::Validation(format!(
            "address {address} has an invalid port"
        )));
    }
    if host.is_empty() && role == Role::Client {
        return Err(ConfigError::Validation(format!(
            "address {address} is missing a host"
        )));
    }
    if host.starts_with('[') != host.ends_with(']') {
        return Err(ConfigError::Validation(format!(
            "address {address} has an unbalanced IPv6 bracket"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TlsConfig;
    use std::time::Duration;

    fn server_quic() -> Config {
        Config::new(Protocol::Quic, ":8000")
    }

    #[test]
    fn accepts_defaults_for_both_roles() {
        validate_config(&server_quic(), Role::Server).unwrap();
        validate_config(&Config::new(Protocol::Udp, "localhost:8000"), Role::Client).unwrap();
        validate_config(&Config::new(Protocol::Tcp, "[::1]:8000"), Role::Client).unwrap();
    }

    #[test]
    fn idle_timeout_only_for_quic_listener() {
        let two_minutes = Duration::from_secs(120);
        validate_config(&server_quic().with_idle_timeout(two_minutes), Role::Server).unwrap();

        for protocol in [Protocol::Tcp, Protocol::Udp] {
            let config = Config::new(protocol, ":8000").with_idle_timeout(two_minutes);
            assert!(matches!(
                validate_config(&config, Role::Server),
                Err(ConfigError::Validation(_))
            ));
        }

        let client = Config::new(Protocol::Quic, "localhost:8000").with_idle_timeout(two_minutes);
        assert!(matches!(
            validate_config(&client, Role::Client),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn rejects_bad_addresses() {
        for (addr, role) in [
            ("", Role::Server),
            ("localhost", Role::Client),
            ("localhost:http", Role::Client),
            ("localhost:70000", Role::Client),
            (":8000", Role::Client),
            ("[::1:8000", Role::Client),
        ] {
            let config = Config::new(Protocol::Tcp, addr);
            assert!(
                validate_config(&config, role).is_err(),
                "{addr:?} should be rejected for {role}"
            );
        }
    }

    #[test]
    fn tls_files_only_for_quic_listener() {
        let tls = TlsConfig {
            cert: "cert.pem".into(),
            key: "key.pem".into(),
        };
        validate_config(&server_quic().with_tls(tls.clone()), Role::Server).unwrap();
        let tcp = Config::new(Protocol::Tcp, ":8000").with_tls(tls);
        assert!(validate_config(&tcp, Role::Server).is_err());
    }

    #[test]
    fn rejects_unknown_log_format() {
        let mut config = server_quic();
        config.logging.format = Some("xml".into());
        assert!(validate_config(&config, Role::Server).is_err());
    }
}
