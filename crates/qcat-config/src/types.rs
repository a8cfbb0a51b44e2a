use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use qcat_core::defaults::DEFAULT_LISTEN_HOST;
use serde::{Deserialize, Serialize};

use crate::loader::ConfigError;

/// Transport used for a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// Encrypted, multiplexed QUIC; one bidirectional stream per session.
    #[default]
    Quic,
    /// Plain TCP byte stream.
    Tcp,
    /// Connectionless UDP datagrams.
    Udp,
}

impl Protocol {
    pub fn as_str(self) -> &'static str {
        match self {
            Protocol::Quic => "quic",
            Protocol::Tcp => "tcp",
            Protocol::Udp => "udp",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Protocol {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "quic" => Ok(Protocol::Quic),
            "tcp" => Ok(Protocol::Tcp),
            "udp" => Ok(Protocol::Udp),
            other => Err(ConfigError::Validation(format!(
                "unsupported protocol: {other} (expected quic, tcp or udp)"
            ))),
        }
    }
}

/// Session configuration shared by the connector and the listener.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub protocol: Protocol,
    /// `host:port` to connect to, or `[host]:port` to listen on.
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub verbose: bool,
    /// QUIC max idle timeout (listen mode only). Zero means transport default.
    #[serde(default, with = "crate::duration::serde_opt")]
    pub idle_timeout: Option<Duration>,
    /// Certificate/key files for the QUIC server. Self-signed when absent.
    #[serde(default)]
    pub tls: Option<TlsConfig>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    pub fn new(protocol: Protocol, address: impl Into<String>) -> Self {
        Self {
            protocol,
            address: address.into(),
            ..Self::default()
        }
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = Some(idle_timeout);
        self
    }

    pub fn with_tls(mut self, tls: TlsConfig) -> Self {
        self.tls = Some(tls);
        self
    }

    /// Address suitable for binding: `:8000` becomes `0.0.0.0:8000`.
    pub fn bind_address(&self) -> String {
        if self.address.starts_with(':') {
            format!("{DEFAULT_LISTEN_HOST}{}", self.address)
        } else {
            self.address.clone()
        }
    }

    /// Idle timeout to apply, if any. Zero is treated as unset.
    pub fn effective_idle_timeout(&self) -> Option<Duration> {
        self.idle_timeout.filter(|d| !d.is_zero())
    }
}

/// TLS certificate and key paths (PEM).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TlsConfig {
    pub cert: String,
    pub key: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    pub level: Option<String>,
    /// Log format: json, pretty, or compact. Default: pretty.
    pub format: Option<String>,
    /// Per-module log level filters (e.g., {"quinn": "warn"}).
    #[serde(default)]
    pub filters: HashMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocol_parses_case_insensitively() {
        assert_eq!("QUIC".parse::<Protocol>().unwrap(), Protocol::Quic);
        assert_eq!("tcp".parse::<Protocol>().unwrap(), Protocol::Tcp);
        assert_eq!(" udp ".parse::<Protocol>().unwrap(), Protocol::Udp);
        assert!("sctp".parse::<Protocol>().is_err());
    }

    #[test]
    fn bind_address_fills_in_host() {
        assert_eq!(Config::new(Protocol::Tcp, ":8000").bind_address(), "0.0.0.0:8000");
        assert_eq!(
            Config::new(Protocol::Tcp, "127.0.0.1:9").bind_address(),
            "127.0.0.1:9"
        );
        assert_eq!(Config::new(Protocol::Tcp, "[::1]:9").bind_address(), "[::1]:9");
    }

    #[test]
    fn zero_idle_timeout_means_default() {
        let config = Config::new(Protocol::Quic, ":1").with_idle_timeout(Duration::ZERO);
        assert_eq!(config.effective_idle_timeout(), None);
        let config = config.with_idle_timeout(Duration::from_secs(120));
        assert_eq!(config.effective_idle_timeout(), Some(Duration::from_secs(120)));
    }
}
