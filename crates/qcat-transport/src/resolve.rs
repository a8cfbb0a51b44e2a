//! Address resolution through the system resolver.

use std::net::SocketAddr;

use tokio::net::lookup_host;

use crate::error::TransportError;

/// Resolve `host:port`, IPv4 addresses first.
///
/// Datagram and QUIC sessions use the first entry, so a `localhost` client
/// reaches a server bound on `0.0.0.0` rather than guessing `::1`.
pub async fn resolve(addr: &str) -> Result<Vec<SocketAddr>, TransportError> {
    let mut addrs: Vec<SocketAddr> = lookup_host(addr)
        .await
        .map_err(|e| TransportError::Resolve {
            addr: addr.to_string(),
            reason: e.to_string(),
        })?
        .collect();
    if addrs.is_empty() {
        return Err(TransportError::Resolve {
            addr: addr.to_string(),
            reason: "no addresses found".into(),
        });
    }
    addrs.sort_by_key(SocketAddr::is_ipv6);
    Ok(addrs)
}

/// Resolve `addr` and keep the preferred entry.
pub async fn resolve_one(addr: &str) -> Result<SocketAddr, TransportError> {
    let addrs = resolve(addr).await?;
    Ok(addrs[0])
}

/// Wildcard local address of the same family as `remote`.
pub(crate) fn unspecified_for(remote: &SocketAddr) -> SocketAddr {
    match remote {
        SocketAddr::V4(_) => SocketAddr::from(([0, 0, 0, 0], 0)),
        SocketAddr::V6(_) => SocketAddr::from(([0u16; 8], 0)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn resolves_literal_addresses() {
        let addrs = resolve("127.0.0.1:9").await.unwrap();
        assert_eq!(addrs, vec!["127.0.0.1:9".parse().unwrap()]);
    }

    #[tokio::test]
    async fn missing_port_is_a_resolve_error() {
        let err = resolve("127.0.0.1").await.unwrap_err();
        assert!(matches!(err, TransportError::Resolve { .. }));
    }

    #[test]
    fn unspecified_matches_family() {
        let v6: SocketAddr = "[::1]:443".parse().unwrap();
        assert!(unspecified_for(&v6).is_ipv6());
        let v4: SocketAddr = "10.0.0.1:443".parse().unwrap();
        assert_eq!(unspecified_for(&v4), "0.0.0.0:0".parse::<SocketAddr>().unwrap());
    }
}
