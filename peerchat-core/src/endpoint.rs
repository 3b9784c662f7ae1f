//! Endpoint validation: IP literals and ports from user input. No DNS.

use std::net::{IpAddr, SocketAddr};

/// Error validating user-supplied endpoint input. Display text is meant to be
/// shown directly before re-prompting.
#[derive(Debug, thiserror::Error)]
pub enum EndpointError {
    #[error("invalid IP address format: {0:?}")]
    InvalidIp(String),
    #[error("invalid port number: {0:?} (expected 1-65535)")]
    InvalidPort(String),
}

/// Parse an IPv4/IPv6 literal. Hostnames are rejected; no lookups happen here.
pub fn parse_ip(s: &str) -> Result<IpAddr, EndpointError> {
    let s = s.trim();
    s.parse()
        .map_err(|_| EndpointError::InvalidIp(s.to_string()))
}

/// Parse a port in 1-65535. Port 0 is a bind wildcard, not a sendable target.
pub fn parse_port(s: &str) -> Result<u16, EndpointError> {
    let s = s.trim();
    match s.parse::<u16>() {
        Ok(0) | Err(_) => Err(EndpointError::InvalidPort(s.to_string())),
        Ok(p) => Ok(p),
    }
}

/// Build the peer endpoint from validated parts.
pub fn peer_endpoint(ip: IpAddr, port: u16) -> SocketAddr {
    SocketAddr::new(ip, port)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn parses_v4_and_v6_literals() {
        assert_eq!(
            parse_ip("192.168.1.20").unwrap(),
            IpAddr::V4(Ipv4Addr::new(192, 168, 1, 20))
        );
        assert!(parse_ip("::1").unwrap().is_ipv6());
        assert!(parse_ip(" 10.0.0.1 ").is_ok());
    }

    #[test]
    fn rejects_hostnames_and_garbage() {
        assert!(matches!(
            parse_ip("example.com"),
            Err(EndpointError::InvalidIp(_))
        ));
        assert!(parse_ip("256.1.1.1").is_err());
        assert!(parse_ip("").is_err());
    }

    #[test]
    fn port_range_is_enforced() {
        assert_eq!(parse_port("5000").unwrap(), 5000);
        assert_eq!(parse_port("65535").unwrap(), 65535);
        assert!(matches!(
            parse_port("0"),
            Err(EndpointError::InvalidPort(_))
        ));
        assert!(parse_port("65536").is_err());
        assert!(parse_port("port").is_err());
        assert!(parse_port("-1").is_err());
    }

    #[test]
    fn builds_endpoint_from_parts() {
        let ep = peer_endpoint(parse_ip("127.0.0.1").unwrap(), 5000);
        assert_eq!(ep.to_string(), "127.0.0.1:5000");
    }
}
