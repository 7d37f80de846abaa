//! Textual endpoint descriptor.
//!
//! A [`Host`] names an endpoint before resolution: a node (hostname or
//! IP literal) and a service (port number or well-known service name),
//! either of which may be absent. The string forms are
//! `"node:service"`, `"node"`, `":service"`, and `":"`.

use crate::base::error::NetError;
use std::fmt;
use std::str::FromStr;

/// A node+service endpoint descriptor, pre-resolution.
///
/// Immutable value type with structural equality. An empty `node` means
/// "any interface" when binding; an empty `service` means "ephemeral"
/// when binding and "protocol default" for typed clients.
#[derive(Clone, Hash, Eq, PartialEq, Default)]
pub struct Host {
    node: String,
    service: String,
}

impl Host {
    /// Creates a host from node and service parts.
    pub fn new(node: impl Into<String>, service: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            service: service.into(),
        }
    }

    /// Creates a host with only a node part.
    pub fn node_only(node: impl Into<String>) -> Self {
        Self::new(node, "")
    }

    /// The node part, empty if absent.
    pub fn node(&self) -> &str {
        &self.node
    }

    /// The service part, empty if absent.
    pub fn service(&self) -> &str {
        &self.service
    }

    /// True if both parts are absent.
    pub fn is_empty(&self) -> bool {
        self.node.is_empty() && self.service.is_empty()
    }

    /// Numeric port for the service part.
    ///
    /// An absent service maps to port 0 (ephemeral/any); a handful of
    /// well-known service names are recognized; anything else is an
    /// error.
    pub fn port(&self) -> Result<u16, NetError> {
        if self.service.is_empty() {
            return Ok(0);
        }
        if let Ok(port) = self.service.parse::<u16>() {
            return Ok(port);
        }
        match self.service.to_ascii_lowercase().as_str() {
            "http" => Ok(80),
            "https" => Ok(443),
            "smtp" => Ok(25),
            "domain" => Ok(53),
            _ => Err(NetError::InvalidHost(self.to_string())),
        }
    }

    /// Returns a copy with the given service part.
    pub fn with_service(&self, service: impl Into<String>) -> Self {
        Self::new(self.node.clone(), service)
    }
}

impl FromStr for Host {
    type Err = NetError;

    /// Parses any of the four string shapes.
    ///
    /// The last colon splits node from service. A bracketed IPv6
    /// literal (`"[::1]:80"`) keeps its colons in the node; an
    /// unbracketed string with multiple colons is taken as a bare IPv6
    /// node with no service.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(rest) = s.strip_prefix('[') {
            let (node, tail) = rest
                .split_once(']')
                .ok_or_else(|| NetError::InvalidHost(s.to_string()))?;
            let service = match tail {
                "" => "",
                _ => tail
                    .strip_prefix(':')
                    .ok_or_else(|| NetError::InvalidHost(s.to_string()))?,
            };
            return Ok(Host::new(node, service));
        }
        if s.matches(':').count() > 1 {
            return Ok(Host::node_only(s));
        }
        match s.rsplit_once(':') {
            Some((node, service)) => Ok(Host::new(node, service)),
            None => Ok(Host::node_only(s)),
        }
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.node.contains(':') {
            write!(f, "[{}]", self.node)?;
        } else {
            f.write_str(&self.node)?;
        }
        if !self.service.is_empty() || self.node.is_empty() {
            write!(f, ":{}", self.service)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Host({})", self)
    }
}

impl From<&str> for Host {
    fn from(value: &str) -> Self {
        value.parse().unwrap_or_else(|_| Host::node_only(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_four_shapes() {
        for s in ["localhost:8080", "localhost", ":8080", ":"] {
            let host: Host = s.parse().unwrap();
            assert_eq!(host.to_string(), s, "round trip of {s:?}");
        }
    }

    #[test]
    fn test_parse_parts() {
        let host: Host = "example.com:smtp".parse().unwrap();
        assert_eq!(host.node(), "example.com");
        assert_eq!(host.service(), "smtp");

        let host: Host = ":http".parse().unwrap();
        assert_eq!(host.node(), "");
        assert_eq!(host.service(), "http");
    }

    #[test]
    fn test_bracketed_ipv6() {
        let host: Host = "[::1]:80".parse().unwrap();
        assert_eq!(host.node(), "::1");
        assert_eq!(host.service(), "80");
        assert_eq!(host.to_string(), "[::1]:80");
    }

    #[test]
    fn test_bare_ipv6_is_node_only() {
        let host: Host = "::1".parse().unwrap();
        assert_eq!(host.node(), "::1");
        assert_eq!(host.service(), "");
    }

    #[test]
    fn test_port_derivation() {
        assert_eq!(Host::new("a", "8080").port().unwrap(), 8080);
        assert_eq!(Host::new("a", "http").port().unwrap(), 80);
        assert_eq!(Host::new("a", "smtp").port().unwrap(), 25);
        assert_eq!(Host::node_only("a").port().unwrap(), 0);
        assert!(Host::new("a", "nonsense-svc").port().is_err());
    }

    #[test]
    fn test_structural_equality() {
        let a: Host = "localhost:80".parse().unwrap();
        let b = Host::new("localhost", "80");
        assert_eq!(a, b);
        assert_ne!(a, Host::new("localhost", "81"));
    }
}
