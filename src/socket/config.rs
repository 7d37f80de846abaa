//! Socket capability configuration.
//!
//! A socket's capability set (address family, socket type, transport
//! protocol, and named options) is fixed at construction time and
//! described by an explicit [`SocketConfig`] value rather than by type
//! composition. Options are applied as a deterministic sequence right
//! after the OS socket is created; the first failing option aborts
//! construction with an error naming it.

use socket2::{Domain, Protocol, Type};

/// Address family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    Inet,
    Inet6,
}

impl Family {
    pub(crate) fn domain(self) -> Domain {
        match self {
            Family::Inet => Domain::IPV4,
            Family::Inet6 => Domain::IPV6,
        }
    }
}

/// Socket type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SocketType {
    Stream,
    Dgram,
}

impl SocketType {
    pub(crate) fn raw(self) -> Type {
        match self {
            SocketType::Stream => Type::STREAM,
            SocketType::Dgram => Type::DGRAM,
        }
    }
}

/// Transport protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transport {
    Tcp,
    Udp,
}

impl Transport {
    pub(crate) fn protocol(self) -> Protocol {
        match self {
            Transport::Tcp => Protocol::TCP,
            Transport::Udp => Protocol::UDP,
        }
    }
}

/// Named socket option toggle, applied at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SocketOption {
    /// Accept both IPv4 and IPv6 on one IPv6 listening socket
    /// (clears `IPV6_V6ONLY`).
    DualStack,
    /// Close does not wait to flush (`SO_LINGER` with a zero timeout).
    NoLinger,
    /// Allow rebinding a recently used local address (`SO_REUSEADDR`).
    ReuseAddr,
}

impl SocketOption {
    /// Option name, used in error reporting.
    pub fn name(self) -> &'static str {
        match self {
            SocketOption::DualStack => "DUAL_STACK",
            SocketOption::NoLinger => "NO_LINGER",
            SocketOption::ReuseAddr => "REUSE_ADDR",
        }
    }
}

/// Fixed capability tuple for one socket.
///
/// Once a [`Socket`](crate::socket::Socket) is created from a config,
/// its capability set never changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocketConfig {
    pub family: Family,
    pub socket_type: SocketType,
    pub transport: Transport,
    pub options: Vec<SocketOption>,
}

impl SocketConfig {
    /// A stream/TCP config for the given family, no options.
    pub fn tcp(family: Family) -> Self {
        Self {
            family,
            socket_type: SocketType::Stream,
            transport: Transport::Tcp,
            options: Vec::new(),
        }
    }

    /// A datagram/UDP config for the given family, no options.
    pub fn udp(family: Family) -> Self {
        Self {
            family,
            socket_type: SocketType::Dgram,
            transport: Transport::Udp,
            options: Vec::new(),
        }
    }

    /// Appends an option; options apply in the order added.
    pub fn with_option(mut self, option: SocketOption) -> Self {
        self.options.push(option);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tcp_config_shape() {
        let config = SocketConfig::tcp(Family::Inet6)
            .with_option(SocketOption::DualStack)
            .with_option(SocketOption::ReuseAddr);
        assert_eq!(config.family, Family::Inet6);
        assert_eq!(config.socket_type, SocketType::Stream);
        assert_eq!(config.transport, Transport::Tcp);
        assert_eq!(
            config.options,
            vec![SocketOption::DualStack, SocketOption::ReuseAddr]
        );
    }

    #[test]
    fn test_option_names() {
        assert_eq!(SocketOption::DualStack.name(), "DUAL_STACK");
        assert_eq!(SocketOption::NoLinger.name(), "NO_LINGER");
    }
}
