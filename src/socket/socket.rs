//! Move-only owner of one OS socket handle.
//!
//! A [`Socket`] is created for a fixed [`SocketConfig`] capability set
//! and owns its OS handle uniquely: moving a `Socket` transfers the
//! handle, and there is no way to clone one for I/O. The only shared
//! view is the [`Interrupter`], which can do nothing but shut the
//! socket down from another thread to wake a blocked operation.

use crate::base::{self, NetError};
use crate::socket::config::{Family, SocketConfig, SocketOption, SocketType, Transport};
use socket2::{SockAddr, Socket as RawSocket};
use std::net::Shutdown;
use std::sync::Arc;
use std::time::Duration;

/// An OS socket with a fixed capability set.
///
/// Not `Clone`: ownership of the handle moves, never aliases.
#[derive(Debug)]
pub struct Socket {
    inner: Option<RawSocket>,
    config: SocketConfig,
}

impl Socket {
    /// Creates a socket for the given capability set.
    ///
    /// Fails with [`NetError::SocketCreation`] if the OS rejects the
    /// family/type/protocol combination, or with
    /// [`NetError::SocketOption`] naming the first option the OS
    /// refused. Options are applied in declaration order.
    pub fn new(config: SocketConfig) -> Result<Self, NetError> {
        base::init();
        let raw = RawSocket::new(
            config.family.domain(),
            config.socket_type.raw(),
            Some(config.transport.protocol()),
        )
        .map_err(|e| NetError::SocketCreation {
            source: Arc::new(e),
        })?;

        for option in &config.options {
            apply_option(&raw, *option).map_err(|e| NetError::SocketOption {
                option: option.name(),
                source: Arc::new(e),
            })?;
        }

        Ok(Self {
            inner: Some(raw),
            config,
        })
    }

    fn from_raw(raw: RawSocket, config: SocketConfig) -> Self {
        Self {
            inner: Some(raw),
            config,
        }
    }

    /// The address family this socket was created with.
    pub fn family(&self) -> Family {
        self.config.family
    }

    /// The socket type this socket was created with.
    pub fn socket_type(&self) -> SocketType {
        self.config.socket_type
    }

    /// The transport protocol this socket was created with.
    pub fn transport(&self) -> Transport {
        self.config.transport
    }

    /// True until [`close`](Self::close) (or a move) takes the handle.
    pub fn is_open(&self) -> bool {
        self.inner.is_some()
    }

    pub(crate) fn raw(&self) -> Result<&RawSocket, NetError> {
        self.inner.as_ref().ok_or(NetError::NotConnected)
    }

    /// Binds to a local address.
    pub fn bind(&self, addr: &SockAddr) -> Result<(), NetError> {
        self.raw()?
            .bind(addr)
            .map_err(|e| NetError::from_connect_io(e))
    }

    /// Starts listening with the given backlog.
    pub fn listen(&self, backlog: i32) -> Result<(), NetError> {
        self.raw()?
            .listen(backlog)
            .map_err(|e| NetError::from_connect_io(e))
    }

    /// Accepts one connection; the returned socket inherits this
    /// socket's capability set.
    pub fn accept(&self) -> Result<(Socket, SockAddr), NetError> {
        let (raw, peer) = self.raw()?.accept().map_err(NetError::from_read_io)?;
        Ok((Socket::from_raw(raw, self.config.clone()), peer))
    }

    /// Connects to a remote address, bounded by `timeout` if given.
    pub fn connect(&self, addr: &SockAddr, timeout: Option<Duration>) -> Result<(), NetError> {
        let raw = self.raw()?;
        let result = match timeout {
            Some(t) => raw.connect_timeout(addr, t),
            None => raw.connect(addr),
        };
        result.map_err(NetError::from_connect_io)
    }

    /// The locally bound address (OS-assigned port included).
    pub fn local_addr(&self) -> Result<SockAddr, NetError> {
        self.raw()?
            .local_addr()
            .map_err(|e| NetError::Io(Arc::new(e)))
    }

    /// Shuts down both directions without releasing the handle.
    pub fn shutdown(&self) -> Result<(), NetError> {
        match self.inner.as_ref() {
            Some(raw) => {
                // NotConnected from shutdown just means the peer beat us to it.
                match raw.shutdown(Shutdown::Both) {
                    Ok(()) => Ok(()),
                    Err(e) if e.kind() == std::io::ErrorKind::NotConnected => Ok(()),
                    Err(e) => Err(NetError::Io(Arc::new(e))),
                }
            }
            None => Ok(()),
        }
    }

    /// Releases the handle. Idempotent; a second close is a no-op.
    pub fn close(&mut self) {
        if let Some(raw) = self.inner.take() {
            let _ = raw.shutdown(Shutdown::Both);
            drop(raw);
        }
    }

    /// Creates the external-interrupt handle for this socket.
    ///
    /// The interrupter duplicates the OS handle but can only shut it
    /// down; it exists so another thread (the server's shutdown path)
    /// can wake an operation blocked on this socket.
    pub fn interrupter(&self) -> Result<Interrupter, NetError> {
        let dup = self.raw()?.try_clone().map_err(|e| NetError::Io(Arc::new(e)))?;
        Ok(Interrupter { inner: dup })
    }
}

fn apply_option(raw: &RawSocket, option: SocketOption) -> std::io::Result<()> {
    match option {
        SocketOption::DualStack => raw.set_only_v6(false),
        SocketOption::NoLinger => raw.set_linger(Some(Duration::ZERO)),
        SocketOption::ReuseAddr => raw.set_reuse_address(true),
    }
}

/// Shutdown-only handle to a socket owned by another thread.
///
/// This is the one sanctioned way two threads touch the same socket:
/// the owner blocks in I/O, the interrupter forces a shutdown so the
/// blocked call wakes promptly with a connection error.
#[derive(Debug)]
pub struct Interrupter {
    inner: RawSocket,
}

impl Interrupter {
    /// Forces both directions shut. Errors are ignored: the socket may
    /// already be gone, which is the desired end state anyway.
    pub fn interrupt(&self) {
        let _ = self.inner.shutdown(Shutdown::Both);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

    fn loopback_any() -> SockAddr {
        SockAddr::from(SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, 0)))
    }

    #[test]
    fn test_create_tcp_socket() {
        let socket = Socket::new(SocketConfig::tcp(Family::Inet)).unwrap();
        assert_eq!(socket.family(), Family::Inet);
        assert_eq!(socket.socket_type(), SocketType::Stream);
        assert_eq!(socket.transport(), Transport::Tcp);
        assert!(socket.is_open());
    }

    #[test]
    fn test_options_applied_in_order() {
        let config = SocketConfig::tcp(Family::Inet6)
            .with_option(SocketOption::DualStack)
            .with_option(SocketOption::ReuseAddr)
            .with_option(SocketOption::NoLinger);
        let socket = Socket::new(config).unwrap();
        assert!(socket.is_open());
    }

    #[test]
    fn test_bind_ephemeral_reports_port() {
        let socket = Socket::new(SocketConfig::tcp(Family::Inet)).unwrap();
        socket.bind(&loopback_any()).unwrap();
        socket.listen(4).unwrap();
        let addr = socket.local_addr().unwrap().as_socket().unwrap();
        assert_ne!(addr.port(), 0);
    }

    #[test]
    fn test_close_is_idempotent() {
        let mut socket = Socket::new(SocketConfig::tcp(Family::Inet)).unwrap();
        socket.close();
        assert!(!socket.is_open());
        socket.close();
        assert!(matches!(socket.raw(), Err(NetError::NotConnected)));
    }

    #[test]
    fn test_closed_socket_rejects_operations() {
        let mut socket = Socket::new(SocketConfig::tcp(Family::Inet)).unwrap();
        socket.close();
        assert!(matches!(
            socket.bind(&loopback_any()),
            Err(NetError::NotConnected)
        ));
    }
}
