//! Protocol-generic blocking client.
//!
//! A [`Client`] resolves a [`Host`], connects to the first reachable
//! candidate, and exchanges requests and responses through the same
//! [`Protocol`] binding the server side uses. Connection failures are
//! hard, typed errors, unlike resolution, which soft-fails to an empty
//! candidate list and surfaces here as [`NetError::ConnectionFailed`].

use crate::base::{Host, NetError};
use crate::dns::{ResolveFlags, Resolver};
use crate::server::Protocol;
use crate::socket::{Connection, Socket, SocketConfig, DEFAULT_BUFFER_CAPACITY};
use std::time::Duration;

/// Builder for a [`Client`].
pub struct ClientBuilder<P: Protocol> {
    protocol: P,
    connect_timeout: Duration,
    recv_timeout: Duration,
    send_timeout: Duration,
    resolve_timeout: Duration,
    buffer_capacity: usize,
}

impl<P: Protocol> ClientBuilder<P> {
    pub fn new(protocol: P) -> Self {
        Self {
            protocol,
            connect_timeout: Duration::from_secs(10),
            recv_timeout: Duration::from_secs(30),
            send_timeout: Duration::from_secs(30),
            resolve_timeout: Duration::from_secs(5),
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
        }
    }

    /// Bound on establishing the TCP connection, per candidate.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Bound on waiting for response bytes.
    pub fn recv_timeout(mut self, timeout: Duration) -> Self {
        self.recv_timeout = timeout;
        self
    }

    /// Bound on writing one request.
    pub fn send_timeout(mut self, timeout: Duration) -> Self {
        self.send_timeout = timeout;
        self
    }

    /// Bound on resolving the target host.
    pub fn resolve_timeout(mut self, timeout: Duration) -> Self {
        self.resolve_timeout = timeout;
        self
    }

    /// Connection buffer capacity (and line-length cap).
    pub fn buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = capacity;
        self
    }

    pub fn build(self) -> Client<P> {
        Client {
            protocol: self.protocol,
            resolver: Resolver::new(),
            conn: None,
            connect_timeout: self.connect_timeout,
            recv_timeout: self.recv_timeout,
            send_timeout: self.send_timeout,
            resolve_timeout: self.resolve_timeout,
            buffer_capacity: self.buffer_capacity,
        }
    }
}

/// A blocking client for one protocol binding.
pub struct Client<P: Protocol> {
    protocol: P,
    resolver: Resolver,
    conn: Option<Connection>,
    connect_timeout: Duration,
    recv_timeout: Duration,
    send_timeout: Duration,
    resolve_timeout: Duration,
    buffer_capacity: usize,
}

impl<P: Protocol> Client<P> {
    /// Starts a builder around a protocol binding.
    pub fn builder(protocol: P) -> ClientBuilder<P> {
        ClientBuilder::new(protocol)
    }

    /// A client with default timeouts.
    pub fn new(protocol: P) -> Self {
        ClientBuilder::new(protocol).build()
    }

    /// Resolves `host` and connects to the first reachable candidate,
    /// in resolver order.
    ///
    /// An unresolvable host or an exhausted candidate list is
    /// [`NetError::ConnectionFailed`]; per-candidate failures surface
    /// as the last candidate's typed error.
    pub fn connect(&mut self, host: &Host) -> Result<(), NetError> {
        self.shutdown();

        let candidates =
            self.resolver
                .resolve_host(host, ResolveFlags::NONE, self.resolve_timeout);
        if candidates.is_empty() {
            tracing::debug!(host = %host, "no address candidates");
            return Err(NetError::ConnectionFailed);
        }

        let mut last_err = NetError::ConnectionFailed;
        for candidate in &candidates {
            let socket = match Socket::new(SocketConfig::tcp(candidate.family())) {
                Ok(socket) => socket,
                Err(e) => {
                    last_err = e;
                    continue;
                }
            };
            match socket.connect(candidate.addr(), Some(self.connect_timeout)) {
                Ok(()) => {
                    tracing::debug!(host = %host, addr = ?candidate.addr().as_socket(), "connected");
                    let mut conn = Connection::with_capacity(socket, self.buffer_capacity);
                    conn.set_recv_timeout(Some(self.recv_timeout))?;
                    conn.set_send_timeout(Some(self.send_timeout))?;
                    self.conn = Some(conn);
                    return Ok(());
                }
                Err(e) => {
                    tracing::debug!(addr = ?candidate.addr().as_socket(), error = %e, "candidate failed");
                    last_err = e;
                }
            }
        }
        Err(last_err)
    }

    /// True while a live connection is held.
    pub fn is_connected(&self) -> bool {
        self.conn.as_ref().is_some_and(|c| c.is_open())
    }

    /// Serializes one request onto the connection.
    pub fn send(&mut self, request: &P::Request) -> Result<(), NetError> {
        let conn = self.conn.as_mut().ok_or(NetError::NotConnected)?;
        self.protocol.write_request(conn, request)
    }

    /// Reads one response with no request context (a greeting, or a
    /// protocol whose framing never depends on the request).
    pub fn recv_response(&mut self) -> Result<P::Response, NetError> {
        let conn = self.conn.as_mut().ok_or(NetError::NotConnected)?;
        self.protocol.read_response(conn, None)
    }

    /// Reads one response framed in the context of `request`
    /// (HTTP/0.9 and HEAD need this).
    pub fn recv_response_for(&mut self, request: &P::Request) -> Result<P::Response, NetError> {
        let conn = self.conn.as_mut().ok_or(NetError::NotConnected)?;
        self.protocol.read_response(conn, Some(request))
    }

    /// One full request/response round trip.
    pub fn exchange(&mut self, request: &P::Request) -> Result<P::Response, NetError> {
        self.send(request)?;
        self.recv_response_for(request)
    }

    /// Drops the connection. Idempotent; further I/O reports
    /// [`NetError::NotConnected`] until the next [`connect`](Self::connect).
    pub fn shutdown(&mut self) {
        if let Some(mut conn) = self.conn.take() {
            conn.close();
        }
    }
}

impl<P: Protocol> Drop for Client<P> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
