//! Socket capability composition and connections.
//!
//! - [`config`]: the fixed capability tuple (family, type, transport,
//!   options) a socket is constructed from
//! - [`socket`]: the move-only OS handle owner and its shutdown-only
//!   [`Interrupter`]
//! - [`connection`]: buffered, timeout-aware byte I/O

pub mod config;
pub mod connection;
pub mod socket;

pub use config::{Family, SocketConfig, SocketOption, SocketType, Transport};
pub use connection::{Connection, DEFAULT_BUFFER_CAPACITY};
pub use socket::{Interrupter, Socket};

#[cfg(test)]
pub(crate) mod test_support {
    //! Loopback plumbing shared by unit tests across the crate.

    use super::{Connection, Family, Socket, SocketConfig, DEFAULT_BUFFER_CAPACITY};
    use socket2::SockAddr;
    use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
    use std::thread;
    use std::time::Duration;

    /// Builds a connected (client, server) pair over loopback.
    pub(crate) fn connected_pair() -> (Connection, Connection) {
        connected_pair_with_capacity(DEFAULT_BUFFER_CAPACITY)
    }

    pub(crate) fn connected_pair_with_capacity(capacity: usize) -> (Connection, Connection) {
        let listener = Socket::new(SocketConfig::tcp(Family::Inet)).unwrap();
        listener
            .bind(&SockAddr::from(SocketAddr::V4(SocketAddrV4::new(
                Ipv4Addr::LOCALHOST,
                0,
            ))))
            .unwrap();
        listener.listen(1).unwrap();
        let addr = listener.local_addr().unwrap();

        let accept = thread::spawn(move || listener.accept().unwrap().0);
        let client = Socket::new(SocketConfig::tcp(Family::Inet)).unwrap();
        client
            .connect(&addr, Some(Duration::from_secs(1)))
            .unwrap();
        let server = accept.join().unwrap();
        (
            Connection::with_capacity(client, capacity),
            Connection::with_capacity(server, capacity),
        )
    }
}
