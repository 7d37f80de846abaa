use std::io;
use std::sync::Arc;
use thiserror::Error;

/// Network error taxonomy.
///
/// One flat enum covering every failure class in the crate:
/// connection errors (fatal to that connection only), timeout errors
/// (fatal to the current operation), protocol parse errors, socket
/// setup errors, and thread-pool exhaustion.
///
/// Two non-errors by policy: EOF on a `recv` returns `Ok(0)`, and a
/// resolver lookup that finds nothing returns an empty vector.
#[derive(Debug, Error, Clone)]
pub enum NetError {
    // Connection errors
    #[error("Connection reset (TCP RST)")]
    ConnectionReset,
    #[error("Connection refused")]
    ConnectionRefused,
    #[error("Connection aborted")]
    ConnectionAborted,
    #[error("Broken pipe")]
    BrokenPipe,
    #[error("Socket not connected")]
    NotConnected,
    #[error("Address in use")]
    AddressInUse,
    #[error("Server already listening")]
    AlreadyListening,
    #[error("Connection failed")]
    ConnectionFailed,

    // Timeout errors
    #[error("Read timed out")]
    ReadTimeout,
    #[error("Write timed out")]
    WriteTimeout,
    #[error("Connect timed out")]
    ConnectTimeout,

    // Socket setup errors
    #[error("Socket creation failed: {source}")]
    SocketCreation { source: Arc<io::Error> },
    #[error("Socket option {option} failed: {source}")]
    SocketOption {
        option: &'static str,
        source: Arc<io::Error>,
    },
    #[error("Invalid host: {0}")]
    InvalidHost(String),

    // Protocol parse errors
    #[error("Malformed start line")]
    BadStartLine,
    #[error("Malformed header line")]
    BadHeaderLine,
    #[error("Malformed status line")]
    BadStatusLine,
    #[error("Line exceeds length cap")]
    LineTooLong,
    #[error("Invalid chunked encoding")]
    BadChunk,
    #[error("Content-Length mismatch")]
    ContentLengthMismatch,

    // Resource exhaustion
    #[error("Worker thread spawn failed: {source}")]
    ThreadSpawn { source: Arc<io::Error> },

    #[error("I/O error: {0}")]
    Io(Arc<io::Error>),
}

impl NetError {
    /// Classifies an I/O error raised by a blocking read.
    ///
    /// `WouldBlock` and `TimedOut` both mean the socket read timeout
    /// elapsed (platforms disagree on which kind a timed-out `recv`
    /// reports).
    pub fn from_read_io(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => NetError::ReadTimeout,
            _ => Self::classify(err),
        }
    }

    /// Classifies an I/O error raised by a blocking write.
    pub fn from_write_io(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => NetError::WriteTimeout,
            _ => Self::classify(err),
        }
    }

    /// Classifies an I/O error raised while connecting.
    pub fn from_connect_io(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => NetError::ConnectTimeout,
            _ => Self::classify(err),
        }
    }

    fn classify(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::ConnectionReset => NetError::ConnectionReset,
            io::ErrorKind::ConnectionRefused => NetError::ConnectionRefused,
            io::ErrorKind::ConnectionAborted => NetError::ConnectionAborted,
            io::ErrorKind::BrokenPipe => NetError::BrokenPipe,
            io::ErrorKind::NotConnected => NetError::NotConnected,
            io::ErrorKind::AddrInUse => NetError::AddressInUse,
            _ => NetError::Io(Arc::new(err)),
        }
    }

    /// True for the timeout class (read, write, connect).
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            NetError::ReadTimeout | NetError::WriteTimeout | NetError::ConnectTimeout
        )
    }

    /// True for errors fatal to the connection they occurred on.
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            NetError::ConnectionReset
                | NetError::ConnectionRefused
                | NetError::ConnectionAborted
                | NetError::BrokenPipe
                | NetError::NotConnected
                | NetError::ConnectionFailed
        )
    }

    /// True for protocol parse errors, which warrant a protocol-level
    /// error response before closing.
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            NetError::BadStartLine
                | NetError::BadHeaderLine
                | NetError::BadStatusLine
                | NetError::LineTooLong
                | NetError::BadChunk
                | NetError::ContentLengthMismatch
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_timeout_classification() {
        let err = io::Error::new(io::ErrorKind::WouldBlock, "timed out");
        assert!(matches!(NetError::from_read_io(err), NetError::ReadTimeout));

        let err = io::Error::new(io::ErrorKind::TimedOut, "timed out");
        assert!(matches!(NetError::from_read_io(err), NetError::ReadTimeout));
    }

    #[test]
    fn test_write_timeout_classification() {
        let err = io::Error::new(io::ErrorKind::TimedOut, "timed out");
        assert!(matches!(
            NetError::from_write_io(err),
            NetError::WriteTimeout
        ));
    }

    #[test]
    fn test_connection_classification() {
        let err = io::Error::new(io::ErrorKind::ConnectionReset, "reset");
        let net = NetError::from_read_io(err);
        assert!(matches!(net, NetError::ConnectionReset));
        assert!(net.is_connection_error());
        assert!(!net.is_timeout());
    }

    #[test]
    fn test_parse_error_class() {
        assert!(NetError::BadChunk.is_parse_error());
        assert!(NetError::LineTooLong.is_parse_error());
        assert!(!NetError::ReadTimeout.is_parse_error());
    }
}
