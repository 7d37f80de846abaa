//! HTTP/0.9, 1.0, and 1.1 protocol binding.
//!
//! Line-oriented parsing over a buffered [`Connection`]: a request or
//! status line, a header block, and a body framed by `Content-Length`,
//! chunked coding, HEAD semantics, or connection close. HTTP/0.9 is the
//! degenerate two-token form with no headers and a body-only response.
//!
//! [`Connection`]: crate::socket::Connection

pub mod chunked;
mod headers;
mod protocol;
mod request;
mod response;

pub use headers::Headers;
pub use protocol::Http;
pub use request::Request;
pub use response::Response;

use crate::base::NetError;
use std::fmt;

/// HTTP protocol version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Version {
    /// The pre-header form: two-token request line, body-only response.
    H09,
    H10,
    H11,
}

impl Version {
    /// The version token as it appears on the wire. HTTP/0.9 has no
    /// token; it is identified by the two-token request line.
    pub fn token(self) -> &'static str {
        match self {
            Version::H09 => "HTTP/0.9",
            Version::H10 => "HTTP/1.0",
            Version::H11 => "HTTP/1.1",
        }
    }

    pub(crate) fn parse(token: &str) -> Result<Self, NetError> {
        match token {
            "HTTP/1.0" => Ok(Version::H10),
            "HTTP/1.1" => Ok(Version::H11),
            _ => Err(NetError::BadStartLine),
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}
