//! HTTP request parsing and serialization.

use crate::base::NetError;
use crate::http::{chunked, Headers, Version};
use crate::socket::Connection;
use bytes::Bytes;

/// One HTTP request.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: String,
    pub target: String,
    pub version: Version,
    pub headers: Headers,
    pub body: Bytes,
}

impl Request {
    pub fn new(method: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            target: target.into(),
            version: Version::H11,
            headers: Headers::new(),
            body: Bytes::new(),
        }
    }

    /// A GET request for `target`.
    pub fn get(target: impl Into<String>) -> Self {
        Self::new("GET", target)
    }

    pub fn with_version(mut self, version: Version) -> Self {
        self.version = version;
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Reads and parses one request off the connection.
    ///
    /// `Ok(None)` means the peer closed before a request line started.
    /// Blank lines ahead of the request line are tolerated. A two-token
    /// request line is HTTP/0.9: no headers, no body.
    pub fn recv_with(conn: &mut Connection) -> Result<Option<Self>, NetError> {
        let line = loop {
            match conn.read_line()? {
                None => return Ok(None),
                Some(line) if line.is_empty() => continue,
                Some(line) => break line,
            }
        };

        let mut tokens = line.split_whitespace();
        let (method, target, version) = match (tokens.next(), tokens.next(), tokens.next()) {
            (Some(method), Some(target), None) => (method, target, Version::H09),
            (Some(method), Some(target), Some(token)) if tokens.next().is_none() => {
                (method, target, Version::parse(token)?)
            }
            _ => return Err(NetError::BadStartLine),
        };
        let mut request = Request::new(method, target).with_version(version);

        if version == Version::H09 {
            return Ok(Some(request));
        }

        loop {
            match conn.read_line()? {
                Some(line) if line.is_empty() => break,
                Some(line) => {
                    let (name, value) = line.split_once(':').ok_or(NetError::BadHeaderLine)?;
                    if name.is_empty() || name.contains(' ') {
                        return Err(NetError::BadHeaderLine);
                    }
                    request.headers.insert(name, value.trim());
                }
                None => return Err(NetError::BadHeaderLine),
            }
        }

        if request.headers.is_chunked() {
            request.body = chunked::decode_from(conn)?.into();
        } else if let Some(length) = request.headers.content_length() {
            request.body = conn.read_exact_buffered(length)?.into();
        }

        Ok(Some(request))
    }

    /// Serializes this request onto the connection.
    ///
    /// HTTP/0.9 emits only the two-token request line. Otherwise a
    /// `Content-Length` is added at serialization time when the body is
    /// non-empty and neither framing header is present.
    pub fn send_with(&self, conn: &mut Connection) -> Result<(), NetError> {
        if self.version == Version::H09 {
            let line = format!("{} {}\r\n", self.method, self.target);
            return conn.send(line.as_bytes());
        }

        let mut headers = self.headers.clone();
        let chunked = headers.is_chunked();
        if !chunked && headers.content_length().is_none() && !self.body.is_empty() {
            headers.set_content_length(self.body.len());
        }

        let mut wire = format!(
            "{} {} {}\r\n{}\r\n",
            self.method, self.target, self.version, headers
        )
        .into_bytes();
        if chunked {
            wire.extend_from_slice(&chunked::encode(&self.body));
        } else {
            wire.extend_from_slice(&self.body);
        }
        conn.send(&wire)
    }
}
