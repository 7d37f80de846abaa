//! HTTP response parsing and serialization.

use crate::base::NetError;
use crate::http::{chunked, Headers, Request, Version};
use crate::socket::Connection;
use bytes::Bytes;

/// One HTTP response.
#[derive(Debug, Clone)]
pub struct Response {
    pub version: Version,
    pub status: u16,
    pub reason: String,
    pub headers: Headers,
    pub body: Bytes,
}

impl Response {
    /// A response with the standard reason phrase for `status`.
    pub fn new(status: u16) -> Self {
        Self {
            version: Version::H11,
            status,
            reason: reason_phrase(status).to_string(),
            headers: Headers::new(),
            body: Bytes::new(),
        }
    }

    /// A 200 response carrying `body`.
    pub fn ok(body: impl Into<Bytes>) -> Self {
        Self::new(200).with_body(body)
    }

    pub fn with_version(mut self, version: Version) -> Self {
        self.version = version;
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Reads and parses one response off the connection.
    ///
    /// `request` supplies framing context: an HTTP/0.9 request means a
    /// body-only response (everything until close), and a HEAD request
    /// means the body is absent regardless of framing headers.
    pub fn recv_with(
        conn: &mut Connection,
        request: Option<&Request>,
    ) -> Result<Self, NetError> {
        if request.is_some_and(|r| r.version == Version::H09) {
            let body = conn.read_to_end_buffered()?;
            return Ok(Response::new(200)
                .with_version(Version::H09)
                .with_body(body));
        }

        let line = conn.read_line()?.ok_or(NetError::BadStatusLine)?;
        let mut parts = line.splitn(3, ' ');
        let version = parts
            .next()
            .ok_or(NetError::BadStatusLine)
            .and_then(|t| Version::parse(t).map_err(|_| NetError::BadStatusLine))?;
        let status: u16 = parts
            .next()
            .and_then(|t| t.parse().ok())
            .ok_or(NetError::BadStatusLine)?;
        let reason = parts.next().unwrap_or("").to_string();

        let mut response = Response {
            version,
            status,
            reason,
            headers: Headers::new(),
            body: Bytes::new(),
        };

        loop {
            match conn.read_line()? {
                Some(line) if line.is_empty() => break,
                Some(line) => {
                    let (name, value) = line.split_once(':').ok_or(NetError::BadHeaderLine)?;
                    if name.is_empty() || name.contains(' ') {
                        return Err(NetError::BadHeaderLine);
                    }
                    response.headers.insert(name, value.trim());
                }
                None => return Err(NetError::BadHeaderLine),
            }
        }

        let head = request.is_some_and(|r| r.method.eq_ignore_ascii_case("HEAD"));
        let bodyless = head || status / 100 == 1 || status == 204 || status == 304;
        if bodyless {
            return Ok(response);
        }

        if response.headers.is_chunked() {
            response.body = chunked::decode_from(conn)?.into();
        } else if let Some(length) = response.headers.content_length() {
            response.body = conn.read_exact_buffered(length)?.into();
        } else {
            // No framing header: the body runs until the peer closes.
            response.body = conn.read_to_end_buffered()?.into();
        }
        Ok(response)
    }

    /// Serializes this response onto the connection.
    ///
    /// HTTP/0.9 emits the body alone. Otherwise a `Content-Length` is
    /// added at serialization time when neither framing header is
    /// present, so keep-alive peers can frame the body.
    pub fn send_with(&self, conn: &mut Connection) -> Result<(), NetError> {
        if self.version == Version::H09 {
            return conn.send(&self.body);
        }

        let mut headers = self.headers.clone();
        let chunked = headers.is_chunked();
        if !chunked && headers.content_length().is_none() {
            headers.set_content_length(self.body.len());
        }

        let mut wire = format!(
            "{} {} {}\r\n{}\r\n",
            self.version, self.status, self.reason, headers
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

/// Standard reason phrase for a status code; empty when unassigned.
pub fn reason_phrase(status: u16) -> &'static str {
    match status {
        100 => "Continue",
        101 => "Switching Protocols",
        200 => "OK",
        201 => "Created",
        202 => "Accepted",
        204 => "No Content",
        301 => "Moved Permanently",
        302 => "Found",
        304 => "Not Modified",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        408 => "Request Timeout",
        411 => "Length Required",
        413 => "Content Too Large",
        500 => "Internal Server Error",
        501 => "Not Implemented",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        505 => "HTTP Version Not Supported",
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::socket::test_support::connected_pair;

    #[test]
    fn test_parse_simple_response() {
        let (mut a, mut b) = connected_pair();
        a.send(b"HTTP/1.1 200 OK\r\nContent-Length: 5\r\n\r\nhello")
            .unwrap();
        let response = Response::recv_with(&mut b, None).unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.reason, "OK");
        assert_eq!(&response.body[..], b"hello");
    }

    #[test]
    fn test_parse_reason_with_spaces() {
        let (mut a, mut b) = connected_pair();
        a.send(b"HTTP/1.0 404 Not Found\r\nContent-Length: 0\r\n\r\n")
            .unwrap();
        let response = Response::recv_with(&mut b, None).unwrap();
        assert_eq!(response.version, Version::H10);
        assert_eq!(response.reason, "Not Found");
    }

    #[test]
    fn test_parse_chunked_response() {
        let (mut a, mut b) = connected_pair();
        a.send(b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n5\r\nhello\r\n0\r\n\r\n")
            .unwrap();
        let response = Response::recv_with(&mut b, None).unwrap();
        assert_eq!(&response.body[..], b"hello");
    }

    #[test]
    fn test_body_until_close_without_framing() {
        let (mut a, mut b) = connected_pair();
        a.send(b"HTTP/1.0 200 OK\r\n\r\nunframed body").unwrap();
        a.close();
        let response = Response::recv_with(&mut b, None).unwrap();
        assert_eq!(&response.body[..], b"unframed body");
    }

    #[test]
    fn test_head_response_has_no_body() {
        let (mut a, mut b) = connected_pair();
        a.send(b"HTTP/1.1 200 OK\r\nContent-Length: 100\r\n\r\n")
            .unwrap();
        let head = Request::new("HEAD", "/");
        let response = Response::recv_with(&mut b, Some(&head)).unwrap();
        assert!(response.body.is_empty());
        assert_eq!(response.headers.content_length(), Some(100));
    }

    #[test]
    fn test_http09_request_gets_body_only_response() {
        let (mut a, mut b) = connected_pair();
        a.send(b"<html>raw</html>").unwrap();
        a.close();
        let request = Request::get("/").with_version(Version::H09);
        let response = Response::recv_with(&mut b, Some(&request)).unwrap();
        assert_eq!(response.version, Version::H09);
        assert_eq!(&response.body[..], b"<html>raw</html>");
    }

    #[test]
    fn test_malformed_status_line() {
        let (mut a, mut b) = connected_pair();
        a.send(b"NONSENSE\r\n\r\n").unwrap();
        assert!(matches!(
            Response::recv_with(&mut b, None),
            Err(NetError::BadStatusLine)
        ));
    }

    #[test]
    fn test_serialize_adds_content_length() {
        let (mut a, mut b) = connected_pair();
        Response::ok(&b"hi"[..]).send_with(&mut a).unwrap();
        let response = Response::recv_with(&mut b, None).unwrap();
        assert_eq!(response.headers.content_length(), Some(2));
        assert_eq!(&response.body[..], b"hi");
    }

    #[test]
    fn test_reason_phrases() {
        assert_eq!(reason_phrase(200), "OK");
        assert_eq!(reason_phrase(404), "Not Found");
        assert_eq!(reason_phrase(501), "Not Implemented");
        assert_eq!(reason_phrase(599), "");
    }
}
