//! The [`Protocol`] binding wiring HTTP into the server and client.

use crate::base::NetError;
use crate::http::{Request, Response, Version};
use crate::server::Protocol;
use crate::socket::Connection;

/// HTTP binding for [`Server`](crate::server::Server) and
/// [`Client`](crate::client::Client).
#[derive(Debug, Clone, Copy, Default)]
pub struct Http;

impl Protocol for Http {
    type Request = Request;
    type Response = Response;

    fn read_request(&self, conn: &mut Connection) -> Result<Option<Request>, NetError> {
        Request::recv_with(conn)
    }

    fn write_response(&self, conn: &mut Connection, response: &Response) -> Result<(), NetError> {
        response.send_with(conn)
    }

    fn write_request(&self, conn: &mut Connection, request: &Request) -> Result<(), NetError> {
        request.send_with(conn)
    }

    fn read_response(
        &self,
        conn: &mut Connection,
        request: Option<&Request>,
    ) -> Result<Response, NetError> {
        Response::recv_with(conn, request)
    }

    /// Unmatched requests draw a 404 with an explicit zero-length body.
    fn fallback(&self, request: &Request) -> Response {
        let mut response = Response::new(404).with_header("Content-Length", "0");
        if request.version == Version::H09 {
            response = response.with_version(Version::H09);
        } else {
            response = response.with_version(request.version.max(Version::H10));
        }
        response
    }

    fn parse_error_response(&self, _error: &NetError) -> Option<Response> {
        Some(Response::new(400).with_header("Content-Length", "0"))
    }

    /// HTTP/0.9 always closes; otherwise `Connection: close` on either
    /// side closes, and HTTP/1.0 closes unless keep-alive was asked for.
    fn wants_close(&self, request: &Request, response: &Response) -> bool {
        if request.version == Version::H09 {
            return true;
        }
        let says_close = |value: Option<&str>| {
            value.is_some_and(|v| v.trim().eq_ignore_ascii_case("close"))
        };
        if says_close(request.headers.connection()) || says_close(response.headers.connection()) {
            return true;
        }
        if request.version == Version::H10 {
            return !request
                .headers
                .connection()
                .is_some_and(|v| v.trim().eq_ignore_ascii_case("keep-alive"));
        }
        false
    }
}
