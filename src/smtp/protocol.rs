//! The [`Protocol`] binding wiring SMTP into the server and client.

use crate::base::NetError;
use crate::server::Protocol;
use crate::smtp::{Command, Request, Response, Status};
use crate::socket::Connection;

/// SMTP binding for [`Server`](crate::server::Server) and
/// [`Client`](crate::client::Client).
#[derive(Debug, Clone, Copy, Default)]
pub struct Smtp;

impl Protocol for Smtp {
    type Request = Request;
    type Response = Response;

    /// SMTP is server-first: 220 before the client says anything.
    fn greeting(&self) -> Option<Response> {
        Some(Response::new(Status::ServiceReady))
    }

    fn read_request(&self, conn: &mut Connection) -> Result<Option<Request>, NetError> {
        let line = match conn.read_line()? {
            Some(line) => line,
            None => return Ok(None),
        };
        let line = line.trim();
        if line.is_empty() {
            return Err(NetError::BadStartLine);
        }
        let (verb, argument) = match line.split_once(' ') {
            Some((verb, argument)) => (verb, argument.trim()),
            None => (line, ""),
        };
        Ok(Some(
            Request::new(Command::parse(verb)).with_argument(argument),
        ))
    }

    fn write_response(&self, conn: &mut Connection, response: &Response) -> Result<(), NetError> {
        let line = format!("{} {}\r\n", response.status.code(), response.message);
        conn.send(line.as_bytes())
    }

    fn write_request(&self, conn: &mut Connection, request: &Request) -> Result<(), NetError> {
        let line = if request.argument.is_empty() {
            format!("{}\r\n", request.command)
        } else {
            format!("{} {}\r\n", request.command, request.argument)
        };
        conn.send(line.as_bytes())
    }

    fn read_response(
        &self,
        conn: &mut Connection,
        _request: Option<&Request>,
    ) -> Result<Response, NetError> {
        let line = conn.read_line()?.ok_or(NetError::BadStatusLine)?;
        let (code, message) = match line.split_once(' ') {
            Some((code, message)) => (code, message),
            None => (line.as_str(), ""),
        };
        let code: u16 = code.parse().map_err(|_| NetError::BadStatusLine)?;
        Ok(Response::new(Status::from_code(code)).with_message(message))
    }

    /// QUIT always gets its closing reply; anything else unmatched is
    /// 502.
    fn fallback(&self, request: &Request) -> Response {
        if request.command == Command::Quit {
            Response::new(Status::ServiceClosing)
        } else {
            Response::new(Status::CommandNotImplemented)
        }
    }

    fn parse_error_response(&self, _error: &NetError) -> Option<Response> {
        Some(Response::new(Status::SyntaxError))
    }

    fn wants_close(&self, request: &Request, response: &Response) -> bool {
        request.command == Command::Quit || response.status == Status::ServiceClosing
    }
}
