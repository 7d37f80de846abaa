//! The protocol seam between transport and application.
//!
//! A [`Protocol`] supplies the request/response types and the
//! per-protocol wire behavior that the shared Server/Worker/Client
//! skeleton drives: how one request is parsed off a connection, how a
//! response is serialized, what to answer when nothing matches, and
//! when the connection must close. HTTP and SMTP are the two bindings
//! in this crate.

use crate::base::NetError;
use crate::socket::Connection;

/// One application protocol's request/response binding.
pub trait Protocol: Send + Sync + 'static {
    type Request: Send + 'static;
    type Response: Send + 'static;

    /// Response emitted immediately on accept, before any request is
    /// read (SMTP's SERVICE_READY). `None` for protocols where the
    /// client speaks first.
    fn greeting(&self) -> Option<Self::Response> {
        None
    }

    /// Reads and parses one request off the connection.
    ///
    /// `Ok(None)` means the peer closed cleanly before a request
    /// started; parse failures and I/O errors are typed errors.
    fn read_request(&self, conn: &mut Connection) -> Result<Option<Self::Request>, NetError>;

    /// Serializes one response onto the connection.
    fn write_response(
        &self,
        conn: &mut Connection,
        response: &Self::Response,
    ) -> Result<(), NetError>;

    /// Serializes one request onto the connection (client side).
    fn write_request(&self, conn: &mut Connection, request: &Self::Request)
        -> Result<(), NetError>;

    /// Reads one response off the connection (client side).
    ///
    /// `request` provides framing context where the response's shape
    /// depends on what was asked (HTTP/0.9, HEAD); `None` when reading
    /// an unsolicited response such as a greeting.
    fn read_response(
        &self,
        conn: &mut Connection,
        request: Option<&Self::Request>,
    ) -> Result<Self::Response, NetError>;

    /// Built-in draft response when no match rule fires
    /// (HTTP NOT_FOUND, SMTP command-not-implemented).
    fn fallback(&self, request: &Self::Request) -> Self::Response;

    /// Response sent for a malformed request before closing, if the
    /// protocol defines one (HTTP 400-class).
    fn parse_error_response(&self, _error: &NetError) -> Option<Self::Response> {
        None
    }

    /// Whether the connection must close after this exchange.
    fn wants_close(&self, _request: &Self::Request, _response: &Self::Response) -> bool {
        false
    }
}

/// A predicate/handler pair mapping a parsed request to a draft
/// response.
///
/// Rules are registered on the server at construction time and walked
/// in order; the first whose predicate accepts the request produces
/// the response.
pub struct MatchRule<P: Protocol> {
    predicate: Box<dyn Fn(&P::Request) -> bool + Send + Sync>,
    handler: Box<dyn Fn(&P::Request) -> P::Response + Send + Sync>,
}

impl<P: Protocol> MatchRule<P> {
    /// Creates a rule from a predicate and a handler.
    pub fn new<F, H>(predicate: F, handler: H) -> Self
    where
        F: Fn(&P::Request) -> bool + Send + Sync + 'static,
        H: Fn(&P::Request) -> P::Response + Send + Sync + 'static,
    {
        Self {
            predicate: Box::new(predicate),
            handler: Box::new(handler),
        }
    }

    pub(crate) fn matches(&self, request: &P::Request) -> bool {
        (self.predicate)(request)
    }

    pub(crate) fn respond(&self, request: &P::Request) -> P::Response {
        (self.handler)(request)
    }
}
