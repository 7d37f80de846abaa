//! Per-connection protocol-driving state machine.
//!
//! One [`Worker`] is created for each accepted connection and runs the
//! fixed pipeline: optional greeting, then stream-in (parse one
//! request, bounded by the read idle timeout) → match (ordered rules,
//! first match wins, protocol fallback otherwise) → stream-out
//! (serialize, bounded by the write idle timeout), repeated until the
//! peer closes, the protocol mandates closure, a timeout fires, or the
//! server shuts down. Failures terminate this worker only; they never
//! cross to other connections.

use crate::server::protocol::Protocol;
use crate::server::ServerShared;
use crate::socket::Connection;
use std::sync::atomic::Ordering;
use std::sync::Arc;

pub(crate) struct Worker<P: Protocol> {
    id: u64,
    conn: Connection,
    shared: Arc<ServerShared<P>>,
}

impl<P: Protocol> Worker<P> {
    pub(crate) fn new(id: u64, conn: Connection, shared: Arc<ServerShared<P>>) -> Self {
        Self { id, conn, shared }
    }

    pub(crate) fn run(mut self) {
        tracing::debug!(worker = self.id, "connection accepted");
        self.drive();
        self.conn.close();
        self.shared.registry.remove(&self.id);
        tracing::debug!(worker = self.id, "connection closed");
    }

    fn drive(&mut self) {
        let shared = Arc::clone(&self.shared);
        let protocol = &shared.protocol;

        if self
            .conn
            .set_recv_timeout(Some(shared.config.read_idle_timeout))
            .and_then(|_| {
                self.conn
                    .set_send_timeout(Some(shared.config.write_idle_timeout))
            })
            .is_err()
        {
            return;
        }

        if let Some(setup) = shared.worker_setup.as_ref() {
            setup(&mut self.conn);
        }

        if let Some(greeting) = protocol.greeting() {
            if let Err(e) = protocol.write_response(&mut self.conn, &greeting) {
                tracing::debug!(worker = self.id, error = %e, "greeting failed");
                return;
            }
        }

        loop {
            if shared.shutdown.load(Ordering::SeqCst) {
                return;
            }

            let request = match protocol.read_request(&mut self.conn) {
                Ok(Some(request)) => request,
                Ok(None) => return, // peer closed between requests
                Err(e) if e.is_parse_error() => {
                    tracing::debug!(worker = self.id, error = %e, "malformed request");
                    if let Some(response) = protocol.parse_error_response(&e) {
                        let _ = protocol.write_response(&mut self.conn, &response);
                    }
                    return;
                }
                Err(e) => {
                    if e.is_timeout() {
                        tracing::debug!(worker = self.id, "idle timeout, closing");
                    } else {
                        tracing::debug!(worker = self.id, error = %e, "read failed");
                    }
                    return;
                }
            };

            let response = shared
                .rules
                .iter()
                .find(|rule| rule.matches(&request))
                .map(|rule| rule.respond(&request))
                .unwrap_or_else(|| protocol.fallback(&request));

            if let Err(e) = protocol.write_response(&mut self.conn, &response) {
                tracing::debug!(worker = self.id, error = %e, "write failed");
                return;
            }

            if protocol.wants_close(&request, &response) {
                return;
            }
        }
    }
}
