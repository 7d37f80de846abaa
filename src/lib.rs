//! # forgenet
//!
//! A composable blocking-socket framework for Rust.
//!
//! `forgenet` builds protocol servers and clients out of small,
//! independently testable layers: capability-described sockets,
//! buffered timeout-aware connections, background-thread DNS/MX
//! resolution, a dynamically sized thread pool, and a generic
//! server/worker/client skeleton that protocol bindings (HTTP, SMTP)
//! plug into.
//!
//! ## Features
//!
//! - **Composable Sockets**: family/type/transport/options described up
//!   front, applied in order at creation
//! - **Buffered Connections**: replay-buffered reads, independent send
//!   and receive timeouts, typed timeout errors
//! - **Bounded Resolution**: `getaddrinfo` and MX lookups on background
//!   threads, soft-failing to empty within a caller-set bound
//! - **Generic Serving**: one worker per connection, ordered match
//!   rules, protocol fallback, external interrupt for shutdown
//! - **HTTP & SMTP**: HTTP/0.9 through 1.1 with chunked coding; SMTP
//!   command/reply with server-first greeting
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use forgenet::http::{Http, Response};
//! use forgenet::server::Server;
//!
//! let mut server = Server::builder(Http)
//!     .rule(
//!         |req| req.target == "/hello",
//!         |_| Response::ok(&b"hi there"[..]),
//!     )
//!     .build();
//! server.serve(&"localhost:0".into()).unwrap();
//! println!("listening on {:?}", server.local_addr());
//! ```
//!
//! ## Modules
//!
//! - [`base`] - Host naming, error definitions, global init
//! - [`socket`] - Capability-described sockets and buffered connections
//! - [`dns`] - Background-thread address and MX resolution
//! - [`pool`] - Dynamically sized blocking thread pool
//! - [`server`] - Generic server, workers, match rules, protocol seam
//! - [`client`] - Protocol-generic blocking client
//! - [`http`] - HTTP/0.9, 1.0, 1.1 binding
//! - [`smtp`] - SMTP command/reply binding

pub mod base;
pub mod client;
pub mod dns;
pub mod http;
pub mod pool;
pub mod server;
pub mod smtp;
pub mod socket;

pub use base::{Host, NetError};
