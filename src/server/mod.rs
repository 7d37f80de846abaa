//! Connection-oriented server with per-connection workers.
//!
//! A [`Server`] binds and listens on a [`Host`], accepts in the
//! background, and runs one [`Worker`](worker) per connection on its
//! thread pool. Protocol behavior (parsing, dispatch, close semantics)
//! comes from a [`Protocol`] binding plus an ordered list of
//! [`MatchRule`]s registered at construction time.
//!
//! Lifecycle: Idle → Listening → (per connection: Accepted →
//! Processing ⇄ Idle-wait → Closing) → Stopped.

pub mod protocol;
mod worker;

pub use protocol::{MatchRule, Protocol};

use crate::base::{Host, NetError};
use crate::dns::{ResolveFlags, Resolver};
use crate::pool::ThreadPool;
use crate::socket::{
    Connection, Family, Interrupter, Socket, SocketConfig, SocketOption,
    DEFAULT_BUFFER_CAPACITY,
};
use dashmap::DashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use worker::Worker;

/// Per-server tuning knobs, set through the builder.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Max silence tolerated while waiting for a request.
    pub read_idle_timeout: Duration,
    /// Max budget for writing one response.
    pub write_idle_timeout: Duration,
    /// Connection buffer capacity (and line-length cap).
    pub buffer_capacity: usize,
    /// Listen backlog.
    pub backlog: i32,
    /// Bound on resolving the bind host.
    pub resolve_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            read_idle_timeout: Duration::from_secs(30),
            write_idle_timeout: Duration::from_secs(30),
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            backlog: 128,
            resolve_timeout: Duration::from_secs(5),
        }
    }
}

type WorkerSetup = Box<dyn Fn(&mut Connection) + Send + Sync>;

/// State shared between the server handle, the accept loop, and the
/// workers.
pub(crate) struct ServerShared<P: Protocol> {
    pub(crate) protocol: P,
    pub(crate) rules: Vec<MatchRule<P>>,
    pub(crate) config: ServerConfig,
    /// Live connections' interrupters, keyed by worker id; the
    /// shutdown path walks this to wake blocked reads.
    pub(crate) registry: DashMap<u64, Interrupter>,
    pub(crate) shutdown: AtomicBool,
    pub(crate) worker_setup: Option<WorkerSetup>,
}

/// Builder for a [`Server`].
pub struct ServerBuilder<P: Protocol> {
    protocol: P,
    rules: Vec<MatchRule<P>>,
    config: ServerConfig,
    max_workers: usize,
    worker_setup: Option<WorkerSetup>,
}

impl<P: Protocol> ServerBuilder<P> {
    /// Starts a builder around a protocol binding.
    pub fn new(protocol: P) -> Self {
        Self {
            protocol,
            rules: Vec::new(),
            config: ServerConfig::default(),
            max_workers: 64,
            worker_setup: None,
        }
    }

    /// Registers a match rule; rules are evaluated in registration
    /// order, first match wins.
    pub fn rule<F, H>(mut self, predicate: F, handler: H) -> Self
    where
        F: Fn(&P::Request) -> bool + Send + Sync + 'static,
        H: Fn(&P::Request) -> P::Response + Send + Sync + 'static,
    {
        self.rules.push(MatchRule::new(predicate, handler));
        self
    }

    /// Sets the read idle timeout.
    pub fn read_idle_timeout(mut self, timeout: Duration) -> Self {
        self.config.read_idle_timeout = timeout;
        self
    }

    /// Sets the write idle timeout.
    pub fn write_idle_timeout(mut self, timeout: Duration) -> Self {
        self.config.write_idle_timeout = timeout;
        self
    }

    /// Sets the per-connection buffer capacity.
    pub fn buffer_capacity(mut self, capacity: usize) -> Self {
        self.config.buffer_capacity = capacity;
        self
    }

    /// Caps concurrently live worker threads.
    pub fn max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers;
        self
    }

    /// Per-connection customization hook, run on the worker thread
    /// right after the connection's timeouts are applied.
    pub fn worker_setup<F>(mut self, setup: F) -> Self
    where
        F: Fn(&mut Connection) + Send + Sync + 'static,
    {
        self.worker_setup = Some(Box::new(setup));
        self
    }

    /// Builds the (idle, not yet listening) server.
    pub fn build(self) -> Server<P> {
        Server {
            shared: Arc::new(ServerShared {
                protocol: self.protocol,
                rules: self.rules,
                config: self.config,
                registry: DashMap::new(),
                shutdown: AtomicBool::new(false),
                worker_setup: self.worker_setup,
            }),
            pool: Arc::new(ThreadPool::new(self.max_workers)),
            resolver: Resolver::new(),
            accept_handle: None,
            listener_interrupter: None,
            local_addr: None,
        }
    }
}

/// A listening server dispatching one worker per connection.
pub struct Server<P: Protocol> {
    shared: Arc<ServerShared<P>>,
    pool: Arc<ThreadPool>,
    resolver: Resolver,
    accept_handle: Option<JoinHandle<()>>,
    listener_interrupter: Option<Interrupter>,
    local_addr: Option<SocketAddr>,
}

impl<P: Protocol> Server<P> {
    /// Starts a builder around a protocol binding.
    pub fn builder(protocol: P) -> ServerBuilder<P> {
        ServerBuilder::new(protocol)
    }

    /// Binds, listens, and starts accepting in the background.
    ///
    /// Returns once listening; the caller's thread is never blocked
    /// for the server's lifetime. A service of `0` (or absent) binds
    /// an ephemeral port, introspectable through
    /// [`local_addr`](Self::local_addr). A server listens at most once;
    /// a second call fails with [`NetError::AlreadyListening`].
    pub fn serve(&mut self, host: &Host) -> Result<(), NetError> {
        if self.accept_handle.is_some() {
            return Err(NetError::AlreadyListening);
        }

        let candidates = self.resolver.resolve_host(
            host,
            ResolveFlags::PASSIVE,
            self.shared.config.resolve_timeout,
        );
        if candidates.is_empty() {
            return Err(NetError::InvalidHost(host.to_string()));
        }

        let mut last_err = NetError::ConnectionFailed;
        let mut listener = None;
        for candidate in &candidates {
            let mut config = SocketConfig::tcp(candidate.family())
                .with_option(SocketOption::ReuseAddr);
            if candidate.family() == Family::Inet6 {
                config = config.with_option(SocketOption::DualStack);
            }
            let socket = match Socket::new(config) {
                Ok(socket) => socket,
                Err(e) => {
                    last_err = e;
                    continue;
                }
            };
            match socket
                .bind(candidate.addr())
                .and_then(|_| socket.listen(self.shared.config.backlog))
            {
                Ok(()) => {
                    listener = Some(socket);
                    break;
                }
                Err(e) => last_err = e,
            }
        }
        let listener = listener.ok_or(last_err)?;

        self.local_addr = listener.local_addr()?.as_socket();
        self.listener_interrupter = Some(listener.interrupter()?);

        let shared = Arc::clone(&self.shared);
        let pool = Arc::clone(&self.pool);
        let handle = thread::Builder::new()
            .name("forgenet-accept".into())
            .spawn(move || accept_loop(listener, shared, pool))
            .map_err(|e| NetError::ThreadSpawn {
                source: Arc::new(e),
            })?;
        self.accept_handle = Some(handle);

        tracing::debug!(addr = ?self.local_addr, "server listening");
        Ok(())
    }

    /// The bound local address, once listening.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// True between a successful [`serve`](Self::serve) and
    /// [`close`](Self::close).
    pub fn is_listening(&self) -> bool {
        self.accept_handle.is_some() && !self.shared.shutdown.load(Ordering::SeqCst)
    }

    /// Stops accepting, force-closes all live connections (waking any
    /// blocked reads), and drains the worker pool. Idempotent.
    pub fn close(&mut self) {
        if self.shared.shutdown.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Some(interrupter) = self.listener_interrupter.take() {
            interrupter.interrupt();
        }
        if let Some(handle) = self.accept_handle.take() {
            let _ = handle.join();
        }
        for entry in self.shared.registry.iter() {
            entry.value().interrupt();
        }
        self.pool.block_for_tasks();
        tracing::debug!("server stopped");
    }
}

impl<P: Protocol> Drop for Server<P> {
    fn drop(&mut self) {
        self.close();
    }
}

fn accept_loop<P: Protocol>(
    listener: Socket,
    shared: Arc<ServerShared<P>>,
    pool: Arc<ThreadPool>,
) {
    let mut next_id: u64 = 0;
    loop {
        if shared.shutdown.load(Ordering::SeqCst) {
            break;
        }
        match listener.accept() {
            Ok((socket, peer)) => {
                next_id += 1;
                let id = next_id;
                tracing::debug!(worker = id, peer = ?peer.as_socket(), "accepted");
                let conn = Connection::with_capacity(socket, shared.config.buffer_capacity);
                match conn.interrupter() {
                    Ok(interrupter) => {
                        shared.registry.insert(id, interrupter);
                    }
                    Err(e) => {
                        tracing::debug!(worker = id, error = %e, "interrupter failed");
                        continue;
                    }
                }
                let worker = Worker::new(id, conn, Arc::clone(&shared));
                if let Err(e) = pool.queue_task(move || worker.run()) {
                    tracing::warn!(worker = id, error = %e, "dispatch failed, dropping connection");
                    shared.registry.remove(&id);
                }
            }
            Err(e) => {
                if shared.shutdown.load(Ordering::SeqCst) {
                    break;
                }
                // Transient per-connection failures keep the loop alive;
                // anything else means the listener itself is gone.
                if matches!(e, NetError::ConnectionAborted | NetError::ReadTimeout) {
                    tracing::debug!(error = %e, "accept failed, continuing");
                    continue;
                }
                tracing::warn!(error = %e, "listener failed, stopping accept loop");
                break;
            }
        }
    }
    tracing::debug!("accept loop stopped");
}
