//! Host and MX lookups on dedicated background threads.
//!
//! Address resolution goes through the operating system's native
//! facility (`getaddrinfo` via the standard library); MX lookups use
//! hickory-dns against the system's configured nameservers. Both run on
//! a thread per call and are joined with `recv_timeout`, so a slow or
//! wedged platform resolver cannot stall the caller past its bound.

use crate::base::Host;
use crate::dns::{AddressInfo, MxRecord, ResolveFlags};
use crate::socket::{Family, SocketType, Transport};
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::Resolver as DnsResolver;
use socket2::SockAddr;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, ToSocketAddrs};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

/// Asynchronous (background-thread) DNS/MX resolver.
///
/// Stateless and cheap to construct; every lookup is independent.
#[derive(Debug, Clone, Copy, Default)]
pub struct Resolver;

impl Resolver {
    pub fn new() -> Self {
        Self
    }

    /// Resolves a host into connectable/bindable address candidates.
    ///
    /// Runs `getaddrinfo` on a background thread and waits at most
    /// `timeout`. A timeout, an unresolvable name, or an invalid
    /// service all yield an empty vector, so
    /// callers can iterate candidates without special-casing.
    pub fn resolve_host(
        &self,
        host: &Host,
        flags: ResolveFlags,
        timeout: Duration,
    ) -> Vec<AddressInfo> {
        let port = match host.port() {
            Ok(port) => port,
            Err(_) => {
                tracing::debug!(host = %host, "unresolvable service name");
                return Vec::new();
            }
        };

        // Wildcard/loopback shortcut for an absent node.
        if host.node().is_empty() {
            return passive_or_loopback(port, flags);
        }

        let node = host.node().to_string();
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            tracing::debug!(host = %node, "resolving via getaddrinfo");
            let result = (node.as_str(), port)
                .to_socket_addrs()
                .map(|iter| iter.collect::<Vec<_>>());
            // Receiver may have timed out and gone; that is fine.
            let _ = tx.send(result);
        });

        let addrs = match rx.recv_timeout(timeout) {
            Ok(Ok(addrs)) => addrs,
            Ok(Err(e)) => {
                tracing::debug!(host = %host, error = %e, "resolution failed");
                return Vec::new();
            }
            Err(_) => {
                tracing::warn!(host = %host, timeout = ?timeout, "resolution timed out");
                return Vec::new();
            }
        };

        tracing::debug!(host = %host, count = addrs.len(), "resolution complete");
        apply_flags(addrs, flags)
            .into_iter()
            .map(address_info)
            .collect()
    }

    /// Resolves a domain's mail-exchanger records.
    ///
    /// Same soft-failure and timeout contract as
    /// [`resolve_host`](Self::resolve_host); records come back in
    /// server order, unsorted.
    pub fn resolve_mx(&self, domain: &str, timeout: Duration) -> Vec<MxRecord> {
        let domain = domain.to_string();
        let query = domain.clone();
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            tracing::debug!(domain = %query, "resolving MX via hickory-dns");
            let resolver = match DnsResolver::from_system_conf() {
                Ok(resolver) => resolver,
                Err(e) => {
                    tracing::warn!(error = %e, "no system DNS config, using defaults");
                    match DnsResolver::new(ResolverConfig::default(), ResolverOpts::default()) {
                        Ok(resolver) => resolver,
                        Err(e) => {
                            tracing::error!(error = %e, "MX resolver construction failed");
                            let _ = tx.send(Vec::new());
                            return;
                        }
                    }
                }
            };
            let records = match resolver.mx_lookup(query.as_str()) {
                Ok(lookup) => lookup
                    .iter()
                    .map(|mx| MxRecord {
                        priority: mx.preference(),
                        exchange: mx.exchange().to_utf8().trim_end_matches('.').to_string(),
                    })
                    .collect(),
                Err(e) => {
                    tracing::debug!(domain = %query, error = %e, "MX lookup failed");
                    Vec::new()
                }
            };
            let _ = tx.send(records);
        });

        match rx.recv_timeout(timeout) {
            Ok(records) => {
                tracing::debug!(domain = %domain, count = records.len(), "MX lookup complete");
                records
            }
            Err(_) => {
                tracing::warn!(domain = %domain, timeout = ?timeout, "MX lookup timed out");
                Vec::new()
            }
        }
    }
}

/// Candidates for an absent node: wildcard addresses when resolving for
/// a passive bind, loopback otherwise.
fn passive_or_loopback(port: u16, flags: ResolveFlags) -> Vec<AddressInfo> {
    let ips: [IpAddr; 2] = if flags.contains(ResolveFlags::PASSIVE) {
        [Ipv6Addr::UNSPECIFIED.into(), Ipv4Addr::UNSPECIFIED.into()]
    } else {
        [Ipv6Addr::LOCALHOST.into(), Ipv4Addr::LOCALHOST.into()]
    };
    ips.into_iter()
        .map(|ip| address_info(SocketAddr::new(ip, port)))
        .collect()
}

/// Emulates the v6-mapping hint flags over getaddrinfo output.
fn apply_flags(addrs: Vec<SocketAddr>, flags: ResolveFlags) -> Vec<SocketAddr> {
    if !flags.contains(ResolveFlags::V4MAPPED) {
        return addrs;
    }
    let keep_native = flags.contains(ResolveFlags::ALL);
    let mut out = Vec::with_capacity(addrs.len());
    for addr in addrs {
        match addr {
            SocketAddr::V4(v4) => {
                if keep_native {
                    out.push(addr);
                }
                out.push(SocketAddr::new(v4.ip().to_ipv6_mapped().into(), v4.port()));
            }
            SocketAddr::V6(_) => out.push(addr),
        }
    }
    out
}

fn address_info(addr: SocketAddr) -> AddressInfo {
    let family = if addr.is_ipv4() {
        Family::Inet
    } else {
        Family::Inet6
    };
    AddressInfo::new(
        family,
        SocketType::Stream,
        Transport::Tcp,
        SockAddr::from(addr),
    )
}
