//! Background DNS and MX resolution.
//!
//! Every lookup runs on its own short-lived thread and is joined with a
//! caller-specified timeout. Lookups never throw: a timeout, an
//! NXDOMAIN, or a resolver failure all yield an empty result set, so
//! callers can loop over candidates (or mail exchangers) without
//! special-casing. Callers that must distinguish "no records" from
//! "timed out" do so by elapsed-time introspection.

mod resolver;

pub use resolver::Resolver;

use crate::socket::{Family, SocketType, Transport};
use socket2::SockAddr;
use std::ops::BitOr;

/// A resolved, bindable/connectable address candidate.
///
/// Produced only by the [`Resolver`]; callers never construct one.
/// Carries everything needed to create and connect a matching socket,
/// including the raw sockaddr bytes.
#[derive(Debug, Clone)]
pub struct AddressInfo {
    family: Family,
    socket_type: SocketType,
    transport: Transport,
    addr: SockAddr,
}

impl AddressInfo {
    pub(crate) fn new(
        family: Family,
        socket_type: SocketType,
        transport: Transport,
        addr: SockAddr,
    ) -> Self {
        Self {
            family,
            socket_type,
            transport,
            addr,
        }
    }

    /// Address family of this candidate.
    pub fn family(&self) -> Family {
        self.family
    }

    /// Socket type of this candidate.
    pub fn socket_type(&self) -> SocketType {
        self.socket_type
    }

    /// Transport protocol of this candidate.
    pub fn transport(&self) -> Transport {
        self.transport
    }

    /// The resolved address (raw sockaddr bytes and length inside).
    pub fn addr(&self) -> &SockAddr {
        &self.addr
    }
}

/// A mail-exchanger record for a domain.
///
/// Returned unordered; sorting by priority is the caller's concern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MxRecord {
    pub priority: u16,
    pub exchange: String,
}

/// Open bit-set of resolution flags, in the platform resolver's terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResolveFlags(u32);

impl ResolveFlags {
    pub const NONE: ResolveFlags = ResolveFlags(0);
    /// Resolve for binding: an absent node yields wildcard addresses.
    pub const PASSIVE: ResolveFlags = ResolveFlags(1 << 0);
    /// Report IPv4 candidates as v6-mapped addresses.
    pub const V4MAPPED: ResolveFlags = ResolveFlags(1 << 1);
    /// Only return families the host is configured for.
    pub const ADDRCONFIG: ResolveFlags = ResolveFlags(1 << 2);
    /// With `V4MAPPED`, keep the native IPv4 candidates as well.
    pub const ALL: ResolveFlags = ResolveFlags(1 << 3);

    /// Builds a flag set from raw bits (the set is open: unknown bits
    /// are carried through untouched).
    pub fn from_bits(bits: u32) -> Self {
        ResolveFlags(bits)
    }

    /// The raw bits.
    pub fn bits(self) -> u32 {
        self.0
    }

    /// True if all of `other`'s bits are set.
    pub fn contains(self, other: ResolveFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for ResolveFlags {
    type Output = ResolveFlags;

    fn bitor(self, rhs: ResolveFlags) -> ResolveFlags {
        ResolveFlags(self.0 | rhs.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_combine_and_contain() {
        let flags = ResolveFlags::PASSIVE | ResolveFlags::V4MAPPED;
        assert!(flags.contains(ResolveFlags::PASSIVE));
        assert!(flags.contains(ResolveFlags::V4MAPPED));
        assert!(!flags.contains(ResolveFlags::ALL));
        assert_eq!(ResolveFlags::from_bits(flags.bits()), flags);
    }

    #[test]
    fn test_unknown_bits_pass_through() {
        let flags = ResolveFlags::from_bits(0x8000_0000);
        assert_eq!(flags.bits(), 0x8000_0000);
        assert!(!flags.contains(ResolveFlags::PASSIVE));
    }
}
