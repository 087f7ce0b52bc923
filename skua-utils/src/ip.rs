//
// Copyright (c) The Skua Project Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::{Ipv4Addr, Ipv6Addr};

// Extension methods for Ipv4Addr.
pub trait Ipv4AddrExt {
    const LENGTH: usize;

    /// Returns true if this address can't appear as the next-hop of a route
    /// received from a peer (0.0.0.0/8, 127.0.0.0/8 and class D/E space).
    fn is_martian(&self) -> bool;

    /// Returns true for addresses that can be used as interface addresses.
    fn is_usable(&self) -> bool;
}

// Extension methods for Ipv6Addr.
pub trait Ipv6AddrExt {
    const LENGTH: usize;

    /// Returns true for addresses in the fe80::/10 range.
    fn is_link_local(&self) -> bool;
}

// ===== impl Ipv4Addr =====

impl Ipv4AddrExt for Ipv4Addr {
    const LENGTH: usize = 4;

    fn is_martian(&self) -> bool {
        let first = self.octets()[0];
        first == 0 || first == 127 || first >= 224
    }

    fn is_usable(&self) -> bool {
        !(self.is_loopback()
            || self.is_broadcast()
            || self.is_multicast()
            || self.is_unspecified())
    }
}

// ===== impl Ipv6Addr =====

impl Ipv6AddrExt for Ipv6Addr {
    const LENGTH: usize = 16;

    fn is_link_local(&self) -> bool {
        (self.segments()[0] & 0xffc0) == 0xfe80
    }
}
