//
// Copyright (c) The Skua Project Contributors
//
// SPDX-License-Identifier: MIT
//

use arbitrary::Arbitrary;
use bitflags::bitflags;
use num_derive::{FromPrimitive, ToPrimitive};
use serde::{Deserialize, Serialize};

// Reserved 2-byte AS number sent in place of a 4-byte AS number to peers
// that didn't negotiate the 4-octet AS number capability (RFC 6793).
pub const AS_TRANS: u16 = 23456;

// BGP Error (Notification) Codes.
//
// IANA registry:
// https://www.iana.org/assignments/bgp-parameters/bgp-parameters.xhtml#bgp-parameters-3
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[derive(FromPrimitive, ToPrimitive)]
#[derive(Deserialize, Serialize)]
pub enum ErrorCode {
    MessageHeaderError = 1,
    OpenMessageError = 2,
    UpdateMessageError = 3,
    HoldTimerExpired = 4,
    FiniteStateMachineError = 5,
    Cease = 6,
    // RFC 7313
    RouteRefreshMessageError = 7,
}

// UPDATE Message Error subcodes.
//
// IANA registry:
// https://www.iana.org/assignments/bgp-parameters/bgp-parameters.xhtml#bgp-parameters-7
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[derive(FromPrimitive, ToPrimitive)]
#[derive(Deserialize, Serialize)]
pub enum UpdateMessageErrorSubcode {
    Unspecific = 0,
    MalformedAttributeList = 1,
    UnrecognizedWellKnownAttribute = 2,
    MissingWellKnownAttribute = 3,
    AttributeFlagsError = 4,
    AttributeLengthError = 5,
    InvalidOriginAttribute = 6,
    InvalidNexthopAttribute = 8,
    OptionalAttributeError = 9,
    InvalidNetworkField = 10,
    MalformedAsPath = 11,
}

// Address Family Identifiers (AFI).
//
// IANA registry:
// https://www.iana.org/assignments/address-family-numbers/address-family-numbers.xhtml
#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd)]
#[derive(FromPrimitive, ToPrimitive)]
#[derive(Deserialize, Serialize)]
#[derive(Arbitrary)]
pub enum Afi {
    Ipv4 = 1,
    Ipv6 = 2,
}

// Subsequent Address Family Identifiers (SAFI).
//
// IANA registry:
// https://www.iana.org/assignments/safi-namespace/safi-namespace.xhtml#safi-namespace-2
#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd)]
#[derive(FromPrimitive, ToPrimitive)]
#[derive(Deserialize, Serialize)]
#[derive(Arbitrary)]
pub enum Safi {
    Unicast = 1,
    Multicast = 2,
    LabeledUnicast = 4,
    MulticastVpn = 5,
    Pseudowire = 6,
    TunnelEncap = 7,
    McastVpls = 8,
    Tunnel = 64,
    Vpls = 65,
    Mdt = 66,
    V4OverV6 = 67,
    V6OverV4 = 68,
    L1VpnAutoDiscovery = 69,
    Evpn = 70,
    BgpLs = 71,
    BgpLsVpn = 72,
    SrTe = 73,
    SdWanCapabilities = 74,
    LabeledVpn = 128,
    MulticastMplsVpn = 129,
    RouteTarget = 132,
    Ipv4FlowSpec = 133,
    Vpnv4FlowSpec = 134,
    VpnAutoDiscovery = 140,
}

impl Safi {
    // SAFIs whose routes carry tunnel information and therefore a
    // Tunnel Encapsulation attribute on the wire.
    pub fn is_vpn_or_encap(&self) -> bool {
        matches!(self, Safi::LabeledVpn | Safi::TunnelEncap)
    }
}

// BGP Path Attribute Flags.
bitflags! {
    #[derive(Clone, Copy, Debug, Default, Eq, Ord, PartialEq, PartialOrd)]
    #[derive(Deserialize, Serialize)]
    #[serde(transparent)]
    pub struct AttrFlags: u8 {
        const OPTIONAL = 0x80;
        const TRANSITIVE = 0x40;
        const PARTIAL = 0x20;
        const EXTENDED = 0x10;
    }
}

// BGP Path Attribute Types.
//
// IANA registry:
// https://www.iana.org/assignments/bgp-parameters/bgp-parameters.xhtml#bgp-parameters-2
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[derive(FromPrimitive, ToPrimitive)]
#[derive(Deserialize, Serialize)]
#[derive(Arbitrary)]
pub enum AttrType {
    Origin = 1,
    AsPath = 2,
    Nexthop = 3,
    Med = 4,
    LocalPref = 5,
    AtomicAggregate = 6,
    Aggregator = 7,
    // RFC 1997
    Communities = 8,
    // RFC 4456
    OriginatorId = 9,
    ClusterList = 10,
    // RFC 4760
    MpReachNlri = 14,
    MpUnreachNlri = 15,
    // RFC 4360
    ExtCommunities = 16,
    // RFC 6793
    As4Path = 17,
    As4Aggregator = 18,
    // RFC 9012
    TunnelEncap = 23,
    // RFC 8092
    LargeCommunity = 32,
}

// BGP Origin.
pub type Origin = skua_utils::bgp::Origin;

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[derive(FromPrimitive, ToPrimitive)]
#[derive(Deserialize, Serialize)]
pub enum AsPathSegmentType {
    Set = 1,
    Sequence = 2,
    ConfedSequence = 3,
    ConfedSet = 4,
}

// Tunnel types carried in the Tunnel Encapsulation attribute.
//
// IANA registry:
// https://www.iana.org/assignments/bgp-parameters/bgp-parameters.xhtml#tunnel-types
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[derive(FromPrimitive, ToPrimitive)]
#[derive(Deserialize, Serialize)]
pub enum TunnelType {
    L2tpv3OverIp = 1,
    Gre = 2,
    TransmitTunnelEndpoint = 3,
    IpsecTunnelMode = 4,
    IpInIpIpsec = 5,
    MplsInIpIpsec = 6,
    IpInIp = 7,
    Vxlan = 8,
    Nvgre = 9,
    Mpls = 10,
    MplsInGre = 11,
    VxlanGpe = 12,
    MplsInUdp = 13,
}

// Re-exports for convenience.
pub type WellKnownCommunities = skua_utils::bgp::WellKnownCommunities;
