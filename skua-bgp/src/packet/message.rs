//
// Copyright (c) The Skua Project Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::BTreeSet;
use std::net::Ipv4Addr;

use arbitrary::Arbitrary;
use bytes::{BufMut, Bytes, BytesMut};
use derive_new::new;
use enum_as_inner::EnumAsInner;
use ipnetwork::{IpNetwork, Ipv4Network, Ipv6Network};
use serde::{Deserialize, Serialize};
use skua_utils::bytes::TLS_BUF;

use crate::neighbor::PeerType;
use crate::packet::consts::{Afi, ErrorCode, Safi};
use crate::packet::error::UpdateMessageError;

// Session capabilities relevant to attribute processing, as negotiated
// through the OPEN exchange (which happens in the session layer).
#[derive(Clone, Debug, Eq, Ord, PartialEq, PartialOrd)]
#[derive(EnumAsInner)]
#[derive(Deserialize, Serialize)]
#[derive(Arbitrary)]
pub enum NegotiatedCapability {
    MultiProtocol { afi: Afi, safi: Safi },
    FourOctetAsNumber,
    RouteRefresh,
    GracefulRestart,
}

//
// NOTIFICATION Message.
//
// Encoding format (message body):
//
// 0                   1                   2                   3
// 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// | Error code    | Error subcode |   Data (variable)             |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//
#[derive(Clone, Debug, Eq, Ord, PartialEq, PartialOrd)]
#[derive(Deserialize, Serialize)]
pub struct NotificationMsg {
    pub error_code: u8,
    pub error_subcode: u8,
    pub data: Vec<u8>,
}

// BGP attribute decoding context.
//
// Everything the parser needs to know about the session the attribute block
// arrived on: who the peer is, what was negotiated, and the knobs that alter
// validation behavior.
#[derive(Debug)]
#[derive(Arbitrary)]
pub struct DecodeCxt {
    pub peer_type: PeerType,
    pub peer_as: u32,
    pub capabilities: BTreeSet<NegotiatedCapability>,
    pub enforce_first_as: bool,
    pub change_local_as: Option<u32>,
    pub local_as_no_prepend: bool,
    // Loopbacks may be used in testing.
    pub allow_martian_nexthop: bool,
}

// BGP attribute encoding context.
//
// Per-destination session properties driving the outbound transforms.
#[derive(Debug)]
pub struct EncodeCxt {
    pub peer_type: PeerType,
    // Session the route was learned from, if any.
    pub from_peer: Option<FromPeer>,
    pub capabilities: BTreeSet<NegotiatedCapability>,
    pub local_as: u32,
    pub confed_id: Option<u32>,
    pub change_local_as: Option<u32>,
    pub replace_as: bool,
    pub router_id: Ipv4Addr,
    pub cluster_id: Option<Ipv4Addr>,
    // Per-address-family send knobs.
    pub send_comm: bool,
    pub send_ext_comm: bool,
    pub send_large_comm: bool,
}

#[derive(Clone, Copy, Debug)]
#[derive(new)]
pub struct FromPeer {
    pub peer_type: PeerType,
    pub remote_id: Ipv4Addr,
}

// Route context for the encoder: which table the route belongs to and, for
// multiprotocol families, the prefix being advertised together with its VPN
// route distinguisher and MPLS label.
#[derive(Clone, Debug)]
pub struct RouteCxt {
    pub afi: Afi,
    pub safi: Safi,
    pub prefix: Option<IpNetwork>,
    pub rd: Option<RouteDistinguisher>,
    pub label: Option<[u8; 3]>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[derive(new)]
#[derive(Deserialize, Serialize)]
pub struct RouteDistinguisher(pub [u8; 8]);

// Multiprotocol reachable NLRI, as handed back to the caller.
//
// The NLRI blob is not parsed here: prefix decoding depends on the
// (AFI, SAFI) pair and belongs to the RIB side of the house. AFI/SAFI are
// therefore kept as raw wire values.
#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct MpReachNlri {
    pub afi: u16,
    pub safi: u8,
    pub nlri: Bytes,
}

// Multiprotocol unreachable NLRI (withdrawals), handed back to the caller.
#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct MpUnreachNlri {
    pub afi: u16,
    pub safi: u8,
    pub nlri: Bytes,
}

// ===== impl NotificationMsg =====

impl NotificationMsg {
    const MSG_TYPE: u8 = 3;
    const MSG_LEN_POS: std::ops::Range<usize> = 16..18;

    // Encodes the NOTIFICATION, including the message header, into a buffer
    // ready to be pushed onto the session socket.
    pub fn encode(&self) -> Bytes {
        TLS_BUF.with(|buf| {
            let mut buf = buf.borrow_mut();
            buf.clear();

            // Marker field.
            buf.put_u128(u128::MAX);
            // The length field will be initialized later.
            buf.put_u16(0);
            buf.put_u8(Self::MSG_TYPE);

            // Message body.
            buf.put_u8(self.error_code);
            buf.put_u8(self.error_subcode);
            buf.put_slice(&self.data);

            // Rewrite message length.
            let msg_len = buf.len() as u16;
            buf[Self::MSG_LEN_POS].copy_from_slice(&msg_len.to_be_bytes());

            buf.clone().freeze()
        })
    }
}

impl From<&UpdateMessageError> for NotificationMsg {
    fn from(error: &UpdateMessageError) -> NotificationMsg {
        NotificationMsg {
            error_code: ErrorCode::UpdateMessageError as u8,
            error_subcode: error.subcode() as u8,
            data: error.data(),
        }
    }
}

// ===== impl RouteCxt =====

impl RouteCxt {
    pub fn ipv4_unicast() -> RouteCxt {
        RouteCxt {
            afi: Afi::Ipv4,
            safi: Safi::Unicast,
            prefix: None,
            rd: None,
            label: None,
        }
    }

    pub(crate) fn is_ipv4_unicast(&self) -> bool {
        self.afi == Afi::Ipv4 && self.safi == Safi::Unicast
    }
}

// ===== helper functions =====

pub(crate) fn prefix_wire_len(plen: u8) -> usize {
    plen.div_ceil(8) as usize
}

pub(crate) fn encode_ipv4_prefix(buf: &mut BytesMut, prefix: &Ipv4Network) {
    // Encode prefix length.
    let plen = prefix.prefix();
    buf.put_u8(plen);

    // Encode prefix address (variable length).
    let prefix_bytes = prefix.ip().octets();
    let plen_wire = prefix_wire_len(plen);
    buf.put_slice(&prefix_bytes[0..plen_wire]);
}

pub(crate) fn encode_ipv6_prefix(buf: &mut BytesMut, prefix: &Ipv6Network) {
    // Encode prefix length.
    let plen = prefix.prefix();
    buf.put_u8(plen);

    // Encode prefix address (variable length).
    let prefix_bytes = prefix.ip().octets();
    let plen_wire = prefix_wire_len(plen);
    buf.put_slice(&prefix_bytes[0..plen_wire]);
}
