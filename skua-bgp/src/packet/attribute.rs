//
// Copyright (c) The Skua Project Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::{BTreeSet, VecDeque};
use std::net::{Ipv4Addr, Ipv6Addr};

use bytes::{Buf, BufMut, Bytes, BytesMut};
use derive_new::new;
use enum_as_inner::EnumAsInner;
use ipnetwork::IpNetwork;
use num_traits::FromPrimitive;
use serde::{Deserialize, Serialize};
use skua_utils::bytes::{BytesExt, BytesMutExt};
use skua_utils::ip::{Ipv4AddrExt, Ipv6AddrExt};

use crate::debug::Debug;
use crate::neighbor::PeerType;
use crate::packet::consts::{
    AS_TRANS, Afi, AsPathSegmentType, AttrFlags, AttrType, Origin, Safi,
};
use crate::packet::encap::TunnelEncap;
use crate::packet::error::{AttrError, AttrMalformed, UpdateMessageError};
use crate::packet::message::{
    DecodeCxt, EncodeCxt, MpReachNlri, MpUnreachNlri, RouteCxt,
    RouteDistinguisher, encode_ipv4_prefix, encode_ipv6_prefix,
    prefix_wire_len,
};

// Attribute header: flags, type and a 1-byte length.
pub const ATTR_MIN_LEN: u16 = 3;
// Attribute header with an extended (2-byte) length.
pub const ATTR_MIN_LEN_EXT: u16 = 4;

pub const DFLT_LOCAL_PREF: u32 = 100;
pub const DFLT_WEIGHT: u32 = 32768;
pub const DFLT_PRIORITY: u32 = 32768;

// Presence bitmap keyed by attribute type code.
//
// This is what decides whether a fixed field like MED carries a value; the
// field itself stays at its default when the bit is clear.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
#[derive(Deserialize, Serialize)]
#[serde(transparent)]
pub struct AttrPresence(u32);

// One distinct combination of path attributes, in its mutable scratch form.
//
// The parser fills one of these in; interning it through the attribute store
// yields the canonical, shared `AttrSet`. Fields that only a minority of
// routes carry live in the lazily allocated extra block.
#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct Attrs {
    pub flag: AttrPresence,
    pub origin: Origin,
    pub nexthop: Ipv4Addr,
    pub med: u32,
    pub local_pref: u32,
    pub as_path: AsPath,
    pub comm: Option<Comms>,
    pub extra: Option<Box<AttrsExtra>>,
}

// Additional, uncommon attributes.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct AttrsExtra {
    pub aggregator: Option<Aggregator>,
    pub weight: u32,
    pub priority: u32,
    pub originator_id: Option<Ipv4Addr>,
    pub cluster_list: Option<ClusterList>,
    pub ext_comm: Option<ExtComms>,
    pub large_comm: Option<LargeComms>,
    pub mp_nexthop: Option<MpNexthop>,
    pub encap: Option<TunnelEncap>,
    pub transit: Option<Transit>,
    pub tag: u32,
}

#[derive(Clone, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[derive(Deserialize, Serialize)]
pub struct AsPath {
    pub segments: VecDeque<AsPathSegment>,
}

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[derive(Deserialize, Serialize)]
pub struct AsPathSegment {
    pub seg_type: AsPathSegmentType,
    pub members: VecDeque<u32>,
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[derive(new)]
#[derive(Deserialize, Serialize)]
pub struct Aggregator {
    pub asn: u32,
    pub identifier: Ipv4Addr,
}

// Route-reflector cluster IDs, in the order they were received. Two lists
// holding the same IDs in different orders are different values.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct ClusterList(pub Vec<Ipv4Addr>);

// Concatenated raw (flags, type, length, value) encodings of the optional
// transitive attributes this speaker doesn't recognize, preserved for
// loss-less re-advertisement.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct Transit(pub Bytes);

// Multiprotocol nexthop. The wire length selects the encoding; VPN variants
// carry an 8-byte route distinguisher on the wire, which is always zero in
// the nexthop field and is discarded on input.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[derive(EnumAsInner)]
#[derive(Deserialize, Serialize)]
pub enum MpNexthop {
    Ipv4(Ipv4Addr),
    VpnIpv4(Ipv4Addr),
    Ipv6(Ipv6Addr),
    VpnIpv6(Ipv6Addr),
    Ipv6Dual { global: Ipv6Addr, link_local: Ipv6Addr },
    VpnIpv6Dual { global: Ipv6Addr, link_local: Ipv6Addr },
}

// Re-exports for convenience.
pub use skua_utils::bgp::{Comm, ExtComm, LargeComm};

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[derive(Deserialize, Serialize)]
pub struct CommList<T: CommType>(pub BTreeSet<T>);

pub trait CommType:
    Clone + Copy + std::fmt::Debug + Eq + std::hash::Hash + Ord
{
    const TYPE: AttrType;
    const LENGTH: usize;

    fn encode(&self, buf: &mut BytesMut);
    fn decode(buf: &mut Bytes) -> Self;
}

// Useful type definitions.
pub type Comms = CommList<Comm>;
pub type ExtComms = CommList<ExtComm>;
pub type LargeComms = CommList<LargeComm>;

// Outcome of parsing an attribute block.
#[derive(Debug, Eq, PartialEq)]
pub enum AttrsResult {
    // The route is usable; an empty set of attributes is how a
    // Graceful-Restart End-of-RIB marker looks.
    Proceed(Box<Attrs>),
    // Treat the affected route as withdrawn.
    Withdraw,
}

// ===== impl AttrPresence =====

impl AttrPresence {
    fn bit(attr_type: AttrType) -> u32 {
        1 << (attr_type as u8 - 1)
    }

    pub fn has(&self, attr_type: AttrType) -> bool {
        self.0 & Self::bit(attr_type) != 0
    }

    pub fn set(&mut self, attr_type: AttrType) {
        self.0 |= Self::bit(attr_type);
    }

    pub(crate) fn clear_raw(&mut self, attr_type: u8) {
        if (1..=32).contains(&attr_type) {
            self.0 &= !(1 << (attr_type - 1));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    fn only(&self, attr_type: AttrType) -> bool {
        self.0 == Self::bit(attr_type)
    }
}

// ===== impl Attrs =====

impl Default for Attrs {
    fn default() -> Attrs {
        Attrs {
            flag: AttrPresence::default(),
            origin: Origin::Igp,
            nexthop: Ipv4Addr::UNSPECIFIED,
            med: 0,
            local_pref: 0,
            as_path: AsPath::default(),
            comm: None,
            extra: None,
        }
    }
}

impl Attrs {
    pub fn med(&self) -> Option<u32> {
        self.flag.has(AttrType::Med).then_some(self.med)
    }

    pub fn local_pref(&self) -> Option<u32> {
        self.flag.has(AttrType::LocalPref).then_some(self.local_pref)
    }

    pub fn nexthop(&self) -> Option<Ipv4Addr> {
        self.flag.has(AttrType::Nexthop).then_some(self.nexthop)
    }

    pub fn extra_mut(&mut self) -> &mut AttrsExtra {
        self.extra.get_or_insert_default()
    }

    // Attributes for a locally originated route.
    pub fn default_local(origin: Origin) -> Attrs {
        let mut attr = Attrs {
            origin,
            ..Default::default()
        };
        attr.flag.set(AttrType::Origin);
        attr.flag.set(AttrType::AsPath);
        attr.flag.set(AttrType::Nexthop);
        let extra = attr.extra_mut();
        extra.weight = DFLT_WEIGHT;
        extra.priority = DFLT_PRIORITY;
        attr
    }

    // Attributes for an aggregate route. The aggregator carries the local
    // AS (or the confederation ID) and the router ID.
    pub fn aggregate(
        origin: Origin,
        as_path: Option<AsPath>,
        comm: Option<Comms>,
        as_set: bool,
        atomic_aggregate: bool,
        aggregator: Aggregator,
    ) -> Attrs {
        let mut attr = Attrs {
            origin,
            ..Default::default()
        };
        attr.flag.set(AttrType::Origin);
        attr.flag.set(AttrType::AsPath);
        attr.flag.set(AttrType::Nexthop);
        if let Some(as_path) = as_path {
            attr.as_path = as_path;
        }
        if let Some(comm) = comm {
            attr.comm = Some(comm);
            attr.flag.set(AttrType::Communities);
        }
        if !as_set || atomic_aggregate {
            attr.flag.set(AttrType::AtomicAggregate);
        }
        let extra = attr.extra_mut();
        extra.weight = DFLT_WEIGHT;
        extra.priority = DFLT_PRIORITY;
        extra.aggregator = Some(aggregator);
        attr.flag.set(AttrType::Aggregator);
        attr
    }

    // Parses the path-attribute portion of one UPDATE message.
    //
    // On success the parsed attributes (or a withdraw indication) are
    // returned; MP reachability and withdrawal NLRI blobs are handed back
    // through the out-parameters for the caller to decode. On error, the
    // returned value carries the NOTIFICATION subcode and data; sending the
    // NOTIFICATION and tearing the session down is the caller's job.
    pub fn decode(
        buf: &mut Bytes,
        cxt: &DecodeCxt,
        mp_reach: &mut Option<MpReachNlri>,
        mp_unreach: &mut Option<MpUnreachNlri>,
    ) -> Result<AttrsResult, UpdateMessageError> {
        let mut attr = Attrs::default();
        // The AS4 attributes are only needed until the AS_PATH and
        // AGGREGATOR have been reconciled with them.
        let mut as4_path: Option<AsPath> = None;
        let mut as4_aggregator: Option<Aggregator> = None;
        let mut transit = BytesMut::new();

        // Bitmap of attribute type codes seen in this message.
        let mut seen = [0u8; 32];

        // Check whether the 4-octet AS number capability has been negotiated.
        let four_byte_asn_cap = cxt
            .capabilities
            .iter()
            .any(|cap| cap.is_four_octet_as_number());

        // Parse attributes.
        while buf.remaining() > 0 {
            if buf.remaining() < ATTR_MIN_LEN as usize {
                return Err(UpdateMessageError::AttributeLengthError(
                    Bytes::new(),
                ));
            }

            // Parse attribute flags.
            //
            // "The lower-order four bits of the Attribute Flags octet are
            // unused. They MUST be zero when sent and MUST be ignored when
            // received."
            let attr_flags = AttrFlags::from_bits_truncate(buf.get_u8());

            // Parse attribute type.
            let attr_type_raw = buf.get_u8();

            // Parse attribute length.
            let attr_len = if attr_flags.contains(AttrFlags::EXTENDED) {
                if buf.remaining() < 2 {
                    return Err(UpdateMessageError::AttributeLengthError(
                        Bytes::new(),
                    ));
                }
                buf.get_u16() as usize
            } else {
                buf.get_u8() as usize
            };

            // "If any attribute appears more than once in the UPDATE
            // message, then the Error Subcode is set to Malformed Attribute
            // List."
            if bitmap_get(&seen, attr_type_raw) {
                return Err(UpdateMessageError::MalformedAttributeList);
            }
            bitmap_set(&mut seen, attr_type_raw);

            // Declared length extends past the end of the attribute block.
            if attr_len > buf.remaining() {
                let mut raw = BytesMut::with_capacity(buf.remaining() + 4);
                raw.put_u8(attr_flags.bits());
                raw.put_u8(attr_type_raw);
                if attr_flags.contains(AttrFlags::EXTENDED) {
                    raw.put_u16(attr_len as u16);
                } else {
                    raw.put_u8(attr_len as u8);
                }
                raw.put_slice(&buf[..]);
                return Err(UpdateMessageError::AttributeLengthError(
                    raw.freeze(),
                ));
            }

            let mut value = buf.copy_to_bytes(attr_len);
            let raw = raw_attr(attr_flags, attr_type_raw, &value);
            let attr_type = AttrType::from_u8(attr_type_raw);

            // "If any recognized attribute has Attribute Flags that conflict
            // with the Attribute Type Code, then the Error Subcode is set to
            // Attribute Flags Error."
            if let Some(attr_type) = attr_type
                && attr_flags_invalid(attr_type, attr_flags)
            {
                Debug::AttrError(attr_type_raw, AttrMalformed::Flags).log();
                match malformed(
                    &mut attr,
                    cxt,
                    attr_type_raw,
                    attr_flags,
                    AttrMalformed::Flags,
                    &raw,
                ) {
                    AttrError::Discard => continue,
                    AttrError::Withdraw => return Ok(AttrsResult::Withdraw),
                    AttrError::Reset(error) => return Err(error),
                }
            }

            match attr_type {
                // Known attribute.
                Some(attr_type) => {
                    let result = match attr_type {
                        AttrType::Origin => {
                            origin::decode(&mut value, &mut attr)
                        }
                        AttrType::AsPath => {
                            AsPath::decode(&mut value, four_byte_asn_cap).map(
                                |as_path| {
                                    attr.as_path = as_path;
                                    attr.flag.set(AttrType::AsPath);
                                },
                            )
                        }
                        AttrType::As4Path => AsPath::decode(&mut value, true)
                            .map(|as_path| {
                                as4_path = Some(as_path);
                                attr.flag.set(AttrType::As4Path);
                            }),
                        AttrType::Nexthop => {
                            nexthop::decode(&mut value, cxt, &mut attr)
                        }
                        AttrType::Med => med::decode(&mut value, &mut attr),
                        AttrType::LocalPref => {
                            local_pref::decode(&mut value, cxt, &mut attr)
                        }
                        AttrType::AtomicAggregate => {
                            atomic_aggregate::decode(&mut value, &mut attr)
                        }
                        AttrType::Aggregator => Aggregator::decode(
                            &mut value,
                            four_byte_asn_cap,
                            &mut attr,
                        ),
                        AttrType::As4Aggregator => Aggregator::decode_as4(
                            &mut value,
                            &mut attr,
                            &mut as4_aggregator,
                        ),
                        AttrType::Communities => Comms::decode(
                            &mut value,
                            &mut attr.comm,
                            &mut attr.flag,
                        ),
                        AttrType::OriginatorId => {
                            originator_id::decode(&mut value, &mut attr)
                        }
                        AttrType::ClusterList => {
                            let extra = attr.extra.get_or_insert_default();
                            ClusterList::decode(
                                &mut value,
                                &mut extra.cluster_list,
                                &mut attr.flag,
                            )
                        }
                        AttrType::MpReachNlri => {
                            mp_reach::decode(&mut value, &mut attr, mp_reach)
                        }
                        AttrType::MpUnreachNlri => mp_unreach::decode(
                            &mut value,
                            &mut attr,
                            mp_unreach,
                        ),
                        AttrType::ExtCommunities => {
                            let extra = attr.extra.get_or_insert_default();
                            ExtComms::decode(
                                &mut value,
                                &mut extra.ext_comm,
                                &mut attr.flag,
                            )
                        }
                        AttrType::LargeCommunity => {
                            let extra = attr.extra.get_or_insert_default();
                            LargeComms::decode(
                                &mut value,
                                &mut extra.large_comm,
                                &mut attr.flag,
                            )
                        }
                        AttrType::TunnelEncap => {
                            TunnelEncap::decode(&mut value).map(|encap| {
                                attr.extra_mut().encap = Some(encap);
                                attr.flag.set(AttrType::TunnelEncap);
                            })
                        }
                    };

                    match result {
                        Ok(()) => {
                            // Each decoder must consume exactly the declared
                            // length.
                            if value.has_remaining() {
                                return Err(
                                    UpdateMessageError::AttributeLengthError(
                                        raw,
                                    ),
                                );
                            }
                        }
                        Err(reason) => {
                            // Log and process the malformed attribute.
                            Debug::AttrError(attr_type_raw, reason).log();
                            match malformed(
                                &mut attr,
                                cxt,
                                attr_type_raw,
                                attr_flags,
                                reason,
                                &raw,
                            ) {
                                AttrError::Discard => continue,
                                AttrError::Withdraw => {
                                    return Ok(AttrsResult::Withdraw);
                                }
                                AttrError::Reset(error) => return Err(error),
                            }
                        }
                    }
                }
                // Unknown attribute.
                None => {
                    Debug::AttrUnknown(attr_type_raw, attr_len).log();

                    // "If any of the mandatory well-known attributes are not
                    // recognized, then the Error Subcode MUST be set to
                    // Unrecognized Well-known Attribute."
                    if !attr_flags.contains(AttrFlags::OPTIONAL) {
                        match malformed(
                            &mut attr,
                            cxt,
                            attr_type_raw,
                            attr_flags,
                            AttrMalformed::Unrecognized,
                            &raw,
                        ) {
                            AttrError::Discard => continue,
                            AttrError::Withdraw => {
                                return Ok(AttrsResult::Withdraw);
                            }
                            AttrError::Reset(error) => return Err(error),
                        }
                    }

                    // "If an optional non-transitive attribute is
                    // unrecognized, it is quietly ignored."
                    if !attr_flags.contains(AttrFlags::TRANSITIVE) {
                        continue;
                    }

                    // "If an optional transitive attribute is unrecognized,
                    // the Partial bit in the attribute flags octet is set to
                    // 1, and the attribute is retained for propagation to
                    // other BGP speakers."
                    let attr_flags = attr_flags | AttrFlags::PARTIAL;
                    transit.put_slice(&raw_attr(
                        attr_flags,
                        attr_type_raw,
                        &value,
                    ));
                }
            }
        }

        // Check all mandatory well-known attributes are present.
        check_mandatory(cxt, &attr)?;

        // Reconcile the AS4 attributes now that the whole block has been
        // read; nothing says in which order they arrive relative to AS_PATH
        // and AGGREGATOR.
        if attr.flag.has(AttrType::AsPath) {
            reconcile_as4(
                &mut attr,
                four_byte_asn_cap,
                as4_path,
                as4_aggregator,
            );

            // The sanity checks run against the reconciled path, not the
            // received one.
            aspath_check(cxt, &mut attr)?;
        }

        // Attach the accumulated unknown-transitive blob.
        if !transit.is_empty() {
            attr.extra_mut().transit = Some(Transit(transit.freeze()));
        }

        Ok(AttrsResult::Proceed(Box::new(attr)))
    }

    // Serializes the attribute set for a specific destination session,
    // applying the per-session transforms.
    pub fn encode(
        &self,
        buf: &mut BytesMut,
        cxt: &EncodeCxt,
        route: &RouteCxt,
    ) {
        // Check whether the 4-octet AS number capability has been negotiated.
        let four_byte_asn_cap = cxt
            .capabilities
            .iter()
            .any(|cap| cap.is_four_octet_as_number());

        // RFC 7606 - Section 5.1:
        // "The MP_REACH_NLRI or MP_UNREACH_NLRI attribute (if present) SHALL
        // be encoded as the very first path attribute in an UPDATE message".
        if let Some(prefix) = &route.prefix
            && !route.is_ipv4_unicast()
        {
            let start_pos = mp_reach_start(buf, route.afi, route.safi, self);
            mp_reach_prefix(
                buf,
                route.safi,
                prefix,
                route.rd.as_ref(),
                route.label.as_ref(),
            );
            mp_reach_end(buf, start_pos);
        }

        // ORIGIN attribute.
        origin::encode(self.origin, buf);

        // AS_PATH attribute, rewritten for the destination.
        let mut as_path = match cxt.peer_type {
            PeerType::External => {
                let mut as_path = self.as_path.clone();
                if let Some(confed_id) = cxt.confed_id {
                    // Strip the confederation segments and put the
                    // confederation ID on the front.
                    as_path.strip_confed();
                    as_path.prepend(confed_id);
                } else if let Some(change_local_as) = cxt.change_local_as {
                    // With replace-as, only the configured AS goes out.
                    if !cxt.replace_as {
                        as_path.prepend(cxt.local_as);
                    }
                    as_path.prepend(change_local_as);
                } else {
                    as_path.prepend(cxt.local_as);
                }
                as_path
            }
            PeerType::Confederation => {
                let mut as_path = self.as_path.clone();
                as_path.prepend_confed(cxt.local_as);
                as_path
            }
            PeerType::Internal => self.as_path.clone(),
        };
        as_path.encode(
            buf,
            AttrFlags::TRANSITIVE,
            AttrType::AsPath,
            four_byte_asn_cap,
        );

        // A 2-byte AS session had any 4-byte AS numbers downgraded to
        // AS_TRANS above; the real path additionally goes out as AS4_PATH.
        let send_as4_path = !four_byte_asn_cap && as_path.has_as4();

        // NEXT_HOP attribute.
        if self.flag.has(AttrType::Nexthop) && route.is_ipv4_unicast() {
            nexthop::encode(self.nexthop, buf);
        }

        // MULTI_EXIT_DISC attribute.
        if let Some(metric) = self.med() {
            med::encode(metric, buf);
        }

        // LOCAL_PREF attribute.
        if cxt.peer_type.is_internal() {
            local_pref::encode(
                self.local_pref().unwrap_or(DFLT_LOCAL_PREF),
                buf,
            );
        }

        // ATOMIC_AGGREGATE attribute.
        if self.flag.has(AttrType::AtomicAggregate) {
            atomic_aggregate::encode(buf);
        }

        // AGGREGATOR attribute.
        let mut send_as4_aggregator = false;
        if let Some(aggregator) =
            self.extra.as_ref().and_then(|extra| extra.aggregator.as_ref())
        {
            let attr_flags = AttrFlags::OPTIONAL | AttrFlags::TRANSITIVE;
            buf.put_u8(attr_flags.bits());
            buf.put_u8(AttrType::Aggregator as u8);
            if four_byte_asn_cap {
                buf.put_u8(8);
                buf.put_u32(aggregator.asn);
            } else {
                buf.put_u8(6);
                if aggregator.asn > 65535 {
                    buf.put_u16(AS_TRANS);
                    // AS4_AGGREGATOR goes out too, later, to keep the
                    // attributes in ascending type order.
                    send_as4_aggregator = true;
                } else {
                    buf.put_u16(aggregator.asn as u16);
                }
            }
            buf.put_ipv4(&aggregator.identifier);
        }

        // COMMUNITIES attribute.
        if cxt.send_comm
            && let Some(comm) = &self.comm
        {
            comm.encode(buf);
        }

        // LARGE_COMMUNITY attribute.
        if cxt.send_large_comm
            && let Some(large_comm) =
                self.extra.as_ref().and_then(|extra| extra.large_comm.as_ref())
        {
            large_comm.encode(buf);
        }

        // Route Reflector attributes, emitted only between iBGP sessions.
        if cxt.peer_type == PeerType::Internal
            && let Some(from_peer) = &cxt.from_peer
            && from_peer.peer_type == PeerType::Internal
        {
            // ORIGINATOR_ID attribute.
            let originator_id = self
                .extra
                .as_ref()
                .and_then(|extra| extra.originator_id)
                .unwrap_or(from_peer.remote_id);
            originator_id::encode(originator_id, buf);

            // CLUSTER_LIST attribute, with the local cluster ID (or router
            // ID) on the front.
            let cluster_id = cxt.cluster_id.unwrap_or(cxt.router_id);
            buf.put_u8(AttrFlags::OPTIONAL.bits());
            buf.put_u8(AttrType::ClusterList as u8);
            match self
                .extra
                .as_ref()
                .and_then(|extra| extra.cluster_list.as_ref())
            {
                Some(cluster_list) => {
                    buf.put_u8((4 + cluster_list.0.len() * 4) as u8);
                    buf.put_ipv4(&cluster_id);
                    for entry in &cluster_list.0 {
                        buf.put_ipv4(entry);
                    }
                }
                None => {
                    buf.put_u8(4);
                    buf.put_ipv4(&cluster_id);
                }
            }
        }

        // EXTENDED COMMUNITIES attribute.
        if cxt.send_ext_comm
            && let Some(ext_comm) =
                self.extra.as_ref().and_then(|extra| extra.ext_comm.as_ref())
        {
            if cxt.peer_type.is_internal() {
                ext_comm.encode(buf);
            } else {
                // Only transitive entries cross an AS boundary.
                let transitive = ext_comm
                    .iter()
                    .filter(|comm| comm.is_transitive())
                    .copied()
                    .collect::<BTreeSet<_>>();
                if !transitive.is_empty() {
                    CommList(transitive).encode(buf);
                }
            }
        }

        // AS4_PATH attribute, without the confederation segments.
        if send_as4_path {
            as_path.strip_confed();
            as_path.encode(
                buf,
                AttrFlags::OPTIONAL | AttrFlags::TRANSITIVE,
                AttrType::As4Path,
                true,
            );
        }

        // AS4_AGGREGATOR attribute.
        if send_as4_aggregator
            && let Some(aggregator) =
                self.extra.as_ref().and_then(|extra| extra.aggregator.as_ref())
        {
            let attr_flags = AttrFlags::OPTIONAL | AttrFlags::TRANSITIVE;
            buf.put_u8(attr_flags.bits());
            buf.put_u8(AttrType::As4Aggregator as u8);
            buf.put_u8(8);
            buf.put_u32(aggregator.asn);
            buf.put_ipv4(&aggregator.identifier);
        }

        // Tunnel Encapsulation attribute.
        if route.safi.is_vpn_or_encap()
            && let Some(encap) =
                self.extra.as_ref().and_then(|extra| extra.encap.as_ref())
        {
            encap.encode(buf);
        }

        // Unknown transitive attributes, forwarded verbatim.
        if let Some(transit) =
            self.extra.as_ref().and_then(|extra| extra.transit.as_ref())
        {
            buf.put_slice(&transit.0);
        }
    }
}

// ===== ORIGIN attribute =====

mod origin {
    use super::*;
    const LEN: u8 = 1;

    pub(super) fn encode(origin: Origin, buf: &mut BytesMut) {
        buf.put_u8(AttrFlags::TRANSITIVE.bits());
        buf.put_u8(AttrType::Origin as u8);
        buf.put_u8(LEN);
        buf.put_u8(origin as u8);
    }

    pub(super) fn decode(
        buf: &mut Bytes,
        attr: &mut Attrs,
    ) -> Result<(), AttrMalformed> {
        if buf.remaining() != LEN as usize {
            return Err(AttrMalformed::Length);
        }

        let value = buf.get_u8();
        let Some(value) = Origin::from_u8(value) else {
            return Err(AttrMalformed::InvalidOrigin);
        };

        attr.origin = value;
        attr.flag.set(AttrType::Origin);
        Ok(())
    }
}

// ===== impl AsPath =====

impl AsPath {
    fn encode(
        &self,
        buf: &mut BytesMut,
        mut attr_flags: AttrFlags,
        attr_type: AttrType,
        four_byte_asns: bool,
    ) {
        attr_flags.insert(AttrFlags::EXTENDED);
        buf.put_u8(attr_flags.bits());
        buf.put_u8(attr_type as u8);

        // The length field will be initialized later.
        let start_pos = buf.len();
        buf.put_u16(0);

        // Encode attribute data.
        for segment in &self.segments {
            segment.encode(buf, four_byte_asns);
        }

        // Rewrite attribute length.
        let attr_len = (buf.len() - start_pos - 2) as u16;
        buf[start_pos..start_pos + 2].copy_from_slice(&attr_len.to_be_bytes());
    }

    fn decode(
        buf: &mut Bytes,
        four_byte_asns: bool,
    ) -> Result<Self, AttrMalformed> {
        // Decode AS path segments. A zero-length path is how iBGP peers
        // advertise locally originated routes.
        let mut segments = VecDeque::new();
        while buf.remaining() > 0 {
            let segment = AsPathSegment::decode(buf, four_byte_asns)?;
            segments.push_back(segment);
        }
        Ok(AsPath { segments })
    }

    pub fn path_length(&self) -> u32 {
        self.segments
            .iter()
            .map(|segment| match segment.seg_type {
                AsPathSegmentType::Set => 1,
                AsPathSegmentType::Sequence => segment.members.len(),
                // RFC 5065 - Section 5.3:
                // "When comparing routes using AS_PATH length, CONFED_SEQUENCE
                // and CONFED_SETs SHOULD NOT be counted".
                AsPathSegmentType::ConfedSequence
                | AsPathSegmentType::ConfedSet => 0,
            })
            .sum::<usize>() as u32
    }

    pub fn first(&self) -> Option<u32> {
        self.segments
            .front()
            .filter(|segment| segment.seg_type == AsPathSegmentType::Sequence)
            .and_then(|segment| segment.members.front().copied())
    }

    pub fn contains(&self, asn: u32) -> bool {
        self.segments.iter().any(|segment| segment.contains(asn))
    }

    pub fn prepend(&mut self, asn: u32) {
        if let Some(segment) = self.segments.front_mut()
            && segment.seg_type == AsPathSegmentType::Sequence
            && segment.members.len() < 255
        {
            segment.members.push_front(asn);
        } else {
            self.segments.push_front(AsPathSegment {
                seg_type: AsPathSegmentType::Sequence,
                members: [asn].into(),
            });
        }
    }

    pub fn prepend_confed(&mut self, asn: u32) {
        if let Some(segment) = self.segments.front_mut()
            && segment.seg_type == AsPathSegmentType::ConfedSequence
            && segment.members.len() < 255
        {
            segment.members.push_front(asn);
        } else {
            self.segments.push_front(AsPathSegment {
                seg_type: AsPathSegmentType::ConfedSequence,
                members: [asn].into(),
            });
        }
    }

    // Drops the leading confederation segments.
    pub fn strip_confed(&mut self) {
        while let Some(segment) = self.segments.front()
            && matches!(
                segment.seg_type,
                AsPathSegmentType::ConfedSequence | AsPathSegmentType::ConfedSet
            )
        {
            self.segments.pop_front();
        }
    }

    fn has_confed(&self) -> bool {
        self.segments.iter().any(|segment| {
            matches!(
                segment.seg_type,
                AsPathSegmentType::ConfedSequence | AsPathSegmentType::ConfedSet
            )
        })
    }

    // A path received from a confederation member must start with a
    // confederation sequence (or be empty).
    fn left_confed_ok(&self) -> bool {
        match self.segments.front() {
            Some(segment) => {
                segment.seg_type == AsPathSegmentType::ConfedSequence
            }
            None => true,
        }
    }

    pub(crate) fn has_as4(&self) -> bool {
        self.segments
            .iter()
            .flat_map(|segment| segment.members.iter())
            .any(|member| *member > 65535)
    }

    // Merges the 4-byte AS_PATH (AS4_PATH) into this 2-byte path: the
    // 4-byte segments replace the corresponding tail of the 2-byte path,
    // length-for-length, keeping whatever leading part (including
    // confederation segments) the AS4_PATH doesn't cover.
    fn reconcile_as4(&self, as4_path: &AsPath) -> AsPath {
        let hops = self.path_length();
        let as4_hops = as4_path.path_length();

        // An AS4_PATH longer than the AS_PATH can't be trusted; keep the
        // received path.
        if hops < as4_hops {
            return self.clone();
        }

        let mut merge = hops - as4_hops;
        let mut segments = VecDeque::new();
        for segment in &self.segments {
            match segment.seg_type {
                // Confederation segments don't count as hops; whatever
                // leads the path stays.
                AsPathSegmentType::ConfedSequence
                | AsPathSegmentType::ConfedSet => {
                    segments.push_back(segment.clone());
                }
                AsPathSegmentType::Set => {
                    if merge == 0 {
                        break;
                    }
                    segments.push_back(segment.clone());
                    merge -= 1;
                }
                AsPathSegmentType::Sequence => {
                    if merge == 0 {
                        break;
                    }
                    let take = (merge as usize).min(segment.members.len());
                    let members =
                        segment.members.iter().copied().take(take).collect();
                    segments.push_back(AsPathSegment {
                        seg_type: AsPathSegmentType::Sequence,
                        members,
                    });
                    merge -= take as u32;
                }
            }
        }
        for segment in &as4_path.segments {
            segments.push_back(segment.clone());
        }

        // Join adjacent sequence segments left over from the splice point.
        let mut normalized: VecDeque<AsPathSegment> = VecDeque::new();
        for segment in segments {
            if let Some(last) = normalized.back_mut()
                && last.seg_type == segment.seg_type
                && matches!(
                    segment.seg_type,
                    AsPathSegmentType::Sequence
                        | AsPathSegmentType::ConfedSequence
                )
            {
                last.members.extend(segment.members);
            } else {
                normalized.push_back(segment);
            }
        }

        AsPath {
            segments: normalized,
        }
    }
}

impl AsPathSegment {
    const MIN_LEN: u16 = 2;

    fn encode(&self, buf: &mut BytesMut, four_byte_asns: bool) {
        buf.put_u8(self.seg_type as u8);
        buf.put_u8(self.members.len() as u8);
        for member in &self.members {
            encode_asn(buf, *member, four_byte_asns);
        }
    }

    fn decode(
        buf: &mut Bytes,
        four_byte_asns: bool,
    ) -> Result<Self, AttrMalformed> {
        if buf.remaining() < Self::MIN_LEN as usize {
            return Err(AttrMalformed::AsPath);
        }

        // Decode segment type.
        let seg_type = buf.get_u8();
        let Some(seg_type) = AsPathSegmentType::from_u8(seg_type) else {
            return Err(AttrMalformed::AsPath);
        };

        // Decode segment length.
        let seg_len = buf.get_u8();
        if seg_len == 0 {
            return Err(AttrMalformed::AsPath);
        }
        let asn_size = if four_byte_asns { 4 } else { 2 };
        if buf.remaining() < seg_len as usize * asn_size {
            return Err(AttrMalformed::AsPath);
        }

        // Decode segment members.
        let members = (0..seg_len as usize)
            .map(|_| decode_asn(buf, four_byte_asns))
            .collect();
        let segment = AsPathSegment { seg_type, members };

        // RFC 7607's AS 0 processing.
        if segment.contains(0) {
            return Err(AttrMalformed::AsPath);
        }

        Ok(segment)
    }

    fn contains(&self, asn: u32) -> bool {
        self.members.iter().any(|member| asn == *member)
    }
}

// ===== NEXT_HOP attribute =====

pub(crate) mod nexthop {
    use super::*;
    const LEN: u8 = 4;

    pub(super) fn encode(addr: Ipv4Addr, buf: &mut BytesMut) {
        buf.put_u8(AttrFlags::TRANSITIVE.bits());
        buf.put_u8(AttrType::Nexthop as u8);
        buf.put_u8(LEN);
        buf.put_ipv4(&addr);
    }

    pub(super) fn decode(
        buf: &mut Bytes,
        cxt: &DecodeCxt,
        attr: &mut Attrs,
    ) -> Result<(), AttrMalformed> {
        if buf.remaining() != LEN as usize {
            return Err(AttrMalformed::Length);
        }

        let value = buf.get_ipv4();
        if value.is_martian() && !cxt.allow_martian_nexthop {
            Debug::MartianNexthop(value).log();
            return Err(AttrMalformed::InvalidNexthop);
        }

        attr.nexthop = value;
        attr.flag.set(AttrType::Nexthop);
        Ok(())
    }
}

// ===== MULTI_EXIT_DISC attribute =====

mod med {
    use super::*;
    const LEN: u8 = 4;

    pub(super) fn encode(metric: u32, buf: &mut BytesMut) {
        buf.put_u8(AttrFlags::OPTIONAL.bits());
        buf.put_u8(AttrType::Med as u8);
        buf.put_u8(LEN);
        buf.put_u32(metric);
    }

    pub(super) fn decode(
        buf: &mut Bytes,
        attr: &mut Attrs,
    ) -> Result<(), AttrMalformed> {
        if buf.remaining() != LEN as usize {
            return Err(AttrMalformed::Length);
        }

        attr.med = buf.get_u32();
        attr.flag.set(AttrType::Med);
        Ok(())
    }
}

// ===== LOCAL_PREF attribute =====

mod local_pref {
    use super::*;
    const LEN: u8 = 4;

    pub(super) fn encode(local_pref: u32, buf: &mut BytesMut) {
        buf.put_u8(AttrFlags::TRANSITIVE.bits());
        buf.put_u8(AttrType::LocalPref as u8);
        buf.put_u8(LEN);
        buf.put_u32(local_pref);
    }

    pub(super) fn decode(
        buf: &mut Bytes,
        cxt: &DecodeCxt,
        attr: &mut Attrs,
    ) -> Result<(), AttrMalformed> {
        if buf.remaining() != LEN as usize {
            return Err(AttrMalformed::Length);
        }

        // "If it is contained in an UPDATE message that is received from an
        // external peer, then this attribute MUST be ignored by the
        // receiving speaker."
        if cxt.peer_type == PeerType::External {
            buf.advance(LEN as usize);
            return Ok(());
        }

        attr.local_pref = buf.get_u32();
        attr.flag.set(AttrType::LocalPref);
        Ok(())
    }
}

// ===== ATOMIC_AGGREGATE attribute =====

mod atomic_aggregate {
    use super::*;
    const LEN: u8 = 0;

    pub(super) fn encode(buf: &mut BytesMut) {
        buf.put_u8(AttrFlags::TRANSITIVE.bits());
        buf.put_u8(AttrType::AtomicAggregate as u8);
        buf.put_u8(LEN);
    }

    pub(super) fn decode(
        buf: &mut Bytes,
        attr: &mut Attrs,
    ) -> Result<(), AttrMalformed> {
        if buf.remaining() != LEN as usize {
            return Err(AttrMalformed::Length);
        }

        attr.flag.set(AttrType::AtomicAggregate);
        Ok(())
    }
}

// ===== impl Aggregator =====

impl Aggregator {
    fn decode(
        buf: &mut Bytes,
        four_byte_asns: bool,
        attr: &mut Attrs,
    ) -> Result<(), AttrMalformed> {
        // A 4-byte AS peer sends an 8-byte aggregator, a 2-byte AS peer a
        // 6-byte one.
        let len = if four_byte_asns { 8 } else { 6 };
        if buf.remaining() != len {
            return Err(AttrMalformed::Length);
        }

        let asn = decode_asn(buf, four_byte_asns);
        let identifier = buf.get_ipv4();

        attr.extra_mut().aggregator = Some(Aggregator { asn, identifier });
        attr.flag.set(AttrType::Aggregator);
        Ok(())
    }

    fn decode_as4(
        buf: &mut Bytes,
        attr: &mut Attrs,
        as4_aggregator: &mut Option<Aggregator>,
    ) -> Result<(), AttrMalformed> {
        // AS4_AGGREGATOR always carries a 4-byte AS number.
        if buf.remaining() != 8 {
            return Err(AttrMalformed::Length);
        }

        let asn = buf.get_u32();
        let identifier = buf.get_ipv4();

        *as4_aggregator = Some(Aggregator { asn, identifier });
        attr.flag.set(AttrType::As4Aggregator);
        Ok(())
    }
}

// ===== ORIGINATOR_ID attribute =====

mod originator_id {
    use super::*;
    const LEN: u8 = 4;

    pub(super) fn encode(originator_id: Ipv4Addr, buf: &mut BytesMut) {
        buf.put_u8(AttrFlags::OPTIONAL.bits());
        buf.put_u8(AttrType::OriginatorId as u8);
        buf.put_u8(LEN);
        buf.put_ipv4(&originator_id);
    }

    pub(super) fn decode(
        buf: &mut Bytes,
        attr: &mut Attrs,
    ) -> Result<(), AttrMalformed> {
        if buf.remaining() != LEN as usize {
            return Err(AttrMalformed::Length);
        }

        attr.extra_mut().originator_id = Some(buf.get_ipv4());
        attr.flag.set(AttrType::OriginatorId);
        Ok(())
    }
}

// ===== impl ClusterList =====

impl ClusterList {
    fn decode(
        buf: &mut Bytes,
        cluster_list: &mut Option<Self>,
        flag: &mut AttrPresence,
    ) -> Result<(), AttrMalformed> {
        if buf.remaining() % 4 != 0 {
            return Err(AttrMalformed::Length);
        }

        let mut list = Vec::with_capacity(buf.remaining() / 4);
        while buf.remaining() > 0 {
            list.push(buf.get_ipv4());
        }

        *cluster_list = Some(ClusterList(list));
        flag.set(AttrType::ClusterList);
        Ok(())
    }

    // Reflection loop check: whether this router's ID already appears in
    // the list.
    pub fn contains(&self, id: Ipv4Addr) -> bool {
        self.0.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// ===== MP_REACH_NLRI attribute =====

mod mp_reach {
    use super::*;
    pub(super) const MIN_LEN: usize = 5;

    pub(super) fn decode(
        buf: &mut Bytes,
        attr: &mut Attrs,
        mp_reach: &mut Option<MpReachNlri>,
    ) -> Result<(), AttrMalformed> {
        if buf.remaining() < MIN_LEN {
            return Err(AttrMalformed::MalformedList);
        }

        // Load AFI, SAFI. The NLRI blob is handed back raw, so unknown
        // values are the caller's business.
        let afi = buf.get_u16();
        let safi = buf.get_u8();

        // Parse nexthop.
        let nexthop_len = buf.get_u8();
        if buf.remaining() < nexthop_len as usize {
            return Err(AttrMalformed::MalformedList);
        }
        let nexthop = match nexthop_len {
            4 => MpNexthop::Ipv4(buf.get_ipv4()),
            12 => {
                let _rd = buf.get_u64();
                MpNexthop::VpnIpv4(buf.get_ipv4())
            }
            16 => MpNexthop::Ipv6(buf.get_ipv6()),
            24 => {
                let _rd = buf.get_u64();
                MpNexthop::VpnIpv6(buf.get_ipv6())
            }
            32 | 48 => {
                let vpn = nexthop_len == 48;
                if vpn {
                    let _rd = buf.get_u64();
                }
                let global = buf.get_ipv6();
                if vpn {
                    let _rd = buf.get_u64();
                }
                let link_local = buf.get_ipv6();
                if !link_local.is_link_local() {
                    // Keep only the global nexthop.
                    Debug::NexthopNotLinkLocal.log();
                    MpNexthop::Ipv6(global)
                } else if vpn {
                    MpNexthop::VpnIpv6Dual { global, link_local }
                } else {
                    MpNexthop::Ipv6Dual { global, link_local }
                }
            }
            _ => return Err(AttrMalformed::MalformedList),
        };

        // RFC 2283 compatibility: a 4-byte MP nexthop doubles as the plain
        // nexthop when none was received.
        if let MpNexthop::Ipv4(addr) = nexthop
            && attr.nexthop.is_unspecified()
        {
            attr.nexthop = addr;
        }

        // Reserved SNPA-length octet.
        if buf.remaining() == 0 {
            return Err(AttrMalformed::MalformedList);
        }
        let snpa = buf.get_u8();
        if snpa != 0 {
            Debug::NonZeroSnpaLength(snpa).log();
        }

        // What is left of the attribute is the NLRI.
        if buf.remaining() == 0 {
            return Err(AttrMalformed::MalformedList);
        }
        let nlri = buf.copy_to_bytes(buf.remaining());

        attr.extra_mut().mp_nexthop = Some(nexthop);
        attr.flag.set(AttrType::MpReachNlri);
        *mp_reach = Some(MpReachNlri { afi, safi, nlri });
        Ok(())
    }
}

// ===== MP_UNREACH_NLRI attribute =====

mod mp_unreach {
    use super::*;
    pub(super) const MIN_LEN: usize = 3;

    pub(super) fn decode(
        buf: &mut Bytes,
        attr: &mut Attrs,
        mp_unreach: &mut Option<MpUnreachNlri>,
    ) -> Result<(), AttrMalformed> {
        if buf.remaining() < MIN_LEN {
            return Err(AttrMalformed::MalformedList);
        }

        let afi = buf.get_u16();
        let safi = buf.get_u8();

        // An empty withdrawal blob is legal (End-of-RIB for the family).
        let nlri = buf.copy_to_bytes(buf.remaining());

        attr.flag.set(AttrType::MpUnreachNlri);
        *mp_unreach = Some(MpUnreachNlri { afi, safi, nlri });
        Ok(())
    }
}

// ===== impl Comm =====

impl CommType for Comm {
    const TYPE: AttrType = AttrType::Communities;
    const LENGTH: usize = 4;

    fn encode(&self, buf: &mut BytesMut) {
        buf.put_u32(self.0);
    }

    fn decode(buf: &mut Bytes) -> Self {
        let value = buf.get_u32();
        Self(value)
    }
}

// ===== impl ExtComm =====

impl CommType for ExtComm {
    const TYPE: AttrType = AttrType::ExtCommunities;
    const LENGTH: usize = 8;

    fn encode(&self, buf: &mut BytesMut) {
        buf.put_slice(&self.0);
    }

    fn decode(buf: &mut Bytes) -> Self {
        let mut value = [0; 8];
        buf.copy_to_slice(&mut value);
        Self(value)
    }
}

// ===== impl LargeComm =====

impl CommType for LargeComm {
    const TYPE: AttrType = AttrType::LargeCommunity;
    const LENGTH: usize = 12;

    fn encode(&self, buf: &mut BytesMut) {
        buf.put_slice(&self.0);
    }

    fn decode(buf: &mut Bytes) -> Self {
        let mut value = [0; 12];
        buf.copy_to_slice(&mut value);
        Self(value)
    }
}

// ===== impl CommList =====

impl<T: CommType> CommList<T> {
    fn encode(&self, buf: &mut BytesMut) {
        let len = self.0.len() * T::LENGTH;
        if len > 255 {
            let attr_flags = AttrFlags::OPTIONAL
                | AttrFlags::TRANSITIVE
                | AttrFlags::EXTENDED;
            buf.put_u8(attr_flags.bits());
            buf.put_u8(T::TYPE as u8);
            buf.put_u16(len as u16);
        } else {
            let attr_flags = AttrFlags::OPTIONAL | AttrFlags::TRANSITIVE;
            buf.put_u8(attr_flags.bits());
            buf.put_u8(T::TYPE as u8);
            buf.put_u8(len as u8);
        }

        for value in &self.0 {
            value.encode(buf);
        }
    }

    fn decode(
        buf: &mut Bytes,
        comm: &mut Option<Self>,
        flag: &mut AttrPresence,
    ) -> Result<(), AttrMalformed> {
        // An empty list isn't invalid per se; it just carries no value.
        if buf.remaining() == 0 {
            return Ok(());
        }
        if buf.remaining() % T::LENGTH != 0 {
            return Err(AttrMalformed::Optional);
        }

        let mut list = BTreeSet::new();
        while buf.remaining() >= T::LENGTH {
            let value = T::decode(buf);
            list.insert(value);
        }

        *comm = Some(CommList(list));
        flag.set(T::TYPE);
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.0.iter()
    }
}

// ===== MP_REACH_NLRI / MP_UNREACH_NLRI encoding =====

// Starts an MP_REACH_NLRI attribute: header, AFI/SAFI and nexthop. Returns
// the position of the length field, to be patched by `mp_reach_end` once
// the prefixes are in.
pub fn mp_reach_start(
    buf: &mut BytesMut,
    afi: Afi,
    safi: Safi,
    attr: &Attrs,
) -> usize {
    // Set the extended bit always to encode the attribute length as 2 bytes.
    buf.put_u8((AttrFlags::OPTIONAL | AttrFlags::EXTENDED).bits());
    buf.put_u8(AttrType::MpReachNlri as u8);
    let start_pos = buf.len();
    buf.put_u16(0);

    buf.put_u16(afi as u16);
    buf.put_u8(safi as u8);

    // Nexthop, sized per family; the route distinguisher embedded in VPN
    // nexthops is always zero.
    let mp_nexthop = attr.extra.as_ref().and_then(|extra| extra.mp_nexthop);
    match afi {
        Afi::Ipv4 => {
            let addr = match mp_nexthop {
                Some(MpNexthop::Ipv4(addr) | MpNexthop::VpnIpv4(addr)) => addr,
                _ => attr.nexthop,
            };
            if safi == Safi::LabeledVpn {
                buf.put_u8(12);
                buf.put_u64(0);
                buf.put_ipv4(&addr);
            } else {
                buf.put_u8(4);
                buf.put_ipv4(&addr);
            }
        }
        Afi::Ipv6 => {
            let (global, link_local) = match mp_nexthop {
                Some(
                    MpNexthop::Ipv6(addr) | MpNexthop::VpnIpv6(addr),
                ) => (addr, None),
                Some(
                    MpNexthop::Ipv6Dual { global, link_local }
                    | MpNexthop::VpnIpv6Dual { global, link_local },
                ) => (global, Some(link_local)),
                _ => (Ipv6Addr::UNSPECIFIED, None),
            };
            match (safi == Safi::LabeledVpn, link_local) {
                (false, None) => {
                    buf.put_u8(16);
                    buf.put_ipv6(&global);
                }
                (false, Some(link_local)) => {
                    buf.put_u8(32);
                    buf.put_ipv6(&global);
                    buf.put_ipv6(&link_local);
                }
                (true, None) => {
                    buf.put_u8(24);
                    buf.put_u64(0);
                    buf.put_ipv6(&global);
                }
                (true, Some(link_local)) => {
                    buf.put_u8(48);
                    buf.put_u64(0);
                    buf.put_ipv6(&global);
                    buf.put_u64(0);
                    buf.put_ipv6(&link_local);
                }
            }
        }
    }

    // Defunct SNPA-length field.
    buf.put_u8(0);
    start_pos
}

// Appends one prefix to an open MP_REACH_NLRI attribute. VPN prefixes carry
// the MPLS label and route distinguisher in front of the address bits.
pub fn mp_reach_prefix(
    buf: &mut BytesMut,
    safi: Safi,
    prefix: &IpNetwork,
    rd: Option<&RouteDistinguisher>,
    label: Option<&[u8; 3]>,
) {
    if safi == Safi::LabeledVpn {
        buf.put_u8(prefix.prefix() + 88);
        match label {
            Some(label) => buf.put_slice(label),
            None => buf.put_slice(&[0; 3]),
        }
        match rd {
            Some(rd) => buf.put_slice(&rd.0),
            None => buf.put_slice(&[0; 8]),
        }
        let plen_wire = prefix_wire_len(prefix.prefix());
        match prefix {
            IpNetwork::V4(prefix) => {
                buf.put_slice(&prefix.ip().octets()[..plen_wire])
            }
            IpNetwork::V6(prefix) => {
                buf.put_slice(&prefix.ip().octets()[..plen_wire])
            }
        }
    } else {
        match prefix {
            IpNetwork::V4(prefix) => encode_ipv4_prefix(buf, prefix),
            IpNetwork::V6(prefix) => encode_ipv6_prefix(buf, prefix),
        }
    }
}

pub fn mp_reach_end(buf: &mut BytesMut, start_pos: usize) {
    // Don't count the 2 bytes used to encode the length itself.
    let attr_len = (buf.len() - start_pos - 2) as u16;
    buf[start_pos..start_pos + 2].copy_from_slice(&attr_len.to_be_bytes());
}

// Starts an MP_UNREACH_NLRI attribute; prefixes follow via
// `mp_unreach_prefix` and the length is patched by `mp_unreach_end`.
pub fn mp_unreach_start(buf: &mut BytesMut, afi: Afi, safi: Safi) -> usize {
    buf.put_u8((AttrFlags::OPTIONAL | AttrFlags::EXTENDED).bits());
    buf.put_u8(AttrType::MpUnreachNlri as u8);
    let start_pos = buf.len();
    buf.put_u16(0);

    buf.put_u16(afi as u16);
    buf.put_u8(safi as u8);
    start_pos
}

pub fn mp_unreach_prefix(
    buf: &mut BytesMut,
    safi: Safi,
    prefix: &IpNetwork,
    rd: Option<&RouteDistinguisher>,
    label: Option<&[u8; 3]>,
) {
    mp_reach_prefix(buf, safi, prefix, rd, label);
}

pub fn mp_unreach_end(buf: &mut BytesMut, start_pos: usize) {
    mp_reach_end(buf, start_pos);
}

// ===== helper functions =====

// Required flags per attribute type. EXTENDED is masked off when testing,
// as is PARTIAL for optional transitive attributes, which intermediate
// speakers may legitimately set.
fn attribute_flags(attr_type: AttrType) -> AttrFlags {
    match attr_type {
        // Well-known.
        AttrType::Origin
        | AttrType::AsPath
        | AttrType::Nexthop
        | AttrType::LocalPref
        | AttrType::AtomicAggregate => AttrFlags::TRANSITIVE,

        // Optional non-transitive.
        AttrType::Med
        | AttrType::OriginatorId
        | AttrType::ClusterList
        | AttrType::MpReachNlri
        | AttrType::MpUnreachNlri => AttrFlags::OPTIONAL,

        // Optional transitive.
        AttrType::Aggregator
        | AttrType::Communities
        | AttrType::ExtCommunities
        | AttrType::As4Path
        | AttrType::As4Aggregator
        | AttrType::TunnelEncap
        | AttrType::LargeCommunity => {
            AttrFlags::TRANSITIVE | AttrFlags::OPTIONAL
        }
    }
}

fn attr_flags_invalid(attr_type: AttrType, attr_flags: AttrFlags) -> bool {
    let desired = attribute_flags(attr_type);

    let mut mask = AttrFlags::EXTENDED;
    if attr_flags.contains(AttrFlags::OPTIONAL)
        && attr_flags.contains(AttrFlags::TRANSITIVE)
    {
        mask.insert(AttrFlags::PARTIAL);
    }

    (attr_flags & !mask) != desired
}

// Decides what to do about a malformed attribute (RFC 7606). This is the
// only place making that decision; decoders just report what went wrong.
fn malformed(
    attr: &mut Attrs,
    cxt: &DecodeCxt,
    attr_type_raw: u8,
    attr_flags: AttrFlags,
    reason: AttrMalformed,
    raw: &Bytes,
) -> AttrError {
    // The malformed attribute must not be carried forward should parsing
    // proceed.
    attr.flag.clear_raw(attr_type_raw);

    let error = reason.to_error(raw.clone());

    // Only relax error handling for eBGP peers; an internal sender is under
    // this speaker's own administration and shouldn't be producing garbage.
    if cxt.peer_type != PeerType::External {
        return AttrError::Reset(error);
    }

    match AttrType::from_u8(attr_type_raw) {
        // Attributes that don't affect route selection are simply dropped
        // and the route processed as normal.
        Some(
            AttrType::Aggregator
            | AttrType::As4Aggregator
            | AttrType::AtomicAggregate,
        ) => AttrError::Discard,

        // Core attributes, which may influence route selection, always
        // cause a session reset.
        Some(
            AttrType::Origin
            | AttrType::AsPath
            | AttrType::Nexthop
            | AttrType::Med
            | AttrType::LocalPref
            | AttrType::Communities
            | AttrType::OriginatorId
            | AttrType::ClusterList
            | AttrType::MpReachNlri
            | AttrType::MpUnreachNlri
            | AttrType::ExtCommunities,
        ) => AttrError::Reset(error),

        // Partial optional transitive attributes were likely mangled
        // somewhere upstream, not by the sending neighbor; treating the
        // route as withdrawn beats resetting the session.
        _ => {
            if attr_flags.contains(
                AttrFlags::TRANSITIVE
                    | AttrFlags::OPTIONAL
                    | AttrFlags::PARTIAL,
            ) {
                AttrError::Withdraw
            } else {
                AttrError::Reset(error)
            }
        }
    }
}

// Well-known mandatory attribute check. Deliberately falls through every
// test, so the last missing attribute is the one reported.
fn check_mandatory(
    cxt: &DecodeCxt,
    attr: &Attrs,
) -> Result<(), UpdateMessageError> {
    // Graceful-Restart End-of-RIB is signaled as an empty UPDATE.
    if attr.flag.is_empty()
        && cxt.capabilities.iter().any(|cap| cap.is_graceful_restart())
    {
        return Ok(());
    }

    // An UPDATE carrying only MP_UNREACH_NLRI need not carry anything else.
    if attr.flag.only(AttrType::MpUnreachNlri) {
        return Ok(());
    }

    let mut missing = 0;
    if !attr.flag.has(AttrType::Origin) {
        missing = AttrType::Origin as u8;
    }
    if !attr.flag.has(AttrType::AsPath) {
        missing = AttrType::AsPath as u8;
    }
    // NEXT_HOP may be replaced by an MP_REACH_NLRI nexthop.
    if !attr.flag.has(AttrType::Nexthop)
        && !attr.flag.has(AttrType::MpReachNlri)
    {
        missing = AttrType::Nexthop as u8;
    }
    if cxt.peer_type == PeerType::Internal
        && !attr.flag.has(AttrType::LocalPref)
    {
        missing = AttrType::LocalPref as u8;
    }

    if missing != 0 {
        Debug::AttrMissing(missing).log();
        return Err(UpdateMessageError::MissingWellKnownAttribute(missing));
    }
    Ok(())
}

// Reconciles AGGREGATOR/AS4_AGGREGATOR and AS_PATH/AS4_PATH once all
// attributes are in (RFC 6793).
fn reconcile_as4(
    attr: &mut Attrs,
    four_byte_asn_cap: bool,
    as4_path: Option<AsPath>,
    as4_aggregator: Option<Aggregator>,
) {
    // A 4-byte capable peer has no business sending AS4 attributes; they
    // are ignored.
    if four_byte_asn_cap {
        if attr.flag.has(AttrType::As4Path) {
            Debug::As4SuperfluousPath.log();
        }
        if attr.flag.has(AttrType::As4Aggregator) {
            Debug::As4SuperfluousAggregator.log();
        }
        return;
    }

    // Look at AS4_AGGREGATOR first because it may override AS4_PATH.
    let mut ignore_as4_path = false;
    if let Some(as4_aggregator) = as4_aggregator {
        if attr.flag.has(AttrType::Aggregator) {
            let extra = attr.extra_mut();
            if let Some(aggregator) = &mut extra.aggregator {
                if aggregator.asn != AS_TRANS as u32 {
                    // The 2-byte speaker that aggregated is presumed
                    // authoritative; both AS4 attributes are dropped.
                    Debug::As4AggregatorIgnored.log();
                    ignore_as4_path = true;
                } else {
                    *aggregator = as4_aggregator;
                }
            }
        } else {
            // AS4_AGGREGATOR without AGGREGATOR is bogus, but it's handled
            // as if AGGREGATOR with AS_TRANS had been there.
            Debug::As4AggregatorMissingAggregator.log();
            attr.extra_mut().aggregator = Some(as4_aggregator);
            attr.flag.set(AttrType::Aggregator);
        }
    }

    if !ignore_as4_path
        && attr.flag.has(AttrType::As4Path)
        && let Some(as4_path) = as4_path
    {
        attr.as_path = attr.as_path.reconcile_as4(&as4_path);
    }
}

// AS path sanity checks that must wait for a potentially reconciled path.
fn aspath_check(
    cxt: &DecodeCxt,
    attr: &mut Attrs,
) -> Result<(), UpdateMessageError> {
    // Confederation sanity check.
    if (cxt.peer_type == PeerType::Confederation
        && !attr.as_path.left_confed_ok())
        || (cxt.peer_type == PeerType::External && attr.as_path.has_confed())
    {
        return Err(UpdateMessageError::MalformedAsPath);
    }

    // First AS check for eBGP peers.
    if cxt.enforce_first_as
        && cxt.peer_type == PeerType::External
        && attr.as_path.first() != Some(cxt.peer_as)
    {
        return Err(UpdateMessageError::MalformedAsPath);
    }

    // local-as prepend.
    if let Some(change_local_as) = cxt.change_local_as
        && !cxt.local_as_no_prepend
    {
        attr.as_path.prepend(change_local_as);
    }

    Ok(())
}

fn raw_attr(attr_flags: AttrFlags, attr_type: u8, value: &Bytes) -> Bytes {
    let mut raw = BytesMut::with_capacity(value.len() + 4);
    raw.put_u8(attr_flags.bits());
    raw.put_u8(attr_type);
    if attr_flags.contains(AttrFlags::EXTENDED) {
        raw.put_u16(value.len() as u16);
    } else {
        raw.put_u8(value.len() as u8);
    }
    raw.put_slice(value);
    raw.freeze()
}

fn bitmap_get(bitmap: &[u8; 32], attr_type: u8) -> bool {
    bitmap[(attr_type / 8) as usize] & (1 << (attr_type % 8)) != 0
}

fn bitmap_set(bitmap: &mut [u8; 32], attr_type: u8) {
    bitmap[(attr_type / 8) as usize] |= 1 << (attr_type % 8);
}

fn encode_asn(buf: &mut BytesMut, asn: u32, four_byte_asns: bool) {
    if four_byte_asns {
        buf.put_u32(asn)
    } else if asn > 65535 {
        buf.put_u16(AS_TRANS)
    } else {
        buf.put_u16(asn as u16)
    }
}

fn decode_asn(buf: &mut Bytes, four_byte_asns: bool) -> u32 {
    if four_byte_asns {
        buf.get_u32()
    } else {
        buf.get_u16() as u32
    }
}
