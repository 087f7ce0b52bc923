//
// Copyright (c) The Skua Project Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::{Ipv4Addr, Ipv6Addr};

use skua_bgp::neighbor::PeerType;
use skua_bgp::packet::attribute::{AttrsResult, MpNexthop};
use skua_bgp::packet::consts::{AttrType, Origin};
use skua_bgp::packet::error::UpdateMessageError;
use skua_bgp::packet::message::NegotiatedCapability;

use super::*;

#[test]
fn test_decode_origin() {
    let cxt = decode_cxt(PeerType::External, &[]);
    let attrs = decode_ok(&base_block(), &cxt);

    assert_eq!(attrs.origin, Origin::Igp);
    assert!(attrs.flag.has(AttrType::Origin));
    assert_eq!(attrs.nexthop(), Some(Ipv4Addr::new(192, 0, 2, 254)));
    assert_eq!(attrs.as_path.first(), Some(64500));
}

#[test]
fn test_decode_origin_bad_length() {
    let cxt = decode_cxt(PeerType::External, &[]);
    let data = block(&[
        attr(0x40, 1, &[0, 0]),
        as_path_attr2(&[64500]),
        nexthop_attr(),
    ]);
    let (result, _, _) = decode(&data, &cxt);

    // Origin is a core attribute, no leniency even for eBGP peers.
    assert!(matches!(
        result,
        Err(UpdateMessageError::AttributeLengthError(_))
    ));
}

#[test]
fn test_decode_origin_invalid_value() {
    let cxt = decode_cxt(PeerType::External, &[]);
    let data = block(&[
        attr(0x40, 1, &[9]),
        as_path_attr2(&[64500]),
        nexthop_attr(),
    ]);
    let (result, _, _) = decode(&data, &cxt);

    assert!(matches!(
        result,
        Err(UpdateMessageError::InvalidOriginAttribute(_))
    ));
}

#[test]
fn test_decode_duplicate_attribute() {
    let cxt = decode_cxt(PeerType::External, &[]);
    let data = block(&[
        origin_attr(),
        origin_attr(),
        as_path_attr2(&[64500]),
        nexthop_attr(),
    ]);
    let (result, _, _) = decode(&data, &cxt);

    assert_eq!(result, Err(UpdateMessageError::MalformedAttributeList));
}

#[test]
fn test_decode_truncated_header() {
    let cxt = decode_cxt(PeerType::External, &[]);
    let (result, _, _) = decode(&[0x40, 0x01], &cxt);

    assert!(matches!(
        result,
        Err(UpdateMessageError::AttributeLengthError(_))
    ));
}

#[test]
fn test_decode_length_overrun() {
    let cxt = decode_cxt(PeerType::External, &[]);
    // Origin declaring 10 bytes of value with only one present.
    let (result, _, _) = decode(&[0x40, 0x01, 0x0A, 0x00], &cxt);

    assert!(matches!(
        result,
        Err(UpdateMessageError::AttributeLengthError(_))
    ));
}

#[test]
fn test_decode_missing_nexthop() {
    let cxt = decode_cxt(PeerType::External, &[]);
    let data = block(&[origin_attr(), as_path_attr2(&[64500])]);
    let (result, _, _) = decode(&data, &cxt);

    assert_eq!(
        result,
        Err(UpdateMessageError::MissingWellKnownAttribute(
            AttrType::Nexthop as u8
        ))
    );
}

#[test]
fn test_decode_missing_reports_last() {
    // With both ORIGIN and NEXT_HOP missing, only the latter is reported.
    let cxt = decode_cxt(PeerType::External, &[]);
    let data = block(&[as_path_attr2(&[64500])]);
    let (result, _, _) = decode(&data, &cxt);

    assert_eq!(
        result,
        Err(UpdateMessageError::MissingWellKnownAttribute(
            AttrType::Nexthop as u8
        ))
    );
}

#[test]
fn test_decode_missing_local_pref_ibgp() {
    let cxt = decode_cxt(PeerType::Internal, &[]);
    let data = base_block();
    let (result, _, _) = decode(&data, &cxt);

    assert_eq!(
        result,
        Err(UpdateMessageError::MissingWellKnownAttribute(
            AttrType::LocalPref as u8
        ))
    );
}

#[test]
fn test_decode_end_of_rib() {
    // An empty attribute block from a graceful-restart peer is the
    // End-of-RIB marker.
    let cxt = decode_cxt(
        PeerType::External,
        &[NegotiatedCapability::GracefulRestart],
    );
    let attrs = decode_ok(&[], &cxt);
    assert!(attrs.flag.is_empty());

    // Without the capability the empty block is short of its mandatory
    // attributes.
    let cxt = decode_cxt(PeerType::External, &[]);
    let (result, _, _) = decode(&[], &cxt);
    assert!(matches!(
        result,
        Err(UpdateMessageError::MissingWellKnownAttribute(_))
    ));
}

#[test]
fn test_decode_local_pref_ebgp_ignored() {
    let cxt = decode_cxt(PeerType::External, &[]);
    let data = block(&[
        origin_attr(),
        as_path_attr2(&[64500]),
        nexthop_attr(),
        local_pref_attr(200),
    ]);
    let attrs = decode_ok(&data, &cxt);

    // Bytes consumed, value not taken.
    assert_eq!(attrs.local_pref(), None);
}

#[test]
fn test_decode_local_pref_ibgp() {
    let cxt = decode_cxt(PeerType::Internal, &[]);
    let attrs = decode_ok(&base_block_ibgp(), &cxt);

    assert_eq!(attrs.local_pref(), Some(100));
}

#[test]
fn test_decode_martian_nexthop() {
    let data = block(&[
        origin_attr(),
        as_path_attr2(&[64500]),
        attr(0x40, 3, &[127, 0, 0, 1]),
    ]);

    // NEXT_HOP is a core attribute, so even an eBGP peer gets the session
    // reset.
    let cxt = decode_cxt(PeerType::External, &[]);
    let (result, _, _) = decode(&data, &cxt);
    assert!(matches!(
        result,
        Err(UpdateMessageError::InvalidNexthopAttribute(_))
    ));

    // The debug override lets loopback nexthops through.
    let mut cxt = decode_cxt(PeerType::External, &[]);
    cxt.allow_martian_nexthop = true;
    let attrs = decode_ok(&data, &cxt);
    assert_eq!(attrs.nexthop(), Some(Ipv4Addr::new(127, 0, 0, 1)));
}

#[test]
fn test_decode_flags_error() {
    // ORIGIN flagged optional.
    let cxt = decode_cxt(PeerType::External, &[]);
    let data = block(&[
        attr(0xC0, 1, &[0]),
        as_path_attr2(&[64500]),
        nexthop_attr(),
    ]);
    let (result, _, _) = decode(&data, &cxt);

    assert!(matches!(
        result,
        Err(UpdateMessageError::AttributeFlagsError(_))
    ));
}

#[test]
fn test_decode_malformed_aggregator_dropped() {
    // A malformed AGGREGATOR doesn't affect route selection; from an eBGP
    // peer it is dropped and the rest of the route survives.
    let cxt = decode_cxt(PeerType::External, &[]);
    let data = block(&[
        origin_attr(),
        as_path_attr2(&[64500]),
        nexthop_attr(),
        attr(0xC0, 7, &[0xFB, 0xF4, 10, 0]),
    ]);
    let attrs = decode_ok(&data, &cxt);

    assert!(!attrs.flag.has(AttrType::Aggregator));
    assert!(attrs.flag.has(AttrType::Origin));
}

#[test]
fn test_decode_malformed_aggregator_ibgp() {
    // No leniency for internal peers.
    let cxt = decode_cxt(PeerType::Internal, &[]);
    let data = block(&[
        origin_attr(),
        attr(0x40, 2, &[]),
        nexthop_attr(),
        local_pref_attr(100),
        attr(0xC0, 7, &[0xFB, 0xF4, 10, 0]),
    ]);
    let (result, _, _) = decode(&data, &cxt);

    assert!(matches!(
        result,
        Err(UpdateMessageError::AttributeLengthError(_))
    ));
}

#[test]
fn test_decode_atomic_aggregate_bad_length() {
    let cxt = decode_cxt(PeerType::External, &[]);
    let data = block(&[
        origin_attr(),
        as_path_attr2(&[64500]),
        nexthop_attr(),
        attr(0x40, 6, &[1]),
    ]);
    let attrs = decode_ok(&data, &cxt);

    assert!(!attrs.flag.has(AttrType::AtomicAggregate));
}

#[test]
fn test_decode_unknown_well_known() {
    // Transitive but not optional: an unrecognized well-known attribute.
    let cxt = decode_cxt(PeerType::External, &[]);
    let data = block(&[
        origin_attr(),
        as_path_attr2(&[64500]),
        nexthop_attr(),
        attr(0x40, 99, &[1, 2]),
    ]);
    let (result, _, _) = decode(&data, &cxt);

    assert!(matches!(
        result,
        Err(UpdateMessageError::UnrecognizedWellKnownAttribute(_))
    ));
}

#[test]
fn test_decode_unknown_optional_nontransitive() {
    let cxt = decode_cxt(PeerType::External, &[]);
    let data = block(&[
        origin_attr(),
        as_path_attr2(&[64500]),
        nexthop_attr(),
        attr(0x80, 99, &[1, 2]),
    ]);
    let attrs = decode_ok(&data, &cxt);

    // Quietly ignored, not forwarded.
    assert!(attrs.extra.is_none());
}

#[test]
fn test_decode_unknown_optional_transitive() {
    let cxt = decode_cxt(PeerType::External, &[]);
    let data = block(&[
        origin_attr(),
        as_path_attr2(&[64500]),
        nexthop_attr(),
        attr(0xC0, 99, &[1, 2]),
    ]);
    let attrs = decode_ok(&data, &cxt);

    // Kept raw, with the Partial bit set in the flags octet.
    let transit = attrs.extra.unwrap().transit.unwrap();
    assert_eq!(&transit.0[..], &[0xE0, 99, 2, 1, 2]);
}

#[test]
fn test_decode_partial_optional_withdraw() {
    // A malformed partial optional transitive attribute (bad
    // LARGE_COMMUNITY length) turns the route into a withdrawal for eBGP
    // peers.
    let cxt = decode_cxt(PeerType::External, &[]);
    let data = block(&[
        origin_attr(),
        as_path_attr2(&[64500]),
        nexthop_attr(),
        attr(0xE0, 32, &[1, 2, 3, 4, 5]),
    ]);
    let (result, _, _) = decode(&data, &cxt);

    assert_eq!(result, Ok(AttrsResult::Withdraw));
}

#[test]
fn test_decode_large_comm_bad_length() {
    // Same failure without the Partial bit resets the session.
    let cxt = decode_cxt(PeerType::External, &[]);
    let data = block(&[
        origin_attr(),
        as_path_attr2(&[64500]),
        nexthop_attr(),
        attr(0xC0, 32, &[1, 2, 3, 4, 5]),
    ]);
    let (result, _, _) = decode(&data, &cxt);

    assert!(matches!(
        result,
        Err(UpdateMessageError::OptionalAttributeError(_))
    ));
}

#[test]
fn test_decode_communities() {
    let cxt = decode_cxt(PeerType::External, &[]);
    let data = block(&[
        origin_attr(),
        as_path_attr2(&[64500]),
        nexthop_attr(),
        attr(0xC0, 8, &[0xFF, 0xFF, 0xFF, 0x01, 0x00, 0x01, 0x00, 0x02]),
    ]);
    let attrs = decode_ok(&data, &cxt);

    let comm = attrs.comm.unwrap();
    assert_eq!(comm.0.len(), 2);
    assert!(comm.iter().any(|comm| comm.0 == 0xFFFFFF01));
}

#[test]
fn test_decode_communities_empty() {
    // Zero length means "no value", not an error.
    let cxt = decode_cxt(PeerType::External, &[]);
    let data = block(&[
        origin_attr(),
        as_path_attr2(&[64500]),
        nexthop_attr(),
        attr(0xC0, 8, &[]),
    ]);
    let attrs = decode_ok(&data, &cxt);

    assert!(attrs.comm.is_none());
    assert!(!attrs.flag.has(AttrType::Communities));
}

#[test]
fn test_decode_communities_bad_length() {
    let cxt = decode_cxt(PeerType::External, &[]);
    let data = block(&[
        origin_attr(),
        as_path_attr2(&[64500]),
        nexthop_attr(),
        attr(0xC0, 8, &[0, 1, 2]),
    ]);
    let (result, _, _) = decode(&data, &cxt);

    assert!(matches!(
        result,
        Err(UpdateMessageError::OptionalAttributeError(_))
    ));
}

#[test]
fn test_decode_cluster_list() {
    let cxt = decode_cxt(PeerType::Internal, &[]);
    let data = block(&[
        origin_attr(),
        attr(0x40, 2, &[]),
        nexthop_attr(),
        local_pref_attr(100),
        attr(0x80, 9, &[10, 0, 0, 9]),
        attr(0x80, 10, &[10, 0, 0, 1, 10, 0, 0, 2]),
    ]);
    let attrs = decode_ok(&data, &cxt);

    let extra = attrs.extra.unwrap();
    assert_eq!(extra.originator_id, Some(Ipv4Addr::new(10, 0, 0, 9)));
    let cluster_list = extra.cluster_list.unwrap();
    assert_eq!(
        cluster_list.0,
        vec![Ipv4Addr::new(10, 0, 0, 1), Ipv4Addr::new(10, 0, 0, 2)]
    );
    assert!(cluster_list.contains(Ipv4Addr::new(10, 0, 0, 2)));
    assert!(!cluster_list.contains(Ipv4Addr::new(10, 0, 0, 3)));
}

#[test]
fn test_decode_cluster_list_bad_length() {
    let cxt = decode_cxt(PeerType::Internal, &[]);
    let data = block(&[
        origin_attr(),
        attr(0x40, 2, &[]),
        nexthop_attr(),
        local_pref_attr(100),
        attr(0x80, 10, &[10, 0, 0, 1, 10, 0]),
    ]);
    let (result, _, _) = decode(&data, &cxt);

    assert!(matches!(
        result,
        Err(UpdateMessageError::AttributeLengthError(_))
    ));
}

#[test]
fn test_decode_confed_segment_from_ebgp() {
    // Plain eBGP peers must not send confederation segments.
    let cxt = decode_cxt(PeerType::External, &[]);
    let data = block(&[
        origin_attr(),
        attr(0x40, 2, &[as_confed_seq2(&[64500]), as_seq2(&[64500])].concat()),
        nexthop_attr(),
    ]);
    let (result, _, _) = decode(&data, &cxt);

    assert_eq!(result, Err(UpdateMessageError::MalformedAsPath));
}

#[test]
fn test_decode_confed_peer() {
    // A confederation member's path must start with a confederation
    // sequence.
    let cxt = decode_cxt(PeerType::Confederation, &[]);
    let data = block(&[
        origin_attr(),
        attr(0x40, 2, &[as_confed_seq2(&[65010]), as_seq2(&[64500])].concat()),
        nexthop_attr(),
    ]);
    let attrs = decode_ok(&data, &cxt);
    assert_eq!(attrs.as_path.segments.len(), 2);

    let data = block(&[origin_attr(), as_path_attr2(&[64500]), nexthop_attr()]);
    let (result, _, _) = decode(&data, &cxt);
    assert_eq!(result, Err(UpdateMessageError::MalformedAsPath));
}

#[test]
fn test_decode_enforce_first_as() {
    let mut cxt = decode_cxt(PeerType::External, &[]);
    cxt.enforce_first_as = true;

    let attrs = decode_ok(&base_block(), &cxt);
    assert_eq!(attrs.as_path.first(), Some(64500));

    let data = block(&[origin_attr(), as_path_attr2(&[64501]), nexthop_attr()]);
    let (result, _, _) = decode(&data, &cxt);
    assert_eq!(result, Err(UpdateMessageError::MalformedAsPath));
}

#[test]
fn test_decode_change_local_as_prepend() {
    let mut cxt = decode_cxt(PeerType::External, &[]);
    cxt.change_local_as = Some(64999);

    let attrs = decode_ok(&base_block(), &cxt);
    assert_eq!(attrs.as_path, as_path(&[64999, 64500]));

    cxt.local_as_no_prepend = true;
    let attrs = decode_ok(&base_block(), &cxt);
    assert_eq!(attrs.as_path, as_path(&[64500]));
}

#[test]
fn test_decode_as_path_zero_as() {
    // RFC 7607: AS 0 in the path is malformed.
    let cxt = decode_cxt(PeerType::External, &[]);
    let data = block(&[
        origin_attr(),
        as_path_attr2(&[0, 64500]),
        nexthop_attr(),
    ]);
    let (result, _, _) = decode(&data, &cxt);

    assert_eq!(result, Err(UpdateMessageError::MalformedAsPath));
}

#[test]
fn test_decode_as4_path_splice() {
    // Both AS numbers were downgraded to AS_TRANS by the speaker; the
    // AS4_PATH replaces them length-for-length.
    let cxt = decode_cxt(PeerType::External, &[]);
    let data = block(&[
        origin_attr(),
        as_path_attr2(&[23456, 23456]),
        nexthop_attr(),
        attr(0xC0, 17, &as_seq4(&[70000, 80000])),
    ]);
    let attrs = decode_ok(&data, &cxt);

    assert_eq!(attrs.as_path, as_path(&[70000, 80000]));
}

#[test]
fn test_decode_as4_path_partial_splice() {
    // A shorter AS4_PATH replaces only the tail.
    let cxt = decode_cxt(PeerType::External, &[]);
    let data = block(&[
        origin_attr(),
        as_path_attr2(&[64500, 23456, 23456]),
        nexthop_attr(),
        attr(0xC0, 17, &as_seq4(&[70000, 80000])),
    ]);
    let attrs = decode_ok(&data, &cxt);

    assert_eq!(attrs.as_path, as_path(&[64500, 70000, 80000]));
}

#[test]
fn test_decode_as4_path_too_long_ignored() {
    let cxt = decode_cxt(PeerType::External, &[]);
    let data = block(&[
        origin_attr(),
        as_path_attr2(&[64500]),
        nexthop_attr(),
        attr(0xC0, 17, &as_seq4(&[70000, 80000])),
    ]);
    let attrs = decode_ok(&data, &cxt);

    assert_eq!(attrs.as_path, as_path(&[64500]));
}

#[test]
fn test_decode_as4_aggregator() {
    // AGGREGATOR carrying AS_TRANS defers to AS4_AGGREGATOR.
    let cxt = decode_cxt(PeerType::External, &[]);
    let data = block(&[
        origin_attr(),
        as_path_attr2(&[64500]),
        nexthop_attr(),
        attr(0xC0, 7, &[0x5B, 0xA0, 10, 0, 0, 9]),
        attr(0xC0, 18, &[0x00, 0x01, 0x11, 0x70, 10, 0, 0, 9]),
    ]);
    let attrs = decode_ok(&data, &cxt);

    let aggregator = attrs.extra.unwrap().aggregator.unwrap();
    assert_eq!(aggregator.asn, 70000);
    assert_eq!(aggregator.identifier, Ipv4Addr::new(10, 0, 0, 9));
}

#[test]
fn test_decode_as4_aggregator_ignored() {
    // AGGREGATOR carrying a real AS wins; both AS4 attributes are ignored,
    // including the AS4_PATH.
    let cxt = decode_cxt(PeerType::External, &[]);
    let data = block(&[
        origin_attr(),
        as_path_attr2(&[64500, 23456]),
        nexthop_attr(),
        attr(0xC0, 7, &[0xFB, 0xF4, 10, 0, 0, 9]),
        attr(0xC0, 17, &as_seq4(&[70000])),
        attr(0xC0, 18, &[0x00, 0x01, 0x11, 0x70, 10, 0, 0, 9]),
    ]);
    let attrs = decode_ok(&data, &cxt);

    let extra = attrs.extra.unwrap();
    assert_eq!(extra.aggregator.unwrap().asn, 64500);
    assert_eq!(attrs.as_path, as_path(&[64500, 23456]));
}

#[test]
fn test_decode_as4_aggregator_without_aggregator() {
    // Treated as if AGGREGATOR with AS_TRANS had been there.
    let cxt = decode_cxt(PeerType::External, &[]);
    let data = block(&[
        origin_attr(),
        as_path_attr2(&[64500]),
        nexthop_attr(),
        attr(0xC0, 18, &[0x00, 0x01, 0x11, 0x70, 10, 0, 0, 9]),
    ]);
    let attrs = decode_ok(&data, &cxt);

    assert!(attrs.flag.has(AttrType::Aggregator));
    assert_eq!(attrs.extra.unwrap().aggregator.unwrap().asn, 70000);
}

#[test]
fn test_decode_as4_superfluous() {
    // A 4-byte capable peer sending AS4_PATH: the attribute is ignored.
    let cxt = decode_cxt(
        PeerType::External,
        &[NegotiatedCapability::FourOctetAsNumber],
    );
    let data = block(&[
        origin_attr(),
        attr(0x40, 2, &as_seq4(&[64500, 70000])),
        nexthop_attr(),
        attr(0xC0, 17, &as_seq4(&[1, 2, 3])),
    ]);
    let attrs = decode_ok(&data, &cxt);

    assert_eq!(attrs.as_path, as_path(&[64500, 70000]));
}

#[test]
fn test_decode_mp_reach_ipv6() {
    let cxt = decode_cxt(PeerType::External, &[]);
    let nexthop = Ipv6Addr::new(0x2001, 0xdb8, 0, 0, 0, 0, 0, 1);
    let mut value = vec![0x00, 0x02, 0x01, 16];
    value.extend_from_slice(&nexthop.octets());
    value.push(0); // SNPA
    value.extend_from_slice(&[32, 0x20, 0x01, 0x0d, 0xb8]); // NLRI
    let data = block(&[
        origin_attr(),
        as_path_attr2(&[64500]),
        attr(0x80, 14, &value),
    ]);
    let (result, mp_reach, _) = decode(&data, &cxt);

    let mp_reach = mp_reach.unwrap();
    assert_eq!(mp_reach.afi, 2);
    assert_eq!(mp_reach.safi, 1);
    assert_eq!(&mp_reach.nlri[..], &[32, 0x20, 0x01, 0x0d, 0xb8]);

    let Ok(AttrsResult::Proceed(attrs)) = result else {
        panic!("unexpected parse result");
    };
    assert_eq!(
        attrs.extra.unwrap().mp_nexthop,
        Some(MpNexthop::Ipv6(nexthop))
    );
}

#[test]
fn test_decode_mp_reach_link_local_demotion() {
    // The second nexthop must be link-local; otherwise only the global one
    // is kept.
    let cxt = decode_cxt(PeerType::External, &[]);
    let global = Ipv6Addr::new(0x2001, 0xdb8, 0, 0, 0, 0, 0, 1);
    let bogus = Ipv6Addr::new(0x2001, 0xdb8, 0, 0, 0, 0, 0, 2);
    let mut value = vec![0x00, 0x02, 0x01, 32];
    value.extend_from_slice(&global.octets());
    value.extend_from_slice(&bogus.octets());
    value.push(0);
    value.extend_from_slice(&[32, 0x20, 0x01, 0x0d, 0xb8]);
    let data = block(&[
        origin_attr(),
        as_path_attr2(&[64500]),
        attr(0x80, 14, &value),
    ]);
    let attrs = decode_ok(&data, &cxt);
    assert_eq!(
        attrs.extra.unwrap().mp_nexthop,
        Some(MpNexthop::Ipv6(global))
    );

    // With a proper link-local address both are kept.
    let link_local = Ipv6Addr::new(0xfe80, 0, 0, 0, 0, 0, 0, 1);
    let mut value = vec![0x00, 0x02, 0x01, 32];
    value.extend_from_slice(&global.octets());
    value.extend_from_slice(&link_local.octets());
    value.push(0);
    value.extend_from_slice(&[32, 0x20, 0x01, 0x0d, 0xb8]);
    let data = block(&[
        origin_attr(),
        as_path_attr2(&[64500]),
        attr(0x80, 14, &value),
    ]);
    let attrs = decode_ok(&data, &cxt);
    assert_eq!(
        attrs.extra.unwrap().mp_nexthop,
        Some(MpNexthop::Ipv6Dual {
            global,
            link_local
        })
    );
}

#[test]
fn test_decode_mp_reach_bad_nexthop_length() {
    let cxt = decode_cxt(PeerType::External, &[]);
    let mut value = vec![0x00, 0x02, 0x01, 7];
    value.extend_from_slice(&[0; 7]);
    value.push(0);
    value.push(1);
    let data = block(&[
        origin_attr(),
        as_path_attr2(&[64500]),
        attr(0x80, 14, &value),
    ]);
    let (result, _, _) = decode(&data, &cxt);

    assert_eq!(result, Err(UpdateMessageError::MalformedAttributeList));
}

#[test]
fn test_decode_mp_unreach_only() {
    // An UPDATE carrying only MP_UNREACH_NLRI is complete by itself.
    let cxt = decode_cxt(PeerType::External, &[]);
    let data = block(&[attr(0x80, 15, &[0x00, 0x02, 0x01, 32, 0x20, 0x01, 0x0d, 0xb8])]);
    let (result, _, mp_unreach) = decode(&data, &cxt);

    assert!(matches!(result, Ok(AttrsResult::Proceed(_))));
    let mp_unreach = mp_unreach.unwrap();
    assert_eq!(mp_unreach.afi, 2);
    assert_eq!(&mp_unreach.nlri[..], &[32, 0x20, 0x01, 0x0d, 0xb8]);
}

#[test]
fn test_decode_tunnel_encap() {
    let cxt = decode_cxt(PeerType::External, &[]);
    // VXLAN (8), two sub-TLVs.
    let value = [
        0x00, 0x08, // tunnel type
        0x00, 0x08, // TLV length
        0x01, 0x02, 0xAA, 0xBB, // sub-TLV 1
        0x04, 0x02, 0xCC, 0xDD, // sub-TLV 2
    ];
    let data = block(&[
        origin_attr(),
        as_path_attr2(&[64500]),
        nexthop_attr(),
        attr(0xC0, 23, &value),
    ]);
    let attrs = decode_ok(&data, &cxt);

    let encap = attrs.extra.unwrap().encap.unwrap();
    assert_eq!(encap.tunnel_type, 8);
    assert_eq!(encap.subtlvs.len(), 2);
    assert_eq!(encap.subtlvs[0].sub_type, 1);
    assert_eq!(&encap.subtlvs[0].value[..], &[0xAA, 0xBB]);
}

#[test]
fn test_decode_tunnel_encap_residual() {
    // Leftover bytes after the declared sub-TLVs; with the Partial bit
    // set, the route is treated as withdrawn.
    let cxt = decode_cxt(PeerType::External, &[]);
    let value = [0x00, 0x08, 0x00, 0x02, 0xAA, 0xBB, 0xCC];
    let data = block(&[
        origin_attr(),
        as_path_attr2(&[64500]),
        nexthop_attr(),
        attr(0xE0, 23, &value),
    ]);
    let (result, _, _) = decode(&data, &cxt);

    assert_eq!(result, Ok(AttrsResult::Withdraw));
}
