//
// Copyright (c) The Skua Project Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::Ipv4Addr;

use tracing::{debug, warn};

use crate::packet::attribute::Attrs;
use crate::packet::error::AttrMalformed;

// BGP attribute debug messages.
#[derive(Debug)]
pub enum Debug<'a> {
    AttrError(u8, AttrMalformed),
    AttrMissing(u8),
    AttrUnknown(u8, usize),
    AttrsInterned(&'a Attrs),
    As4SuperfluousPath,
    As4SuperfluousAggregator,
    As4AggregatorMissingAggregator,
    As4AggregatorIgnored,
    MartianNexthop(Ipv4Addr),
    NexthopNotLinkLocal,
    NonZeroSnpaLength(u8),
    EncapTlvLengthMismatch(u16, usize),
    EncapTooLong(usize),
}

// ===== impl Debug =====

impl Debug<'_> {
    // Log debug message using the tracing API.
    pub(crate) fn log(&self) {
        match self {
            Debug::AttrError(attr_type, reason) => {
                warn!(%attr_type, %reason, "{}", self);
            }
            Debug::AttrMissing(attr_type) => {
                warn!(%attr_type, "{}", self);
            }
            Debug::AttrUnknown(attr_type, length) => {
                debug!(%attr_type, %length, "{}", self);
            }
            Debug::AttrsInterned(attrs) => {
                let data = serde_json::to_string(&attrs).unwrap();
                debug!(%data, "{}", self);
            }
            Debug::As4SuperfluousPath
            | Debug::As4SuperfluousAggregator
            | Debug::As4AggregatorMissingAggregator
            | Debug::As4AggregatorIgnored => {
                debug!("{}", self);
            }
            Debug::MartianNexthop(addr) => {
                warn!(%addr, "{}", self);
            }
            Debug::NexthopNotLinkLocal => {
                debug!("{}", self);
            }
            Debug::NonZeroSnpaLength(value) => {
                warn!(%value, "{}", self);
            }
            Debug::EncapTlvLengthMismatch(tlv_length, actual) => {
                warn!(%tlv_length, %actual, "{}", self);
            }
            Debug::EncapTooLong(length) => {
                warn!(%length, "{}", self);
            }
        }
    }
}

impl std::fmt::Display for Debug<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Debug::AttrError(..) => {
                write!(f, "malformed attribute")
            }
            Debug::AttrMissing(..) => {
                write!(f, "missing well-known attribute")
            }
            Debug::AttrUnknown(..) => {
                write!(f, "unknown attribute")
            }
            Debug::AttrsInterned(..) => {
                write!(f, "attribute set interned")
            }
            Debug::As4SuperfluousPath => {
                write!(f, "AS4 capable peer, yet it sent AS4_PATH")
            }
            Debug::As4SuperfluousAggregator => {
                write!(f, "AS4 capable peer, yet it sent AS4_AGGREGATOR")
            }
            Debug::As4AggregatorMissingAggregator => {
                write!(
                    f,
                    "AS4_AGGREGATOR without AGGREGATOR, \
                     taking it as AGGREGATOR with AS_TRANS"
                )
            }
            Debug::As4AggregatorIgnored => {
                write!(
                    f,
                    "AGGREGATOR carries a real AS, \
                     ignoring AS4_AGGREGATOR and AS4_PATH"
                )
            }
            Debug::MartianNexthop(..) => {
                write!(f, "martian nexthop")
            }
            Debug::NexthopNotLinkLocal => {
                write!(f, "second nexthop is not link-local")
            }
            Debug::NonZeroSnpaLength(..) => {
                write!(f, "non-zero value for defunct SNPA-length field")
            }
            Debug::EncapTlvLengthMismatch(..) => {
                write!(f, "tunnel encapsulation TLV length mismatch")
            }
            Debug::EncapTooLong(..) => {
                write!(f, "tunnel encapsulation attribute is too long")
            }
        }
    }
}
