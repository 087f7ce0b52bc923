//
// Copyright (c) The Skua Project Contributors
//
// SPDX-License-Identifier: MIT
//

use std::hash::{DefaultHasher, Hash, Hasher};

use bytes::{Buf, BufMut, Bytes, BytesMut};
use derive_new::new;
use serde::{Deserialize, Serialize};

use crate::debug::Debug;
use crate::packet::consts::{AttrFlags, AttrType};
use crate::packet::error::AttrMalformed;

//
// Tunnel Encapsulation attribute (RFC 5512).
//
// Encoding format:
//
// +--------------------------------+
// | Tunnel Type (2 octets)         |
// +--------------------------------+
// | Length (2 octets)              |
// +--------------------------------+
// | Sub-TLVs: type (1), length (1),|
// | value (variable), repeated     |
// +--------------------------------+
//
// The sub-TLV chain is owned by exactly one attribute set and duplicated
// whenever the set is copied; tunnel encapsulation is rare and the chains
// are small, so the chain is not interned.
//
#[derive(Clone, Debug)]
#[derive(Deserialize, Serialize)]
pub struct TunnelEncap {
    pub tunnel_type: u16,
    pub subtlvs: Vec<EncapSubTlv>,
}

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
#[derive(new)]
#[derive(Deserialize, Serialize)]
pub struct EncapSubTlv {
    pub sub_type: u16,
    pub value: Bytes,
}

// ===== impl TunnelEncap =====

impl TunnelEncap {
    const MIN_LEN: usize = 4;

    pub(crate) fn encode(&self, buf: &mut BytesMut) {
        // No sub-TLVs, no attribute.
        if self.subtlvs.is_empty() {
            return;
        }

        let attr_len = Self::MIN_LEN
            + self
                .subtlvs
                .iter()
                .map(|subtlv| 2 + subtlv.value.len())
                .sum::<usize>();
        if attr_len > 0xffff {
            Debug::EncapTooLong(attr_len).log();
            return;
        }

        if attr_len > 0xff {
            let attr_flags = AttrFlags::OPTIONAL
                | AttrFlags::TRANSITIVE
                | AttrFlags::EXTENDED;
            buf.put_u8(attr_flags.bits());
            buf.put_u8(AttrType::TunnelEncap as u8);
            buf.put_u16(attr_len as u16);
        } else {
            let attr_flags = AttrFlags::OPTIONAL | AttrFlags::TRANSITIVE;
            buf.put_u8(attr_flags.bits());
            buf.put_u8(AttrType::TunnelEncap as u8);
            buf.put_u8(attr_len as u8);
        }

        // Outer TLV header.
        buf.put_u16(self.tunnel_type);
        buf.put_u16((attr_len - Self::MIN_LEN) as u16);

        // Sub-TLVs.
        for subtlv in &self.subtlvs {
            buf.put_u8(subtlv.sub_type as u8);
            buf.put_u8(subtlv.value.len() as u8);
            buf.put_slice(&subtlv.value);
        }
    }

    pub(crate) fn decode(buf: &mut Bytes) -> Result<Self, AttrMalformed> {
        // The attribute needs at least the outer (type, length) pair.
        if buf.remaining() < Self::MIN_LEN {
            return Err(AttrMalformed::Optional);
        }
        let tunnel_type = buf.get_u16();
        let tlv_length = buf.get_u16();
        if tlv_length as usize != buf.remaining() {
            Debug::EncapTlvLengthMismatch(tlv_length, buf.remaining()).log();
        }

        let mut subtlvs = Vec::new();
        while buf.remaining() >= 4 {
            let sub_type = buf.get_u8() as u16;
            let sub_len = buf.get_u8() as usize;
            if sub_len > buf.remaining() {
                return Err(AttrMalformed::Optional);
            }
            let value = buf.copy_to_bytes(sub_len);
            subtlvs.push(EncapSubTlv::new(sub_type, value));
        }

        // Spurious leftover data.
        if buf.has_remaining() {
            return Err(AttrMalformed::Optional);
        }

        Ok(TunnelEncap {
            tunnel_type,
            subtlvs,
        })
    }
}

// Two chains are equivalent when every sub-TLV of one has a matching
// (type, length, value) record in the other and vice versa, regardless of
// chain order.
impl PartialEq for TunnelEncap {
    fn eq(&self, other: &Self) -> bool {
        self.tunnel_type == other.tunnel_type
            && self
                .subtlvs
                .iter()
                .all(|subtlv| other.subtlvs.contains(subtlv))
            && other
                .subtlvs
                .iter()
                .all(|subtlv| self.subtlvs.contains(subtlv))
    }
}

impl Eq for TunnelEncap {}

// Order-independent, to stay consistent with the equality relation.
impl Hash for TunnelEncap {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.tunnel_type.hash(state);
        let mut acc: u64 = 0;
        for subtlv in &self.subtlvs {
            let mut hasher = DefaultHasher::new();
            subtlv.hash(&mut hasher);
            acc ^= hasher.finish();
        }
        acc.hash(state);
    }
}

// ===== impl EncapSubTlv =====

impl EncapSubTlv {
    pub fn length(&self) -> u16 {
        self.value.len() as u16
    }
}
