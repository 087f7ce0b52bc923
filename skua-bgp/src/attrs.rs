//
// Copyright (c) The Skua Project Contributors
//
// SPDX-License-Identifier: MIT
//

//! Attribute store: content-addressed, reference-counted pools that keep a
//! single canonical copy of every distinct attribute value in use. A table
//! holding millions of routes typically references only a small set of
//! distinct attribute combinations.

use std::collections::HashSet;
use std::hash::Hash;
use std::net::Ipv4Addr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::debug::Debug;
use crate::packet::attribute::{
    Aggregator, AsPath, AttrPresence, Attrs, AttrsExtra, ClusterList, Comms,
    ExtComms, LargeComms, MpNexthop, Transit,
};
use crate::packet::consts::Origin;
use crate::packet::encap::TunnelEncap;

// Generic content-addressed pool.
//
// `intern` maps a value to its canonical shared instance, creating one on
// first occurrence; `release` drops one holder's reference and removes the
// entry once no holder remains. The reference count is the `Arc` strong
// count, so plain clones of a handle count as holders too.
#[derive(Debug)]
pub struct Interner<T> {
    entries: HashSet<Arc<T>>,
}

// One canonical, shared combination of path attributes.
//
// Same shape as `Attrs`, but every independently interned value is held by
// reference. Two sets are equal iff all plain fields match, the referenced
// values are the same canonical instances, and the encapsulation sub-TLV
// chains match as sets.
#[derive(Debug, Hash)]
#[derive(Deserialize, Serialize)]
pub struct AttrSet {
    pub flag: AttrPresence,
    pub origin: Origin,
    pub nexthop: Ipv4Addr,
    pub med: u32,
    pub local_pref: u32,
    pub as_path: Arc<AsPath>,
    pub comm: Option<Arc<Comms>>,
    pub extra: Option<Box<AttrSetExtra>>,
}

#[derive(Debug, Hash)]
#[derive(Deserialize, Serialize)]
pub struct AttrSetExtra {
    pub aggregator: Option<Aggregator>,
    pub weight: u32,
    pub priority: u32,
    pub originator_id: Option<Ipv4Addr>,
    pub cluster_list: Option<Arc<ClusterList>>,
    pub ext_comm: Option<Arc<ExtComms>>,
    pub large_comm: Option<Arc<LargeComms>>,
    pub mp_nexthop: Option<MpNexthop>,
    pub encap: Option<TunnelEncap>,
    pub transit: Option<Arc<Transit>>,
    pub tag: u32,
}

// The attribute pools, owned by the instance and passed by reference to
// whoever interns or releases. Independent stores can coexist.
#[derive(Debug, Default)]
pub struct AttrStore {
    pub sets: Interner<AttrSet>,
    pub as_paths: Interner<AsPath>,
    pub comms: Interner<Comms>,
    pub ext_comms: Interner<ExtComms>,
    pub large_comms: Interner<LargeComms>,
    pub cluster_lists: Interner<ClusterList>,
    pub transits: Interner<Transit>,
}

// ===== impl Interner =====

impl<T> Interner<T>
where
    T: Eq + Hash,
{
    pub fn intern(&mut self, value: T) -> Arc<T> {
        if let Some(entry) = self.entries.get(&value) {
            Arc::clone(entry)
        } else {
            let entry = Arc::new(value);
            self.entries.insert(Arc::clone(&entry));
            entry
        }
    }

    // Releases one holder's reference. When the handle being released is
    // the last one outside the pool, the entry is removed and the value
    // handed back so the caller can release whatever it references in turn.
    pub fn release(&mut self, handle: Arc<T>) -> Option<T> {
        if Arc::strong_count(&handle) == 2 {
            self.entries.remove(&*handle);
            return Arc::into_inner(handle);
        }
        None
    }

    // Number of holders of the canonical instance, not counting the pool
    // itself.
    pub fn refcount(&self, value: &T) -> usize {
        self.entries
            .get(value)
            .map_or(0, |entry| Arc::strong_count(entry) - 1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T> Default for Interner<T> {
    fn default() -> Interner<T> {
        Interner {
            entries: Default::default(),
        }
    }
}

// ===== impl AttrSet =====

impl PartialEq for AttrSet {
    fn eq(&self, other: &Self) -> bool {
        self.flag == other.flag
            && self.origin == other.origin
            && self.nexthop == other.nexthop
            && self.med == other.med
            && self.local_pref == other.local_pref
            // Referenced values are canonical, compare by pointer.
            && Arc::ptr_eq(&self.as_path, &other.as_path)
            && opt_ptr_eq(&self.comm, &other.comm)
            && match (&self.extra, &other.extra) {
                (None, None) => true,
                (Some(a), Some(b)) => a == b,
                _ => false,
            }
    }
}

impl Eq for AttrSet {}

impl AttrSet {
    // Reassembles the value form, e.g. to feed the encoder.
    pub fn get(&self) -> Attrs {
        Attrs {
            flag: self.flag,
            origin: self.origin,
            nexthop: self.nexthop,
            med: self.med,
            local_pref: self.local_pref,
            as_path: (*self.as_path).clone(),
            comm: self.comm.as_ref().map(|comm| (**comm).clone()),
            extra: self.extra.as_ref().map(|extra| {
                Box::new(AttrsExtra {
                    aggregator: extra.aggregator,
                    weight: extra.weight,
                    priority: extra.priority,
                    originator_id: extra.originator_id,
                    cluster_list: extra
                        .cluster_list
                        .as_ref()
                        .map(|value| (**value).clone()),
                    ext_comm: extra
                        .ext_comm
                        .as_ref()
                        .map(|value| (**value).clone()),
                    large_comm: extra
                        .large_comm
                        .as_ref()
                        .map(|value| (**value).clone()),
                    mp_nexthop: extra.mp_nexthop,
                    encap: extra.encap.clone(),
                    transit: extra
                        .transit
                        .as_ref()
                        .map(|value| (**value).clone()),
                    tag: extra.tag,
                })
            }),
        }
    }
}

// ===== impl AttrSetExtra =====

impl PartialEq for AttrSetExtra {
    fn eq(&self, other: &Self) -> bool {
        self.aggregator == other.aggregator
            && self.weight == other.weight
            && self.priority == other.priority
            && self.originator_id == other.originator_id
            && opt_ptr_eq(&self.cluster_list, &other.cluster_list)
            && opt_ptr_eq(&self.ext_comm, &other.ext_comm)
            && opt_ptr_eq(&self.large_comm, &other.large_comm)
            && self.mp_nexthop == other.mp_nexthop
            && self.encap == other.encap
            && opt_ptr_eq(&self.transit, &other.transit)
            && self.tag == other.tag
    }
}

impl Eq for AttrSetExtra {}

// ===== impl AttrStore =====

impl AttrStore {
    pub fn new() -> AttrStore {
        Default::default()
    }

    // Interns the scratch attributes, yielding the canonical shared set.
    // The referenced values are interned first so the aggregate lookup can
    // compare them by pointer.
    pub fn intern(&mut self, attrs: Attrs) -> Arc<AttrSet> {
        Debug::AttrsInterned(&attrs).log();

        let Attrs {
            flag,
            origin,
            nexthop,
            med,
            local_pref,
            as_path,
            comm,
            extra,
        } = attrs;

        let as_path = self.as_paths.intern(as_path);
        let comm = comm.map(|comm| self.comms.intern(comm));
        let extra = extra.map(|extra| {
            let extra = *extra;
            Box::new(AttrSetExtra {
                aggregator: extra.aggregator,
                weight: extra.weight,
                priority: extra.priority,
                originator_id: extra.originator_id,
                cluster_list: extra
                    .cluster_list
                    .map(|value| self.cluster_lists.intern(value)),
                ext_comm: extra
                    .ext_comm
                    .map(|value| self.ext_comms.intern(value)),
                large_comm: extra
                    .large_comm
                    .map(|value| self.large_comms.intern(value)),
                mp_nexthop: extra.mp_nexthop,
                encap: extra.encap,
                transit: extra
                    .transit
                    .map(|value| self.transits.intern(value)),
                tag: extra.tag,
            })
        });

        self.sets.intern(AttrSet {
            flag,
            origin,
            nexthop,
            med,
            local_pref,
            as_path,
            comm,
            extra,
        })
    }

    // Releases one holder's reference to a canonical set. Dropping the last
    // one removes the set from the pool and cascades into the values it
    // references.
    pub fn release(&mut self, set: Arc<AttrSet>) {
        if let Some(set) = self.sets.release(set) {
            let AttrSet {
                as_path,
                comm,
                extra,
                ..
            } = set;
            self.as_paths.release(as_path);
            if let Some(comm) = comm {
                self.comms.release(comm);
            }
            if let Some(extra) = extra {
                let extra = *extra;
                if let Some(value) = extra.cluster_list {
                    self.cluster_lists.release(value);
                }
                if let Some(value) = extra.ext_comm {
                    self.ext_comms.release(value);
                }
                if let Some(value) = extra.large_comm {
                    self.large_comms.release(value);
                }
                if let Some(value) = extra.transit {
                    self.transits.release(value);
                }
            }
        }
    }

    // Interns the default attributes of a locally originated route.
    pub fn intern_default(&mut self, origin: Origin) -> Arc<AttrSet> {
        self.intern(Attrs::default_local(origin))
    }

    // Number of distinct attribute sets in use.
    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    // Number of distinct unknown-transit blobs in use.
    pub fn transit_len(&self) -> usize {
        self.transits.len()
    }
}

// ===== helper functions =====

fn opt_ptr_eq<T>(a: &Option<Arc<T>>, b: &Option<Arc<T>>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => Arc::ptr_eq(a, b),
        _ => false,
    }
}
