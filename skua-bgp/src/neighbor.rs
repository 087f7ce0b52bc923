//
// Copyright (c) The Skua Project Contributors
//
// SPDX-License-Identifier: MIT
//

use arbitrary::Arbitrary;
use serde::{Deserialize, Serialize};

// BGP peer type.
//
// Confederation members speak eBGP on the wire but are treated like iBGP
// peers for most attribute-processing purposes (LOCAL_PREF, error handling).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
#[derive(Arbitrary)]
pub enum PeerType {
    Internal,
    External,
    Confederation,
}

// ===== impl PeerType =====

impl PeerType {
    // True for sessions whose peer is under the same administration
    // (iBGP proper and intra-confederation sessions).
    pub fn is_internal(&self) -> bool {
        matches!(self, PeerType::Internal | PeerType::Confederation)
    }
}

impl std::fmt::Display for PeerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PeerType::Internal => write!(f, "internal"),
            PeerType::External => write!(f, "external"),
            PeerType::Confederation => write!(f, "confederation"),
        }
    }
}
