//
// Copyright (c) The Skua Project Contributors
//
// SPDX-License-Identifier: MIT
//

use bytes::{Bytes, TryGetError};
use serde::{Deserialize, Serialize};

use crate::packet::consts::UpdateMessageErrorSubcode;

// UPDATE message errors.
//
// Each variant maps to a specific UPDATE message error subcode; variants
// carrying a `Bytes` payload hold the raw (flags, type, length, value)
// encoding of the offending attribute, which goes out as the NOTIFICATION
// data field.
//
// NOTE: many of the errors originally specified by RFC 4271 were made
// obsolete by RFC 7606.
#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub enum UpdateMessageError {
    ReadOutOfBounds,
    MalformedAttributeList,
    UnrecognizedWellKnownAttribute(Bytes),
    MissingWellKnownAttribute(u8),
    AttributeFlagsError(Bytes),
    AttributeLengthError(Bytes),
    InvalidOriginAttribute(Bytes),
    InvalidNexthopAttribute(Bytes),
    MalformedAsPath,
    OptionalAttributeError(Bytes),
}

// Reasons a single attribute failed to decode.
//
// Decoders never send NOTIFICATIONs themselves: they return one of these and
// the malformed-attribute policy decides whether the attribute is dropped,
// the route is withdrawn or the session is reset.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub enum AttrMalformed {
    Length,
    Flags,
    InvalidOrigin,
    InvalidNexthop,
    AsPath,
    Optional,
    Unrecognized,
    MalformedList,
}

// Action to take on a malformed attribute, as decided by the
// malformed-attribute policy.
#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub enum AttrError {
    // Drop the attribute, keep processing the rest of the message.
    Discard,
    // Treat the affected route as withdrawn.
    Withdraw,
    // Reset the session (the carried error becomes a NOTIFICATION).
    Reset(UpdateMessageError),
}

// ===== impl UpdateMessageError =====

impl UpdateMessageError {
    pub fn subcode(&self) -> UpdateMessageErrorSubcode {
        match self {
            UpdateMessageError::ReadOutOfBounds
            | UpdateMessageError::AttributeLengthError(..) => {
                UpdateMessageErrorSubcode::AttributeLengthError
            }
            UpdateMessageError::MalformedAttributeList => {
                UpdateMessageErrorSubcode::MalformedAttributeList
            }
            UpdateMessageError::UnrecognizedWellKnownAttribute(..) => {
                UpdateMessageErrorSubcode::UnrecognizedWellKnownAttribute
            }
            UpdateMessageError::MissingWellKnownAttribute(..) => {
                UpdateMessageErrorSubcode::MissingWellKnownAttribute
            }
            UpdateMessageError::AttributeFlagsError(..) => {
                UpdateMessageErrorSubcode::AttributeFlagsError
            }
            UpdateMessageError::InvalidOriginAttribute(..) => {
                UpdateMessageErrorSubcode::InvalidOriginAttribute
            }
            UpdateMessageError::InvalidNexthopAttribute(..) => {
                UpdateMessageErrorSubcode::InvalidNexthopAttribute
            }
            UpdateMessageError::MalformedAsPath => {
                UpdateMessageErrorSubcode::MalformedAsPath
            }
            UpdateMessageError::OptionalAttributeError(..) => {
                UpdateMessageErrorSubcode::OptionalAttributeError
            }
        }
    }

    // Data field of the corresponding NOTIFICATION message.
    pub fn data(&self) -> Vec<u8> {
        match self {
            UpdateMessageError::UnrecognizedWellKnownAttribute(raw)
            | UpdateMessageError::AttributeFlagsError(raw)
            | UpdateMessageError::AttributeLengthError(raw)
            | UpdateMessageError::InvalidOriginAttribute(raw)
            | UpdateMessageError::InvalidNexthopAttribute(raw)
            | UpdateMessageError::OptionalAttributeError(raw) => raw.to_vec(),
            UpdateMessageError::MissingWellKnownAttribute(attr_type) => {
                vec![*attr_type]
            }
            UpdateMessageError::ReadOutOfBounds
            | UpdateMessageError::MalformedAttributeList
            | UpdateMessageError::MalformedAsPath => vec![],
        }
    }
}

impl std::fmt::Display for UpdateMessageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "UPDATE message error: ")?;

        match self {
            UpdateMessageError::ReadOutOfBounds => {
                write!(f, "attempt to read out of bounds")
            }
            UpdateMessageError::MalformedAttributeList => {
                write!(f, "malformed attribute list")
            }
            UpdateMessageError::UnrecognizedWellKnownAttribute(..) => {
                write!(f, "unrecognized well-known attribute")
            }
            UpdateMessageError::MissingWellKnownAttribute(attr_type) => {
                write!(f, "missing well-known attribute: {attr_type}")
            }
            UpdateMessageError::AttributeFlagsError(..) => {
                write!(f, "attribute flags error")
            }
            UpdateMessageError::AttributeLengthError(..) => {
                write!(f, "attribute length error")
            }
            UpdateMessageError::InvalidOriginAttribute(..) => {
                write!(f, "invalid origin attribute")
            }
            UpdateMessageError::InvalidNexthopAttribute(..) => {
                write!(f, "invalid nexthop attribute")
            }
            UpdateMessageError::MalformedAsPath => {
                write!(f, "malformed AS path")
            }
            UpdateMessageError::OptionalAttributeError(..) => {
                write!(f, "optional attribute error")
            }
        }
    }
}

impl std::error::Error for UpdateMessageError {}

impl From<TryGetError> for UpdateMessageError {
    fn from(_error: TryGetError) -> UpdateMessageError {
        UpdateMessageError::ReadOutOfBounds
    }
}

// ===== impl AttrMalformed =====

impl AttrMalformed {
    // The UPDATE error this reason escalates to when the policy decides to
    // reset the session. `raw` is the failing attribute's raw encoding.
    pub(crate) fn to_error(self, raw: Bytes) -> UpdateMessageError {
        match self {
            AttrMalformed::Length => {
                UpdateMessageError::AttributeLengthError(raw)
            }
            AttrMalformed::Flags => UpdateMessageError::AttributeFlagsError(raw),
            AttrMalformed::InvalidOrigin => {
                UpdateMessageError::InvalidOriginAttribute(raw)
            }
            AttrMalformed::InvalidNexthop => {
                UpdateMessageError::InvalidNexthopAttribute(raw)
            }
            AttrMalformed::AsPath => UpdateMessageError::MalformedAsPath,
            AttrMalformed::Optional => {
                UpdateMessageError::OptionalAttributeError(raw)
            }
            AttrMalformed::Unrecognized => {
                UpdateMessageError::UnrecognizedWellKnownAttribute(raw)
            }
            AttrMalformed::MalformedList => {
                UpdateMessageError::MalformedAttributeList
            }
        }
    }
}

impl std::fmt::Display for AttrMalformed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttrMalformed::Length => write!(f, "bad attribute length"),
            AttrMalformed::Flags => write!(f, "bad attribute flags"),
            AttrMalformed::InvalidOrigin => write!(f, "invalid origin value"),
            AttrMalformed::InvalidNexthop => write!(f, "invalid nexthop"),
            AttrMalformed::AsPath => write!(f, "malformed AS path"),
            AttrMalformed::Optional => write!(f, "malformed optional attribute"),
            AttrMalformed::Unrecognized => {
                write!(f, "unrecognized well-known attribute")
            }
            AttrMalformed::MalformedList => {
                write!(f, "malformed attribute list")
            }
        }
    }
}

impl From<TryGetError> for AttrMalformed {
    fn from(_error: TryGetError) -> AttrMalformed {
        AttrMalformed::Length
    }
}
