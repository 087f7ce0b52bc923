//
// Copyright (c) The Skua Project Contributors
//
// SPDX-License-Identifier: MIT
//

pub mod attribute;
pub mod consts;
pub mod encap;
pub mod error;
pub mod message;
