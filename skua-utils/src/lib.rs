//
// Copyright (c) The Skua Project Contributors
//
// SPDX-License-Identifier: MIT
//

pub mod bgp;
pub mod bytes;
pub mod ip;
