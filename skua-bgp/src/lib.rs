//
// Copyright (c) The Skua Project Contributors
//
// SPDX-License-Identifier: MIT
//

pub mod attrs;
pub mod debug;
pub mod neighbor;
pub mod packet;
