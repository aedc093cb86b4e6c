// Armature - Guest CPU Front End
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Basic blocks and control-flow discovery.

mod block;
mod builder;
pub mod classify;

pub use block::{Block, BlockId};
pub use builder::{decode_basic_block, decode_function, fill_block, Decoder};
