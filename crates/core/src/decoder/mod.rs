// Armature - Guest CPU Front End
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

pub mod fields;
pub mod instruction;
pub mod table;

pub use fields::{decode_bitmask, decode_imm8_float, BitMask, FloatSize};
pub use instruction::{
    Condition, DataOp, ExtendType, Instruction, MemAccess, MemOffset, Operands, RegisterWidth,
    ShiftType,
};
pub use table::{InstDescriptor, InstName, OpCodeTable, PatternTable, Shape};
