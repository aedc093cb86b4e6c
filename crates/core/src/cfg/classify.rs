// Armature - Guest CPU Front End
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Terminal-instruction classification.

use crate::decoder::{InstName, Instruction, Operands};
use crate::ExecutionMode;

const PC: u8 = 15;
const LR: u8 = 14;

/// Whether `inst` can transfer control somewhere other than the next
/// instruction.
pub fn is_branch(inst: &Instruction, mode: ExecutionMode) -> bool {
    if mode.is_aarch32() {
        is_aarch32_branch(inst)
    } else {
        matches!(
            inst.operands,
            Operands::BImm { .. }
                | Operands::BImmCond { .. }
                | Operands::BImmCmp { .. }
                | Operands::BImmTest { .. }
                | Operands::BReg { .. }
        )
    }
}

// In AArch32 anything that writes PC is a branch: ALU results, loads into
// PC, and base write-back to PC.
fn is_aarch32_branch(inst: &Instruction) -> bool {
    if matches!(
        inst.operands,
        Operands::A32BImm { .. } | Operands::A32BReg { .. }
    ) {
        return true;
    }

    if inst.a32_alu_rd() == Some(PC) {
        return true;
    }

    let (rt, rn, load, wback) = if let Some(access) = inst.a32_mem_access() {
        // LDRD also writes rt + 1
        let rt = if inst.name == InstName::Ldrd && access.rt == LR {
            PC
        } else {
            access.rt
        };
        (rt, access.rn, access.load, access.wback)
    } else if let Operands::A32MemMult {
        rn,
        register_mask,
        post_offset,
        load,
        ..
    } = inst.operands
    {
        let rt = if register_mask & (1 << PC) != 0 { PC } else { 0 };
        (rt, rn, load, post_offset != 0)
    } else {
        return false;
    };

    (rt == PC && load) || (wback && rn == PC)
}

/// Branch that never falls through.
pub fn is_unconditional_branch(inst: &Instruction, mode: ExecutionMode) -> bool {
    if mode.is_aarch32() {
        is_aarch32_branch(inst) && inst.condition().is_always()
    } else {
        matches!(inst.operands, Operands::BImm { .. } | Operands::BReg { .. })
    }
}

/// Subroutine call. Only AArch64 `BL`/`BLR` are recognised.
pub fn is_call(inst: &Instruction, mode: ExecutionMode) -> bool {
    !mode.is_aarch32() && matches!(inst.name, InstName::Bl | InstName::Blr)
}

pub fn is_exception(inst: &Instruction) -> bool {
    matches!(inst.name, InstName::Brk | InstName::Svc | InstName::Und)
}

/// Ends a block.
pub fn is_terminal(inst: &Instruction, mode: ExecutionMode) -> bool {
    is_branch(inst, mode) || is_exception(inst)
}
