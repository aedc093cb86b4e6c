// Armature - Guest CPU Front End
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Thumb (16-bit) operand extraction.
//!
//! Branches, loads and stack operations map onto the AArch32 operand
//! variants with an `AL` condition so block discovery sees one model for
//! both instruction sets.

use super::{Built, Condition, MemOffset, Operands, Undefined};
use crate::decoder::fields::{decode_imm11_1, decode_imm8_1};
use crate::decoder::table::InstName;

const SP: u8 = 13;
const PC: u8 = 15;
const LR_BIT: u16 = 1 << 14;
const PC_BIT: u16 = 1 << 15;

#[inline]
fn low_reg(raw: u32, lsb: u32) -> u8 {
    ((raw >> lsb) & 7) as u8
}

/// Thumb reads PC as the instruction address plus 4.
#[inline]
fn pc(address: u64) -> u64 {
    address.wrapping_add(4)
}

pub(super) fn shift_imm(raw: u32) -> Built {
    Ok(Operands::T16ShiftImm {
        rd: low_reg(raw, 0),
        rm: low_reg(raw, 3),
        imm: ((raw >> 6) & 0x1f) as u8,
    })
}

pub(super) fn add_sub_reg(raw: u32) -> Built {
    Ok(Operands::T16AddSub {
        rd: low_reg(raw, 0),
        rn: low_reg(raw, 3),
        rm: low_reg(raw, 6),
    })
}

pub(super) fn add_sub_imm3(raw: u32) -> Built {
    Ok(Operands::T16AddSubImm3 {
        rd: low_reg(raw, 0),
        rn: low_reg(raw, 3),
        imm: low_reg(raw, 6),
    })
}

pub(super) fn alu_imm8(raw: u32) -> Built {
    Ok(Operands::T16AluImm8 {
        rd: low_reg(raw, 8),
        imm: (raw & 0xff) as u8,
    })
}

pub(super) fn alu_reg(raw: u32) -> Built {
    Ok(Operands::T16AluReg {
        rd: low_reg(raw, 0),
        rm: low_reg(raw, 3),
    })
}

// ADD/MOV with high registers: DN:Rdn gives a full 4-bit destination
pub(super) fn alu_reg_high(raw: u32) -> Built {
    Ok(Operands::T16AluReg {
        rd: (((raw >> 4) & 8) | (raw & 7)) as u8,
        rm: ((raw >> 3) & 0xf) as u8,
    })
}

// ADD Rd, SP/PC, #imm8 << 2
fn add_base_imm8(raw: u32, rn: u8) -> Built {
    Ok(Operands::A32AluImm {
        cond: Condition::Al,
        rd: low_reg(raw, 8),
        rn,
        set_flags: false,
        imm: (raw & 0xff) << 2,
    })
}

/// `ADR` reads PC rounded down to a word.
pub(super) fn adr(raw: u32) -> Built {
    add_base_imm8(raw, PC)
}

pub(super) fn add_sp_imm8(raw: u32) -> Built {
    add_base_imm8(raw, SP)
}

// ADD/SUB SP, SP, #imm7 << 2
pub(super) fn adjust_sp(raw: u32) -> Built {
    Ok(Operands::A32AluImm {
        cond: Condition::Al,
        rd: SP,
        rn: SP,
        set_flags: false,
        imm: (raw & 0x7f) << 2,
    })
}

pub(super) fn hint() -> Built {
    Ok(Operands::A32Plain { cond: Condition::Al })
}

pub(super) fn b_reg(raw: u32) -> Built {
    Ok(Operands::A32BReg {
        cond: Condition::Al,
        rm: ((raw >> 3) & 0xf) as u8,
    })
}

pub(super) fn b_cond(raw: u32, address: u64) -> Built {
    let cond = Condition::from_bits(raw >> 8);
    // 1110 is UDF; 1111 (SVC) never reaches here
    if cond == Condition::Al {
        return Err(Undefined);
    }

    Ok(Operands::A32BImm {
        cond,
        target: pc(address).wrapping_add(decode_imm8_1(raw) as u64),
    })
}

pub(super) fn b(raw: u32, address: u64) -> Built {
    Ok(Operands::A32BImm {
        cond: Condition::Al,
        target: pc(address).wrapping_add(decode_imm11_1(raw) as u64),
    })
}

pub(super) fn exception(raw: u32) -> Built {
    Ok(Operands::A32Exception {
        cond: Condition::Al,
        id: raw & 0xff,
    })
}

// Offset addressing only: 16-bit transfers never write back
fn transfer(rt: u8, rn: u8, load: bool, offset: MemOffset) -> Built {
    Ok(Operands::A32Mem {
        cond: Condition::Al,
        rt,
        rn,
        load,
        index: true,
        add: true,
        wback: false,
        unprivileged: false,
        offset,
    })
}

/// Direction and log2 access size of a single-register transfer.
fn access(name: InstName) -> (bool, u32) {
    match name {
        InstName::Ldr => (true, 2),
        InstName::Ldrh | InstName::Ldrsh => (true, 1),
        InstName::Ldrb | InstName::Ldrsb => (true, 0),
        InstName::Strh => (false, 1),
        InstName::Strb => (false, 0),
        _ => (false, 2),
    }
}

pub(super) fn ldr_lit(raw: u32) -> Built {
    transfer(low_reg(raw, 8), PC, true, MemOffset::Imm((raw & 0xff) << 2))
}

// imm5 is scaled by the access size
pub(super) fn mem_imm(raw: u32, name: InstName) -> Built {
    let (load, scale) = access(name);
    let imm = ((raw >> 6) & 0x1f) << scale;
    transfer(low_reg(raw, 0), low_reg(raw, 3), load, MemOffset::Imm(imm))
}

pub(super) fn mem_reg(raw: u32, name: InstName) -> Built {
    let (load, _) = access(name);
    let offset = MemOffset::Reg { rm: low_reg(raw, 6) };
    transfer(low_reg(raw, 0), low_reg(raw, 3), load, offset)
}

pub(super) fn mem_sp(raw: u32, name: InstName) -> Built {
    let (load, _) = access(name);
    transfer(low_reg(raw, 8), SP, load, MemOffset::Imm((raw & 0xff) << 2))
}

fn register_list(raw: u32, extra: u16) -> Result<u16, Undefined> {
    let mut mask = (raw & 0xff) as u16;
    if (raw >> 8) & 1 != 0 {
        mask |= extra;
    }
    if mask == 0 {
        return Err(Undefined);
    }
    Ok(mask)
}

pub(super) fn push(raw: u32) -> Built {
    let register_mask = register_list(raw, LR_BIT)?;
    let regs_size = (register_mask.count_ones() * 4) as i32;

    Ok(Operands::A32MemMult {
        cond: Condition::Al,
        rn: SP,
        register_mask,
        offset: -regs_size,
        post_offset: -regs_size,
        load: false,
    })
}

pub(super) fn pop(raw: u32) -> Built {
    let register_mask = register_list(raw, PC_BIT)?;
    let regs_size = (register_mask.count_ones() * 4) as i32;

    Ok(Operands::A32MemMult {
        cond: Condition::Al,
        rn: SP,
        register_mask,
        offset: 0,
        post_offset: regs_size,
        load: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_processing_fields() {
        // MOVS R0, #5
        assert_eq!(alu_imm8(0x2005), Ok(Operands::T16AluImm8 { rd: 0, imm: 5 }));
        // LSLS R1, R2, #3
        assert_eq!(shift_imm(0x00D1), Ok(Operands::T16ShiftImm { rd: 1, rm: 2, imm: 3 }));
        // ADDS R0, R1, R2
        assert_eq!(add_sub_reg(0x1888), Ok(Operands::T16AddSub { rd: 0, rn: 1, rm: 2 }));
        // ADDS R0, R1, #3
        assert_eq!(add_sub_imm3(0x1CC8), Ok(Operands::T16AddSubImm3 { rd: 0, rn: 1, imm: 3 }));
        // ANDS R0, R1
        assert_eq!(alu_reg(0x4008), Ok(Operands::T16AluReg { rd: 0, rm: 1 }));
    }

    #[test]
    fn test_high_register_destination() {
        // MOV PC, LR
        assert_eq!(alu_reg_high(0x46F7), Ok(Operands::T16AluReg { rd: 15, rm: 14 }));
        // ADD R0, R8
        assert_eq!(alu_reg_high(0x4440), Ok(Operands::T16AluReg { rd: 0, rm: 8 }));
    }

    #[test]
    fn test_branch_targets() {
        // BEQ +6 at 0x100
        assert_eq!(
            b_cond(0xD003, 0x100),
            Ok(Operands::A32BImm { cond: Condition::Eq, target: 0x10A })
        );
        // B . at 0x200
        assert_eq!(
            b(0xE7FE, 0x200),
            Ok(Operands::A32BImm { cond: Condition::Al, target: 0x200 })
        );
        // UDF shares the conditional branch space
        assert_eq!(b_cond(0xDE00, 0x0), Err(Undefined));
    }

    #[test]
    fn test_bx_and_svc() {
        assert_eq!(b_reg(0x4770), Ok(Operands::A32BReg { cond: Condition::Al, rm: 14 }));
        assert_eq!(
            exception(0xDFAB),
            Ok(Operands::A32Exception { cond: Condition::Al, id: 0xAB })
        );
    }

    #[test]
    fn test_literal_load() {
        // LDR R3, [PC, #8]
        assert!(matches!(
            ldr_lit(0x4B02),
            Ok(Operands::A32Mem { rt: 3, rn: 15, load: true, wback: false, offset: MemOffset::Imm(8), .. })
        ));
    }

    #[test]
    fn test_immediate_offsets_scale_with_size() {
        // LDR R0, [R1, #4]
        assert_eq!(
            mem_imm(0x6848, InstName::Ldr),
            Ok(Operands::A32Mem {
                cond: Condition::Al,
                rt: 0,
                rn: 1,
                load: true,
                index: true,
                add: true,
                wback: false,
                unprivileged: false,
                offset: MemOffset::Imm(4)
            })
        );
        // STRH R2, [R3, #2]
        assert!(matches!(
            mem_imm(0x805A, InstName::Strh),
            Ok(Operands::A32Mem { rt: 2, rn: 3, load: false, offset: MemOffset::Imm(2), .. })
        ));
        // LDRB R0, [R1, #31]
        assert!(matches!(
            mem_imm(0x7FC8, InstName::Ldrb),
            Ok(Operands::A32Mem { rt: 0, rn: 1, load: true, offset: MemOffset::Imm(31), .. })
        ));
    }

    #[test]
    fn test_register_and_sp_relative_transfers() {
        // LDRSH R0, [R1, R2]
        assert!(matches!(
            mem_reg(0x5E88, InstName::Ldrsh),
            Ok(Operands::A32Mem { rt: 0, rn: 1, load: true, offset: MemOffset::Reg { rm: 2 }, .. })
        ));
        // STR R0, [R1, R2]
        assert!(matches!(
            mem_reg(0x5088, InstName::Str),
            Ok(Operands::A32Mem { load: false, offset: MemOffset::Reg { rm: 2 }, .. })
        ));
        // LDR R3, [SP, #8]
        assert!(matches!(
            mem_sp(0x9B02, InstName::Ldr),
            Ok(Operands::A32Mem { rt: 3, rn: 13, load: true, offset: MemOffset::Imm(8), .. })
        ));
    }

    #[test]
    fn test_sp_and_pc_arithmetic() {
        // ADR R0, #4
        assert_eq!(
            adr(0xA001),
            Ok(Operands::A32AluImm { cond: Condition::Al, rd: 0, rn: 15, set_flags: false, imm: 4 })
        );
        // ADD R1, SP, #8
        assert_eq!(
            add_sp_imm8(0xA902),
            Ok(Operands::A32AluImm { cond: Condition::Al, rd: 1, rn: 13, set_flags: false, imm: 8 })
        );
        // SUB SP, #508
        assert_eq!(
            adjust_sp(0xB0FF),
            Ok(Operands::A32AluImm { cond: Condition::Al, rd: 13, rn: 13, set_flags: false, imm: 508 })
        );
        assert_eq!(hint(), Ok(Operands::A32Plain { cond: Condition::Al }));
    }

    #[test]
    fn test_push_pop_lists() {
        // PUSH {R4, LR}
        assert_eq!(
            push(0xB510),
            Ok(Operands::A32MemMult {
                cond: Condition::Al,
                rn: 13,
                register_mask: 0x4010,
                offset: -8,
                post_offset: -8,
                load: false
            })
        );
        // POP {R4, PC}
        assert_eq!(
            pop(0xBD10),
            Ok(Operands::A32MemMult {
                cond: Condition::Al,
                rn: 13,
                register_mask: 0x8010,
                offset: 0,
                post_offset: 8,
                load: true
            })
        );
        // Empty lists are unpredictable
        assert_eq!(push(0xB400), Err(Undefined));
        assert_eq!(pop(0xBC00), Err(Undefined));
    }
}
