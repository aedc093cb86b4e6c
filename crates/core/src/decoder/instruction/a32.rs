// Armature - Guest CPU Front End
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! AArch32 (ARM state) operand extraction.

use super::{Built, Condition, MemOffset, Operands, ShiftType, Undefined};
use crate::bits::rotate_right_u32;
use crate::decoder::fields::decode_imm24_2;
use crate::decoder::table::InstName;

#[inline]
fn cond(raw: u32) -> Condition {
    Condition::from_bits(raw >> 28)
}

#[inline]
fn reg(raw: u32, lsb: u32) -> u8 {
    ((raw >> lsb) & 0xf) as u8
}

#[inline]
fn bit(raw: u32, index: u32) -> bool {
    (raw >> index) & 1 != 0
}

pub(super) fn plain(raw: u32) -> Built {
    Ok(Operands::A32Plain { cond: cond(raw) })
}

pub(super) fn alu_imm(raw: u32) -> Built {
    let rotate = ((raw >> 8) & 0xf) * 2;

    Ok(Operands::A32AluImm {
        cond: cond(raw),
        rd: reg(raw, 12),
        rn: reg(raw, 16),
        set_flags: bit(raw, 20),
        imm: rotate_right_u32(raw & 0xff, rotate, 32),
    })
}

pub(super) fn alu_imm16(raw: u32) -> Built {
    Ok(Operands::A32AluImm16 {
        cond: cond(raw),
        rd: reg(raw, 12),
        imm: ((raw & 0xfff) | ((raw >> 4) & 0xf000)) as u16,
    })
}

pub(super) fn alu_rs_imm(raw: u32) -> Built {
    Ok(Operands::A32AluRsImm {
        cond: cond(raw),
        rd: reg(raw, 12),
        rn: reg(raw, 16),
        set_flags: bit(raw, 20),
        rm: reg(raw, 0),
        imm: ((raw >> 7) & 0x1f) as u8,
        shift_type: ShiftType::from_bits(raw >> 5),
    })
}

pub(super) fn alu_rs_reg(raw: u32) -> Built {
    Ok(Operands::A32AluRsReg {
        cond: cond(raw),
        rd: reg(raw, 12),
        rn: reg(raw, 16),
        set_flags: bit(raw, 20),
        rm: reg(raw, 0),
        rs: reg(raw, 8),
        shift_type: ShiftType::from_bits(raw >> 5),
    })
}

pub(super) fn alu_reg(raw: u32) -> Built {
    Ok(Operands::A32AluReg {
        cond: cond(raw),
        rd: reg(raw, 12),
        rn: reg(raw, 16),
        rm: reg(raw, 0),
    })
}

pub(super) fn alu_bf(raw: u32) -> Built {
    Ok(Operands::A32AluBf {
        cond: cond(raw),
        rd: reg(raw, 12),
        rn: reg(raw, 0),
        msb: ((raw >> 16) & 0x1f) as u8,
        lsb: ((raw >> 7) & 0x1f) as u8,
    })
}

// Multiplies keep the destination in bits 16..19 and the accumulator in 12..15.
pub(super) fn alu_mla(raw: u32) -> Built {
    Ok(Operands::A32AluMla {
        cond: cond(raw),
        rd: reg(raw, 16),
        rn: reg(raw, 0),
        rm: reg(raw, 8),
        ra: reg(raw, 12),
        set_flags: bit(raw, 20),
        n_high: bit(raw, 5),
        m_high: bit(raw, 6),
        round: bit(raw, 5),
    })
}

pub(super) fn alu_umull(raw: u32) -> Built {
    Ok(Operands::A32AluUmull {
        cond: cond(raw),
        rd_lo: reg(raw, 12),
        rd_hi: reg(raw, 16),
        rn: reg(raw, 0),
        rm: reg(raw, 8),
        set_flags: bit(raw, 20),
        n_high: bit(raw, 5),
        m_high: bit(raw, 6),
    })
}

pub(super) fn alu_ux(raw: u32) -> Built {
    let rn = reg(raw, 16);

    Ok(Operands::A32AluUx {
        cond: cond(raw),
        rd: reg(raw, 12),
        rn,
        rm: reg(raw, 0),
        rotate: (((raw >> 10) & 3) * 8) as u8,
        // Rn == PC selects the plain extend, anything else is the accumulating form
        add: rn != 15,
    })
}

pub(super) fn b_imm(raw: u32, address: u64) -> Built {
    let cond = cond(raw);
    let mut pc = address.wrapping_add(8);

    // cond == NV is BLX (immediate), which switches to Thumb and keeps the
    // halfword bit H
    if cond != Condition::Nv {
        pc &= !3;
    }

    let mut target = pc.wrapping_add(decode_imm24_2(raw) as u64);
    if cond == Condition::Nv {
        target |= ((raw >> 23) & 2) as u64;
    }

    Ok(Operands::A32BImm { cond, target })
}

pub(super) fn b_reg(raw: u32) -> Built {
    Ok(Operands::A32BReg {
        cond: cond(raw),
        rm: reg(raw, 0),
    })
}

pub(super) fn exception(raw: u32) -> Built {
    Ok(Operands::A32Exception {
        cond: cond(raw),
        id: raw & 0x00ff_ffff,
    })
}

fn mem(raw: u32, name: InstName, offset: MemOffset) -> Built {
    let p = bit(raw, 24);
    let w = bit(raw, 21);

    Ok(Operands::A32Mem {
        cond: cond(raw),
        rt: reg(raw, 12),
        rn: reg(raw, 16),
        // LDRD lives in the L=0 half of the extra load/store space
        load: bit(raw, 20) || name == InstName::Ldrd,
        index: p,
        add: bit(raw, 23),
        wback: !p || w,
        unprivileged: !p && w,
        offset,
    })
}

pub(super) fn mem_imm(raw: u32, name: InstName) -> Built {
    mem(raw, name, MemOffset::Imm(raw & 0xfff))
}

pub(super) fn mem_imm8(raw: u32, name: InstName) -> Built {
    let imm = (raw & 0xf) | (((raw >> 8) & 0xf) << 4);
    mem(raw, name, MemOffset::Imm(imm))
}

pub(super) fn mem_reg(raw: u32, name: InstName) -> Built {
    mem(raw, name, MemOffset::Reg { rm: reg(raw, 0) })
}

pub(super) fn mem_rs_imm(raw: u32, name: InstName) -> Built {
    let offset = MemOffset::ShiftedReg {
        rm: reg(raw, 0),
        imm: ((raw >> 7) & 0x1f) as u8,
        shift_type: ShiftType::from_bits(raw >> 5),
    };
    mem(raw, name, offset)
}

pub(super) fn mem_mult(raw: u32) -> Built {
    let register_mask = (raw & 0xffff) as u16;
    let p = bit(raw, 24);
    let u = bit(raw, 23);
    let w = bit(raw, 21);

    let regs_size = (register_mask.count_ones() * 4) as i32;

    let mut offset = 0;
    if !u {
        offset -= regs_size;
    }
    // IB and DA start one word away from the base
    if u == p {
        offset += 4;
    }

    let post_offset = match (w, u) {
        (false, _) => 0,
        (true, true) => regs_size,
        (true, false) => -regs_size,
    };

    Ok(Operands::A32MemMult {
        cond: cond(raw),
        rn: reg(raw, 16),
        register_mask,
        offset,
        post_offset,
        load: bit(raw, 20),
    })
}

pub(super) fn mem_ld_ex(raw: u32) -> Built {
    Ok(Operands::A32MemLdEx {
        cond: cond(raw),
        rt: reg(raw, 12),
        rn: reg(raw, 16),
        wback: !bit(raw, 24) || bit(raw, 21),
    })
}

pub(super) fn mem_st_ex(raw: u32) -> Built {
    Ok(Operands::A32MemStEx {
        cond: cond(raw),
        rd: reg(raw, 12),
        rt: reg(raw, 0),
        rn: reg(raw, 16),
        wback: !bit(raw, 24) || bit(raw, 21),
    })
}

pub(super) fn mrs(raw: u32) -> Built {
    Ok(Operands::A32Mrs {
        cond: cond(raw),
        rd: reg(raw, 12),
        spsr: bit(raw, 22),
    })
}

// A zero field mask is the hint space, or unpredictable
fn msr_mask(raw: u32) -> Result<u8, Undefined> {
    match reg(raw, 16) {
        0 => Err(Undefined),
        mask => Ok(mask),
    }
}

pub(super) fn msr_imm(raw: u32) -> Built {
    let rotate = ((raw >> 8) & 0xf) * 2;

    Ok(Operands::A32MsrImm {
        cond: cond(raw),
        spsr: bit(raw, 22),
        mask: msr_mask(raw)?,
        imm: rotate_right_u32(raw & 0xff, rotate, 32),
    })
}

pub(super) fn msr_reg(raw: u32) -> Built {
    Ok(Operands::A32MsrReg {
        cond: cond(raw),
        spsr: bit(raw, 22),
        mask: msr_mask(raw)?,
        rn: reg(raw, 0),
    })
}

pub(super) fn system(raw: u32) -> Built {
    Ok(Operands::A32System {
        cond: cond(raw),
        opc1: ((raw >> 21) & 7) as u8,
        crn: reg(raw, 16),
        rt: reg(raw, 12),
        coproc: reg(raw, 8),
        opc2: ((raw >> 5) & 7) as u8,
        crm: reg(raw, 0),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alu_imm_rotation() {
        // ADD R0, R1, #0xFF000000
        assert_eq!(
            alu_imm(0xE281_04FF),
            Ok(Operands::A32AluImm {
                cond: Condition::Al,
                rd: 0,
                rn: 1,
                set_flags: false,
                imm: 0xFF00_0000
            })
        );
        // ADDS R0, R1, #1
        assert!(matches!(
            alu_imm(0xE291_0001),
            Ok(Operands::A32AluImm { set_flags: true, imm: 1, .. })
        ));
    }

    #[test]
    fn test_shifted_register_forms() {
        // MOV R0, R1, LSL #2
        assert_eq!(
            alu_rs_imm(0xE1A0_0101),
            Ok(Operands::A32AluRsImm {
                cond: Condition::Al,
                rd: 0,
                rn: 0,
                set_flags: false,
                rm: 1,
                imm: 2,
                shift_type: ShiftType::Lsl
            })
        );
        // MOV R2, R3, LSR R4
        assert!(matches!(
            alu_rs_reg(0xE1A0_2433),
            Ok(Operands::A32AluRsReg { rd: 2, rm: 3, rs: 4, shift_type: ShiftType::Lsr, .. })
        ));
    }

    #[test]
    fn test_movw_immediate() {
        assert_eq!(
            alu_imm16(0xE301_0234),
            Ok(Operands::A32AluImm16 { cond: Condition::Al, rd: 0, imm: 0x1234 })
        );
    }

    #[test]
    fn test_bitfield_and_multiply_fields() {
        // UBFX R0, R1, #4, #8
        assert_eq!(
            alu_bf(0xE7E7_0251),
            Ok(Operands::A32AluBf { cond: Condition::Al, rd: 0, rn: 1, msb: 7, lsb: 4 })
        );
        // MUL R0, R1, R2
        assert!(matches!(
            alu_mla(0xE000_0291),
            Ok(Operands::A32AluMla { rd: 0, rn: 1, rm: 2, ra: 0, .. })
        ));
        // UMULL R0, R1, R2, R3
        assert!(matches!(
            alu_umull(0xE081_0392),
            Ok(Operands::A32AluUmull { rd_lo: 0, rd_hi: 1, rn: 2, rm: 3, .. })
        ));
    }

    #[test]
    fn test_extend_rotation() {
        // UXTB R0, R1, ROR #8
        assert_eq!(
            alu_ux(0xE6EF_0471),
            Ok(Operands::A32AluUx {
                cond: Condition::Al,
                rd: 0,
                rn: 15,
                rm: 1,
                rotate: 8,
                add: false
            })
        );
    }

    #[test]
    fn test_branch_immediate_targets() {
        // B . at 0x8000
        assert_eq!(
            b_imm(0xEAFF_FFFE, 0x8000),
            Ok(Operands::A32BImm { cond: Condition::Al, target: 0x8000 })
        );
        // BLX #+2 (H=1) switches to Thumb at a halfword
        assert_eq!(
            b_imm(0xFB00_0000, 0x8000),
            Ok(Operands::A32BImm { cond: Condition::Nv, target: 0x800A })
        );
        // BNE +4
        assert!(matches!(
            b_imm(0x1A00_0001, 0x100),
            Ok(Operands::A32BImm { cond: Condition::Ne, target: 0x10C })
        ));
    }

    #[test]
    fn test_single_register_transfers() {
        // LDR R0, [R1, #4]
        assert_eq!(
            mem_imm(0xE591_0004, InstName::Ldr),
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
        // LDR PC, [SP], #4: post-indexed always writes back
        assert!(matches!(
            mem_imm(0xE49D_F004, InstName::Ldr),
            Ok(Operands::A32Mem { rt: 15, rn: 13, wback: true, unprivileged: false, index: false, .. })
        ));
        // LDRH R0, [R1, #-0x12]
        assert!(matches!(
            mem_imm8(0xE151_01B2, InstName::Ldrh),
            Ok(Operands::A32Mem { add: false, offset: MemOffset::Imm(0x12), .. })
        ));
        // LDR R0, [R1, R2, LSL #2]
        assert!(matches!(
            mem_rs_imm(0xE791_0102, InstName::Ldr),
            Ok(Operands::A32Mem {
                offset: MemOffset::ShiftedReg { rm: 2, imm: 2, shift_type: ShiftType::Lsl },
                ..
            })
        ));
    }

    #[test]
    fn test_ldrd_counts_as_load() {
        // LDRD R0, R1, [R2]: L bit is clear
        assert!(matches!(
            mem_imm8(0xE1C2_00D0, InstName::Ldrd),
            Ok(Operands::A32Mem { load: true, rt: 0, rn: 2, .. })
        ));
        // STRD with the same layout stays a store
        assert!(matches!(
            mem_imm8(0xE1C2_00F0, InstName::Strd),
            Ok(Operands::A32Mem { load: false, .. })
        ));
    }

    #[test]
    fn test_multiple_transfer_offsets() {
        // PUSH {R4, LR} == STMDB SP!, {R4, LR}
        assert_eq!(
            mem_mult(0xE92D_4010),
            Ok(Operands::A32MemMult {
                cond: Condition::Al,
                rn: 13,
                register_mask: 0x4010,
                offset: -8,
                post_offset: -8,
                load: false
            })
        );
        // POP {R4, PC} == LDMIA SP!, {R4, PC}
        assert!(matches!(
            mem_mult(0xE8BD_8010),
            Ok(Operands::A32MemMult { offset: 0, post_offset: 8, load: true, .. })
        ));
        // LDMIB R0, {R1}
        assert!(matches!(
            mem_mult(0xE990_0002),
            Ok(Operands::A32MemMult { offset: 4, post_offset: 0, .. })
        ));
        // LDMDA R0, {R1, R2}
        assert!(matches!(
            mem_mult(0xE810_0006),
            Ok(Operands::A32MemMult { offset: -4, post_offset: 0, .. })
        ));
    }

    #[test]
    fn test_exclusive_transfers() {
        // LDREX R0, [R1]
        assert_eq!(
            mem_ld_ex(0xE191_0F9F),
            Ok(Operands::A32MemLdEx { cond: Condition::Al, rt: 0, rn: 1, wback: false })
        );
        // STREX R2, R0, [R1]
        assert_eq!(
            mem_st_ex(0xE181_2F90),
            Ok(Operands::A32MemStEx { cond: Condition::Al, rd: 2, rt: 0, rn: 1, wback: false })
        );
    }

    #[test]
    fn test_coprocessor_fields() {
        // MRC p15, 0, R0, c13, c0, 3
        assert_eq!(
            system(0xEE1D_0F70),
            Ok(Operands::A32System {
                cond: Condition::Al,
                opc1: 0,
                crn: 13,
                rt: 0,
                coproc: 15,
                opc2: 3,
                crm: 0
            })
        );
    }

    #[test]
    fn test_status_register_moves() {
        // MRS R3, SPSR
        assert_eq!(
            mrs(0xE14F_3000),
            Ok(Operands::A32Mrs { cond: Condition::Al, rd: 3, spsr: true })
        );
        // MSR APSR_nzcvq, #0xF0000000
        assert_eq!(
            msr_imm(0xE328_F20F),
            Ok(Operands::A32MsrImm { cond: Condition::Al, spsr: false, mask: 8, imm: 0xF000_0000 })
        );
        // MSR CPSR_fc, R1
        assert_eq!(
            msr_reg(0xE129_F001),
            Ok(Operands::A32MsrReg { cond: Condition::Al, spsr: false, mask: 9, rn: 1 })
        );
        // Empty field mask outside the hint encodings
        assert_eq!(msr_imm(0xE320_F0FF), Err(Undefined));
    }

    #[test]
    fn test_svc_and_bx() {
        assert_eq!(
            exception(0xEF12_3456),
            Ok(Operands::A32Exception { cond: Condition::Al, id: 0x12_3456 })
        );
        assert_eq!(b_reg(0xE12F_FF1E), Ok(Operands::A32BReg { cond: Condition::Al, rm: 14 }));
    }
}
