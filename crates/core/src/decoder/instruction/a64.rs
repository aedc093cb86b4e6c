// Armature - Guest CPU Front End
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! AArch64 operand extraction, one function per shape.

use super::{Built, Condition, DataOp, ExtendType, Operands, ShiftType, Undefined};
use crate::bits::{highest_set_bit_nibble, lowest_set_bit, shl_ones};
use crate::decoder::fields::{
    decode_bitmask, decode_imm26_2, decode_imm8_float, decode_imm_s14_2, decode_imm_s19_2,
    FloatSize,
};
use crate::decoder::table::InstName;

#[inline]
fn rd(raw: u32) -> u8 {
    (raw & 0x1f) as u8
}

#[inline]
fn rn(raw: u32) -> u8 {
    ((raw >> 5) & 0x1f) as u8
}

#[inline]
fn rm(raw: u32) -> u8 {
    ((raw >> 16) & 0x1f) as u8
}

#[inline]
fn is_64bit(raw: u32) -> bool {
    raw >> 31 != 0
}

#[inline]
fn pc_relative(address: u64, offset: i64) -> u64 {
    address.wrapping_add(offset as u64)
}

pub(super) fn alu(raw: u32) -> Built {
    Ok(Operands::Alu {
        rd: rd(raw),
        rn: rn(raw),
        data_op: DataOp::from_bits(raw >> 24),
    })
}

pub(super) fn alu_binary(raw: u32) -> Built {
    Ok(Operands::AluBinary {
        rd: rd(raw),
        rn: rn(raw),
        rm: rm(raw),
    })
}

pub(super) fn alu_imm(raw: u32) -> Built {
    let data_op = DataOp::from_bits(raw >> 24);

    let imm = match data_op {
        DataOp::Arithmetic => {
            let shift = (raw >> 22) & 3;
            if shift > 1 {
                return Err(Undefined);
            }
            (((raw >> 10) & 0xfff) as u64) << (shift * 12)
        }
        DataOp::Logical => decode_bitmask(raw, true).ok_or(Undefined)?.wmask,
        DataOp::Adr | DataOp::BitField => return Err(Undefined),
    };

    Ok(Operands::AluImm {
        rd: rd(raw),
        rn: rn(raw),
        imm,
        data_op,
    })
}

pub(super) fn alu_rs(raw: u32) -> Built {
    let shift = (raw >> 10) & 0x3f;
    let bits = if is_64bit(raw) { 64 } else { 32 };
    if shift >= bits {
        return Err(Undefined);
    }

    Ok(Operands::AluRs {
        rd: rd(raw),
        rn: rn(raw),
        rm: rm(raw),
        shift: shift as u8,
        shift_type: ShiftType::from_bits(raw >> 22),
    })
}

pub(super) fn alu_rx(raw: u32) -> Built {
    Ok(Operands::AluRx {
        rd: rd(raw),
        rn: rn(raw),
        rm: rm(raw),
        shift: ((raw >> 10) & 7) as u8,
        extend: ExtendType::from_bits(raw >> 13),
    })
}

pub(super) fn adr(raw: u32) -> Built {
    Ok(Operands::Adr {
        rd: rd(raw),
        imm: decode_imm_s19_2(raw) | ((raw >> 29) & 3) as i64,
    })
}

pub(super) fn bfm(raw: u32) -> Built {
    let mask = decode_bitmask(raw, false).ok_or(Undefined)?;

    Ok(Operands::Bfm {
        rd: rd(raw),
        rn: rn(raw),
        wmask: mask.wmask,
        tmask: mask.tmask,
        pos: mask.pos as u8,
        shift: mask.shift as u8,
    })
}

pub(super) fn b_imm_al(raw: u32, address: u64) -> Built {
    Ok(Operands::BImm {
        target: pc_relative(address, decode_imm26_2(raw)),
    })
}

pub(super) fn b_imm_cond(raw: u32, address: u64) -> Built {
    // o0 set is BC.cond, not handled here
    if (raw >> 4) & 1 != 0 {
        return Err(Undefined);
    }

    Ok(Operands::BImmCond {
        target: pc_relative(address, decode_imm_s19_2(raw)),
        cond: Condition::from_bits(raw),
    })
}

pub(super) fn b_imm_cmp(raw: u32, address: u64) -> Built {
    Ok(Operands::BImmCmp {
        rt: rd(raw),
        target: pc_relative(address, decode_imm_s19_2(raw)),
    })
}

pub(super) fn b_imm_test(raw: u32, address: u64) -> Built {
    Ok(Operands::BImmTest {
        rt: rd(raw),
        target: pc_relative(address, decode_imm_s14_2(raw)),
        bit: (((raw >> 19) & 0x1f) | ((raw >> 26) & 0x20)) as u8,
    })
}

pub(super) fn b_reg(raw: u32) -> Built {
    let op4 = raw & 0x1f;
    let op2 = (raw >> 16) & 0x1f;
    if op2 != 0b11111 || op4 != 0 {
        return Err(Undefined);
    }

    Ok(Operands::BReg { rn: rn(raw) })
}

pub(super) fn ccmp_imm(raw: u32) -> Built {
    if (raw >> 4) & 1 != 0 {
        return Err(Undefined);
    }

    Ok(Operands::CcmpImm {
        rn: rn(raw),
        imm: rm(raw),
        nzcv: (raw & 0xf) as u8,
        cond: Condition::from_bits(raw >> 12),
    })
}

pub(super) fn ccmp_reg(raw: u32) -> Built {
    if (raw >> 4) & 1 != 0 {
        return Err(Undefined);
    }

    Ok(Operands::CcmpReg {
        rn: rn(raw),
        rm: rm(raw),
        nzcv: (raw & 0xf) as u8,
        cond: Condition::from_bits(raw >> 12),
    })
}

pub(super) fn csel(raw: u32) -> Built {
    Ok(Operands::Csel {
        rd: rd(raw),
        rn: rn(raw),
        rm: rm(raw),
        cond: Condition::from_bits(raw >> 12),
    })
}

pub(super) fn exception(raw: u32) -> Built {
    Ok(Operands::Exception {
        id: (raw >> 5) & 0xffff,
    })
}

pub(super) fn mov(raw: u32) -> Built {
    let p1 = (raw >> 22) & 1;
    if !is_64bit(raw) && p1 != 0 {
        return Err(Undefined);
    }

    let shift = ((raw >> 21) & 3) << 4;
    Ok(Operands::Mov {
        rd: rd(raw),
        imm: (((raw >> 5) & 0xffff) as u64) << shift,
        shift: shift as u8,
    })
}

pub(super) fn mul(raw: u32) -> Built {
    Ok(Operands::Mul {
        rd: rd(raw),
        rn: rn(raw),
        rm: rm(raw),
        ra: ((raw >> 10) & 0x1f) as u8,
    })
}

/// Addressing form of the load/store register (immediate) group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MemOp {
    Unscaled,
    PostIndexed,
    Unprivileged,
    PreIndexed,
    Unsigned,
}

struct MemImmFields {
    size: u8,
    imm: i64,
    wback: bool,
    post_idx: bool,
    unscaled: bool,
}

fn mem_imm_fields(raw: u32) -> MemImmFields {
    let size = ((raw >> 30) & 3) as u8;
    let mut wback = (raw >> 24) & 1 == 0;

    // Bits 10..12 belong to the 12-bit offset in the unsigned form
    let op = if wback {
        match (raw >> 10) & 3 {
            0 => MemOp::Unscaled,
            1 => MemOp::PostIndexed,
            2 => MemOp::Unprivileged,
            _ => MemOp::PreIndexed,
        }
    } else {
        MemOp::Unsigned
    };

    let post_idx = op == MemOp::PostIndexed;
    let unscaled = matches!(op, MemOp::Unscaled | MemOp::Unprivileged);
    if unscaled {
        wback = false;
    }

    let imm = if wback || unscaled {
        (((raw << 11) as i32) >> 23) as i64
    } else {
        (((raw >> 10) & 0xfff) as i64) << size
    };

    MemImmFields {
        size,
        imm,
        wback,
        post_idx,
        unscaled,
    }
}

pub(super) fn mem_imm(raw: u32) -> Built {
    let fields = mem_imm_fields(raw);

    Ok(Operands::MemImm {
        rt: rd(raw),
        rn: rn(raw),
        size: fields.size,
        signed: (raw >> 23) & 1 != 0,
        extend64: (raw >> 22) & 3 == 2,
        imm: fields.imm,
        wback: fields.wback,
        post_idx: fields.post_idx,
        unscaled: fields.unscaled,
    })
}

pub(super) fn mem_lit(raw: u32, address: u64) -> Built {
    let (size, signed, prefetch) = match (raw >> 30) & 3 {
        0 => (2, false, false),
        1 => (3, false, false),
        2 => (2, true, false),
        _ => (0, false, true),
    };

    Ok(Operands::MemLit {
        rt: rd(raw),
        target: pc_relative(address, decode_imm_s19_2(raw)),
        size,
        signed,
        prefetch,
    })
}

pub(super) fn mem_pair(raw: u32) -> Built {
    let size = (((raw >> 31) & 1) | 2) as u8;

    Ok(Operands::MemPair {
        rt: rd(raw),
        rt2: ((raw >> 10) & 0x1f) as u8,
        rn: rn(raw),
        size,
        imm: (((raw >> 15) as i64) << 57) >> (57 - size as u32),
        wback: (raw >> 23) & 1 != 0,
        post_idx: (raw >> 23) & 3 == 1,
        extend64: (raw >> 30) & 3 == 1,
    })
}

pub(super) fn mem_reg(raw: u32) -> Built {
    Ok(Operands::MemReg {
        rt: rd(raw),
        rn: rn(raw),
        rm: rm(raw),
        size: ((raw >> 30) & 3) as u8,
        signed: (raw >> 23) & 1 != 0,
        extend64: (raw >> 22) & 3 == 2,
        shift: (raw >> 12) & 1 != 0,
        extend: ExtendType::from_bits(raw >> 13),
    })
}

pub(super) fn mem_ex(raw: u32) -> Built {
    Ok(Operands::MemEx {
        rt: rd(raw),
        rt2: ((raw >> 10) & 0x1f) as u8,
        rn: rn(raw),
        rs: rm(raw),
        size: ((raw >> 30) & 3) as u8,
    })
}

pub(super) fn system(raw: u32) -> Built {
    Ok(Operands::System {
        rt: rd(raw),
        op0: (((raw >> 19) & 1) | 2) as u8,
        op1: ((raw >> 16) & 7) as u8,
        crn: ((raw >> 12) & 0xf) as u8,
        crm: ((raw >> 8) & 0xf) as u8,
        op2: ((raw >> 5) & 7) as u8,
    })
}

pub(super) fn simd(raw: u32) -> Built {
    Ok(Operands::Simd {
        rd: rd(raw),
        rn: rn(raw),
        size: ((raw >> 22) & 3) as u8,
    })
}

pub(super) fn simd_reg(raw: u32) -> Built {
    Ok(Operands::SimdReg {
        rd: rd(raw),
        rn: rn(raw),
        rm: rm(raw),
        size: ((raw >> 22) & 3) as u8,
    })
}

pub(super) fn simd_fmov(raw: u32) -> Built {
    let size = FloatSize::try_from((raw >> 22) & 3).map_err(|_| Undefined)?;
    let imm8 = ((raw >> 13) & 0xff) as u64;

    Ok(Operands::SimdFmov {
        rd: rd(raw),
        imm: decode_imm8_float(imm8, size),
        size,
    })
}

pub(super) fn simd_imm(raw: u32) -> Built {
    let cmode = (raw >> 12) & 0xf;
    let op = (raw >> 29) & 1;
    let mode_low = cmode & 1;
    let mode_high = cmode >> 1;

    let imm8 = (((raw >> 5) & 0x1f) | ((raw >> 11) & 0xe0)) as u64;

    let (imm, size) = if mode_high == 0b111 {
        match op | (mode_low << 1) {
            // 8-bit element, replicated
            0 => (imm8 * 0x0101_0101_0101_0101, 0),
            // Each immediate bit selects a whole byte
            1 => {
                let mask = (0..8)
                    .filter(|bit| (imm8 >> bit) & 1 != 0)
                    .fold(0u64, |acc, bit| acc | (0xff << (bit * 8)));
                (mask, 3)
            }
            2 => {
                let single = decode_imm8_float(imm8, FloatSize::Single);
                (single | (single << 32), 2)
            }
            _ => (decode_imm8_float(imm8, FloatSize::Double), 3),
        }
    } else if mode_high & 0b110 == 0b100 {
        (imm8 << ((mode_high & 1) << 3), 1)
    } else if mode_high & 0b100 == 0 {
        (imm8 << (mode_high << 3), 2)
    } else {
        // cmode 110x: shifted ones
        (shl_ones(imm8, 8 << mode_low), 2)
    };

    Ok(Operands::SimdImm {
        rd: rd(raw),
        imm,
        size,
    })
}

pub(super) fn simd_ins(raw: u32) -> Built {
    let imm4 = (raw >> 11) & 0xf;
    let imm5 = (raw >> 16) & 0x1f;
    if imm5 & 0xf == 0 {
        return Err(Undefined);
    }

    let size = lowest_set_bit(imm5 as i32) as u32;

    Ok(Operands::SimdIns {
        rd: rd(raw),
        rn: rn(raw),
        size: size as u8,
        src_index: (imm4 >> size) as u8,
        dst_index: (imm5 >> (size + 1)) as u8,
    })
}

pub(super) fn simd_sh_imm(raw: u32, name: InstName) -> Built {
    let imm = (raw >> 16) & 0x7f;
    // Element size is the top set bit of immh
    let size = highest_set_bit_nibble((imm >> 3) as i32);
    if size < 0 {
        return Err(Undefined);
    }

    let esize = 8u32 << size;
    let shift = match name {
        InstName::ShlS | InstName::ShlV | InstName::SshllV | InstName::UshllV => imm - esize,
        _ => 2 * esize - imm,
    };

    Ok(Operands::SimdShImm {
        rd: rd(raw),
        rn: rn(raw),
        size: size as u8,
        shift: shift as u8,
    })
}

pub(super) fn simd_mem_imm(raw: u32) -> Built {
    let fields = mem_imm_fields(raw);

    let size = fields.size | ((raw >> 21) & 4) as u8;
    if size > 4 {
        return Err(Undefined);
    }

    let mut imm = fields.imm;
    if !fields.wback && !fields.unscaled && size == 4 {
        imm <<= 4;
    }

    Ok(Operands::SimdMemImm {
        rt: rd(raw),
        rn: rn(raw),
        size,
        imm,
        wback: fields.wback,
        post_idx: fields.post_idx,
        unscaled: fields.unscaled,
    })
}

pub(super) fn simd_mem_lit(raw: u32, address: u64) -> Built {
    let opc = (raw >> 30) & 3;
    if opc == 3 {
        return Err(Undefined);
    }

    Ok(Operands::SimdMemLit {
        rt: rd(raw),
        target: pc_relative(address, decode_imm_s19_2(raw)),
        size: (opc + 2) as u8,
    })
}
